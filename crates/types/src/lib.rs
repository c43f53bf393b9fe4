//! Shared value types and entities for the CAPS registry.
//!
//! - [`NonEmptyText`] for required free-text fields
//! - code enums used by the RAAS layout ([`codes`])
//! - [`MonthReference`], the year-month an attendance is reported against
//! - the registry entities: patients, professionals, procedures, attendances and their actions
//!
//! Entities are split into a `*Details` struct (the editable payload accepted on create/update)
//! and the stored record, which adds the id and bookkeeping timestamps.

pub mod attendance;
pub mod codes;
pub mod month;
pub mod patient;
pub mod procedure;
pub mod professional;

pub use attendance::{Attendance, AttendanceAction, AttendanceActionDetails, AttendanceDetails};
pub use caps_uuid::RecordId;
pub use codes::{CodeError, PatientDestination, PatientOrigin, RaceColor, Sex, YesNo};
pub use month::MonthReference;
pub use patient::{Address, Contact, Patient, PatientDetails};
pub use procedure::{Procedure, ProcedureDetails};
pub use professional::{Professional, ProfessionalDetails};

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `Err(TextError::Empty)` if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for NonEmptyText {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NonEmptyText::new(s)
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Trims an optional text value, mapping blank input to `None`.
///
/// Optional fields arrive from forms and CLI flags as possibly-empty strings; stored records and
/// the RAAS encoder only ever see `None` or a non-blank value.
pub fn normalise_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
