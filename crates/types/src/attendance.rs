//! Attendances and the actions performed during them.
//!
//! An attendance is one patient's admission to the facility for a reporting period. Its month
//! reference is always derived from the admission date, never supplied by the caller.

use crate::codes::{PatientDestination, PatientOrigin, YesNo};
use crate::month::MonthReference;
use crate::NonEmptyText;
use caps_uuid::RecordId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of secondary CID codes carried by one attendance.
pub const MAX_SECONDARY_CIDS: usize = 3;

/// Editable attendance data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AttendanceDetails {
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub patient_id: RecordId,

    pub admission_date: NaiveDate,

    #[serde(default)]
    pub origin: PatientOrigin,

    /// Primary diagnosis (CID-10), e.g. `F200`.
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub cid_primary: NonEmptyText,

    /// Up to [`MAX_SECONDARY_CIDS`] secondary diagnoses, in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cid_secondary: Vec<String>,

    /// Covered by a family-health-team (ESF).
    #[serde(default)]
    pub esf_coverage: YesNo,

    /// CNES of the covering ESF unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub esf_cnes: Option<String>,

    #[serde(default)]
    pub destination: PatientDestination,

    #[serde(default)]
    pub homeless: YesNo,

    #[serde(default)]
    pub substance_use: YesNo,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substance_type: Option<String>,
}

impl AttendanceDetails {
    /// Returns the `index`-th secondary CID (0-based), if present.
    pub fn secondary_cid(&self, index: usize) -> Option<&str> {
        self.cid_secondary.get(index).map(String::as_str)
    }
}

/// A stored attendance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Attendance {
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub id: RecordId,

    #[serde(flatten)]
    pub details: AttendanceDetails,

    /// Year-month of `admission_date`.
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "2024-03"))]
    pub month_reference: MonthReference,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attendance {
    /// Builds a new record, deriving the month reference from the admission date.
    pub fn create(details: AttendanceDetails, now: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::new(),
            month_reference: MonthReference::from_date(details.admission_date),
            details,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the editable data, re-deriving the month reference.
    pub fn apply(&mut self, details: AttendanceDetails, now: DateTime<Utc>) {
        self.month_reference = MonthReference::from_date(details.admission_date);
        self.details = details;
        self.updated_at = now;
    }
}

fn default_quantity() -> u32 {
    1
}

/// Editable data of a procedure performed during an attendance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AttendanceActionDetails {
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub professional_id: RecordId,

    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub procedure_id: RecordId,

    pub action_date: NaiveDate,

    /// Number of times the procedure was performed; must be positive.
    #[serde(default = "default_quantity")]
    pub quantity: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A stored attendance action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AttendanceAction {
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub id: RecordId,

    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub attendance_id: RecordId,

    #[serde(flatten)]
    pub details: AttendanceActionDetails,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceAction {
    pub fn create(
        attendance_id: RecordId,
        details: AttendanceActionDetails,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            attendance_id,
            details,
            created_at: now,
            updated_at: now,
        }
    }
}
