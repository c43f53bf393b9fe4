//! Year-month reference periods.
//!
//! An attendance is reported against the month of its admission date, and the RAAS header is
//! stamped with the month the file was generated in (the competency). Both use [`MonthReference`].

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// A `YYYY-MM` period.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthReference {
    year: i32,
    month: u32,
}

/// Error returned when parsing a malformed `YYYY-MM` string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid month reference '{0}', expected YYYY-MM")]
pub struct MonthReferenceError(pub String);

/// Last year a four-digit `YYYY` field can hold.
pub const MAX_YEAR: i32 = 9999;

impl MonthReference {
    /// Creates a month reference, validating the month number.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) && (0..=MAX_YEAR).contains(&year) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// Truncates a date to its year and month, or `None` if the year is outside `0..=9999`.
    pub fn try_from_date(date: NaiveDate) -> Option<Self> {
        Self::new(date.year(), date.month())
    }

    /// Truncates a date to its year and month.
    ///
    /// Callers must have checked the year with [`MonthReference::try_from_date`]; years outside
    /// `0..=9999` do not round-trip through `YYYY-MM`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The separator-free form written to the export file, e.g. `202403`.
    pub fn digits(&self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }
}

impl fmt::Display for MonthReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthReference {
    type Err = MonthReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MonthReferenceError(s.to_owned());

        let (year, month) = s.trim().split_once('-').ok_or_else(err)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(err());
        }
        let year: i32 = year.parse().map_err(|_| err())?;
        let month: u32 = month.parse().map_err(|_| err())?;

        MonthReference::new(year, month).ok_or_else(err)
    }
}

impl serde::Serialize for MonthReference {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for MonthReference {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
