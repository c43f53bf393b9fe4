//! Naming and packaging of the export file.

use crate::encoder::{AttendanceRow, RaasEncoder};
use crate::facility::Facility;
use crate::field::LINE_END;
use crate::RaasResult;
use chrono::{Datelike, NaiveDate};

/// Prefix shared by all RAAS production files.
pub const FILE_PREFIX: &str = "AAC";

/// Returns the export file name for a file generated on `generated_on`.
///
/// Format: `AAC<file_tag>.<MM><YY>`, e.g. `AACBVSES.0725` for July 2025.
pub fn file_name(facility: &Facility, generated_on: NaiveDate) -> String {
    format!(
        "{}{}.{:02}{:02}",
        FILE_PREFIX,
        facility.file_tag,
        generated_on.month(),
        generated_on.year().rem_euclid(100)
    )
}

/// An encoded RAAS file ready to be downloaded or written to disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RaasFile {
    pub file_name: String,
    pub contents: String,
}

impl RaasFile {
    /// Encodes `rows` and names the result.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RaasError::EmptyExport`] if `rows` is empty; no file is produced.
    pub fn build(
        encoder: &RaasEncoder<'_>,
        rows: &[AttendanceRow],
        generated_on: NaiveDate,
    ) -> RaasResult<Self> {
        let contents = encoder.encode(rows, generated_on)?;
        Ok(Self {
            file_name: file_name(encoder.facility(), generated_on),
            contents,
        })
    }

    /// Number of detail lines (excluding the header).
    pub fn detail_count(&self) -> usize {
        self.contents.matches(LINE_END).count().saturating_sub(1)
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.contents.as_bytes()
    }
}
