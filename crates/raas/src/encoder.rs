//! Attendance-to-RAAS encoding.

use crate::facility::Facility;
use crate::field::render_line;
use crate::layout::{detail_layout, header_layout, DetailRecord, HeaderRecord, HEADER_SEQUENCE};
use crate::{RaasError, RaasResult};
use caps_types::{Attendance, MonthReference, Patient};
use chrono::NaiveDate;

/// An attendance joined with its patient.
///
/// `patient` is `None` when the attendance references a patient that no longer resolves; such
/// rows produce no detail line.
#[derive(Clone, Debug)]
pub struct AttendanceRow {
    pub attendance: Attendance,
    pub patient: Option<Patient>,
}

/// Encodes attendance rows into the RAAS text body.
///
/// The encoder is a pure function of its inputs: it performs no I/O and does not validate field
/// content. Values longer than their column are truncated.
#[derive(Clone, Debug)]
pub struct RaasEncoder<'a> {
    facility: &'a Facility,
    sequence: u32,
}

impl<'a> RaasEncoder<'a> {
    pub fn new(facility: &'a Facility) -> Self {
        Self {
            facility,
            sequence: HEADER_SEQUENCE,
        }
    }

    /// Overrides the header sequence counter.
    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn facility(&self) -> &Facility {
        self.facility
    }

    /// Renders the `01` header line for a file generated on `generated_on`.
    pub fn header(&self, generated_on: NaiveDate) -> String {
        let record = HeaderRecord {
            competency: MonthReference::from_date(generated_on),
            sequence: self.sequence,
            generated_on,
            facility: self.facility,
        };
        render_line(&header_layout(), &record)
    }

    /// Encodes `rows` (already ordered by admission date) into the full file body.
    ///
    /// # Errors
    ///
    /// Returns [`RaasError::EmptyExport`] if `rows` is empty.
    pub fn encode(&self, rows: &[AttendanceRow], generated_on: NaiveDate) -> RaasResult<String> {
        if rows.is_empty() {
            return Err(RaasError::EmptyExport);
        }

        let mut out = self.header(generated_on);
        let layout = detail_layout();
        let mut written = 0usize;

        for row in rows {
            let Some(patient) = row.patient.as_ref() else {
                tracing::warn!(
                    "attendance {} references unknown patient {}; skipped",
                    row.attendance.id,
                    row.attendance.details.patient_id
                );
                continue;
            };

            let record = DetailRecord {
                attendance: &row.attendance,
                patient,
                facility: self.facility,
            };
            out.push_str(&render_line(&layout, &record));
            written += 1;
        }

        tracing::debug!(
            "encoded {} of {} attendances for competency {}",
            written,
            rows.len(),
            MonthReference::from_date(generated_on)
        );

        Ok(out)
    }
}
