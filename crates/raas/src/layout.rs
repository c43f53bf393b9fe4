//! RAAS header and detail layouts (layout version `02.20`).
//!
//! The column order, widths and kinds below are dictated by the DATASUS ingestion system and are
//! bit-position sensitive. Constants whose meaning is fixed by the official layout rather than by
//! our data (protocol tag, control field, sequence counter, version strings) are named here and
//! must only change together with a new layout version.

use crate::facility::Facility;
use crate::field::Column;
use caps_types::{Attendance, MonthReference, Patient};
use chrono::NaiveDate;

/// Layout version the columns below implement.
pub const LAYOUT_VERSION: &str = "02.20";

/// Version of the generating system, as announced in the header.
pub const SYSTEM_VERSION: &str = "02.20.0";

/// Header record type.
pub const HEADER_RECORD_TYPE: &str = "01";

/// Protocol tag identifying a RAAS file.
pub const PROTOCOL_TAG: &str = "#RAS#";

/// Header control field.
pub const HEADER_CONTROL: &str = "1111";

/// Sequence counter of a single-file submission.
pub const HEADER_SEQUENCE: u32 = 1;

/// Detail (psychosocial attendance) record type.
pub const DETAIL_RECORD_TYPE: &str = "15";

/// Version tag of the detail record.
pub const DETAIL_LAYOUT_VERSION: &str = "21";

/// Nationality code for Brazil.
pub const NATIONALITY_BRAZIL: &str = "010";

/// Service classification written on every detail line.
pub const SERVICE_TYPE: &str = "01";

/// Procedure origin tag.
pub const PROCEDURE_ORIGIN: &str = "RAS";

/// Written in place of a missing CNS.
pub const DEFAULT_CNS: &str = "000000000000000";

/// Written in place of a missing CPF.
pub const DEFAULT_CPF: &str = "00000000000";

/// Width of a header line, excluding CRLF.
pub const HEADER_WIDTH: usize = 246;

/// Width of a detail line, excluding CRLF.
pub const DETAIL_WIDTH: usize = 406;

/// Values rendered into the `01` header line.
pub struct HeaderRecord<'a> {
    pub competency: MonthReference,
    pub sequence: u32,
    pub generated_on: NaiveDate,
    pub facility: &'a Facility,
}

/// Values rendered into one `15` detail line.
pub struct DetailRecord<'a> {
    pub attendance: &'a Attendance,
    pub patient: &'a Patient,
    pub facility: &'a Facility,
}

fn iso(date: NaiveDate) -> Option<String> {
    Some(date.format("%Y-%m-%d").to_string())
}

/// Column layout of the header line.
pub fn header_layout<'a>() -> Vec<Column<HeaderRecord<'a>>> {
    vec![
        Column::constant("record_type", HEADER_RECORD_TYPE),
        Column::constant("protocol_tag", PROTOCOL_TAG),
        Column::numeric("competency", 6, |h: &HeaderRecord<'a>| {
            Some(h.competency.digits())
        }),
        Column::numeric("sequence", 6, |h: &HeaderRecord<'a>| {
            Some(h.sequence.to_string())
        }),
        Column::constant("control", HEADER_CONTROL),
        Column::alpha("facility_name", 30, |h: &HeaderRecord<'a>| {
            Some(h.facility.name.clone())
        }),
        Column::alpha("origin_body_acronym", 6, |h: &HeaderRecord<'a>| {
            Some(h.facility.origin_body_acronym.clone())
        }),
        Column::numeric("origin_body_cnpj", 14, |h: &HeaderRecord<'a>| {
            Some(h.facility.origin_body_cnpj.clone())
        }),
        Column::alpha("destination_body_name", 40, |h: &HeaderRecord<'a>| {
            Some(h.facility.destination_body_name.clone())
        }),
        Column::alpha("destination_body_kind", 1, |h: &HeaderRecord<'a>| {
            Some(h.facility.destination_body_kind.clone())
        }),
        Column::date("generated_on", |h: &HeaderRecord<'a>| iso(h.generated_on)),
        Column::constant("layout_version", LAYOUT_VERSION),
        Column::numeric("reserved", 10, |_: &HeaderRecord<'a>| None),
        Column::constant("system_version", SYSTEM_VERSION),
        Column::blank("filler", 102),
    ]
}

/// Column layout of a detail line.
pub fn detail_layout<'a>() -> Vec<Column<DetailRecord<'a>>> {
    vec![
        Column::constant("record_type", DETAIL_RECORD_TYPE),
        Column::constant("layout_version", DETAIL_LAYOUT_VERSION),
        Column::numeric("month_reference", 6, |r: &DetailRecord<'a>| {
            Some(r.attendance.month_reference.digits())
        }),
        Column::numeric("facility_cnes", 7, |r: &DetailRecord<'a>| {
            Some(r.facility.cnes.clone())
        }),
        Column::alpha("patient_cns", 15, |r: &DetailRecord<'a>| {
            Some(
                r.patient
                    .details
                    .cns
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CNS.to_owned()),
            )
        }),
        Column::date("admission_date", |r: &DetailRecord<'a>| {
            iso(r.attendance.details.admission_date)
        }),
        Column::blank("discharge_date", 8),
        Column::alpha("patient_name", 30, |r: &DetailRecord<'a>| {
            Some(r.patient.details.name.to_string())
        }),
        Column::alpha("medical_record", 10, |r: &DetailRecord<'a>| {
            r.patient.details.medical_record.clone()
        }),
        Column::alpha("mother_name", 30, |r: &DetailRecord<'a>| {
            r.patient.details.mother_name.clone()
        }),
        Column::alpha("street", 30, |r: &DetailRecord<'a>| {
            r.patient.details.address.street.clone()
        }),
        Column::alpha("street_number", 5, |r: &DetailRecord<'a>| {
            r.patient.details.address.number.clone()
        }),
        Column::alpha("complement", 10, |r: &DetailRecord<'a>| {
            r.patient.details.address.complement.clone()
        }),
        Column::alpha("zipcode", 8, |r: &DetailRecord<'a>| {
            r.patient.details.address.zipcode.clone()
        }),
        Column::alpha("municipality_code", 7, |r: &DetailRecord<'a>| {
            Some(r.facility.municipality_code.clone())
        }),
        Column::date("birth_date", |r: &DetailRecord<'a>| {
            iso(r.patient.details.birth_date)
        }),
        Column::alpha("sex", 1, |r: &DetailRecord<'a>| {
            Some(r.patient.details.sex.code().to_owned())
        }),
        Column::numeric("race_color", 2, |r: &DetailRecord<'a>| {
            Some(r.patient.details.race_color.code().to_owned())
        }),
        Column::alpha("responsible_name", 30, |r: &DetailRecord<'a>| {
            let details = &r.patient.details;
            Some(
                details
                    .responsible_name
                    .clone()
                    .unwrap_or_else(|| details.name.to_string()),
            )
        }),
        Column::alpha("nationality", 3, |_: &DetailRecord<'a>| {
            Some(NATIONALITY_BRAZIL.to_owned())
        }),
        Column::blank("filler_1", 4),
        Column::alpha("phone", 11, |r: &DetailRecord<'a>| {
            r.patient.details.contact.phone.clone()
        }),
        Column::alpha("mobile", 11, |r: &DetailRecord<'a>| {
            r.patient.details.contact.mobile.clone()
        }),
        Column::numeric("destination", 2, |r: &DetailRecord<'a>| {
            Some(r.attendance.details.destination.code().to_owned())
        }),
        Column::blank("filler_2", 8),
        Column::alpha("cid_primary", 4, |r: &DetailRecord<'a>| {
            Some(r.attendance.details.cid_primary.to_string())
        }),
        Column::alpha("cid_secondary_1", 4, |r: &DetailRecord<'a>| {
            r.attendance.details.secondary_cid(0).map(str::to_owned)
        }),
        Column::alpha("cid_secondary_2", 4, |r: &DetailRecord<'a>| {
            r.attendance.details.secondary_cid(1).map(str::to_owned)
        }),
        Column::alpha("cid_secondary_3", 4, |r: &DetailRecord<'a>| {
            r.attendance.details.secondary_cid(2).map(str::to_owned)
        }),
        Column::blank("filler_3", 4),
        Column::alpha("service_type", 2, |_: &DetailRecord<'a>| {
            Some(SERVICE_TYPE.to_owned())
        }),
        Column::numeric("origin", 2, |r: &DetailRecord<'a>| {
            Some(r.attendance.details.origin.code().to_owned())
        }),
        Column::alpha("esf_coverage", 1, |r: &DetailRecord<'a>| {
            Some(r.attendance.details.esf_coverage.code().to_owned())
        }),
        Column::alpha("esf_cnes", 7, |r: &DetailRecord<'a>| {
            r.attendance.details.esf_cnes.clone()
        }),
        Column::numeric("reserved", 5, |_: &DetailRecord<'a>| None),
        Column::numeric("destination_repeat", 2, |r: &DetailRecord<'a>| {
            Some(r.attendance.details.destination.code().to_owned())
        }),
        Column::constant("procedure_origin", PROCEDURE_ORIGIN),
        Column::alpha("homeless", 1, |r: &DetailRecord<'a>| {
            Some(r.attendance.details.homeless.code().to_owned())
        }),
        Column::alpha("substance_use", 1, |r: &DetailRecord<'a>| {
            Some(r.attendance.details.substance_use.code().to_owned())
        }),
        Column::alpha("substance_type", 3, |r: &DetailRecord<'a>| {
            r.attendance.details.substance_type.clone()
        }),
        Column::blank("filler_4", 13),
        Column::alpha("neighborhood", 30, |r: &DetailRecord<'a>| {
            r.patient.details.address.neighborhood.clone()
        }),
        Column::blank("filler_5", 3),
        Column::alpha("email", 40, |r: &DetailRecord<'a>| {
            r.patient.details.contact.email.clone()
        }),
        Column::alpha("patient_cpf", 11, |r: &DetailRecord<'a>| {
            Some(
                r.patient
                    .details
                    .cpf
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CPF.to_owned()),
            )
        }),
        Column::blank("filler_6", 4),
    ]
}

/// Character offset of the named column within a layout, if present.
pub fn column_offset<R>(layout: &[Column<R>], name: &str) -> Option<usize> {
    let mut offset = 0;
    for column in layout {
        if column.name() == name {
            return Some(offset);
        }
        offset += column.width();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::line_width;
    use std::collections::HashSet;

    #[test]
    fn test_header_width() {
        assert_eq!(line_width(&header_layout()), HEADER_WIDTH);
    }

    #[test]
    fn test_detail_width() {
        assert_eq!(line_width(&detail_layout()), DETAIL_WIDTH);
    }

    #[test]
    fn test_column_names_are_unique() {
        let detail = detail_layout();
        let names: HashSet<_> = detail.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), detail.len());

        let header = header_layout();
        let names: HashSet<_> = header.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), header.len());
    }

    #[test]
    fn test_detail_column_offsets() {
        let layout = detail_layout();

        assert_eq!(column_offset(&layout, "record_type"), Some(0));
        assert_eq!(column_offset(&layout, "month_reference"), Some(4));
        assert_eq!(column_offset(&layout, "patient_cns"), Some(17));
        assert_eq!(column_offset(&layout, "admission_date"), Some(32));
        assert_eq!(column_offset(&layout, "patient_name"), Some(48));
        assert_eq!(column_offset(&layout, "birth_date"), Some(178));
        assert_eq!(column_offset(&layout, "cid_primary"), Some(258));
        assert_eq!(column_offset(&layout, "patient_cpf"), Some(391));
        assert_eq!(column_offset(&layout, "missing"), None);
    }

    #[test]
    fn test_header_column_offsets() {
        let layout = header_layout();

        assert_eq!(column_offset(&layout, "competency"), Some(7));
        assert_eq!(column_offset(&layout, "facility_name"), Some(23));
        assert_eq!(column_offset(&layout, "generated_on"), Some(114));
        assert_eq!(column_offset(&layout, "filler"), Some(144));
    }
}
