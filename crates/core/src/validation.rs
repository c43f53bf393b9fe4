//! Input validation utilities.
//!
//! These functions run before a record is stored. They trim optional free-text fields (blank
//! becomes absent) and enforce the rules the entity types cannot express on their own. The RAAS
//! encoder does not validate: whatever passes here is what gets exported.

use caps_types::attendance::MAX_SECONDARY_CIDS;
use caps_types::{
    normalise_optional, AttendanceActionDetails, AttendanceDetails, MonthReference,
    PatientDetails, ProcedureDetails, ProfessionalDetails,
};
use chrono::NaiveDate;
use raas::Facility;

use crate::{CapsError, CapsResult};

fn require_digits(field: &str, value: &str, len: usize) -> CapsResult<()> {
    if value.len() != len || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CapsError::InvalidInput(format!(
            "{} must be exactly {} digits, got '{}'",
            field, len, value
        )));
    }
    Ok(())
}

/// Validates the facility identity written into every export.
///
/// # Errors
///
/// Returns [`CapsError::InvalidInput`] if a code has the wrong length or alphabet, the name is
/// blank, the destination kind is not `M`/`E`, or the file tag is not plain ASCII alphanumerics.
pub fn validate_facility(facility: &Facility) -> CapsResult<()> {
    if facility.name.trim().is_empty() {
        return Err(CapsError::InvalidInput(
            "facility name cannot be empty".into(),
        ));
    }

    require_digits("facility cnes", &facility.cnes, 7)?;
    require_digits("municipality_code", &facility.municipality_code, 7)?;
    require_digits("origin_body_cnpj", &facility.origin_body_cnpj, 14)?;

    if !matches!(facility.destination_body_kind.as_str(), "M" | "E") {
        return Err(CapsError::InvalidInput(format!(
            "destination_body_kind must be 'M' or 'E', got '{}'",
            facility.destination_body_kind
        )));
    }

    let tag_ok = !facility.file_tag.is_empty()
        && facility.file_tag.bytes().all(|b| b.is_ascii_alphanumeric());
    if !tag_ok {
        return Err(CapsError::InvalidInput(format!(
            "file_tag must be non-empty ASCII alphanumerics, got '{}'",
            facility.file_tag
        )));
    }

    Ok(())
}

/// Normalises a patient payload.
///
/// # Errors
///
/// Returns [`CapsError::InvalidInput`] if neither CNS nor CPF is present after trimming.
pub fn normalise_patient(mut details: PatientDetails) -> CapsResult<PatientDetails> {
    details.medical_record = normalise_optional(details.medical_record);
    details.cns = normalise_optional(details.cns);
    details.cpf = normalise_optional(details.cpf);
    details.mother_name = normalise_optional(details.mother_name);
    details.responsible_name = normalise_optional(details.responsible_name);

    let address = &mut details.address;
    address.street = normalise_optional(address.street.take());
    address.number = normalise_optional(address.number.take());
    address.complement = normalise_optional(address.complement.take());
    address.neighborhood = normalise_optional(address.neighborhood.take());
    address.zipcode = normalise_optional(address.zipcode.take());

    let contact = &mut details.contact;
    contact.phone = normalise_optional(contact.phone.take());
    contact.mobile = normalise_optional(contact.mobile.take());
    contact.email = normalise_optional(contact.email.take());

    if !details.has_identity_document() {
        return Err(CapsError::InvalidInput(
            "patient requires a CNS or a CPF".into(),
        ));
    }

    Ok(details)
}

/// Checks that `date` falls in a year the `YYYY` export fields and month references can hold.
///
/// # Errors
///
/// Returns [`CapsError::InvalidInput`] for years outside `0000..=9999`.
pub fn validate_reporting_date(field: &str, date: NaiveDate) -> CapsResult<()> {
    if MonthReference::try_from_date(date).is_none() {
        return Err(CapsError::InvalidInput(format!(
            "{} {} is outside years 0000-9999",
            field, date
        )));
    }
    Ok(())
}

/// Normalises a professional payload.
pub fn normalise_professional(mut details: ProfessionalDetails) -> ProfessionalDetails {
    details.cns = normalise_optional(details.cns);
    details.cpf = normalise_optional(details.cpf);
    details
}

/// Normalises a procedure payload.
pub fn normalise_procedure(mut details: ProcedureDetails) -> ProcedureDetails {
    details.procedure_type = normalise_optional(details.procedure_type);
    details
}

/// Normalises an attendance payload.
///
/// Blank secondary CIDs are dropped and the rest are trimmed.
///
/// # Errors
///
/// Returns [`CapsError::InvalidInput`] if the admission year does not fit `YYYY`, or more than
/// [`MAX_SECONDARY_CIDS`] secondary CIDs remain.
pub fn normalise_attendance(mut details: AttendanceDetails) -> CapsResult<AttendanceDetails> {
    validate_reporting_date("admission date", details.admission_date)?;

    details.cid_secondary = details
        .cid_secondary
        .into_iter()
        .filter_map(|cid| normalise_optional(Some(cid)))
        .collect();

    if details.cid_secondary.len() > MAX_SECONDARY_CIDS {
        return Err(CapsError::InvalidInput(format!(
            "at most {} secondary CIDs are allowed, got {}",
            MAX_SECONDARY_CIDS,
            details.cid_secondary.len()
        )));
    }

    details.esf_cnes = normalise_optional(details.esf_cnes);
    details.substance_type = normalise_optional(details.substance_type);
    Ok(details)
}

/// Normalises an attendance action payload.
///
/// # Errors
///
/// Returns [`CapsError::InvalidInput`] if `quantity` is zero.
pub fn normalise_action(mut details: AttendanceActionDetails) -> CapsResult<AttendanceActionDetails> {
    if details.quantity == 0 {
        return Err(CapsError::InvalidInput(
            "action quantity must be at least 1".into(),
        ));
    }

    details.notes = normalise_optional(details.notes);
    Ok(details)
}
