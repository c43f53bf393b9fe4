//! Patient records.

use crate::codes::{RaceColor, Sex};
use crate::NonEmptyText;
use caps_uuid::RecordId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Postal address of a patient.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zipcode: Option<String>,
}

/// Phone numbers and email of a patient.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Editable patient data, as accepted on create and update.
///
/// At least one identity document (CNS or CPF) must be present; the core services enforce this
/// before a record is stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PatientDetails {
    /// Facility medical-record number (prontuário).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_record: Option<String>,

    /// National health card number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cns: Option<String>,

    /// Tax ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,

    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub name: NonEmptyText,

    pub birth_date: NaiveDate,

    pub sex: Sex,

    #[serde(default)]
    pub race_color: RaceColor,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother_name: Option<String>,

    /// Legal guardian or responsible party, when different from the patient.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responsible_name: Option<String>,

    #[serde(default)]
    pub address: Address,

    #[serde(default)]
    pub contact: Contact,
}

impl PatientDetails {
    /// Returns true when a CNS or CPF is present and non-blank.
    pub fn has_identity_document(&self) -> bool {
        [&self.cns, &self.cpf]
            .iter()
            .any(|doc| doc.as_deref().is_some_and(|d| !d.trim().is_empty()))
    }

    /// The document shown next to the patient name in listings: CNS, else CPF.
    pub fn identity_document(&self) -> Option<&str> {
        self.cns.as_deref().or(self.cpf.as_deref())
    }
}

/// A stored patient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Patient {
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub id: RecordId,

    #[serde(flatten)]
    pub details: PatientDetails,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Patient {
    /// Builds a new record with a fresh id.
    pub fn create(details: PatientDetails, now: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::new(),
            details,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the editable data and bumps `updated_at`.
    pub fn apply(&mut self, details: PatientDetails, now: DateTime<Utc>) {
        self.details = details;
        self.updated_at = now;
    }
}
