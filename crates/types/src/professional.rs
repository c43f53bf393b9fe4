//! Health professionals who perform attendance actions.

use crate::NonEmptyText;
use caps_uuid::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_active() -> bool {
    true
}

/// Editable professional data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProfessionalDetails {
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub name: NonEmptyText,

    /// CBO occupation code.
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub cbo_code: NonEmptyText,

    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub cbo_description: NonEmptyText,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cns: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,

    #[serde(default = "default_active")]
    pub active: bool,
}

/// A stored professional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Professional {
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub id: RecordId,

    #[serde(flatten)]
    pub details: ProfessionalDetails,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Professional {
    pub fn create(details: ProfessionalDetails, now: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::new(),
            details,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, details: ProfessionalDetails, now: DateTime<Utc>) {
        self.details = details;
        self.updated_at = now;
    }
}
