//! SIGTAP procedure catalogue entries.

use crate::NonEmptyText;
use caps_uuid::RecordId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_active() -> bool {
    true
}

/// Editable procedure data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProcedureDetails {
    /// National procedure table code, e.g. `0301080208`.
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub sigtap_code: NonEmptyText,

    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub description: NonEmptyText,

    /// Free-form category used to group procedures in listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub procedure_type: Option<String>,

    #[serde(default = "default_active")]
    pub active: bool,
}

/// A stored procedure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Procedure {
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub id: RecordId,

    #[serde(flatten)]
    pub details: ProcedureDetails,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Procedure {
    pub fn create(details: ProcedureDetails, now: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::new(),
            details,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, details: ProcedureDetails, now: DateTime<Utc>) {
        self.details = details;
        self.updated_at = now;
    }
}
