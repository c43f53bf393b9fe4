//! Identity of the reporting facility.
//!
//! These values are constant for a deployment and appear in the header line, in every detail
//! line (CNES and municipality) and in the file name. The defaults identify the CAPS this system
//! was first deployed at; other deployments override them through a facility YAML file.

use serde::{Deserialize, Serialize};

/// Reporting facility metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Facility {
    /// Facility name as printed in the header (30 columns).
    pub name: String,

    /// CNES registry code of the facility (7 digits).
    pub cnes: String,

    /// IBGE code of the facility's municipality (7 digits).
    pub municipality_code: String,

    /// Acronym of the body submitting the file (6 columns).
    pub origin_body_acronym: String,

    /// CNPJ of the submitting body (14 digits).
    pub origin_body_cnpj: String,

    /// Name of the body receiving the file (40 columns).
    pub destination_body_name: String,

    /// `M` for a municipal manager, `E` for a state manager.
    pub destination_body_kind: String,

    /// Facility part of the export file name, between the `AAC` prefix and the period.
    pub file_tag: String,
}

impl Default for Facility {
    fn default() -> Self {
        Self {
            name: "CAPS 3 DR BACELAR VIANA".into(),
            cnes: "6981291".into(),
            municipality_code: "2111300".into(),
            origin_body_acronym: "SESMA".into(),
            origin_body_cnpj: "00000000000000".into(),
            destination_body_name: "SECRETARIA MUNICIPAL DE SAUDE".into(),
            destination_body_kind: "M".into(),
            file_tag: "BVSES".into(),
        }
    }
}
