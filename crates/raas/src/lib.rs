//! RAAS wire boundary.
//!
//! This crate turns registry records into the fixed-width text file the Ministry of Health
//! ingests (RAAS, "Registro das Ações Ambulatoriais de Saúde", layout version `02.20`).
//!
//! The format is positional: every column has an exact width and fields are concatenated with no
//! delimiter, so column position alone identifies a field. Lines end in CRLF.
//!
//! Responsibilities:
//! - Describe the header and detail layouts as lists of [`Column`] descriptors ([`layout`])
//! - Apply the padding/truncation rules of each column kind ([`field`])
//! - Encode attendance rows into the file body ([`RaasEncoder`])
//! - Name and package the resulting file ([`RaasFile`])
//!
//! There is no decoder: the file is write-only from this system's point of view.

pub mod encoder;
pub mod facility;
pub mod field;
pub mod layout;
pub mod package;

pub use encoder::{AttendanceRow, RaasEncoder};
pub use facility::Facility;
pub use field::{Column, FieldKind};
pub use package::{file_name, RaasFile};

/// Errors returned by the RAAS encoder.
#[derive(Debug, thiserror::Error)]
pub enum RaasError {
    /// Encoding was attempted with no attendances; no file must be produced.
    #[error("there are no attendances to export")]
    EmptyExport,
}

/// Type alias for Results that can fail with a [`RaasError`].
pub type RaasResult<T> = Result<T, RaasError>;
