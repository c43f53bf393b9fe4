//! Record identifiers and sharded-path utilities.
//!
//! Every stored CAPS record (patient, professional, procedure, attendance, action) is keyed by a
//! UUID in a *canonical* form: **32 lowercase hexadecimal characters**, no hyphens.
//!
//! This crate provides:
//! - [`RecordId`], a wrapper that guarantees the canonical form once constructed.
//! - The sharding rule used by the file store to place a record on disk.
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Identifiers arriving from outside the core (CLI arguments, REST path segments) must already be
//! canonical. Use [`RecordId::parse`] to validate them; hyphenated or uppercase values are rejected.
//!
//! ## Sharded directory layout
//! For a canonical id `u`, a record lives under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`
//!
//! Example:
//! `caps_data/patients/55/0e/550e8400e29b41d4a716446655440000/`

mod record_id;

pub use record_id::{RecordId, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
