//! # CAPS Core
//!
//! Core business logic for the CAPS registry.
//!
//! This crate contains pure data operations and storage management:
//! - The [`Repository`](store::Repository) interface and its YAML-file and in-memory stores
//! - CRUD services for patients, professionals, procedures, attendances and their actions
//! - Referential rules between collections (cascades and conflicts)
//! - The RAAS export pipeline: query, order, encode, package, write
//!
//! **No API concerns**: HTTP servers and command-line parsing belong in `caps-run` and `caps-cli`.

pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod registry;
pub mod services;
pub mod store;
pub mod validation;

pub use caps_types::{NonEmptyText, RecordId};
pub use config::{CoreConfig, StoreKind};
pub use error::{CapsError, CapsResult};
pub use export::ExportService;
pub use registry::Registry;
pub use services::{
    AttendanceService, DashboardService, PatientService, ProcedureService, ProfessionalService,
    RegistryCounts,
};
