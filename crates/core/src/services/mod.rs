//! CRUD services over the shared [`Registry`](crate::Registry).
//!
//! Each service owns the rules for one collection: input normalisation, ordering of listings, and
//! the referential checks that keep collections consistent with each other.

mod attendances;
mod dashboard;
mod patients;
mod procedures;
mod professionals;

pub use attendances::AttendanceService;
pub use dashboard::{DashboardService, RegistryCounts};
pub use patients::PatientService;
pub use procedures::ProcedureService;
pub use professionals::ProfessionalService;
