//! Registry totals for the dashboard.

use crate::registry::Registry;
use crate::CapsResult;
use serde::Serialize;
use std::sync::Arc;

/// Number of records in each collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RegistryCounts {
    pub patients: usize,
    pub professionals: usize,
    pub procedures: usize,
    pub attendances: usize,
    pub actions: usize,
}

#[derive(Clone, Debug)]
pub struct DashboardService {
    registry: Arc<Registry>,
}

impl DashboardService {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn counts(&self) -> CapsResult<RegistryCounts> {
        Ok(RegistryCounts {
            patients: self.registry.patients.count()?,
            professionals: self.registry.professionals.count()?,
            procedures: self.registry.procedures.count()?,
            attendances: self.registry.attendances.count()?,
            actions: self.registry.actions.count()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{fixtures, AttendanceService, PatientService, ProcedureService};

    #[test]
    fn test_counts_empty_registry() {
        let svc = DashboardService::new(Arc::new(Registry::in_memory()));
        assert_eq!(
            svc.counts().expect("counts should succeed"),
            RegistryCounts::default()
        );
    }

    #[test]
    fn test_counts_each_collection() {
        let registry = Arc::new(Registry::in_memory());
        let patients = PatientService::new(registry.clone());
        let attendances = AttendanceService::new(registry.clone());
        ProcedureService::new(registry.clone())
            .create(fixtures::procedure("0301080232"))
            .expect("create should succeed");

        let ana = patients
            .create(fixtures::patient("Ana Silva"))
            .expect("create should succeed");
        patients
            .create(fixtures::patient("Bruno Lima"))
            .expect("create should succeed");
        attendances
            .create(fixtures::attendance(ana.id, "2024-03-05"))
            .expect("create should succeed");

        let counts = DashboardService::new(registry)
            .counts()
            .expect("counts should succeed");
        assert_eq!(
            counts,
            RegistryCounts {
                patients: 2,
                professionals: 0,
                procedures: 1,
                attendances: 1,
                actions: 0,
            }
        );
    }
}
