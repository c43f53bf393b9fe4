//! Patient management.

use crate::registry::Registry;
use crate::validation::normalise_patient;
use crate::{CapsError, CapsResult};
use caps_types::{Patient, PatientDetails, RecordId};
use chrono::Utc;
use std::sync::Arc;

/// Service for creating, listing, updating and deleting patients.
#[derive(Clone, Debug)]
pub struct PatientService {
    registry: Arc<Registry>,
}

impl PatientService {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Registers a new patient.
    ///
    /// # Errors
    ///
    /// Returns [`CapsError::InvalidInput`] if the patient has neither CNS nor CPF.
    pub fn create(&self, details: PatientDetails) -> CapsResult<Patient> {
        let details = normalise_patient(details)?;
        let patient = Patient::create(details, Utc::now());
        self.registry.patients.insert(&patient)?;

        tracing::info!("created patient {}", patient.id);
        Ok(patient)
    }

    pub fn get(&self, id: RecordId) -> CapsResult<Patient> {
        self.registry.patients.require(id)
    }

    /// All patients, ordered by name (case-insensitive).
    pub fn list(&self) -> CapsResult<Vec<Patient>> {
        let mut patients = self.registry.patients.list()?;
        patients.sort_by_cached_key(|p| p.details.name.as_str().to_lowercase());
        Ok(patients)
    }

    /// Replaces the editable fields of a patient.
    pub fn update(&self, id: RecordId, details: PatientDetails) -> CapsResult<Patient> {
        let details = normalise_patient(details)?;
        let mut patient = self.registry.patients.require(id)?;
        patient.apply(details, Utc::now());
        self.registry.patients.update(&patient)?;

        tracing::info!("updated patient {}", id);
        Ok(patient)
    }

    /// Deletes a patient.
    ///
    /// # Errors
    ///
    /// Returns [`CapsError::Conflict`] while any attendance still references the patient.
    pub fn delete(&self, id: RecordId) -> CapsResult<()> {
        let _guard = self.registry.write_guard()?;
        self.registry.patients.require(id)?;

        let attendances = self
            .registry
            .attendances
            .list()?
            .into_iter()
            .filter(|a| a.details.patient_id == id)
            .count();
        if attendances > 0 {
            return Err(CapsError::Conflict(format!(
                "patient {} has {} attendance(s); delete them first",
                id, attendances
            )));
        }

        self.registry.patients.delete(id)?;
        tracing::info!("deleted patient {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::fixtures;
    use crate::services::AttendanceService;

    fn service() -> PatientService {
        PatientService::new(Arc::new(Registry::in_memory()))
    }

    #[test]
    fn test_create_and_get() {
        let svc = service();
        let created = svc
            .create(fixtures::patient("Ana Silva"))
            .expect("create should succeed");

        let loaded = svc.get(created.id).expect("get should succeed");
        assert_eq!(loaded, created);
        assert_eq!(loaded.created_at, loaded.updated_at);
    }

    #[test]
    fn test_create_rejects_patient_without_documents() {
        let svc = service();
        let mut details = fixtures::patient("Ana Silva");
        details.cns = None;
        details.cpf = Some("  ".into());

        let err = svc.create(details).expect_err("create should fail");
        assert!(matches!(err, CapsError::InvalidInput(_)));
        assert!(svc.list().expect("list should succeed").is_empty());
    }

    #[test]
    fn test_list_orders_by_name() {
        let svc = service();
        for name in ["carlos souza", "Ana Silva", "Bruno Lima"] {
            svc.create(fixtures::patient(name))
                .expect("create should succeed");
        }

        let names: Vec<String> = svc
            .list()
            .expect("list should succeed")
            .into_iter()
            .map(|p| p.details.name.to_string())
            .collect();
        assert_eq!(names, vec!["Ana Silva", "Bruno Lima", "carlos souza"]);
    }

    #[test]
    fn test_update_replaces_details() {
        let svc = service();
        let created = svc
            .create(fixtures::patient("Ana Silva"))
            .expect("create should succeed");

        let mut details = fixtures::patient("Ana Silva Costa");
        details.responsible_name = Some("Maria Costa".into());
        let updated = svc
            .update(created.id, details)
            .expect("update should succeed");

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.details.name.as_str(), "Ana Silva Costa");
        assert_eq!(
            svc.get(created.id).expect("get should succeed"),
            updated
        );
    }

    #[test]
    fn test_update_unknown_patient_not_found() {
        let svc = service();
        let err = svc
            .update(RecordId::new(), fixtures::patient("Ana Silva"))
            .expect_err("update should fail");
        assert!(matches!(err, CapsError::NotFound { .. }));
    }

    #[test]
    fn test_delete_conflicts_while_attendances_exist() {
        let registry = Arc::new(Registry::in_memory());
        let patients = PatientService::new(registry.clone());
        let attendances = AttendanceService::new(registry);

        let patient = patients
            .create(fixtures::patient("Ana Silva"))
            .expect("create should succeed");
        let attendance = attendances
            .create(fixtures::attendance(patient.id, "2024-03-05"))
            .expect("create attendance should succeed");

        let err = patients
            .delete(patient.id)
            .expect_err("delete should fail");
        assert!(matches!(err, CapsError::Conflict(_)));

        attendances
            .delete(attendance.id)
            .expect("delete attendance should succeed");
        patients.delete(patient.id).expect("delete should succeed");
        assert!(matches!(
            patients.get(patient.id),
            Err(CapsError::NotFound { .. })
        ));
    }

    #[test]
    fn test_concurrent_delete_and_attendance_leave_no_orphans() {
        for _ in 0..20 {
            let registry = Arc::new(Registry::in_memory());
            let patients = PatientService::new(registry.clone());
            let attendances = AttendanceService::new(registry.clone());
            let patient = patients
                .create(fixtures::patient("Ana Silva"))
                .expect("create should succeed");
            let barrier = std::sync::Barrier::new(2);

            std::thread::scope(|scope| {
                scope.spawn(|| {
                    barrier.wait();
                    let _ = patients.delete(patient.id);
                });
                scope.spawn(|| {
                    barrier.wait();
                    let _ = attendances.create(fixtures::attendance(patient.id, "2024-03-05"));
                });
            });

            let patient_exists = registry
                .patients
                .get(patient.id)
                .expect("get should succeed")
                .is_some();
            let attendance_count = registry.attendances.count().expect("count should succeed");
            assert!(patient_exists || attendance_count == 0);
        }
    }
}
