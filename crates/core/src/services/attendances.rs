//! Attendance and attendance-action management.
//!
//! An attendance belongs to one patient and carries the month it is reported against; its actions
//! record which professional performed which procedure, and when. Deleting an attendance deletes
//! its actions with it.

use crate::registry::Registry;
use crate::validation::{normalise_action, normalise_attendance};
use crate::{CapsError, CapsResult};
use caps_types::{
    Attendance, AttendanceAction, AttendanceActionDetails, AttendanceDetails, Patient, RecordId,
};
use chrono::Utc;
use raas::AttendanceRow;
use std::collections::HashMap;
use std::sync::Arc;

/// Service for attendances and the actions recorded under them.
#[derive(Clone, Debug)]
pub struct AttendanceService {
    registry: Arc<Registry>,
}

impl AttendanceService {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    // ========================================================================
    // ATTENDANCES
    // ========================================================================

    /// Opens an attendance. The month reference is derived from the admission date.
    ///
    /// # Errors
    ///
    /// Returns [`CapsError::InvalidInput`] if the patient does not exist or more than three
    /// secondary CIDs are given.
    pub fn create(&self, details: AttendanceDetails) -> CapsResult<Attendance> {
        let details = normalise_attendance(details)?;
        let _guard = self.registry.write_guard()?;
        self.ensure_patient_exists(details.patient_id)?;

        let attendance = Attendance::create(details, Utc::now());
        self.registry.attendances.insert(&attendance)?;

        tracing::info!(
            "created attendance {} for patient {} ({})",
            attendance.id,
            attendance.details.patient_id,
            attendance.month_reference
        );
        Ok(attendance)
    }

    pub fn get(&self, id: RecordId) -> CapsResult<Attendance> {
        self.registry.attendances.require(id)
    }

    /// Attendances for display: most recent admission first.
    pub fn list(&self) -> CapsResult<Vec<Attendance>> {
        let mut attendances = self.registry.attendances.list()?;
        attendances.sort_by(|a, b| {
            b.details
                .admission_date
                .cmp(&a.details.admission_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(attendances)
    }

    /// Replaces the editable fields of an attendance and re-derives its month reference.
    pub fn update(&self, id: RecordId, details: AttendanceDetails) -> CapsResult<Attendance> {
        let details = normalise_attendance(details)?;
        let _guard = self.registry.write_guard()?;
        let mut attendance = self.registry.attendances.require(id)?;
        self.ensure_patient_exists(details.patient_id)?;

        attendance.apply(details, Utc::now());
        self.registry.attendances.update(&attendance)?;

        tracing::info!("updated attendance {}", id);
        Ok(attendance)
    }

    /// Deletes an attendance together with all of its actions.
    pub fn delete(&self, id: RecordId) -> CapsResult<()> {
        let _guard = self.registry.write_guard()?;
        self.registry.attendances.require(id)?;

        let mut removed = 0usize;
        for action in self.actions_of(id)? {
            self.registry.actions.delete(action.id)?;
            removed += 1;
        }
        self.registry.attendances.delete(id)?;

        tracing::info!("deleted attendance {} and {} action(s)", id, removed);
        Ok(())
    }

    /// Attendances joined with their patients, oldest admission first, as the RAAS file lists
    /// them.
    ///
    /// An attendance whose patient no longer resolves is still returned, with `patient: None`.
    pub fn export_rows(&self) -> CapsResult<Vec<AttendanceRow>> {
        let patients: HashMap<RecordId, Patient> = self
            .registry
            .patients
            .list()?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut attendances = self.registry.attendances.list()?;
        attendances.sort_by(|a, b| {
            a.details
                .admission_date
                .cmp(&b.details.admission_date)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });

        Ok(attendances
            .into_iter()
            .map(|attendance| {
                let patient = patients.get(&attendance.details.patient_id).cloned();
                AttendanceRow {
                    attendance,
                    patient,
                }
            })
            .collect())
    }

    // ========================================================================
    // ACTIONS
    // ========================================================================

    /// Records an action under an attendance.
    ///
    /// # Errors
    ///
    /// - [`CapsError::NotFound`] if the attendance does not exist
    /// - [`CapsError::InvalidInput`] if the quantity is zero, or the professional or procedure
    ///   does not exist or is inactive
    pub fn add_action(
        &self,
        attendance_id: RecordId,
        details: AttendanceActionDetails,
    ) -> CapsResult<AttendanceAction> {
        let details = normalise_action(details)?;
        let _guard = self.registry.write_guard()?;
        self.registry.attendances.require(attendance_id)?;

        match self.registry.professionals.get(details.professional_id)? {
            Some(p) if p.details.active => {}
            Some(_) => {
                return Err(CapsError::InvalidInput(format!(
                    "professional {} is inactive",
                    details.professional_id
                )))
            }
            None => {
                return Err(CapsError::InvalidInput(format!(
                    "professional {} does not exist",
                    details.professional_id
                )))
            }
        }

        match self.registry.procedures.get(details.procedure_id)? {
            Some(p) if p.details.active => {}
            Some(_) => {
                return Err(CapsError::InvalidInput(format!(
                    "procedure {} is inactive",
                    details.procedure_id
                )))
            }
            None => {
                return Err(CapsError::InvalidInput(format!(
                    "procedure {} does not exist",
                    details.procedure_id
                )))
            }
        }

        let action = AttendanceAction::create(attendance_id, details, Utc::now());
        self.registry.actions.insert(&action)?;

        tracing::info!("added action {} to attendance {}", action.id, attendance_id);
        Ok(action)
    }

    /// Actions of an attendance, most recent first.
    pub fn list_actions(&self, attendance_id: RecordId) -> CapsResult<Vec<AttendanceAction>> {
        self.registry.attendances.require(attendance_id)?;

        let mut actions = self.actions_of(attendance_id)?;
        actions.sort_by(|a, b| {
            b.details
                .action_date
                .cmp(&a.details.action_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(actions)
    }

    pub fn delete_action(&self, id: RecordId) -> CapsResult<()> {
        self.registry.actions.delete(id)?;
        tracing::info!("deleted action {}", id);
        Ok(())
    }

    fn actions_of(&self, attendance_id: RecordId) -> CapsResult<Vec<AttendanceAction>> {
        Ok(self
            .registry
            .actions
            .list()?
            .into_iter()
            .filter(|a| a.attendance_id == attendance_id)
            .collect())
    }

    fn ensure_patient_exists(&self, patient_id: RecordId) -> CapsResult<()> {
        if self.registry.patients.get(patient_id)?.is_none() {
            return Err(CapsError::InvalidInput(format!(
                "patient {} does not exist",
                patient_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{fixtures, PatientService, ProcedureService, ProfessionalService};
    use caps_types::{MonthReference, Procedure, Professional};

    struct Fixture {
        registry: Arc<Registry>,
        svc: AttendanceService,
        patient: Patient,
        professional: Professional,
        procedure: Procedure,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(Registry::in_memory());
        let patient = PatientService::new(registry.clone())
            .create(fixtures::patient("Ana Silva"))
            .expect("create patient should succeed");
        let professional = ProfessionalService::new(registry.clone())
            .create(fixtures::professional("Carla Mendes"))
            .expect("create professional should succeed");
        let procedure = ProcedureService::new(registry.clone())
            .create(fixtures::procedure("0301080232"))
            .expect("create procedure should succeed");

        Fixture {
            svc: AttendanceService::new(registry.clone()),
            registry,
            patient,
            professional,
            procedure,
        }
    }

    #[test]
    fn test_create_derives_month_reference() {
        let f = fixture();
        let attendance = f
            .svc
            .create(fixtures::attendance(f.patient.id, "2024-03-05"))
            .expect("create should succeed");

        assert_eq!(attendance.month_reference.to_string(), "2024-03");
        assert_eq!(attendance.month_reference.digits(), "202403");
    }

    #[test]
    fn test_create_rejects_unknown_patient() {
        let f = fixture();
        let err = f
            .svc
            .create(fixtures::attendance(RecordId::new(), "2024-03-05"))
            .expect_err("create should fail");

        assert!(matches!(err, CapsError::InvalidInput(_)));
        assert!(f.svc.list().expect("list should succeed").is_empty());
    }

    #[test]
    fn test_admission_beyond_year_9999_never_reaches_file_store() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let registry =
            Arc::new(Registry::file_backed(temp_dir.path()).expect("open should succeed"));
        let patient = PatientService::new(registry.clone())
            .create(fixtures::patient("Ana Silva"))
            .expect("create patient should succeed");
        let svc = AttendanceService::new(registry);

        let mut details = fixtures::attendance(patient.id, "2024-03-05");
        details.admission_date =
            chrono::NaiveDate::from_ymd_opt(10000, 1, 1).expect("date should be valid");
        let err = svc.create(details.clone()).expect_err("create should fail");
        assert!(matches!(err, CapsError::InvalidInput(_)));

        let kept = svc
            .create(fixtures::attendance(patient.id, "9999-12-31"))
            .expect("create should succeed");
        assert_eq!(kept.month_reference.digits(), "999912");
        let err = svc.update(kept.id, details).expect_err("update should fail");
        assert!(matches!(err, CapsError::InvalidInput(_)));

        let listed = svc.list().expect("list should succeed");
        assert_eq!(listed.len(), 1);
        assert_eq!(svc.get(kept.id).expect("get should succeed"), kept);
    }

    #[test]
    fn test_update_rederives_month_reference() {
        let f = fixture();
        let created = f
            .svc
            .create(fixtures::attendance(f.patient.id, "2024-03-05"))
            .expect("create should succeed");

        let updated = f
            .svc
            .update(created.id, fixtures::attendance(f.patient.id, "2024-05-01"))
            .expect("update should succeed");

        assert_eq!(
            updated.month_reference,
            MonthReference::new(2024, 5).expect("month should be valid")
        );
    }

    #[test]
    fn test_list_is_newest_first_and_export_rows_oldest_first() {
        let f = fixture();
        for date in ["2024-03-10", "2024-01-02", "2024-02-15"] {
            f.svc
                .create(fixtures::attendance(f.patient.id, date))
                .expect("create should succeed");
        }

        let display: Vec<String> = f
            .svc
            .list()
            .expect("list should succeed")
            .iter()
            .map(|a| a.details.admission_date.to_string())
            .collect();
        assert_eq!(display, vec!["2024-03-10", "2024-02-15", "2024-01-02"]);

        let rows = f.svc.export_rows().expect("export_rows should succeed");
        let export: Vec<String> = rows
            .iter()
            .map(|r| r.attendance.details.admission_date.to_string())
            .collect();
        assert_eq!(export, vec!["2024-01-02", "2024-02-15", "2024-03-10"]);
        assert!(rows.iter().all(|r| r.patient.as_ref() == Some(&f.patient)));
    }

    #[test]
    fn test_export_rows_keeps_attendance_with_missing_patient() {
        let f = fixture();
        let attendance = f
            .svc
            .create(fixtures::attendance(f.patient.id, "2024-03-05"))
            .expect("create should succeed");
        f.registry
            .patients
            .delete(f.patient.id)
            .expect("raw delete should succeed");

        let rows = f.svc.export_rows().expect("export_rows should succeed");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].attendance.id, attendance.id);
        assert!(rows[0].patient.is_none());
    }

    #[test]
    fn test_add_and_list_actions_newest_first() {
        let f = fixture();
        let attendance = f
            .svc
            .create(fixtures::attendance(f.patient.id, "2024-03-05"))
            .expect("create should succeed");

        for date in ["2024-03-06", "2024-03-20", "2024-03-12"] {
            f.svc
                .add_action(
                    attendance.id,
                    fixtures::action(f.professional.id, f.procedure.id, date),
                )
                .expect("add_action should succeed");
        }

        let dates: Vec<String> = f
            .svc
            .list_actions(attendance.id)
            .expect("list_actions should succeed")
            .iter()
            .map(|a| a.details.action_date.to_string())
            .collect();
        assert_eq!(dates, vec!["2024-03-20", "2024-03-12", "2024-03-06"]);
    }

    #[test]
    fn test_add_action_validates_references_and_quantity() {
        let f = fixture();
        let attendance = f
            .svc
            .create(fixtures::attendance(f.patient.id, "2024-03-05"))
            .expect("create should succeed");

        let mut zero = fixtures::action(f.professional.id, f.procedure.id, "2024-03-06");
        zero.quantity = 0;
        assert!(matches!(
            f.svc.add_action(attendance.id, zero),
            Err(CapsError::InvalidInput(_))
        ));

        let unknown_professional = fixtures::action(RecordId::new(), f.procedure.id, "2024-03-06");
        assert!(matches!(
            f.svc.add_action(attendance.id, unknown_professional),
            Err(CapsError::InvalidInput(_))
        ));

        let unknown_procedure = fixtures::action(f.professional.id, RecordId::new(), "2024-03-06");
        assert!(matches!(
            f.svc.add_action(attendance.id, unknown_procedure),
            Err(CapsError::InvalidInput(_))
        ));

        let unknown_attendance = fixtures::action(f.professional.id, f.procedure.id, "2024-03-06");
        assert!(matches!(
            f.svc.add_action(RecordId::new(), unknown_attendance),
            Err(CapsError::NotFound { .. })
        ));
    }

    #[test]
    fn test_add_action_rejects_inactive_professional() {
        let f = fixture();
        let attendance = f
            .svc
            .create(fixtures::attendance(f.patient.id, "2024-03-05"))
            .expect("create should succeed");

        let mut details = f.professional.details.clone();
        details.active = false;
        ProfessionalService::new(f.registry.clone())
            .update(f.professional.id, details)
            .expect("update should succeed");

        let err = f
            .svc
            .add_action(
                attendance.id,
                fixtures::action(f.professional.id, f.procedure.id, "2024-03-06"),
            )
            .expect_err("inactive professional should fail");
        assert!(matches!(err, CapsError::InvalidInput(_)));
    }

    #[test]
    fn test_delete_cascades_to_actions() {
        let f = fixture();
        let keep = f
            .svc
            .create(fixtures::attendance(f.patient.id, "2024-03-01"))
            .expect("create should succeed");
        let doomed = f
            .svc
            .create(fixtures::attendance(f.patient.id, "2024-03-05"))
            .expect("create should succeed");

        for attendance_id in [keep.id, doomed.id, doomed.id] {
            f.svc
                .add_action(
                    attendance_id,
                    fixtures::action(f.professional.id, f.procedure.id, "2024-03-06"),
                )
                .expect("add_action should succeed");
        }

        f.svc.delete(doomed.id).expect("delete should succeed");

        let remaining = f.registry.actions.list().expect("list should succeed");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].attendance_id, keep.id);
        assert!(matches!(
            f.svc.list_actions(doomed.id),
            Err(CapsError::NotFound { .. })
        ));
    }

    #[test]
    fn test_delete_action() {
        let f = fixture();
        let attendance = f
            .svc
            .create(fixtures::attendance(f.patient.id, "2024-03-05"))
            .expect("create should succeed");
        let action = f
            .svc
            .add_action(
                attendance.id,
                fixtures::action(f.professional.id, f.procedure.id, "2024-03-06"),
            )
            .expect("add_action should succeed");

        f.svc.delete_action(action.id).expect("delete should succeed");
        assert!(f
            .svc
            .list_actions(attendance.id)
            .expect("list_actions should succeed")
            .is_empty());
        assert!(matches!(
            f.svc.delete_action(action.id),
            Err(CapsError::NotFound { .. })
        ));
    }
}
