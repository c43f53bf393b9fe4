//! RAAS export pipeline.
//!
//! Queries attendances (oldest admission first) joined with their patients, encodes them with the
//! configured facility identity, and names the result. Writing to disk is a separate step so the
//! REST server can stream the file instead.

use crate::config::CoreConfig;
use crate::registry::Registry;
use crate::services::AttendanceService;
use crate::validation::validate_reporting_date;
use crate::{CapsError, CapsResult};
use chrono::NaiveDate;
use raas::{RaasEncoder, RaasFile};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Service producing the RAAS production file.
#[derive(Clone, Debug)]
pub struct ExportService {
    cfg: Arc<CoreConfig>,
    attendances: AttendanceService,
}

impl ExportService {
    pub fn new(cfg: Arc<CoreConfig>, registry: Arc<Registry>) -> Self {
        Self {
            cfg,
            attendances: AttendanceService::new(registry),
        }
    }

    /// Builds the export for a file generated on `generated_on`.
    ///
    /// The competency in the header is the month of `generated_on`.
    ///
    /// # Errors
    ///
    /// - [`CapsError::InvalidInput`] if the year of `generated_on` does not fit `YYYY`
    /// - [`CapsError::Raas`] wrapping [`raas::RaasError::EmptyExport`] when there are no
    ///   attendances; no file is produced
    pub fn build(&self, generated_on: NaiveDate) -> CapsResult<RaasFile> {
        validate_reporting_date("generation date", generated_on)?;
        let rows = self.attendances.export_rows()?;
        let encoder = RaasEncoder::new(self.cfg.facility());
        let file = RaasFile::build(&encoder, &rows, generated_on)?;

        tracing::info!(
            "built {} with {} detail line(s)",
            file.file_name,
            file.detail_count()
        );
        Ok(file)
    }

    /// Writes `file` into `dir` (created if missing) and returns the written path.
    pub fn write_to_dir(&self, file: &RaasFile, dir: &Path) -> CapsResult<PathBuf> {
        fs::create_dir_all(dir).map_err(CapsError::StorageDirCreation)?;

        let path = dir.join(&file.file_name);
        fs::write(&path, file.as_bytes()).map_err(CapsError::FileWrite)?;

        tracing::info!("wrote {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreKind;
    use crate::services::{fixtures, PatientService};
    use raas::layout::{column_offset, detail_layout, DETAIL_WIDTH};
    use raas::{Facility, RaasError};
    use tempfile::TempDir;

    fn setup(data_dir: PathBuf, store: StoreKind) -> (ExportService, Arc<Registry>) {
        let cfg = Arc::new(
            CoreConfig::new(data_dir, Facility::default(), store)
                .expect("CoreConfig::new should succeed"),
        );
        let registry = Arc::new(Registry::open(&cfg).expect("open should succeed"));
        (ExportService::new(cfg, registry.clone()), registry)
    }

    #[test]
    fn test_build_empty_registry_produces_no_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let (svc, _) = setup(temp_dir.path().to_path_buf(), StoreKind::Memory);

        let err = svc
            .build(fixtures::date("2024-04-01"))
            .expect_err("empty export should fail");
        assert!(matches!(err, CapsError::Raas(RaasError::EmptyExport)));
        assert_eq!(
            fs::read_dir(temp_dir.path())
                .expect("read_dir should succeed")
                .count(),
            0
        );
    }

    #[test]
    fn test_build_rejects_generation_date_beyond_year_9999() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let (svc, registry) = setup(temp_dir.path().to_path_buf(), StoreKind::Memory);
        let ana = PatientService::new(registry.clone())
            .create(fixtures::patient("Ana Silva"))
            .expect("create should succeed");
        AttendanceService::new(registry)
            .create(fixtures::attendance(ana.id, "2024-03-05"))
            .expect("create should succeed");

        let far = NaiveDate::from_ymd_opt(10000, 1, 1).expect("date should be valid");
        let err = svc.build(far).expect_err("build should fail");
        assert!(matches!(err, CapsError::InvalidInput(_)));
    }

    #[test]
    fn test_build_and_write_from_file_store() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let (svc, registry) = setup(temp_dir.path().join("data"), StoreKind::File);

        let patients = PatientService::new(registry.clone());
        let attendances = AttendanceService::new(registry);
        let ana = patients
            .create(fixtures::patient("Ana Silva"))
            .expect("create should succeed");
        let bruno = patients
            .create(fixtures::patient("Bruno Lima"))
            .expect("create should succeed");
        attendances
            .create(fixtures::attendance(bruno.id, "2024-03-20"))
            .expect("create should succeed");
        attendances
            .create(fixtures::attendance(ana.id, "2024-03-05"))
            .expect("create should succeed");

        let file = svc
            .build(fixtures::date("2025-07-14"))
            .expect("build should succeed");
        assert_eq!(file.file_name, "AACBVSES.0725");
        assert_eq!(file.detail_count(), 2);

        let lines: Vec<&str> = file.contents.split_inclusive("\r\n").collect();
        assert!(lines[0].starts_with("01#RAS#202507"));
        let name = column_offset(&detail_layout(), "patient_name").expect("column should exist");
        assert!(lines[1][name..].starts_with("ANA SILVA"));
        assert!(lines[2][name..].starts_with("BRUNO LIMA"));
        assert!(lines[1..].iter().all(|l| l.len() == DETAIL_WIDTH + 2));

        let out_dir = temp_dir.path().join("out");
        let path = svc
            .write_to_dir(&file, &out_dir)
            .expect("write_to_dir should succeed");
        assert_eq!(path, out_dir.join("AACBVSES.0725"));
        assert_eq!(
            fs::read_to_string(&path).expect("read should succeed"),
            file.contents
        );
    }
}
