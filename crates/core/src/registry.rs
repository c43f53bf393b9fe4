//! The set of collections a running registry works against.

use crate::config::{CoreConfig, StoreKind};
use crate::store::{InMemoryRepository, Repository, YamlFileRepository};
use crate::{CapsError, CapsResult};
use caps_types::{Attendance, AttendanceAction, Patient, Procedure, Professional};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

/// One repository per collection, shared by every service.
///
/// Mutations whose checks span records (SIGTAP uniqueness, references between collections) run
/// under [`Registry::write_guard`] so the check and the write are not interleaved with another
/// such mutation.
#[derive(Clone)]
pub struct Registry {
    pub patients: Arc<dyn Repository<Patient>>,
    pub professionals: Arc<dyn Repository<Professional>>,
    pub procedures: Arc<dyn Repository<Procedure>>,
    pub attendances: Arc<dyn Repository<Attendance>>,
    pub actions: Arc<dyn Repository<AttendanceAction>>,
    write_lock: Arc<Mutex<()>>,
}

impl Registry {
    /// Opens the store selected by `cfg`.
    ///
    /// # Errors
    ///
    /// Returns [`CapsError::StorageDirCreation`] if a file-backed collection directory cannot be
    /// created.
    pub fn open(cfg: &CoreConfig) -> CapsResult<Self> {
        match cfg.store_kind() {
            StoreKind::File => Self::file_backed(cfg.data_dir()),
            StoreKind::Memory => Ok(Self::in_memory()),
        }
    }

    /// Opens (creating if needed) a YAML file store rooted at `data_dir`.
    pub fn file_backed(data_dir: &Path) -> CapsResult<Self> {
        std::fs::create_dir_all(data_dir).map_err(CapsError::StorageDirCreation)?;
        tracing::debug!("opening file store at {}", data_dir.display());

        Ok(Self {
            patients: Arc::new(YamlFileRepository::<Patient>::open(data_dir)?),
            professionals: Arc::new(YamlFileRepository::<Professional>::open(data_dir)?),
            procedures: Arc::new(YamlFileRepository::<Procedure>::open(data_dir)?),
            attendances: Arc::new(YamlFileRepository::<Attendance>::open(data_dir)?),
            actions: Arc::new(YamlFileRepository::<AttendanceAction>::open(data_dir)?),
            write_lock: Arc::default(),
        })
    }

    /// An empty store held in memory.
    pub fn in_memory() -> Self {
        Self {
            patients: Arc::new(InMemoryRepository::<Patient>::new()),
            professionals: Arc::new(InMemoryRepository::<Professional>::new()),
            procedures: Arc::new(InMemoryRepository::<Procedure>::new()),
            attendances: Arc::new(InMemoryRepository::<Attendance>::new()),
            actions: Arc::new(InMemoryRepository::<AttendanceAction>::new()),
            write_lock: Arc::default(),
        }
    }

    /// Serialises cross-record mutations. Hold the guard across the check and the write.
    ///
    /// # Errors
    ///
    /// Returns [`CapsError::LockPoisoned`] if a previous holder panicked.
    pub(crate) fn write_guard(&self) -> CapsResult<MutexGuard<'_, ()>> {
        self.write_lock.lock().map_err(|_| CapsError::LockPoisoned)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").finish_non_exhaustive()
    }
}
