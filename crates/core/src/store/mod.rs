//! Record storage.
//!
//! Services never touch files or maps directly: every collection is reached through a
//! [`Repository`] trait object, so the file store and the in-memory store are interchangeable.
//!
//! - [`yaml::YamlFileRepository`] keeps one YAML document per record in a sharded directory tree
//! - [`memory::InMemoryRepository`] keeps records in a lock-guarded ordered map

pub mod memory;
pub mod yaml;

use crate::constants::{
    ACTIONS_DIR_NAME, ACTION_FILENAME, ATTENDANCES_DIR_NAME, ATTENDANCE_FILENAME,
    PATIENTS_DIR_NAME, PATIENT_FILENAME, PROCEDURES_DIR_NAME, PROCEDURE_FILENAME,
    PROFESSIONALS_DIR_NAME, PROFESSIONAL_FILENAME,
};
use crate::{CapsError, CapsResult};
use caps_types::{Attendance, AttendanceAction, Patient, Procedure, Professional, RecordId};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use memory::InMemoryRepository;
pub use yaml::YamlFileRepository;

/// A record type that can be stored in a collection.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection name; also the collection's directory name in the file store.
    const COLLECTION: &'static str;
    /// File name of one record inside its sharded directory.
    const FILE_NAME: &'static str;

    fn id(&self) -> RecordId;
}

/// Storage operations for one collection.
pub trait Repository<E: Entity>: Send + Sync {
    /// Stores a new record.
    ///
    /// # Errors
    ///
    /// Returns [`CapsError::Conflict`] if a record with the same id already exists.
    fn insert(&self, entity: &E) -> CapsResult<()>;

    /// Loads a record, or `None` if the id is unknown.
    fn get(&self, id: RecordId) -> CapsResult<Option<E>>;

    /// Loads every record, in no particular order.
    fn list(&self) -> CapsResult<Vec<E>>;

    /// Replaces an existing record.
    ///
    /// # Errors
    ///
    /// Returns [`CapsError::NotFound`] if the id is unknown.
    fn update(&self, entity: &E) -> CapsResult<()>;

    /// Removes a record.
    ///
    /// # Errors
    ///
    /// Returns [`CapsError::NotFound`] if the id is unknown.
    fn delete(&self, id: RecordId) -> CapsResult<()>;

    fn count(&self) -> CapsResult<usize> {
        Ok(self.list()?.len())
    }

    /// Like [`Repository::get`], but an unknown id is a [`CapsError::NotFound`].
    fn require(&self, id: RecordId) -> CapsResult<E> {
        self.get(id)?
            .ok_or_else(|| CapsError::not_found(E::COLLECTION, id))
    }
}

impl Entity for Patient {
    const COLLECTION: &'static str = PATIENTS_DIR_NAME;
    const FILE_NAME: &'static str = PATIENT_FILENAME;

    fn id(&self) -> RecordId {
        self.id
    }
}

impl Entity for Professional {
    const COLLECTION: &'static str = PROFESSIONALS_DIR_NAME;
    const FILE_NAME: &'static str = PROFESSIONAL_FILENAME;

    fn id(&self) -> RecordId {
        self.id
    }
}

impl Entity for Procedure {
    const COLLECTION: &'static str = PROCEDURES_DIR_NAME;
    const FILE_NAME: &'static str = PROCEDURE_FILENAME;

    fn id(&self) -> RecordId {
        self.id
    }
}

impl Entity for Attendance {
    const COLLECTION: &'static str = ATTENDANCES_DIR_NAME;
    const FILE_NAME: &'static str = ATTENDANCE_FILENAME;

    fn id(&self) -> RecordId {
        self.id
    }
}

impl Entity for AttendanceAction {
    const COLLECTION: &'static str = ACTIONS_DIR_NAME;
    const FILE_NAME: &'static str = ACTION_FILENAME;

    fn id(&self) -> RecordId {
        self.id
    }
}
