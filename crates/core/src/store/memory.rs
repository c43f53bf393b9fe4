//! In-memory record store.

use super::{Entity, Repository};
use crate::{CapsError, CapsResult};
use caps_types::RecordId;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A collection held in a lock-guarded ordered map. Contents are lost when dropped.
#[derive(Debug)]
pub struct InMemoryRepository<E> {
    records: RwLock<BTreeMap<RecordId, E>>,
}

impl<E> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<E: Entity> InMemoryRepository<E> {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> CapsResult<RwLockReadGuard<'_, BTreeMap<RecordId, E>>> {
        self.records.read().map_err(|_| CapsError::LockPoisoned)
    }

    fn write(&self) -> CapsResult<RwLockWriteGuard<'_, BTreeMap<RecordId, E>>> {
        self.records.write().map_err(|_| CapsError::LockPoisoned)
    }
}

impl<E: Entity> Repository<E> for InMemoryRepository<E> {
    fn insert(&self, entity: &E) -> CapsResult<()> {
        let mut records = self.write()?;
        let id = entity.id();
        if records.contains_key(&id) {
            return Err(CapsError::Conflict(format!(
                "{} record {} already exists",
                E::COLLECTION,
                id
            )));
        }
        records.insert(id, entity.clone());
        Ok(())
    }

    fn get(&self, id: RecordId) -> CapsResult<Option<E>> {
        Ok(self.read()?.get(&id).cloned())
    }

    fn list(&self) -> CapsResult<Vec<E>> {
        Ok(self.read()?.values().cloned().collect())
    }

    fn update(&self, entity: &E) -> CapsResult<()> {
        let mut records = self.write()?;
        match records.get_mut(&entity.id()) {
            Some(existing) => {
                *existing = entity.clone();
                Ok(())
            }
            None => Err(CapsError::not_found(E::COLLECTION, entity.id())),
        }
    }

    fn delete(&self, id: RecordId) -> CapsResult<()> {
        self.write()?
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CapsError::not_found(E::COLLECTION, id))
    }

    fn count(&self) -> CapsResult<usize> {
        Ok(self.read()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caps_types::{NonEmptyText, Procedure, ProcedureDetails};
    use chrono::Utc;

    fn procedure(code: &str) -> Procedure {
        Procedure::create(
            ProcedureDetails {
                sigtap_code: NonEmptyText::new(code).expect("code should be valid"),
                description: NonEmptyText::new("ACOLHIMENTO").expect("description should be valid"),
                procedure_type: None,
                active: true,
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_insert_get_list_count() {
        let repo = InMemoryRepository::<Procedure>::new();
        let p = procedure("0301080232");

        repo.insert(&p).expect("insert should succeed");

        assert_eq!(repo.get(p.id).expect("get should succeed"), Some(p.clone()));
        assert_eq!(repo.list().expect("list should succeed"), vec![p]);
        assert_eq!(repo.count().expect("count should succeed"), 1);
    }

    #[test]
    fn test_insert_duplicate_id_conflicts() {
        let repo = InMemoryRepository::<Procedure>::new();
        let p = procedure("0301080232");
        repo.insert(&p).expect("insert should succeed");

        let err = repo.insert(&p).expect_err("duplicate insert should fail");
        assert!(matches!(err, CapsError::Conflict(_)));
    }

    #[test]
    fn test_update_and_delete_unknown_id_not_found() {
        let repo = InMemoryRepository::<Procedure>::new();
        let p = procedure("0301080232");

        assert!(matches!(
            repo.update(&p),
            Err(CapsError::NotFound { .. })
        ));
        assert!(matches!(
            repo.delete(p.id),
            Err(CapsError::NotFound { .. })
        ));
        assert!(matches!(
            repo.require(p.id),
            Err(CapsError::NotFound { collection: "procedures", .. })
        ));
    }

    #[test]
    fn test_update_replaces_record() {
        let repo = InMemoryRepository::<Procedure>::new();
        let mut p = procedure("0301080232");
        repo.insert(&p).expect("insert should succeed");

        p.details.active = false;
        repo.update(&p).expect("update should succeed");

        let stored = repo.require(p.id).expect("require should succeed");
        assert!(!stored.details.active);

        repo.delete(p.id).expect("delete should succeed");
        assert_eq!(repo.get(p.id).expect("get should succeed"), None);
    }
}
