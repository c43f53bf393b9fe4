//! YAML file record store.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//!   <collection>/
//!     <s1>/
//!       <s2>/
//!         <id>/
//!           <entity>.yaml
//! ```
//!
//! where `s1` and `s2` are the first four hex characters of the record id, providing scalable
//! directory sharding. Updates write a sibling temporary file and rename it over the record, so a
//! reader never sees a half-written document.

use super::{Entity, Repository};
use crate::{CapsError, CapsResult};
use caps_types::RecordId;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// One collection stored as sharded YAML files.
#[derive(Debug)]
pub struct YamlFileRepository<E> {
    collection_dir: PathBuf,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> YamlFileRepository<E> {
    /// Opens the collection under `data_dir`, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CapsError::StorageDirCreation`] if the collection directory cannot be created.
    pub fn open(data_dir: &Path) -> CapsResult<Self> {
        let collection_dir = data_dir.join(E::COLLECTION);
        fs::create_dir_all(&collection_dir).map_err(CapsError::StorageDirCreation)?;

        Ok(Self {
            collection_dir,
            _entity: PhantomData,
        })
    }

    pub fn collection_dir(&self) -> &Path {
        &self.collection_dir
    }

    fn record_dir(&self, id: RecordId) -> PathBuf {
        id.sharded_dir(&self.collection_dir)
    }

    fn record_path(&self, id: RecordId) -> PathBuf {
        self.record_dir(id).join(E::FILE_NAME)
    }

    fn render(entity: &E) -> CapsResult<String> {
        serde_yaml::to_string(entity).map_err(CapsError::YamlSerialization)
    }

    /// Parses a record, naming the failing field path on error.
    fn parse(raw: &str) -> CapsResult<E> {
        let deserializer = serde_yaml::Deserializer::from_str(raw);
        serde_path_to_error::deserialize(deserializer).map_err(|e| {
            let path = e.path().to_string();
            CapsError::YamlDeserialization(format!(
                "{} schema mismatch at {}: {}",
                E::FILE_NAME,
                path,
                e.into_inner()
            ))
        })
    }

    fn read(path: &Path) -> CapsResult<E> {
        let raw = fs::read_to_string(path).map_err(CapsError::FileRead)?;
        Self::parse(&raw)
    }

    fn write_atomic(path: &Path, contents: &str) -> CapsResult<()> {
        let tmp = path.with_extension("yaml.tmp");
        fs::write(&tmp, contents).map_err(CapsError::FileWrite)?;
        fs::rename(&tmp, path).map_err(CapsError::FileWrite)
    }

    /// Removes empty shard directories left behind by a delete.
    fn prune_empty_shards(&self, record_dir: &Path) {
        for dir in record_dir.ancestors().skip(1).take(2) {
            if dir == self.collection_dir || fs::remove_dir(dir).is_err() {
                break;
            }
        }
    }
}

impl<E: Entity> Repository<E> for YamlFileRepository<E> {
    fn insert(&self, entity: &E) -> CapsResult<()> {
        let id = entity.id();
        let record_dir = self.record_dir(id);
        if record_dir.exists() {
            return Err(CapsError::Conflict(format!(
                "{} record {} already exists",
                E::COLLECTION,
                id
            )));
        }

        let contents = Self::render(entity)?;
        fs::create_dir_all(&record_dir).map_err(CapsError::StorageDirCreation)?;

        if let Err(insert_error) = fs::write(record_dir.join(E::FILE_NAME), contents) {
            let insert_error = CapsError::FileWrite(insert_error);
            return match fs::remove_dir_all(&record_dir) {
                Ok(()) => Err(insert_error),
                Err(cleanup_error) => Err(CapsError::CleanupAfterInsertFailed {
                    path: record_dir,
                    insert_error: Box::new(insert_error),
                    cleanup_error,
                }),
            };
        }

        Ok(())
    }

    fn get(&self, id: RecordId) -> CapsResult<Option<E>> {
        let path = self.record_path(id);
        if !path.is_file() {
            return Ok(None);
        }
        Self::read(&path).map(Some)
    }

    fn list(&self) -> CapsResult<Vec<E>> {
        let mut records = Vec::new();

        let s1_iter = match fs::read_dir(&self.collection_dir) {
            Ok(it) => it,
            Err(_) => return Ok(records),
        };
        for s1 in s1_iter.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }

            let s2_iter = match fs::read_dir(&s1_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }

                let id_iter = match fs::read_dir(&s2_path) {
                    Ok(it) => it,
                    Err(_) => continue,
                };

                for id_ent in id_iter.flatten() {
                    let record_path = id_ent.path().join(E::FILE_NAME);
                    if !record_path.is_file() {
                        continue;
                    }

                    match Self::read(&record_path) {
                        Ok(record) => records.push(record),
                        Err(e) => {
                            tracing::warn!(
                                "failed to load {}: {} - {}",
                                E::FILE_NAME,
                                record_path.display(),
                                e
                            );
                        }
                    }
                }
            }
        }

        Ok(records)
    }

    fn update(&self, entity: &E) -> CapsResult<()> {
        let path = self.record_path(entity.id());
        if !path.is_file() {
            return Err(CapsError::not_found(E::COLLECTION, entity.id()));
        }

        let contents = Self::render(entity)?;
        Self::write_atomic(&path, &contents)
    }

    fn delete(&self, id: RecordId) -> CapsResult<()> {
        let record_dir = self.record_dir(id);
        if !record_dir.is_dir() {
            return Err(CapsError::not_found(E::COLLECTION, id));
        }

        fs::remove_dir_all(&record_dir).map_err(CapsError::FileDelete)?;
        self.prune_empty_shards(&record_dir);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caps_types::{NonEmptyText, Professional, ProfessionalDetails};
    use chrono::Utc;
    use tempfile::TempDir;

    fn professional(name: &str) -> Professional {
        Professional::create(
            ProfessionalDetails {
                name: NonEmptyText::new(name).expect("name should be valid"),
                cbo_code: NonEmptyText::new("225133").expect("cbo should be valid"),
                cbo_description: NonEmptyText::new("MEDICO PSIQUIATRA")
                    .expect("cbo description should be valid"),
                cns: None,
                cpf: None,
                active: true,
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_insert_writes_sharded_yaml_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = YamlFileRepository::<Professional>::open(temp_dir.path())
            .expect("open should succeed");
        let p = professional("Carla Mendes");

        repo.insert(&p).expect("insert should succeed");

        let id = p.id.to_string();
        let expected = temp_dir
            .path()
            .join("professionals")
            .join(&id[0..2])
            .join(&id[2..4])
            .join(&id)
            .join("professional.yaml");
        assert!(expected.is_file());

        let raw = fs::read_to_string(&expected).expect("read should succeed");
        assert!(raw.contains("Carla Mendes"));
    }

    #[test]
    fn test_round_trip_through_filesystem() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = YamlFileRepository::<Professional>::open(temp_dir.path())
            .expect("open should succeed");
        let a = professional("Carla Mendes");
        let b = professional("Bruno Lima");
        repo.insert(&a).expect("insert should succeed");
        repo.insert(&b).expect("insert should succeed");

        let loaded = repo.get(a.id).expect("get should succeed");
        assert_eq!(loaded, Some(a.clone()));

        let mut all = repo.list().expect("list should succeed");
        all.sort_by(|x, y| x.details.name.cmp(&y.details.name));
        assert_eq!(all, vec![b, a]);
    }

    #[test]
    fn test_list_skips_corrupt_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = YamlFileRepository::<Professional>::open(temp_dir.path())
            .expect("open should succeed");
        let good = professional("Carla Mendes");
        repo.insert(&good).expect("insert should succeed");

        let bad_id = RecordId::new();
        let bad_dir = bad_id.sharded_dir(repo.collection_dir());
        fs::create_dir_all(&bad_dir).expect("create_dir_all should succeed");
        fs::write(bad_dir.join("professional.yaml"), "name: [unterminated")
            .expect("write should succeed");

        let all = repo.list().expect("list should succeed");
        assert_eq!(all, vec![good]);

        let err = repo.get(bad_id).expect_err("corrupt record should fail to load");
        assert!(matches!(err, CapsError::YamlDeserialization(_)));
    }

    #[test]
    fn test_get_reports_schema_mismatch() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = YamlFileRepository::<Professional>::open(temp_dir.path())
            .expect("open should succeed");
        let p = professional("Carla Mendes");
        repo.insert(&p).expect("insert should succeed");

        let path = p.id.sharded_dir(repo.collection_dir()).join("professional.yaml");
        let raw = fs::read_to_string(&path).expect("read should succeed");
        fs::write(&path, raw.replace("active: true", "active: maybe"))
            .expect("write should succeed");

        match repo.get(p.id) {
            Err(CapsError::YamlDeserialization(msg)) => {
                assert!(msg.contains("professional.yaml schema mismatch"))
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_update_rewrites_record() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = YamlFileRepository::<Professional>::open(temp_dir.path())
            .expect("open should succeed");
        let mut p = professional("Carla Mendes");
        repo.insert(&p).expect("insert should succeed");

        p.details.active = false;
        repo.update(&p).expect("update should succeed");

        let stored = repo.require(p.id).expect("require should succeed");
        assert!(!stored.details.active);

        let record_dir = p.id.sharded_dir(repo.collection_dir());
        let entries: Vec<_> = fs::read_dir(&record_dir)
            .expect("read_dir should succeed")
            .flatten()
            .collect();
        assert_eq!(entries.len(), 1, "temporary file should be renamed away");
    }

    #[test]
    fn test_unknown_id_errors() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = YamlFileRepository::<Professional>::open(temp_dir.path())
            .expect("open should succeed");
        let p = professional("Carla Mendes");

        assert_eq!(repo.get(p.id).expect("get should succeed"), None);
        assert!(matches!(repo.update(&p), Err(CapsError::NotFound { .. })));
        assert!(matches!(repo.delete(p.id), Err(CapsError::NotFound { .. })));
    }

    #[test]
    fn test_insert_duplicate_conflicts() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = YamlFileRepository::<Professional>::open(temp_dir.path())
            .expect("open should succeed");
        let p = professional("Carla Mendes");
        repo.insert(&p).expect("insert should succeed");

        assert!(matches!(repo.insert(&p), Err(CapsError::Conflict(_))));
    }

    #[test]
    fn test_delete_removes_record_and_empty_shards() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let repo = YamlFileRepository::<Professional>::open(temp_dir.path())
            .expect("open should succeed");
        let p = professional("Carla Mendes");
        repo.insert(&p).expect("insert should succeed");

        repo.delete(p.id).expect("delete should succeed");

        let id = p.id.to_string();
        assert!(!repo.collection_dir().join(&id[0..2]).exists());
        assert!(repo.collection_dir().is_dir());
        assert_eq!(repo.count().expect("count should succeed"), 0);
    }
}
