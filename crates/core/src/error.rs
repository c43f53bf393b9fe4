#[derive(Debug, thiserror::Error)]
pub enum CapsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{collection} record not found: {id}")]
    NotFound { collection: &'static str, id: String },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error(
        "insert failed and cleanup also failed (path: {path}): insert={insert_error}; cleanup={cleanup_error}",
        path = path.display()
    )]
    CleanupAfterInsertFailed {
        path: std::path::PathBuf,
        #[source]
        insert_error: Box<CapsError>,
        cleanup_error: std::io::Error,
    },
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to delete record: {0}")]
    FileDelete(std::io::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(String),
    #[error("record store lock poisoned")]
    LockPoisoned,

    #[error("export error: {0}")]
    Raas(#[from] raas::RaasError),
    #[error("invalid record id: {0}")]
    Uuid(#[from] caps_uuid::UuidError),
    #[error("invalid text: {0}")]
    Text(#[from] caps_types::TextError),
}

impl CapsError {
    pub(crate) fn not_found(collection: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            collection,
            id: id.to_string(),
        }
    }
}

pub type CapsResult<T> = std::result::Result<T, CapsError>;
