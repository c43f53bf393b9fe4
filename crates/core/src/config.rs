//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services, so
//! request handling never reads process-wide environment variables.

use crate::constants::DEFAULT_DATA_DIR;
use crate::validation::validate_facility;
use crate::{CapsError, CapsResult};
use raas::Facility;
use std::path::{Path, PathBuf};

/// Backend used to persist registry records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreKind {
    /// One YAML file per record under the data directory.
    #[default]
    File,
    /// Process-local maps; contents are lost on exit.
    Memory,
}

impl std::str::FromStr for StoreKind {
    type Err = CapsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(Self::File),
            "memory" => Ok(Self::Memory),
            other => Err(CapsError::InvalidInput(format!(
                "unknown store kind '{}' (expected 'file' or 'memory')",
                other
            ))),
        }
    }
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    data_dir: PathBuf,
    facility: Facility,
    store_kind: StoreKind,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`CapsError::InvalidInput`] if the facility identity is malformed.
    pub fn new(data_dir: PathBuf, facility: Facility, store_kind: StoreKind) -> CapsResult<Self> {
        validate_facility(&facility)?;

        Ok(Self {
            data_dir,
            facility,
            store_kind,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn facility(&self) -> &Facility {
        &self.facility
    }

    pub fn store_kind(&self) -> StoreKind {
        self.store_kind
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolve the data directory from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_DATA_DIR`].
pub fn data_dir_from_env_value(value: Option<String>) -> PathBuf {
    non_blank(value)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Parse the store kind from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`StoreKind::File`].
pub fn store_kind_from_env_value(value: Option<String>) -> CapsResult<StoreKind> {
    non_blank(value)
        .map(|v| v.parse::<StoreKind>())
        .transpose()
        .map(Option::unwrap_or_default)
}

/// Load the facility identity.
///
/// With no `path`, the built-in [`Facility::default`] is returned. Otherwise the file is parsed as
/// YAML; missing keys take their defaults and unknown keys are rejected.
///
/// # Errors
///
/// Returns [`CapsError::FileRead`] if the file cannot be read and
/// [`CapsError::YamlDeserialization`] (naming the failing key) if it does not parse.
pub fn load_facility(path: Option<&Path>) -> CapsResult<Facility> {
    let Some(path) = path else {
        return Ok(Facility::default());
    };

    let raw = std::fs::read_to_string(path).map_err(CapsError::FileRead)?;
    parse_facility(&raw)
}

/// Parse a facility identity from YAML text.
pub fn parse_facility(raw: &str) -> CapsResult<Facility> {
    if raw.trim().is_empty() {
        return Ok(Facility::default());
    }

    let deserializer = serde_yaml::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(deserializer).map_err(|e| {
        let path = e.path().to_string();
        CapsError::YamlDeserialization(format!(
            "facility schema mismatch at {}: {}",
            path,
            e.into_inner()
        ))
    })
}
