//! Backend selection and options, loadable from YAML.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use rollupindex_core::{IndexStore, StorageError};

/// Which storage backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Memory,
    #[default]
    Sqlite,
}

/// Storage configuration.
///
/// ```yaml
/// backend: sqlite
/// path: ./rollupindex.db
/// wal: true
/// enforce_checkpoint_references: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: BackendKind,
    /// Database file for the sqlite backend. `":memory:"` opens a private
    /// in-memory database.
    pub path: Option<PathBuf>,
    /// Enable WAL journaling (sqlite only).
    pub wal: bool,
    /// Reject checkpoints whose L1 event GUID is not stored.
    pub enforce_checkpoint_references: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            path: None,
            wal: true,
            enforce_checkpoint_references: true,
        }
    }
}

impl StorageConfig {
    /// An in-memory store with default options.
    pub fn memory() -> Self {
        Self {
            backend: BackendKind::Memory,
            ..Default::default()
        }
    }

    /// A sqlite store at `path` with default options.
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendKind::Sqlite,
            path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, StorageError> {
        serde_yaml::from_str(yaml)
            .map_err(|e| StorageError::Config(format!("invalid storage config: {e}")))
    }

    /// Read a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            StorageError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Open the configured backend.
    pub fn open(&self) -> Result<Box<dyn IndexStore>, StorageError> {
        let store: Box<dyn IndexStore> = match self.backend {
            BackendKind::Memory => self.open_memory()?,
            BackendKind::Sqlite => self.open_sqlite()?,
        };
        info!(backend = store.backend_name(), "storage backend ready");
        Ok(store)
    }

    #[cfg(feature = "memory")]
    fn open_memory(&self) -> Result<Box<dyn IndexStore>, StorageError> {
        Ok(Box::new(
            crate::memory::InMemoryStorage::new()
                .with_reference_checks(self.enforce_checkpoint_references),
        ))
    }

    #[cfg(not(feature = "memory"))]
    fn open_memory(&self) -> Result<Box<dyn IndexStore>, StorageError> {
        Err(StorageError::Config(
            "memory backend not compiled in (enable the `memory` feature)".into(),
        ))
    }

    #[cfg(feature = "sqlite")]
    fn open_sqlite(&self) -> Result<Box<dyn IndexStore>, StorageError> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| StorageError::Config("sqlite backend requires `path`".into()))?;
        let options = crate::sqlite::SqliteOptions {
            wal: self.wal,
            enforce_references: self.enforce_checkpoint_references,
        };
        Ok(Box::new(crate::sqlite::SqliteStorage::open_with(path, options)?))
    }

    #[cfg(not(feature = "sqlite"))]
    fn open_sqlite(&self) -> Result<Box<dyn IndexStore>, StorageError> {
        Err(StorageError::Config(
            "sqlite backend not compiled in (enable the `sqlite` feature)".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg = StorageConfig::from_yaml_str("backend: memory\n").unwrap();
        assert_eq!(cfg.backend, BackendKind::Memory);
        assert!(cfg.wal);
        assert!(cfg.enforce_checkpoint_references);
        assert_eq!(cfg.path, None);
    }

    #[test]
    fn full_yaml() {
        let cfg = StorageConfig::from_yaml_str(
            "backend: sqlite\npath: /var/lib/rollupindex.db\nwal: false\nenforce_checkpoint_references: false\n",
        )
        .unwrap();
        assert_eq!(cfg.path.as_deref(), Some(Path::new("/var/lib/rollupindex.db")));
        assert!(!cfg.wal);
        assert!(!cfg.enforce_checkpoint_references);
    }

    #[test]
    fn unknown_backend_is_config_error() {
        let err = StorageConfig::from_yaml_str("backend: postgres\n").unwrap_err();
        assert!(matches!(err, StorageError::Config(_)));
    }

    #[test]
    fn sqlite_without_path_is_config_error() {
        let cfg = StorageConfig {
            backend: BackendKind::Sqlite,
            ..Default::default()
        };
        assert!(matches!(cfg.open(), Err(StorageError::Config(_))));
    }

    #[test]
    fn opens_each_backend() {
        assert_eq!(StorageConfig::memory().open().unwrap().backend_name(), "memory");
        assert_eq!(
            StorageConfig::sqlite(":memory:").open().unwrap().backend_name(),
            "sqlite"
        );
    }
}
