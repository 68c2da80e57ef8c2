//! CLI configuration file: a `storage:` section and a `log:` section.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use rollupindex_storage::{BackendKind, StorageConfig};

use crate::logging::LogConfig;

/// Database used when neither the config file nor `--db` names one.
pub const DEFAULT_DB: &str = "rollupindex.db";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub storage: StorageConfig,
    pub log: LogConfig,
}

impl CliConfig {
    /// Load `path` if given, otherwise start from defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_yaml::from_str(&yaml).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Apply `--db`, which always selects the sqlite backend.
    pub fn with_db(mut self, db: Option<PathBuf>) -> Self {
        if let Some(db) = db {
            self.storage.backend = BackendKind::Sqlite;
            self.storage.path = Some(db);
        }
        if self.storage.backend == BackendKind::Sqlite && self.storage.path.is_none() {
            self.storage.path = Some(PathBuf::from(DEFAULT_DB));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "storage:\n  backend: memory\nlog:\n  level: debug\n  components:\n    rollupindex-storage: trace"
        )
        .unwrap();

        let cfg = CliConfig::load(Some(file.path())).unwrap();
        assert_eq!(cfg.storage.backend, BackendKind::Memory);
        assert_eq!(cfg.log.level, "debug");
        assert_eq!(cfg.log.components["rollupindex-storage"], "trace");
    }

    #[test]
    fn db_flag_overrides_backend() {
        let cfg = CliConfig {
            storage: StorageConfig::memory(),
            ..Default::default()
        }
        .with_db(Some(PathBuf::from("/tmp/x.db")));
        assert_eq!(cfg.storage.backend, BackendKind::Sqlite);
        assert_eq!(cfg.storage.path.as_deref(), Some(Path::new("/tmp/x.db")));
    }

    #[test]
    fn sqlite_falls_back_to_default_path() {
        let cfg = CliConfig::default().with_db(None);
        assert_eq!(cfg.storage.path.as_deref(), Some(Path::new(DEFAULT_DB)));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(CliConfig::load(Some(Path::new("/nonexistent/rollupindex.yaml"))).is_err());
    }
}
