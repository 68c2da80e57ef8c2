//! rollupindex-storage: storage backends for the rollup indexer.
//!
//! Backends:
//! - [`memory`]: in-memory (dev/testing, no persistence)
//! - [`sqlite`]: SQLite via `rusqlite` (embedded, single-file persistence)
//!
//! [`StorageConfig`] picks one at runtime and hands it out as a
//! `Box<dyn IndexStore>`.

pub mod config;

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use config::{BackendKind, StorageConfig};

#[cfg(feature = "memory")]
pub use memory::InMemoryStorage;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteOptions, SqliteStorage};
