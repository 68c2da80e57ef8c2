//! rollupindex-core: data model and store contracts for a dual-layer
//! (L1/L2) rollup indexer.
//!
//! # Architecture
//!
//! ```text
//! fetcher (external) ──store_*──► IndexStore
//!                                  ├── HeaderStore     (l1/l2 block headers)
//!                                  ├── EventStore      (l1/l2 contract events)
//!                                  ├── EpochView       (L1⋈L2 on timestamp)
//!                                  └── CheckpointStore (state batches, outputs)
//! readers ◄──views── InMemoryStorage / SqliteStorage (rollupindex-storage)
//! ```
//!
//! Rows are written through [`codec`] and read back through it; reading an
//! event always reconciles its raw log against the canonical columns.

pub mod chain;
pub mod codec;
pub mod error;
pub mod store;
pub mod types;

pub use chain::Chain;
pub use codec::{EventRow, HeaderRow, RawHeader, RawLog};
pub use error::StorageError;
pub use store::{
    CheckpointStore, CheckpointView, EpochView, EventStore, EventView, HeaderStore, HeaderView,
    IndexStore,
};
pub use types::{BlockHeader, ContractEvent, Epoch, EventFilter, LegacyStateBatch, OutputProposal};
