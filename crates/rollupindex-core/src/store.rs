//! Store traits implemented by every storage backend.
//!
//! Each store is split into a read-only view (what downstream services such
//! as bridges, proposers and challengers consume) and a write trait used by
//! the ingestion fetcher. All operations are synchronous; a `store_*` batch
//! either commits completely or leaves no trace.

use alloy_primitives::{B256, U256};
use uuid::Uuid;

use crate::chain::Chain;
use crate::error::StorageError;
use crate::types::{BlockHeader, ContractEvent, Epoch, EventFilter, LegacyStateBatch, OutputProposal};

// ─── Headers ──────────────────────────────────────────────────────────────────

/// Read access to the per-chain block header tables.
pub trait HeaderView: Send + Sync {
    /// The header with exactly this number, if any.
    ///
    /// Should two rows share a number, the earliest-inserted one is returned.
    fn header_at(&self, chain: Chain, number: U256) -> Result<Option<BlockHeader>, StorageError>;

    /// The header with this hash, if any.
    fn header_by_hash(&self, chain: Chain, hash: B256) -> Result<Option<BlockHeader>, StorageError>;

    /// The header with the greatest number, or `None` for an empty table.
    fn latest_header(&self, chain: Chain) -> Result<Option<BlockHeader>, StorageError>;

    /// Headers with `from <= number <= to`, ascending by number.
    fn headers_in_range(
        &self,
        chain: Chain,
        from: U256,
        to: U256,
    ) -> Result<Vec<BlockHeader>, StorageError>;
}

/// Append-only writes to the per-chain block header tables.
pub trait HeaderStore: HeaderView {
    /// Insert a batch of headers atomically.
    ///
    /// Fails with [`StorageError::DuplicateKey`] if any hash is already
    /// stored for `chain` or repeats within the batch.
    fn store_headers(&self, chain: Chain, headers: &[BlockHeader]) -> Result<(), StorageError>;
}

// ─── Events ───────────────────────────────────────────────────────────────────

/// Read access to the per-chain contract event tables.
///
/// Every event handed out has had its raw log reconciled against the
/// canonical columns.
pub trait EventView: Send + Sync {
    /// Exact lookup by GUID.
    fn event_by_id(&self, chain: Chain, guid: Uuid) -> Result<Option<ContractEvent>, StorageError>;

    /// Exact lookup by the unique `(transaction hash, log index)` pair.
    fn event_by_location(
        &self,
        chain: Chain,
        tx_hash: B256,
        log_index: u64,
    ) -> Result<Option<ContractEvent>, StorageError>;

    /// Events matching `filter` whose containing header has
    /// `from <= number <= to` (`from` defaults to 0).
    ///
    /// Ordered ascending by the containing header's number, then by log
    /// index, then by insertion order. Events whose block hash matches no
    /// stored header are never returned.
    fn events_in_range(
        &self,
        chain: Chain,
        filter: &EventFilter,
        from: Option<U256>,
        to: U256,
    ) -> Result<Vec<ContractEvent>, StorageError>;

    /// Dual-chain entry point taking a `"l1"` / `"l2"` selector.
    ///
    /// An unknown selector fails with [`StorageError::InvalidChain`] before
    /// storage is touched.
    fn contract_events_with_filter(
        &self,
        chain: &str,
        filter: &EventFilter,
        from: Option<U256>,
        to: U256,
    ) -> Result<Vec<ContractEvent>, StorageError> {
        let chain: Chain = chain.parse()?;
        self.events_in_range(chain, filter, from, to)
    }
}

/// Append-only writes to the per-chain contract event tables.
pub trait EventStore: EventView {
    /// Insert a batch of events atomically.
    ///
    /// Fails with [`StorageError::DuplicateKey`] on a GUID collision or a
    /// `(transaction hash, log index)` collision, whether against stored
    /// rows or within the batch.
    fn store_events(&self, chain: Chain, events: &[ContractEvent]) -> Result<(), StorageError>;
}

// ─── Epochs ───────────────────────────────────────────────────────────────────

/// Derives epochs by joining the L1 and L2 header tables on timestamp.
pub trait EpochView: Send + Sync {
    /// The L1/L2 header pair sharing the greatest timestamp.
    ///
    /// The first L2 block of an epoch carries its L1 origin's timestamp, so
    /// timestamp equality (not number) is the join key. When several L2
    /// headers share the timestamp, the lowest-numbered one opens the epoch.
    fn latest_epoch(&self) -> Result<Option<Epoch>, StorageError>;
}

// ─── Checkpoints ──────────────────────────────────────────────────────────────

/// Read access to checkpoint artifacts.
pub trait CheckpointView: Send + Sync {
    /// The output proposal with the greatest L2 output index.
    fn latest_checkpointed_output(&self) -> Result<Option<OutputProposal>, StorageError>;

    /// The output proposal with exactly this L2 output index.
    fn output_proposal_at(&self, index: U256) -> Result<Option<OutputProposal>, StorageError>;

    /// The legacy state batch with this index.
    fn legacy_state_batch_at(&self, index: u64) -> Result<Option<LegacyStateBatch>, StorageError>;

    /// The legacy state batch with the greatest index.
    fn latest_legacy_state_batch(&self) -> Result<Option<LegacyStateBatch>, StorageError>;
}

/// Writes of checkpoint artifacts.
///
/// Each row must reference an L1 contract event by GUID; backends reject
/// dangling references with [`StorageError::MissingReference`] unless that
/// check was disabled when the store was opened.
pub trait CheckpointStore: CheckpointView {
    fn store_legacy_state_batches(&self, batches: &[LegacyStateBatch]) -> Result<(), StorageError>;

    fn store_output_proposals(&self, proposals: &[OutputProposal]) -> Result<(), StorageError>;
}

// ─── Umbrella ─────────────────────────────────────────────────────────────────

/// Everything a complete backend provides.
pub trait IndexStore: HeaderStore + EventStore + EpochView + CheckpointStore {
    /// Short backend name for logs (`"memory"`, `"sqlite"`).
    fn backend_name(&self) -> &'static str;
}
