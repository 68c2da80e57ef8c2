//! In-memory storage backend.
//!
//! Keeps the same row shapes the SQLite backend persists and reads them back
//! through the same codec, so both backends reconcile events identically.
//! Useful for testing and short-lived indexers that don't need persistence.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use alloy_primitives::{B256, U256};
use tracing::debug;
use uuid::Uuid;

use rollupindex_core::codec::{EventRow, HeaderRow};
use rollupindex_core::store::{
    CheckpointStore, CheckpointView, EpochView, EventStore, EventView, HeaderStore, HeaderView,
    IndexStore,
};
use rollupindex_core::{
    BlockHeader, Chain, ContractEvent, Epoch, EventFilter, LegacyStateBatch, OutputProposal,
    StorageError,
};

const LEGACY_STATE_BATCHES: &str = "legacy_state_batches";
const OUTPUT_PROPOSALS: &str = "output_proposals";

/// Rows for one chain, in insertion order, plus their unique-key indexes.
#[derive(Default)]
struct ChainTables {
    headers: Vec<HeaderRow>,
    header_by_hash: HashMap<B256, usize>,
    events: Vec<EventRow>,
    event_by_guid: HashMap<Uuid, usize>,
    event_by_location: HashMap<(B256, u64), usize>,
}

#[derive(Default)]
struct Tables {
    l1: ChainTables,
    l2: ChainTables,
    state_batches: BTreeMap<u64, LegacyStateBatch>,
    outputs: Vec<OutputProposal>,
    output_roots: HashSet<B256>,
}

impl Tables {
    fn chain(&self, chain: Chain) -> &ChainTables {
        match chain {
            Chain::L1 => &self.l1,
            Chain::L2 => &self.l2,
        }
    }

    fn chain_mut(&mut self, chain: Chain) -> &mut ChainTables {
        match chain {
            Chain::L1 => &mut self.l1,
            Chain::L2 => &mut self.l2,
        }
    }

    fn check_l1_reference(&self, table: &str, guid: Uuid) -> Result<(), StorageError> {
        if self.l1.event_by_guid.contains_key(&guid) {
            Ok(())
        } else {
            Err(StorageError::missing_reference(
                table,
                format!("no l1 contract event with guid {guid}"),
            ))
        }
    }
}

/// In-memory index storage.
///
/// Readers share a read lock; a batch write validates every row under the
/// write lock before applying any of them. All data is lost when the process
/// exits.
pub struct InMemoryStorage {
    tables: RwLock<Tables>,
    enforce_references: bool,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self {
            tables: RwLock::default(),
            enforce_references: true,
        }
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the checkpoint → L1 event reference check (on by default).
    pub fn with_reference_checks(mut self, enforce: bool) -> Self {
        self.enforce_references = enforce;
        self
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StorageError> {
        self.tables
            .read()
            .map_err(|_| StorageError::Backend("in-memory tables lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StorageError> {
        self.tables
            .write()
            .map_err(|_| StorageError::Backend("in-memory tables lock poisoned".into()))
    }
}

// ─── Headers ──────────────────────────────────────────────────────────────────

impl HeaderView for InMemoryStorage {
    fn header_at(&self, chain: Chain, number: U256) -> Result<Option<BlockHeader>, StorageError> {
        let tables = self.read()?;
        tables
            .chain(chain)
            .headers
            .iter()
            .find(|row| row.number == number)
            .map(|row| row.clone().decode(chain))
            .transpose()
    }

    fn header_by_hash(&self, chain: Chain, hash: B256) -> Result<Option<BlockHeader>, StorageError> {
        let tables = self.read()?;
        let table = tables.chain(chain);
        table
            .header_by_hash
            .get(&hash)
            .map(|&i| table.headers[i].clone().decode(chain))
            .transpose()
    }

    fn latest_header(&self, chain: Chain) -> Result<Option<BlockHeader>, StorageError> {
        let tables = self.read()?;
        tables
            .chain(chain)
            .headers
            .iter()
            .enumerate()
            .max_by_key(|(i, row)| (row.number, *i))
            .map(|(_, row)| row.clone().decode(chain))
            .transpose()
    }

    fn headers_in_range(
        &self,
        chain: Chain,
        from: U256,
        to: U256,
    ) -> Result<Vec<BlockHeader>, StorageError> {
        let tables = self.read()?;
        let mut rows: Vec<&HeaderRow> = tables
            .chain(chain)
            .headers
            .iter()
            .filter(|row| row.number >= from && row.number <= to)
            .collect();
        rows.sort_by_key(|row| row.number);
        rows.into_iter().map(|row| row.clone().decode(chain)).collect()
    }
}

impl HeaderStore for InMemoryStorage {
    fn store_headers(&self, chain: Chain, headers: &[BlockHeader]) -> Result<(), StorageError> {
        if headers.is_empty() {
            return Ok(());
        }
        let mut tables = self.write()?;
        let table = tables.chain_mut(chain);

        let mut batch = HashSet::with_capacity(headers.len());
        for header in headers {
            if table.header_by_hash.contains_key(&header.hash) || !batch.insert(header.hash) {
                return Err(StorageError::duplicate(
                    chain.headers_table(),
                    format!("hash {}", header.hash),
                ));
            }
        }

        for header in headers {
            table.header_by_hash.insert(header.hash, table.headers.len());
            table.headers.push(HeaderRow::from(header));
        }

        debug!(%chain, count = headers.len(), "headers stored");
        Ok(())
    }
}

// ─── Events ───────────────────────────────────────────────────────────────────

impl EventView for InMemoryStorage {
    fn event_by_id(&self, chain: Chain, guid: Uuid) -> Result<Option<ContractEvent>, StorageError> {
        let tables = self.read()?;
        let table = tables.chain(chain);
        table
            .event_by_guid
            .get(&guid)
            .map(|&i| table.events[i].clone().decode(chain))
            .transpose()
    }

    fn event_by_location(
        &self,
        chain: Chain,
        tx_hash: B256,
        log_index: u64,
    ) -> Result<Option<ContractEvent>, StorageError> {
        let tables = self.read()?;
        let table = tables.chain(chain);
        table
            .event_by_location
            .get(&(tx_hash, log_index))
            .map(|&i| table.events[i].clone().decode(chain))
            .transpose()
    }

    fn events_in_range(
        &self,
        chain: Chain,
        filter: &EventFilter,
        from: Option<U256>,
        to: U256,
    ) -> Result<Vec<ContractEvent>, StorageError> {
        let from = from.unwrap_or(U256::ZERO);
        let tables = self.read()?;
        let table = tables.chain(chain);

        // Inner join on block_hash = hash, restricted to the height range.
        let mut joined = Vec::new();
        for row in &table.events {
            let Some(&h) = table.header_by_hash.get(&row.block_hash) else {
                continue;
            };
            let number = table.headers[h].number;
            if number < from || number > to {
                continue;
            }
            let event = row.clone().decode(chain)?;
            if filter.matches(&event) {
                joined.push((number, event));
            }
        }

        joined.sort_by_key(|(number, event)| (*number, event.log_index));
        Ok(joined.into_iter().map(|(_, event)| event).collect())
    }
}

impl EventStore for InMemoryStorage {
    fn store_events(&self, chain: Chain, events: &[ContractEvent]) -> Result<(), StorageError> {
        if events.is_empty() {
            return Ok(());
        }
        let mut tables = self.write()?;
        let table = tables.chain_mut(chain);

        let mut guids = HashSet::with_capacity(events.len());
        let mut locations = HashSet::with_capacity(events.len());
        for event in events {
            if table.event_by_guid.contains_key(&event.guid) || !guids.insert(event.guid) {
                return Err(StorageError::duplicate(
                    chain.events_table(),
                    format!("guid {}", event.guid),
                ));
            }
            let location = (event.transaction_hash, event.log_index);
            if table.event_by_location.contains_key(&location) || !locations.insert(location) {
                return Err(StorageError::duplicate(
                    chain.events_table(),
                    format!("tx {} log index {}", event.transaction_hash, event.log_index),
                ));
            }
        }

        for event in events {
            let i = table.events.len();
            table.event_by_guid.insert(event.guid, i);
            table
                .event_by_location
                .insert((event.transaction_hash, event.log_index), i);
            table.events.push(EventRow::from(event));
        }

        debug!(%chain, count = events.len(), "contract events stored");
        Ok(())
    }
}

// ─── Epochs ───────────────────────────────────────────────────────────────────

impl EpochView for InMemoryStorage {
    fn latest_epoch(&self) -> Result<Option<Epoch>, StorageError> {
        let tables = self.read()?;

        // Epoch-opening L2 block per timestamp: lowest number, then earliest row.
        let mut l2_by_timestamp: HashMap<u64, &HeaderRow> = HashMap::new();
        for row in &tables.l2.headers {
            l2_by_timestamp
                .entry(row.timestamp)
                .and_modify(|best| {
                    if row.number < best.number {
                        *best = row;
                    }
                })
                .or_insert(row);
        }

        // Walk L1 from the most recent timestamp down.
        let mut l1: Vec<(usize, &HeaderRow)> = tables.l1.headers.iter().enumerate().collect();
        l1.sort_by(|(ia, a), (ib, b)| {
            (b.timestamp, b.number, *ib).cmp(&(a.timestamp, a.number, *ia))
        });

        for (_, l1_row) in l1 {
            if let Some(l2_row) = l2_by_timestamp.get(&l1_row.timestamp) {
                return Ok(Some(Epoch {
                    l1: l1_row.clone().decode(Chain::L1)?,
                    l2: (*l2_row).clone().decode(Chain::L2)?,
                }));
            }
        }
        Ok(None)
    }
}

// ─── Checkpoints ──────────────────────────────────────────────────────────────

impl CheckpointView for InMemoryStorage {
    fn latest_checkpointed_output(&self) -> Result<Option<OutputProposal>, StorageError> {
        let tables = self.read()?;
        Ok(tables
            .outputs
            .iter()
            .enumerate()
            .max_by_key(|(i, p)| (p.l2_output_index, *i))
            .map(|(_, p)| p.clone()))
    }

    fn output_proposal_at(&self, index: U256) -> Result<Option<OutputProposal>, StorageError> {
        let tables = self.read()?;
        Ok(tables
            .outputs
            .iter()
            .find(|p| p.l2_output_index == index)
            .cloned())
    }

    fn legacy_state_batch_at(&self, index: u64) -> Result<Option<LegacyStateBatch>, StorageError> {
        Ok(self.read()?.state_batches.get(&index).cloned())
    }

    fn latest_legacy_state_batch(&self) -> Result<Option<LegacyStateBatch>, StorageError> {
        Ok(self
            .read()?
            .state_batches
            .last_key_value()
            .map(|(_, batch)| batch.clone()))
    }
}

impl CheckpointStore for InMemoryStorage {
    fn store_legacy_state_batches(&self, batches: &[LegacyStateBatch]) -> Result<(), StorageError> {
        if batches.is_empty() {
            return Ok(());
        }
        let mut tables = self.write()?;

        let mut seen = HashSet::with_capacity(batches.len());
        for batch in batches {
            if tables.state_batches.contains_key(&batch.index) || !seen.insert(batch.index) {
                return Err(StorageError::duplicate(
                    LEGACY_STATE_BATCHES,
                    format!("index {}", batch.index),
                ));
            }
            if self.enforce_references {
                tables.check_l1_reference(LEGACY_STATE_BATCHES, batch.l1_contract_event_guid)?;
            }
        }

        for batch in batches {
            tables.state_batches.insert(batch.index, batch.clone());
        }

        debug!(count = batches.len(), "legacy state batches stored");
        Ok(())
    }

    fn store_output_proposals(&self, proposals: &[OutputProposal]) -> Result<(), StorageError> {
        if proposals.is_empty() {
            return Ok(());
        }
        let mut tables = self.write()?;

        let mut seen = HashSet::with_capacity(proposals.len());
        for proposal in proposals {
            if tables.output_roots.contains(&proposal.output_root)
                || !seen.insert(proposal.output_root)
            {
                return Err(StorageError::duplicate(
                    OUTPUT_PROPOSALS,
                    format!("output root {}", proposal.output_root),
                ));
            }
            if self.enforce_references {
                tables.check_l1_reference(OUTPUT_PROPOSALS, proposal.l1_contract_event_guid)?;
            }
        }

        for proposal in proposals {
            tables.output_roots.insert(proposal.output_root);
            tables.outputs.push(proposal.clone());
        }

        debug!(count = proposals.len(), "output proposals stored");
        Ok(())
    }
}

impl IndexStore for InMemoryStorage {
    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
