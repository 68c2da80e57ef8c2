//! Records persisted by the stores, plus the derived [`Epoch`] pair.

use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::{RawHeader, RawLog};

// ─── BlockHeader ──────────────────────────────────────────────────────────────

/// A canonical block header of either chain.
///
/// `hash`, `parent_hash`, `number` and `timestamp` are the canonical columns.
/// `raw_header` is kept only for archival re-export and is never consulted
/// for those columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub hash: B256,
    pub parent_hash: B256,
    pub number: U256,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    pub raw_header: RawHeader,
}

impl BlockHeader {
    /// Build the stored form of a chain-native header.
    ///
    /// The hash is derived from the header's RLP encoding.
    pub fn from_raw(raw: RawHeader) -> Self {
        Self {
            hash: raw.hash_slow(),
            parent_hash: raw.parent_hash,
            number: U256::from(raw.number),
            timestamp: raw.timestamp,
            raw_header: raw,
        }
    }
}

// ─── ContractEvent ────────────────────────────────────────────────────────────

/// A contract log emitted on either chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEvent {
    /// Generated at creation; never reassigned.
    pub guid: Uuid,
    /// Hash of the containing block. A plain reference: no header row is
    /// required to exist.
    pub block_hash: B256,
    pub contract_address: Address,
    pub transaction_hash: B256,
    pub log_index: u64,
    /// First topic of the log, or `B256::ZERO` for a topic-less log.
    pub event_signature: B256,
    /// Timestamp of the containing block.
    pub timestamp: u64,
    /// The full log. Its block hash, transaction hash and log index are
    /// overwritten from the columns above on every read.
    pub raw_log: RawLog,
}

impl ContractEvent {
    /// Build the stored form of a log with a freshly generated GUID.
    ///
    /// Positional fields the node left out (pending logs) become zero.
    pub fn from_log(log: RawLog, timestamp: u64) -> Self {
        Self {
            guid: Uuid::new_v4(),
            block_hash: log.block_hash.unwrap_or_default(),
            contract_address: log.inner.address,
            transaction_hash: log.transaction_hash.unwrap_or_default(),
            log_index: log.log_index.unwrap_or_default(),
            event_signature: log.inner.data.topics().first().copied().unwrap_or(B256::ZERO),
            timestamp,
            raw_log: log,
        }
    }

    /// Overwrite the positional fields of `raw_log` with the canonical columns.
    pub fn reconcile(&mut self) {
        self.raw_log.block_hash = Some(self.block_hash);
        self.raw_log.transaction_hash = Some(self.transaction_hash);
        self.raw_log.log_index = Some(self.log_index);
    }
}

// ─── EventFilter ──────────────────────────────────────────────────────────────

/// Partial-match template for event range queries.
///
/// Every `None` field is unconstrained; every `Some` field must match exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    pub guid: Option<Uuid>,
    pub block_hash: Option<B256>,
    pub contract_address: Option<Address>,
    pub transaction_hash: Option<B256>,
    pub log_index: Option<u64>,
    pub event_signature: Option<B256>,
    pub timestamp: Option<u64>,
}

impl EventFilter {
    /// Create a filter for a single contract address.
    pub fn contract(address: Address) -> Self {
        Self {
            contract_address: Some(address),
            ..Default::default()
        }
    }

    /// Add an event signature (topic 0) constraint.
    pub fn event_signature(mut self, signature: B256) -> Self {
        self.event_signature = Some(signature);
        self
    }

    /// Build a filter from an event used as a template: zero-valued fields
    /// are left unconstrained, every other field must match.
    ///
    /// A template cannot express `log_index == 0` or `timestamp == 0`; use
    /// the `Option` fields directly for that.
    pub fn from_template(template: &ContractEvent) -> Self {
        fn non_zero<T: PartialEq + Default>(value: T) -> Option<T> {
            (value != T::default()).then_some(value)
        }

        Self {
            guid: (!template.guid.is_nil()).then_some(template.guid),
            block_hash: non_zero(template.block_hash),
            contract_address: non_zero(template.contract_address),
            transaction_hash: non_zero(template.transaction_hash),
            log_index: non_zero(template.log_index),
            event_signature: non_zero(template.event_signature),
            timestamp: non_zero(template.timestamp),
        }
    }

    /// Returns `true` if `event` satisfies every constrained field.
    pub fn matches(&self, event: &ContractEvent) -> bool {
        fn check<T: PartialEq>(want: &Option<T>, got: &T) -> bool {
            want.as_ref().map_or(true, |w| w == got)
        }

        check(&self.guid, &event.guid)
            && check(&self.block_hash, &event.block_hash)
            && check(&self.contract_address, &event.contract_address)
            && check(&self.transaction_hash, &event.transaction_hash)
            && check(&self.log_index, &event.log_index)
            && check(&self.event_signature, &event.event_signature)
            && check(&self.timestamp, &event.timestamp)
    }
}

// ─── Epoch ────────────────────────────────────────────────────────────────────

/// An L1 origin block paired with the L2 block that opened its epoch.
///
/// Never persisted; derived from the two header tables by timestamp equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epoch {
    pub l1: BlockHeader,
    pub l2: BlockHeader,
}

// ─── Checkpoints ──────────────────────────────────────────────────────────────

/// A state batch commitment from the pre-Bedrock system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyStateBatch {
    /// Batch sequence number; 0 is a valid index.
    pub index: u64,
    pub root: B256,
    pub size: u64,
    pub prev_total: u64,
    /// The L1 event that emitted this batch.
    pub l1_contract_event_guid: Uuid,
}

/// An L2 output root proposed on L1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputProposal {
    pub output_root: B256,
    pub l2_output_index: U256,
    pub l2_block_number: U256,
    /// The L1 event that emitted this proposal.
    pub l1_contract_event_guid: Uuid,
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256, Bytes, Log as PrimitiveLog, LogData};

    fn transfer_log() -> RawLog {
        RawLog {
            inner: PrimitiveLog::new_unchecked(
                address!("4200000000000000000000000000000000000010"),
                vec![
                    b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"),
                    B256::with_last_byte(1),
                ],
                Bytes::from_static(&[0x01, 0x02]),
            ),
            block_number: Some(12),
            block_hash: Some(B256::with_last_byte(0xbb)),
            transaction_hash: Some(B256::with_last_byte(0xcc)),
            transaction_index: Some(3),
            log_index: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn event_from_log_copies_columns() {
        let ev = ContractEvent::from_log(transfer_log(), 1_700_000_000);
        assert_eq!(ev.block_hash, B256::with_last_byte(0xbb));
        assert_eq!(ev.transaction_hash, B256::with_last_byte(0xcc));
        assert_eq!(ev.log_index, 7);
        assert_eq!(
            ev.event_signature,
            b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")
        );
        assert_eq!(ev.contract_address, address!("4200000000000000000000000000000000000010"));
        assert_eq!(ev.timestamp, 1_700_000_000);
        assert!(!ev.guid.is_nil());
    }

    #[test]
    fn topicless_log_has_zero_signature() {
        let mut log = transfer_log();
        log.inner.data = LogData::new_unchecked(vec![], Bytes::new());
        let ev = ContractEvent::from_log(log, 0);
        assert_eq!(ev.event_signature, B256::ZERO);
    }

    #[test]
    fn pending_log_positions_become_zero() {
        let mut log = transfer_log();
        log.block_hash = None;
        log.log_index = None;
        let ev = ContractEvent::from_log(log, 0);
        assert_eq!(ev.block_hash, B256::ZERO);
        assert_eq!(ev.log_index, 0);
    }

    #[test]
    fn guids_are_unique() {
        let a = ContractEvent::from_log(transfer_log(), 0);
        let b = ContractEvent::from_log(transfer_log(), 0);
        assert_ne!(a.guid, b.guid);
    }

    #[test]
    fn reconcile_overwrites_stale_raw_fields() {
        let mut ev = ContractEvent::from_log(transfer_log(), 0);
        ev.block_hash = B256::with_last_byte(0x01);
        ev.log_index = 0;
        ev.reconcile();
        assert_eq!(ev.raw_log.block_hash, Some(B256::with_last_byte(0x01)));
        assert_eq!(ev.raw_log.log_index, Some(0));
        assert_eq!(ev.raw_log.transaction_hash, Some(ev.transaction_hash));
    }

    #[test]
    fn template_leaves_zero_fields_unconstrained() {
        let mut template = ContractEvent::from_log(RawLog::default(), 0);
        template.guid = Uuid::nil();
        template.contract_address = address!("4200000000000000000000000000000000000010");

        let filter = EventFilter::from_template(&template);
        assert_eq!(filter, EventFilter::contract(template.contract_address));

        let ev = ContractEvent::from_log(transfer_log(), 99);
        assert!(filter.matches(&ev));
    }

    #[test]
    fn filter_rejects_mismatch() {
        let ev = ContractEvent::from_log(transfer_log(), 0);
        let f = EventFilter::contract(ev.contract_address).event_signature(B256::ZERO);
        assert!(!f.matches(&ev));
        assert!(EventFilter::default().matches(&ev));
    }

    #[test]
    fn header_columns_come_from_raw() {
        let raw = RawHeader {
            parent_hash: B256::with_last_byte(9),
            number: 101,
            timestamp: 1012,
            ..Default::default()
        };
        let header = BlockHeader::from_raw(raw.clone());
        assert_eq!(header.hash, raw.hash_slow());
        assert_eq!(header.parent_hash, B256::with_last_byte(9));
        assert_eq!(header.number, U256::from(101));
        assert_eq!(header.timestamp, 1012);
    }
}
