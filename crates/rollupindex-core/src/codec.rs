//! Canonical codec: chain-native headers and logs, their RLP raw forms, and
//! the row shapes the storage backends persist.
//!
//! Reading a record is always `row -> decode -> reconcile`: the raw payload
//! is decoded first, then the derived fields it cannot be trusted for are
//! overwritten from the row's canonical columns.

use alloy_primitives::{Address, Bytes, Log as PrimitiveLog, B256, U256};
use uuid::Uuid;

use crate::chain::Chain;
use crate::error::StorageError;
use crate::types::{BlockHeader, ContractEvent};

// ─── Raw forms ────────────────────────────────────────────────────────────────

/// A full Ethereum block header as served by a chain node.
///
/// Its RLP encoding is what gets archived; `hash_slow()` over it is the block
/// hash.
pub type RawHeader = alloy_consensus::Header;

/// A contract log as served by a node's RPC.
///
/// Only the consensus part (`inner`: address, topics, data) is archived. The
/// positional fields come back as `None` after [`decode_log`] until the event
/// is reconciled.
pub type RawLog = alloy_rpc_types_eth::Log;

/// Decode a header from its RLP bytes, rejecting trailing input.
pub fn decode_header(bytes: &[u8]) -> alloy_rlp::Result<RawHeader> {
    alloy_rlp::decode_exact(bytes)
}

/// Consensus RLP of a log. Positional fields are not part of it.
pub fn encode_log(log: &RawLog) -> Vec<u8> {
    alloy_rlp::encode(&log.inner)
}

/// Decode a log from its consensus RLP bytes, rejecting trailing input.
pub fn decode_log(bytes: &[u8]) -> alloy_rlp::Result<RawLog> {
    let inner: PrimitiveLog = alloy_rlp::decode_exact(bytes)?;
    Ok(RawLog {
        inner,
        ..Default::default()
    })
}

// ─── Rows ─────────────────────────────────────────────────────────────────────

/// The persisted shape of a [`BlockHeader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRow {
    pub hash: B256,
    pub parent_hash: B256,
    pub number: U256,
    pub timestamp: u64,
    pub rlp_bytes: Bytes,
}

impl HeaderRow {
    /// Turn a stored row back into a header.
    pub fn decode(self, chain: Chain) -> Result<BlockHeader, StorageError> {
        let raw_header = decode_header(&self.rlp_bytes)
            .map_err(|e| StorageError::codec(chain.headers_table(), e))?;
        Ok(BlockHeader {
            hash: self.hash,
            parent_hash: self.parent_hash,
            number: self.number,
            timestamp: self.timestamp,
            raw_header,
        })
    }
}

impl From<&BlockHeader> for HeaderRow {
    fn from(header: &BlockHeader) -> Self {
        Self {
            hash: header.hash,
            parent_hash: header.parent_hash,
            number: header.number,
            timestamp: header.timestamp,
            rlp_bytes: alloy_rlp::encode(&header.raw_header).into(),
        }
    }
}

/// The persisted shape of a [`ContractEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRow {
    pub guid: Uuid,
    pub block_hash: B256,
    pub contract_address: Address,
    pub transaction_hash: B256,
    pub log_index: u64,
    pub event_signature: B256,
    pub timestamp: u64,
    pub rlp_bytes: Bytes,
}

impl EventRow {
    /// Turn a stored row back into an event.
    ///
    /// The raw log is decoded and then reconciled against the row's
    /// canonical columns before it is handed out.
    pub fn decode(self, chain: Chain) -> Result<ContractEvent, StorageError> {
        let raw_log = decode_log(&self.rlp_bytes)
            .map_err(|e| StorageError::codec(chain.events_table(), e))?;
        let mut event = ContractEvent {
            guid: self.guid,
            block_hash: self.block_hash,
            contract_address: self.contract_address,
            transaction_hash: self.transaction_hash,
            log_index: self.log_index,
            event_signature: self.event_signature,
            timestamp: self.timestamp,
            raw_log,
        };
        event.reconcile();
        Ok(event)
    }
}

impl From<&ContractEvent> for EventRow {
    fn from(event: &ContractEvent) -> Self {
        Self {
            guid: event.guid,
            block_hash: event.block_hash,
            contract_address: event.contract_address,
            transaction_hash: event.transaction_hash,
            log_index: event.log_index,
            event_signature: event.event_signature,
            timestamp: event.timestamp,
            rlp_bytes: encode_log(&event.raw_log).into(),
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256, hex};

    fn cancun_header() -> RawHeader {
        RawHeader {
            parent_hash: B256::with_last_byte(1),
            ommers_hash: b256!("1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347"),
            beneficiary: address!("4200000000000000000000000000000000000011"),
            state_root: B256::with_last_byte(2),
            transactions_root: B256::with_last_byte(3),
            receipts_root: B256::with_last_byte(4),
            number: 19_500_000,
            gas_limit: 30_000_000,
            gas_used: 12_345_678,
            timestamp: 1_710_338_135,
            extra_data: Bytes::from_static(b"rollupindex"),
            base_fee_per_gas: Some(7),
            withdrawals_root: Some(B256::with_last_byte(5)),
            blob_gas_used: Some(131_072),
            excess_blob_gas: Some(0),
            parent_beacon_block_root: Some(B256::with_last_byte(6)),
            ..Default::default()
        }
    }

    fn deposit_log() -> RawLog {
        RawLog {
            inner: PrimitiveLog::new_unchecked(
                address!("4200000000000000000000000000000000000010"),
                vec![B256::with_last_byte(0xaa)],
                Bytes::from(hex!("deadbeef").to_vec()),
            ),
            block_hash: Some(B256::with_last_byte(0xbb)),
            block_number: Some(5),
            transaction_hash: Some(B256::with_last_byte(0xcc)),
            transaction_index: Some(1),
            log_index: Some(4),
            ..Default::default()
        }
    }

    #[test]
    fn cancun_header_survives_encoding() {
        let header = cancun_header();
        let bytes = alloy_rlp::encode(&header);
        assert_eq!(decode_header(&bytes).unwrap(), header);
    }

    #[test]
    fn prague_header_with_requests_hash_decodes() {
        let mut header = cancun_header();
        header.requests_hash = Some(B256::with_last_byte(7));
        let bytes = alloy_rlp::encode(&header);

        let decoded = decode_header(&bytes).unwrap();
        assert_eq!(decoded.requests_hash, Some(B256::with_last_byte(7)));
        assert_eq!(decoded.hash_slow(), header.hash_slow());
        assert_ne!(header.hash_slow(), cancun_header().hash_slow());
    }

    #[test]
    fn header_hash_depends_on_every_field() {
        let a = cancun_header();
        let mut b = cancun_header();
        b.gas_used += 1;
        assert_ne!(a.hash_slow(), b.hash_slow());
        assert_eq!(a.hash_slow(), cancun_header().hash_slow());
    }

    #[test]
    fn header_rejects_trailing_bytes() {
        let mut bytes = alloy_rlp::encode(cancun_header());
        bytes.push(0x80);
        assert!(decode_header(&bytes).is_err());
    }

    #[test]
    fn log_encoding_drops_positional_fields() {
        let log = deposit_log();
        let decoded = decode_log(&encode_log(&log)).unwrap();
        assert_eq!(decoded.inner, log.inner);
        assert_eq!(decoded.block_hash, None);
        assert_eq!(decoded.transaction_hash, None);
        assert_eq!(decoded.log_index, None);
    }

    #[test]
    fn event_row_decode_reconciles() {
        let event = ContractEvent::from_log(deposit_log(), 1000);
        let row = EventRow::from(&event);

        let read = row.decode(Chain::L1).unwrap();
        assert_eq!(read.raw_log.block_hash, Some(event.block_hash));
        assert_eq!(read.raw_log.transaction_hash, Some(event.transaction_hash));
        assert_eq!(read.raw_log.log_index, Some(4));
        assert_eq!(read.raw_log.inner, event.raw_log.inner);
        assert_eq!(read.guid, event.guid);
    }

    #[test]
    fn corrupt_row_is_codec_error() {
        let header = BlockHeader::from_raw(cancun_header());
        let mut row = HeaderRow::from(&header);
        row.rlp_bytes = Bytes::from_static(&[0xc1]);
        let err = row.decode(Chain::L2).unwrap_err();
        assert!(matches!(err, StorageError::Codec { ref table, .. } if table == "l2_block_headers"));
    }

    #[test]
    fn node_json_field_names() {
        let json = serde_json::to_value(cancun_header()).unwrap();
        assert!(json.get("parentHash").is_some());
        assert!(json.get("baseFeePerGas").is_some());
        assert!(json.get("requestsHash").is_none());

        let log = serde_json::to_value(deposit_log()).unwrap();
        assert!(log.get("transactionHash").is_some());
        assert!(log.get("logIndex").is_some());
    }

    #[test]
    fn header_row_roundtrip_keeps_columns() {
        let header = BlockHeader::from_raw(cancun_header());
        let read = HeaderRow::from(&header).decode(Chain::L1).unwrap();
        assert_eq!(read, header);
    }
}
