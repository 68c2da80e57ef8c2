//! SQLite storage backend.
//!
//! Persists headers, events and checkpoints in a single-file database.
//! Hashes, addresses and GUIDs are stored as raw BLOBs. Integers are stored
//! as fixed-width big-endian BLOBs (32 bytes for `U256`, 8 for `u64`) so
//! SQLite's bytewise BLOB comparison orders them numerically and no `u64`
//! value falls outside SQLite's signed integer range.
//!
//! ## Schema
//! ```sql
//! CREATE TABLE l1_block_headers (          -- and l2_block_headers
//!     hash        BLOB    NOT NULL PRIMARY KEY,
//!     parent_hash BLOB    NOT NULL,
//!     number      BLOB    NOT NULL,         -- U256, 32 bytes big-endian
//!     timestamp   BLOB    NOT NULL,         -- u64, 8 bytes big-endian
//!     rlp_bytes   BLOB    NOT NULL
//! );
//! CREATE TABLE l1_contract_events (        -- and l2_contract_events
//!     guid             BLOB    NOT NULL PRIMARY KEY,
//!     block_hash       BLOB    NOT NULL,
//!     contract_address BLOB    NOT NULL,
//!     transaction_hash BLOB    NOT NULL,
//!     log_index        BLOB    NOT NULL,
//!     event_signature  BLOB    NOT NULL,
//!     timestamp        BLOB    NOT NULL,
//!     rlp_bytes        BLOB    NOT NULL,
//!     UNIQUE (transaction_hash, log_index)
//! );
//! CREATE TABLE legacy_state_batches (
//!     "index"                BLOB NOT NULL PRIMARY KEY,
//!     root                   BLOB NOT NULL,
//!     size                   BLOB NOT NULL,
//!     prev_total             BLOB NOT NULL,
//!     l1_contract_event_guid BLOB NOT NULL REFERENCES l1_contract_events (guid)
//! );
//! CREATE TABLE output_proposals (
//!     output_root            BLOB NOT NULL PRIMARY KEY,
//!     l2_output_index        BLOB NOT NULL,
//!     l2_block_number        BLOB NOT NULL,
//!     l1_contract_event_guid BLOB NOT NULL REFERENCES l1_contract_events (guid)
//! );
//! ```

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use alloy_primitives::{Address, Bytes, B256, U256};
use rusqlite::types::Type;
use rusqlite::{ffi, params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row, ToSql};
use tracing::{debug, info};
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

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS l1_block_headers (
    hash        BLOB    NOT NULL PRIMARY KEY,
    parent_hash BLOB    NOT NULL,
    number      BLOB    NOT NULL,
    timestamp   BLOB    NOT NULL,
    rlp_bytes   BLOB    NOT NULL
);
CREATE INDEX IF NOT EXISTS l1_block_headers_number    ON l1_block_headers (number);
CREATE INDEX IF NOT EXISTS l1_block_headers_timestamp ON l1_block_headers (timestamp);

CREATE TABLE IF NOT EXISTS l2_block_headers (
    hash        BLOB    NOT NULL PRIMARY KEY,
    parent_hash BLOB    NOT NULL,
    number      BLOB    NOT NULL,
    timestamp   BLOB    NOT NULL,
    rlp_bytes   BLOB    NOT NULL
);
CREATE INDEX IF NOT EXISTS l2_block_headers_number    ON l2_block_headers (number);
CREATE INDEX IF NOT EXISTS l2_block_headers_timestamp ON l2_block_headers (timestamp);

CREATE TABLE IF NOT EXISTS l1_contract_events (
    guid             BLOB    NOT NULL PRIMARY KEY,
    block_hash       BLOB    NOT NULL,
    contract_address BLOB    NOT NULL,
    transaction_hash BLOB    NOT NULL,
    log_index        BLOB    NOT NULL,
    event_signature  BLOB    NOT NULL,
    timestamp        BLOB    NOT NULL,
    rlp_bytes        BLOB    NOT NULL,
    UNIQUE (transaction_hash, log_index)
);
CREATE INDEX IF NOT EXISTS l1_contract_events_block_hash ON l1_contract_events (block_hash);
CREATE INDEX IF NOT EXISTS l1_contract_events_contract
    ON l1_contract_events (contract_address, event_signature);

CREATE TABLE IF NOT EXISTS l2_contract_events (
    guid             BLOB    NOT NULL PRIMARY KEY,
    block_hash       BLOB    NOT NULL,
    contract_address BLOB    NOT NULL,
    transaction_hash BLOB    NOT NULL,
    log_index        BLOB    NOT NULL,
    event_signature  BLOB    NOT NULL,
    timestamp        BLOB    NOT NULL,
    rlp_bytes        BLOB    NOT NULL,
    UNIQUE (transaction_hash, log_index)
);
CREATE INDEX IF NOT EXISTS l2_contract_events_block_hash ON l2_contract_events (block_hash);
CREATE INDEX IF NOT EXISTS l2_contract_events_contract
    ON l2_contract_events (contract_address, event_signature);

CREATE TABLE IF NOT EXISTS legacy_state_batches (
    "index"                BLOB NOT NULL PRIMARY KEY,
    root                   BLOB NOT NULL,
    size                   BLOB NOT NULL,
    prev_total             BLOB NOT NULL,
    l1_contract_event_guid BLOB NOT NULL REFERENCES l1_contract_events (guid)
);

CREATE TABLE IF NOT EXISTS output_proposals (
    output_root            BLOB NOT NULL PRIMARY KEY,
    l2_output_index        BLOB NOT NULL,
    l2_block_number        BLOB NOT NULL,
    l1_contract_event_guid BLOB NOT NULL REFERENCES l1_contract_events (guid)
);
CREATE INDEX IF NOT EXISTS output_proposals_index ON output_proposals (l2_output_index);
"#;

const HEADER_COLUMNS: &str = "hash, parent_hash, number, timestamp, rlp_bytes";
const EVENT_COLUMNS: &str = "guid, block_hash, contract_address, transaction_hash, log_index, \
                             event_signature, timestamp, rlp_bytes";

/// Connection options for [`SqliteStorage::open_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqliteOptions {
    /// Enable WAL journaling for concurrent readers.
    pub wal: bool,
    /// Enforce the checkpoint → L1 event foreign keys.
    pub enforce_references: bool,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            wal: true,
            enforce_references: true,
        }
    }
}

/// SQLite-backed index storage.
///
/// Thread-safe via an internal `Arc<Mutex<Connection>>`. Every batch write
/// runs inside a single transaction.
#[derive(Clone)]
pub struct SqliteStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStorage {
    /// Open (or create) a database at `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        Self::open_with(path, SqliteOptions::default())
    }

    /// Open (or create) a database at `path`.
    ///
    /// Runs `CREATE TABLE IF NOT EXISTS` for every table on open.
    pub fn open_with(path: impl AsRef<Path>, options: SqliteOptions) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .map_err(|e| StorageError::Backend(format!("sqlite open error: {e}")))?;
        let storage = Self::init(conn, options)?;
        info!(path = %path.display(), wal = options.wal, "sqlite storage opened");
        Ok(storage)
    }

    /// Open a private in-memory database (useful for tests).
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::in_memory_with(SqliteOptions::default())
    }

    pub fn in_memory_with(options: SqliteOptions) -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Backend(format!("sqlite open error: {e}")))?;
        Self::init(conn, options)
    }

    fn init(conn: Connection, options: SqliteOptions) -> Result<Self, StorageError> {
        if options.wal {
            conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
                .map_err(sqlite_err)?;
        }
        conn.pragma_update(None, "foreign_keys", options.enforce_references)
            .map_err(sqlite_err)?;
        conn.execute_batch(SCHEMA).map_err(sqlite_err)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Backend("sqlite connection lock poisoned".into()))
    }

    fn query_headers(
        &self,
        chain: Chain,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> Result<Vec<BlockHeader>, StorageError> {
        let table = chain.headers_table();
        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(sql).map_err(sqlite_err)?;
        let rows = stmt
            .query_map(params, |row| header_row(row, 0))
            .map_err(sqlite_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| read_err(table, e))?;
        rows.into_iter().map(|row| row.decode(chain)).collect()
    }

    fn query_header(
        &self,
        chain: Chain,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> Result<Option<BlockHeader>, StorageError> {
        let table = chain.headers_table();
        let conn = self.lock()?;
        conn.query_row(sql, params, |row| header_row(row, 0))
            .optional()
            .map_err(|e| read_err(table, e))?
            .map(|row| row.decode(chain))
            .transpose()
    }

    fn query_event(
        &self,
        chain: Chain,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> Result<Option<ContractEvent>, StorageError> {
        let table = chain.events_table();
        let conn = self.lock()?;
        conn.query_row(sql, params, event_row)
            .optional()
            .map_err(|e| read_err(table, e))?
            .map(|row| row.decode(chain))
            .transpose()
    }
}

// ─── Headers ──────────────────────────────────────────────────────────────────

impl HeaderView for SqliteStorage {
    fn header_at(&self, chain: Chain, number: U256) -> Result<Option<BlockHeader>, StorageError> {
        let sql = format!(
            "SELECT {HEADER_COLUMNS} FROM {} WHERE number = ?1 ORDER BY rowid ASC LIMIT 1",
            chain.headers_table()
        );
        self.query_header(chain, &sql, params![&u256_blob(number)[..]])
    }

    fn header_by_hash(&self, chain: Chain, hash: B256) -> Result<Option<BlockHeader>, StorageError> {
        let sql = format!(
            "SELECT {HEADER_COLUMNS} FROM {} WHERE hash = ?1",
            chain.headers_table()
        );
        self.query_header(chain, &sql, params![hash.as_slice()])
    }

    fn latest_header(&self, chain: Chain) -> Result<Option<BlockHeader>, StorageError> {
        let sql = format!(
            "SELECT {HEADER_COLUMNS} FROM {} ORDER BY number DESC, rowid DESC LIMIT 1",
            chain.headers_table()
        );
        self.query_header(chain, &sql, params![])
    }

    fn headers_in_range(
        &self,
        chain: Chain,
        from: U256,
        to: U256,
    ) -> Result<Vec<BlockHeader>, StorageError> {
        let sql = format!(
            "SELECT {HEADER_COLUMNS} FROM {} WHERE number BETWEEN ?1 AND ?2
             ORDER BY number ASC, rowid ASC",
            chain.headers_table()
        );
        self.query_headers(
            chain,
            &sql,
            params![&u256_blob(from)[..], &u256_blob(to)[..]],
        )
    }
}

impl HeaderStore for SqliteStorage {
    fn store_headers(&self, chain: Chain, headers: &[BlockHeader]) -> Result<(), StorageError> {
        if headers.is_empty() {
            return Ok(());
        }
        let table = chain.headers_table();
        let sql = format!("INSERT INTO {table} ({HEADER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)");

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(sqlite_err)?;
        {
            let mut stmt = tx.prepare_cached(&sql).map_err(sqlite_err)?;
            for header in headers {
                let row = HeaderRow::from(header);
                stmt.execute(params![
                    row.hash.as_slice(),
                    row.parent_hash.as_slice(),
                    &u256_blob(row.number)[..],
                    &u64_blob(row.timestamp)[..],
                    &row.rlp_bytes[..],
                ])
                .map_err(|e| write_err(table, e))?;
            }
        }
        tx.commit().map_err(sqlite_err)?;

        debug!(%chain, count = headers.len(), "headers stored");
        Ok(())
    }
}

// ─── Events ───────────────────────────────────────────────────────────────────

impl EventView for SqliteStorage {
    fn event_by_id(&self, chain: Chain, guid: Uuid) -> Result<Option<ContractEvent>, StorageError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM {} WHERE guid = ?1",
            chain.events_table()
        );
        self.query_event(chain, &sql, params![&guid.as_bytes()[..]])
    }

    fn event_by_location(
        &self,
        chain: Chain,
        tx_hash: B256,
        log_index: u64,
    ) -> Result<Option<ContractEvent>, StorageError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM {} WHERE transaction_hash = ?1 AND log_index = ?2",
            chain.events_table()
        );
        self.query_event(
            chain,
            &sql,
            params![tx_hash.as_slice(), &u64_blob(log_index)[..]],
        )
    }

    fn events_in_range(
        &self,
        chain: Chain,
        filter: &EventFilter,
        from: Option<U256>,
        to: U256,
    ) -> Result<Vec<ContractEvent>, StorageError> {
        let table = chain.events_table();
        let from = from.unwrap_or(U256::ZERO);

        let columns = EVENT_COLUMNS
            .split(", ")
            .map(|c| format!("e.{}", c.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        let mut sql = format!(
            "SELECT {columns} FROM {table} e
             INNER JOIN {} h ON e.block_hash = h.hash
             WHERE h.number >= ? AND h.number <= ?",
            chain.headers_table()
        );
        let mut args: Vec<Box<dyn ToSql>> = vec![
            Box::new(u256_blob(from).to_vec()),
            Box::new(u256_blob(to).to_vec()),
        ];

        if let Some(guid) = filter.guid {
            sql.push_str(" AND e.guid = ?");
            args.push(Box::new(guid.as_bytes().to_vec()));
        }
        if let Some(block_hash) = filter.block_hash {
            sql.push_str(" AND e.block_hash = ?");
            args.push(Box::new(block_hash.to_vec()));
        }
        if let Some(address) = filter.contract_address {
            sql.push_str(" AND e.contract_address = ?");
            args.push(Box::new(address.to_vec()));
        }
        if let Some(tx_hash) = filter.transaction_hash {
            sql.push_str(" AND e.transaction_hash = ?");
            args.push(Box::new(tx_hash.to_vec()));
        }
        if let Some(log_index) = filter.log_index {
            sql.push_str(" AND e.log_index = ?");
            args.push(Box::new(u64_blob(log_index).to_vec()));
        }
        if let Some(signature) = filter.event_signature {
            sql.push_str(" AND e.event_signature = ?");
            args.push(Box::new(signature.to_vec()));
        }
        if let Some(timestamp) = filter.timestamp {
            sql.push_str(" AND e.timestamp = ?");
            args.push(Box::new(u64_blob(timestamp).to_vec()));
        }
        sql.push_str(" ORDER BY h.number ASC, e.log_index ASC, e.rowid ASC");

        let conn = self.lock()?;
        let mut stmt = conn.prepare_cached(&sql).map_err(sqlite_err)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), event_row)
            .map_err(sqlite_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| read_err(table, e))?;
        rows.into_iter().map(|row| row.decode(chain)).collect()
    }
}

impl EventStore for SqliteStorage {
    fn store_events(&self, chain: Chain, events: &[ContractEvent]) -> Result<(), StorageError> {
        if events.is_empty() {
            return Ok(());
        }
        let table = chain.events_table();
        let sql = format!(
            "INSERT INTO {table} ({EVENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
        );

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(sqlite_err)?;
        {
            let mut stmt = tx.prepare_cached(&sql).map_err(sqlite_err)?;
            for event in events {
                let row = EventRow::from(event);
                stmt.execute(params![
                    &row.guid.as_bytes()[..],
                    row.block_hash.as_slice(),
                    row.contract_address.as_slice(),
                    row.transaction_hash.as_slice(),
                    &u64_blob(row.log_index)[..],
                    row.event_signature.as_slice(),
                    &u64_blob(row.timestamp)[..],
                    &row.rlp_bytes[..],
                ])
                .map_err(|e| write_err(table, e))?;
            }
        }
        tx.commit().map_err(sqlite_err)?;

        debug!(%chain, count = events.len(), "contract events stored");
        Ok(())
    }
}

// ─── Epochs ───────────────────────────────────────────────────────────────────

impl EpochView for SqliteStorage {
    fn latest_epoch(&self) -> Result<Option<Epoch>, StorageError> {
        let sql = "SELECT l1.hash, l1.parent_hash, l1.number, l1.timestamp, l1.rlp_bytes,
                          l2.hash, l2.parent_hash, l2.number, l2.timestamp, l2.rlp_bytes
                   FROM l1_block_headers l1
                   INNER JOIN l2_block_headers l2 ON l1.timestamp = l2.timestamp
                   ORDER BY l1.timestamp DESC, l1.number DESC, l1.rowid DESC,
                            l2.number ASC, l2.rowid ASC
                   LIMIT 1";

        let conn = self.lock()?;
        let pair = conn
            .query_row(sql, [], |row| Ok((header_row(row, 0)?, header_row(row, 5)?)))
            .optional()
            .map_err(|e| read_err("l1_block_headers", e))?;

        pair.map(|(l1, l2)| {
            Ok(Epoch {
                l1: l1.decode(Chain::L1)?,
                l2: l2.decode(Chain::L2)?,
            })
        })
        .transpose()
    }
}

// ─── Checkpoints ──────────────────────────────────────────────────────────────

impl CheckpointView for SqliteStorage {
    fn latest_checkpointed_output(&self) -> Result<Option<OutputProposal>, StorageError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT output_root, l2_output_index, l2_block_number, l1_contract_event_guid
             FROM output_proposals ORDER BY l2_output_index DESC, rowid DESC LIMIT 1",
            [],
            output_proposal_row,
        )
        .optional()
        .map_err(|e| read_err(OUTPUT_PROPOSALS, e))
    }

    fn output_proposal_at(&self, index: U256) -> Result<Option<OutputProposal>, StorageError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT output_root, l2_output_index, l2_block_number, l1_contract_event_guid
             FROM output_proposals WHERE l2_output_index = ?1 ORDER BY rowid ASC LIMIT 1",
            params![&u256_blob(index)[..]],
            output_proposal_row,
        )
        .optional()
        .map_err(|e| read_err(OUTPUT_PROPOSALS, e))
    }

    fn legacy_state_batch_at(&self, index: u64) -> Result<Option<LegacyStateBatch>, StorageError> {
        let conn = self.lock()?;
        conn.query_row(
            r#"SELECT "index", root, size, prev_total, l1_contract_event_guid
               FROM legacy_state_batches WHERE "index" = ?1"#,
            params![&u64_blob(index)[..]],
            legacy_state_batch_row,
        )
        .optional()
        .map_err(|e| read_err(LEGACY_STATE_BATCHES, e))
    }

    fn latest_legacy_state_batch(&self) -> Result<Option<LegacyStateBatch>, StorageError> {
        let conn = self.lock()?;
        conn.query_row(
            r#"SELECT "index", root, size, prev_total, l1_contract_event_guid
               FROM legacy_state_batches ORDER BY "index" DESC LIMIT 1"#,
            [],
            legacy_state_batch_row,
        )
        .optional()
        .map_err(|e| read_err(LEGACY_STATE_BATCHES, e))
    }
}

impl CheckpointStore for SqliteStorage {
    fn store_legacy_state_batches(&self, batches: &[LegacyStateBatch]) -> Result<(), StorageError> {
        if batches.is_empty() {
            return Ok(());
        }
        let table = LEGACY_STATE_BATCHES;

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(sqlite_err)?;
        {
            let mut stmt = tx
                .prepare_cached(
                    r#"INSERT INTO legacy_state_batches
                       ("index", root, size, prev_total, l1_contract_event_guid)
                       VALUES (?1, ?2, ?3, ?4, ?5)"#,
                )
                .map_err(sqlite_err)?;
            for batch in batches {
                stmt.execute(params![
                    &u64_blob(batch.index)[..],
                    batch.root.as_slice(),
                    &u64_blob(batch.size)[..],
                    &u64_blob(batch.prev_total)[..],
                    &batch.l1_contract_event_guid.as_bytes()[..],
                ])
                .map_err(|e| write_err(table, e))?;
            }
        }
        tx.commit().map_err(sqlite_err)?;

        debug!(count = batches.len(), "legacy state batches stored");
        Ok(())
    }

    fn store_output_proposals(&self, proposals: &[OutputProposal]) -> Result<(), StorageError> {
        if proposals.is_empty() {
            return Ok(());
        }
        let table = OUTPUT_PROPOSALS;

        let mut conn = self.lock()?;
        let tx = conn.transaction().map_err(sqlite_err)?;
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT INTO output_proposals
                     (output_root, l2_output_index, l2_block_number, l1_contract_event_guid)
                     VALUES (?1, ?2, ?3, ?4)",
                )
                .map_err(sqlite_err)?;
            for proposal in proposals {
                stmt.execute(params![
                    proposal.output_root.as_slice(),
                    &u256_blob(proposal.l2_output_index)[..],
                    &u256_blob(proposal.l2_block_number)[..],
                    &proposal.l1_contract_event_guid.as_bytes()[..],
                ])
                .map_err(|e| write_err(table, e))?;
            }
        }
        tx.commit().map_err(sqlite_err)?;

        debug!(count = proposals.len(), "output proposals stored");
        Ok(())
    }
}

impl IndexStore for SqliteStorage {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

// ─── Row mapping ──────────────────────────────────────────────────────────────

fn header_row(row: &Row<'_>, at: usize) -> rusqlite::Result<HeaderRow> {
    Ok(HeaderRow {
        hash: b256_at(row, at)?,
        parent_hash: b256_at(row, at + 1)?,
        number: u256_at(row, at + 2)?,
        timestamp: u64_at(row, at + 3)?,
        rlp_bytes: Bytes::from(row.get::<_, Vec<u8>>(at + 4)?),
    })
}

fn event_row(row: &Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        guid: uuid_at(row, 0)?,
        block_hash: b256_at(row, 1)?,
        contract_address: address_at(row, 2)?,
        transaction_hash: b256_at(row, 3)?,
        log_index: u64_at(row, 4)?,
        event_signature: b256_at(row, 5)?,
        timestamp: u64_at(row, 6)?,
        rlp_bytes: Bytes::from(row.get::<_, Vec<u8>>(7)?),
    })
}

fn legacy_state_batch_row(row: &Row<'_>) -> rusqlite::Result<LegacyStateBatch> {
    Ok(LegacyStateBatch {
        index: u64_at(row, 0)?,
        root: b256_at(row, 1)?,
        size: u64_at(row, 2)?,
        prev_total: u64_at(row, 3)?,
        l1_contract_event_guid: uuid_at(row, 4)?,
    })
}

fn output_proposal_row(row: &Row<'_>) -> rusqlite::Result<OutputProposal> {
    Ok(OutputProposal {
        output_root: b256_at(row, 0)?,
        l2_output_index: u256_at(row, 1)?,
        l2_block_number: u256_at(row, 2)?,
        l1_contract_event_guid: uuid_at(row, 3)?,
    })
}

fn conversion_failure(col: usize, reason: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(col, Type::Blob, reason.into())
}

fn b256_at(row: &Row<'_>, col: usize) -> rusqlite::Result<B256> {
    let bytes: Vec<u8> = row.get(col)?;
    if bytes.len() != 32 {
        return Err(conversion_failure(
            col,
            format!("expected 32 bytes for B256, got {}", bytes.len()),
        ));
    }
    Ok(B256::from_slice(&bytes))
}

fn address_at(row: &Row<'_>, col: usize) -> rusqlite::Result<Address> {
    let bytes: Vec<u8> = row.get(col)?;
    if bytes.len() != 20 {
        return Err(conversion_failure(
            col,
            format!("expected 20 bytes for Address, got {}", bytes.len()),
        ));
    }
    Ok(Address::from_slice(&bytes))
}

fn u256_at(row: &Row<'_>, col: usize) -> rusqlite::Result<U256> {
    let bytes: Vec<u8> = row.get(col)?;
    if bytes.len() != 32 {
        return Err(conversion_failure(
            col,
            format!("expected 32 bytes for U256, got {}", bytes.len()),
        ));
    }
    Ok(U256::from_be_slice(&bytes))
}

fn uuid_at(row: &Row<'_>, col: usize) -> rusqlite::Result<Uuid> {
    let bytes: Vec<u8> = row.get(col)?;
    Uuid::from_slice(&bytes).map_err(|e| conversion_failure(col, e.to_string()))
}

fn u64_at(row: &Row<'_>, col: usize) -> rusqlite::Result<u64> {
    let bytes: Vec<u8> = row.get(col)?;
    let bytes: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
        conversion_failure(col, format!("expected 8 bytes for u64, got {}", bytes.len()))
    })?;
    Ok(u64::from_be_bytes(bytes))
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn u256_blob(value: U256) -> [u8; 32] {
    value.to_be_bytes()
}

fn u64_blob(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

fn sqlite_err(e: rusqlite::Error) -> StorageError {
    StorageError::Backend(format!("sqlite error: {e}"))
}

/// Column conversion failures mean a stored row can't be decoded.
fn read_err(table: &str, e: rusqlite::Error) -> StorageError {
    match e {
        rusqlite::Error::FromSqlConversionFailure(..) | rusqlite::Error::InvalidColumnType(..) => {
            StorageError::codec(table, e)
        }
        other => sqlite_err(other),
    }
}

/// Map constraint violations on insert to the typed store errors.
fn write_err(table: &str, e: rusqlite::Error) -> StorageError {
    if let rusqlite::Error::SqliteFailure(ref failure, ref message) = e {
        if failure.code == ErrorCode::ConstraintViolation {
            let detail = message.clone().unwrap_or_else(|| failure.to_string());
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
                    return StorageError::duplicate(table, detail);
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return StorageError::missing_reference(table, detail);
                }
                _ => {}
            }
        }
    }
    sqlite_err(e)
}

// ─── Tests ────────────────────────────────────────────────────────────────────
