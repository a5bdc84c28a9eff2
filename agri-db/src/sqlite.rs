//! Durable telemetry repository backed by SQLite

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::info;

use agri_core::{BlockchainReceipt, TelemetryPacket, TelemetryRecord};

use crate::error::{StoreError, StoreResult};
use crate::repository::TelemetryRepository;
use crate::schema::{CREATE_TELEMETRY_RECORDS, RECORD_COLUMNS};

/// Durable [`TelemetryRepository`] over a single SQLite database file.
///
/// All operations run inside one `Mutex<Connection>` critical section; the
/// database handle lives for the lifetime of the repository and closes on
/// drop.
#[derive(Debug)]
pub struct SqliteTelemetryRepository {
    conn: Mutex<Connection>,
}

impl SqliteTelemetryRepository {
    /// Open (creating if missing) the database at `path` and ensure the
    /// schema exists. Parent directories are created first.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(CREATE_TELEMETRY_RECORDS)?;

        info!(path = %path.display(), "opened telemetry database");
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Open a private in-memory database. Test fixture constructor.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(CREATE_TELEMETRY_RECORDS)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<TelemetryRecord> {
        let batch_code: Option<String> = row.get(8)?;
        let tx_hash: Option<String> = row.get(9)?;

        let receipt = match tx_hash {
            Some(tx_hash) => {
                let block_height: Option<i64> = row.get(10)?;
                let submitted_at: Option<String> = row.get(11)?;
                Some(BlockchainReceipt {
                    tx_hash,
                    block_height: block_height.unwrap_or(0) as u64,
                    submitted_at: submitted_at.unwrap_or_default(),
                })
            }
            None => None,
        };

        Ok(TelemetryRecord {
            record_id: row.get::<_, i64>(0)? as u64,
            packet: TelemetryPacket {
                device_id: row.get(1)?,
                timestamp: row.get::<_, i64>(2)? as u64,
                telemetry_json: row.get(3)?,
                hash_hex: row.get(4)?,
                signature: row.get(5)?,
                pub_key_id: row.get(6)?,
                transport: row.get(7)?,
                batch_code: batch_code.unwrap_or_default(),
            },
            receipt,
        })
    }
}

impl TelemetryRepository for SqliteTelemetryRepository {
    fn save(&self, packet: &TelemetryPacket) -> StoreResult<u64> {
        let conn = self.lock()?;

        let batch_code = if packet.batch_code.is_empty() {
            None
        } else {
            Some(packet.batch_code.as_str())
        };

        conn.execute(
            "INSERT INTO telemetry_records \
             (device_id, timestamp, telemetry_json, hash_hex, signature, pub_key_id, transport, batch_code) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                packet.device_id,
                packet.timestamp as i64,
                packet.telemetry_json,
                packet.hash_hex,
                packet.signature,
                packet.pub_key_id,
                packet.transport,
                batch_code,
            ],
        )?;

        Ok(conn.last_insert_rowid() as u64)
    }

    fn attach_receipt(&self, record_id: u64, receipt: &BlockchainReceipt) -> StoreResult<bool> {
        let conn = self.lock()?;

        let owner: Option<i64> = conn
            .query_row(
                "SELECT record_id FROM telemetry_records WHERE tx_hash = ?1",
                params![receipt.tx_hash],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(owner) = owner {
            if owner as u64 != record_id {
                return Err(StoreError::Conflict(format!(
                    "tx hash {} already bound to record {owner}",
                    receipt.tx_hash
                )));
            }
        }

        let changed = conn.execute(
            "UPDATE telemetry_records \
             SET tx_hash = ?1, block_height = ?2, submitted_at = ?3 \
             WHERE record_id = ?4",
            params![
                receipt.tx_hash,
                receipt.block_height as i64,
                receipt.submitted_at,
                record_id as i64,
            ],
        )?;

        Ok(changed > 0)
    }

    fn delete(&self, record_id: u64) -> StoreResult<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "DELETE FROM telemetry_records WHERE record_id = ?1",
            params![record_id as i64],
        )?;
        Ok(changed > 0)
    }

    fn latest_by_device(&self, device_id: &str) -> StoreResult<Option<TelemetryRecord>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM telemetry_records \
             WHERE device_id = ?1 \
             ORDER BY timestamp DESC, record_id DESC LIMIT 1"
        );
        let record = conn
            .query_row(&sql, params![device_id], Self::row_to_record)
            .optional()?;
        Ok(record)
    }

    fn find_by_transaction(&self, tx_hash: &str) -> StoreResult<Option<TelemetryRecord>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM telemetry_records WHERE tx_hash = ?1 LIMIT 1"
        );
        let record = conn
            .query_row(&sql, params![tx_hash], Self::row_to_record)
            .optional()?;
        Ok(record)
    }

    fn find_by_batch(&self, batch_code: &str) -> StoreResult<Vec<TelemetryRecord>> {
        if batch_code.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM telemetry_records \
             WHERE batch_code = ?1 \
             ORDER BY timestamp ASC, record_id ASC"
        );
        let mut statement = conn.prepare(&sql)?;
        let rows = statement.query_map(params![batch_code], Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn size(&self) -> StoreResult<u64> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(1) FROM telemetry_records", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
