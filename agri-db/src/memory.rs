//! Volatile telemetry repository for tests and sandbox deployments

use std::collections::HashMap;
use std::sync::Mutex;

use agri_core::{BlockchainReceipt, TelemetryPacket, TelemetryRecord};

use crate::error::{StoreError, StoreResult};
use crate::repository::TelemetryRepository;

#[derive(Debug, Default)]
struct Inner {
    records: Vec<TelemetryRecord>,
    /// Last allocated record id; allocation pre-increments so ids start at 1
    last_record_id: u64,
    position_by_id: HashMap<u64, usize>,
    ids_by_device: HashMap<String, Vec<u64>>,
    ids_by_batch: HashMap<String, Vec<u64>>,
    id_by_tx_hash: HashMap<String, u64>,
}

impl Inner {
    fn record_by_id(&self, record_id: u64) -> Option<&TelemetryRecord> {
        self.position_by_id
            .get(&record_id)
            .map(|&position| &self.records[position])
    }
}

/// Volatile [`TelemetryRepository`] holding everything in process memory.
///
/// Conformance target for the storage contract; the ingest and API test
/// suites run against it.
#[derive(Debug, Default)]
pub struct InMemoryTelemetryRepository {
    inner: Mutex<Inner>,
}

impl InMemoryTelemetryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

impl TelemetryRepository for InMemoryTelemetryRepository {
    fn save(&self, packet: &TelemetryPacket) -> StoreResult<u64> {
        let mut inner = self.lock()?;

        inner.last_record_id += 1;
        let record_id = inner.last_record_id;

        inner.records.push(TelemetryRecord {
            record_id,
            packet: packet.clone(),
            receipt: None,
        });
        let position = inner.records.len() - 1;
        inner.position_by_id.insert(record_id, position);
        inner
            .ids_by_device
            .entry(packet.device_id.clone())
            .or_default()
            .push(record_id);
        if !packet.batch_code.is_empty() {
            inner
                .ids_by_batch
                .entry(packet.batch_code.clone())
                .or_default()
                .push(record_id);
        }

        Ok(record_id)
    }

    fn attach_receipt(&self, record_id: u64, receipt: &BlockchainReceipt) -> StoreResult<bool> {
        let mut inner = self.lock()?;

        let Some(&position) = inner.position_by_id.get(&record_id) else {
            return Ok(false);
        };

        if let Some(&owner) = inner.id_by_tx_hash.get(&receipt.tx_hash) {
            if owner != record_id {
                return Err(StoreError::Conflict(format!(
                    "tx hash {} already bound to record {owner}",
                    receipt.tx_hash
                )));
            }
        }

        inner.records[position].receipt = Some(receipt.clone());
        inner.id_by_tx_hash.insert(receipt.tx_hash.clone(), record_id);
        Ok(true)
    }

    fn delete(&self, record_id: u64) -> StoreResult<bool> {
        let mut inner = self.lock()?;

        let Some(position) = inner.position_by_id.remove(&record_id) else {
            return Ok(false);
        };

        let record = inner.records.remove(position);

        let mut device_entry_empty = false;
        if let Some(ids) = inner.ids_by_device.get_mut(&record.packet.device_id) {
            ids.retain(|&id| id != record_id);
            device_entry_empty = ids.is_empty();
        }
        if device_entry_empty {
            inner.ids_by_device.remove(&record.packet.device_id);
        }

        if !record.packet.batch_code.is_empty() {
            let mut batch_entry_empty = false;
            if let Some(ids) = inner.ids_by_batch.get_mut(&record.packet.batch_code) {
                ids.retain(|&id| id != record_id);
                batch_entry_empty = ids.is_empty();
            }
            if batch_entry_empty {
                inner.ids_by_batch.remove(&record.packet.batch_code);
            }
        }
        if let Some(receipt) = &record.receipt {
            inner.id_by_tx_hash.remove(&receipt.tx_hash);
        }

        // Every record past the removal point shifted left by one.
        for shifted in position..inner.records.len() {
            let shifted_id = inner.records[shifted].record_id;
            inner.position_by_id.insert(shifted_id, shifted);
        }

        Ok(true)
    }

    fn latest_by_device(&self, device_id: &str) -> StoreResult<Option<TelemetryRecord>> {
        let inner = self.lock()?;

        let Some(ids) = inner.ids_by_device.get(device_id) else {
            return Ok(None);
        };

        let latest = ids
            .iter()
            .filter_map(|&id| inner.record_by_id(id))
            .max_by_key(|record| (record.packet.timestamp, record.record_id))
            .cloned();
        Ok(latest)
    }

    fn find_by_transaction(&self, tx_hash: &str) -> StoreResult<Option<TelemetryRecord>> {
        let inner = self.lock()?;
        let record = inner
            .id_by_tx_hash
            .get(tx_hash)
            .and_then(|&id| inner.record_by_id(id))
            .cloned();
        Ok(record)
    }

    fn find_by_batch(&self, batch_code: &str) -> StoreResult<Vec<TelemetryRecord>> {
        if batch_code.is_empty() {
            return Ok(Vec::new());
        }

        let inner = self.lock()?;
        let Some(ids) = inner.ids_by_batch.get(batch_code) else {
            return Ok(Vec::new());
        };

        let mut records: Vec<TelemetryRecord> = ids
            .iter()
            .filter_map(|&id| inner.record_by_id(id))
            .cloned()
            .collect();
        records.sort_by_key(|record| (record.packet.timestamp, record.record_id));
        Ok(records)
    }

    fn size(&self) -> StoreResult<u64> {
        let inner = self.lock()?;
        Ok(inner.records.len() as u64)
    }
}
