use super::{decode, encode, SledFleetStore};
use pulse_types::{NetworkSnapshot, PulseError, PulseResult};
use std::sync::atomic::Ordering;
use tracing::debug;

impl SledFleetStore {
    /// Insert-only. Keys are big-endian ids from the database's monotonic
    /// generator, so tree order is insertion order.
    pub(super) fn store_snapshot(&self, snapshot: &NetworkSnapshot) -> PulseResult<u64> {
        let id = self
            .db
            .generate_id()
            .map_err(|e| PulseError::Storage(format!("Failed to allocate snapshot id: {}", e)))?;

        let value = encode(snapshot, "snapshot")?;
        let len = value.len() as u64;

        let previous = self
            .snapshots
            .compare_and_swap(id.to_be_bytes(), None as Option<&[u8]>, Some(value))
            .map_err(|e| {
                self.metrics.record_error();
                PulseError::Storage(format!("Failed to append snapshot: {}", e))
            })?;

        if previous.is_err() {
            self.metrics.record_error();
            return Err(PulseError::Storage(format!("Snapshot id {} already exists", id)));
        }

        self.metrics.writes.fetch_add(1, Ordering::Relaxed);
        self.metrics.write_bytes.fetch_add(len, Ordering::Relaxed);
        debug!("Appended snapshot {}", id);
        Ok(id)
    }

    pub(super) fn read_latest_snapshots(&self, count: usize) -> PulseResult<Vec<NetworkSnapshot>> {
        let mut snapshots = Vec::with_capacity(count.min(self.snapshots.len()));

        for item in self.snapshots.iter().rev().take(count) {
            let (_, value) = item
                .map_err(|e| PulseError::Storage(format!("Failed to iterate snapshots: {}", e)))?;
            self.metrics.record_read(value.len());
            snapshots.push(decode(&value, "snapshot")?);
        }

        Ok(snapshots)
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }
}
