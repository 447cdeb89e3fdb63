use super::{decode, encode, SledFleetStore, MAX_BATCH_SIZE};
use pulse_types::{NodeRecord, PulseError, PulseResult};
use sled::Batch;
use std::sync::atomic::Ordering;
use tracing::debug;

impl SledFleetStore {
    /// Replace-on-identity write of every record, applied in batches.
    pub(super) fn store_nodes(&self, nodes: &[NodeRecord]) -> PulseResult<usize> {
        if nodes.is_empty() {
            return Ok(0);
        }

        let mut stored = 0;
        for chunk in nodes.chunks(MAX_BATCH_SIZE) {
            let mut batch = Batch::default();
            let mut bytes = 0u64;

            for node in chunk {
                let value = encode(node, "node")?;
                bytes += value.len() as u64;
                batch.insert(node.key().as_bytes(), value);
            }

            self.nodes.apply_batch(batch).map_err(|e| {
                self.metrics.errors.fetch_add(chunk.len() as u64, Ordering::Relaxed);
                PulseError::Storage(format!("Failed to apply node batch: {}", e))
            })?;

            self.metrics.writes.fetch_add(chunk.len() as u64, Ordering::Relaxed);
            self.metrics.write_bytes.fetch_add(bytes, Ordering::Relaxed);
            stored += chunk.len();
        }

        debug!("Upserted {} nodes", stored);
        Ok(stored)
    }

    pub(super) fn read_node(&self, identity: &str) -> PulseResult<Option<NodeRecord>> {
        let bytes = self
            .nodes
            .get(identity.as_bytes())
            .map_err(|e| PulseError::Storage(format!("Failed to load node: {}", e)))?;

        match bytes {
            Some(bytes) => {
                self.metrics.record_read(bytes.len());
                decode(&bytes, "node").map(Some).map_err(|e| {
                    self.metrics.record_error();
                    e
                })
            }
            None => Ok(None),
        }
    }

    pub(super) fn read_all_nodes(&self) -> PulseResult<Vec<NodeRecord>> {
        let mut nodes = Vec::with_capacity(self.nodes.len());

        for item in self.nodes.iter() {
            let (_, value) =
                item.map_err(|e| PulseError::Storage(format!("Failed to iterate nodes: {}", e)))?;
            self.metrics.record_read(value.len());
            nodes.push(decode(&value, "node")?);
        }

        Ok(nodes)
    }
}
