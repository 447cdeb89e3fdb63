//! Durable home for node records and snapshot history.

mod metrics;
mod nodes;
mod snapshots;
mod types;

pub use metrics::{StorageMetrics, StorageMetricsSnapshot};
pub use types::SchemaInfo;

use crate::config::StorageSection;
use async_trait::async_trait;
use pulse_types::{NetworkSnapshot, NodeRecord, PulseError, PulseResult};
use sled::{Db, Tree};
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

const CURRENT_SCHEMA_VERSION: u32 = 1;
const SCHEMA_KEY: &[u8] = b"__schema_version__";
const MAX_BATCH_SIZE: usize = 1000;

/// Operations the sync cycle needs from the store, plus the reads used by
/// the CLI.
#[async_trait]
pub trait FleetStore: Send + Sync {
    /// Insert or replace each record by identity. Returns the rows written.
    async fn upsert_nodes(&self, nodes: &[NodeRecord]) -> PulseResult<usize>;

    /// Append a snapshot to the history. Returns the id it was stored under.
    async fn append_snapshot(&self, snapshot: &NetworkSnapshot) -> PulseResult<u64>;

    /// Cheap connectivity check.
    async fn probe(&self) -> PulseResult<()>;

    async fn load_node(&self, identity: &str) -> PulseResult<Option<NodeRecord>>;

    async fn list_nodes(&self) -> PulseResult<Vec<NodeRecord>>;

    /// Most recent first.
    async fn latest_snapshots(&self, count: usize) -> PulseResult<Vec<NetworkSnapshot>>;

    async fn node_count(&self) -> PulseResult<usize>;
}

pub struct SledFleetStore {
    db: Db,
    schema: Tree,
    nodes: Tree,
    snapshots: Tree,
    path: PathBuf,
    metrics: Arc<StorageMetrics>,
}

impl SledFleetStore {
    pub fn open(path: impl AsRef<Path>, section: &StorageSection) -> PulseResult<Self> {
        let path = path.as_ref();
        info!("Opening fleet store at {:?}", path);

        let db = sled::Config::new()
            .path(path)
            .cache_capacity(section.cache_capacity_bytes)
            .mode(sled::Mode::HighThroughput)
            .flush_every_ms(section.flush_every_ms)
            .open()
            .map_err(|e| PulseError::Storage(format!("Failed to open database: {}", e)))?;

        let store = Self::from_db(db, path.to_path_buf())?;
        info!("Fleet store opened (schema version {})", CURRENT_SCHEMA_VERSION);
        Ok(store)
    }

    /// Temporary store discarded on drop.
    pub fn in_memory() -> PulseResult<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| PulseError::Storage(format!("Failed to open temp database: {}", e)))?;

        Self::from_db(db, PathBuf::new())
    }

    fn from_db(db: Db, path: PathBuf) -> PulseResult<Self> {
        let store = Self {
            schema: open_tree(&db, "schema")?,
            nodes: open_tree(&db, "nodes")?,
            snapshots: open_tree(&db, "snapshots")?,
            db,
            path,
            metrics: Arc::new(StorageMetrics::new()),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    fn ensure_schema(&self) -> PulseResult<()> {
        match self.schema_version()? {
            None => self.initialize_schema(),
            Some(version) if version > CURRENT_SCHEMA_VERSION => Err(PulseError::Storage(format!(
                "Database schema version {} is newer than supported {}",
                version, CURRENT_SCHEMA_VERSION
            ))),
            Some(_) => Ok(()),
        }
    }

    pub fn schema_version(&self) -> PulseResult<Option<u32>> {
        let bytes = self
            .schema
            .get(SCHEMA_KEY)
            .map_err(|e| PulseError::Storage(format!("Failed to read schema: {}", e)))?;

        match bytes {
            Some(bytes) => {
                let info: SchemaInfo = decode(&bytes, "schema")?;
                Ok(Some(info.version))
            }
            None => Ok(None),
        }
    }

    fn initialize_schema(&self) -> PulseResult<()> {
        info!("Initializing fleet store with schema version {}", CURRENT_SCHEMA_VERSION);

        let info = SchemaInfo {
            version: CURRENT_SCHEMA_VERSION,
            created_at: chrono::Utc::now().timestamp(),
        };

        self.schema
            .insert(SCHEMA_KEY, encode(&info, "schema")?)
            .map_err(|e| PulseError::Storage(format!("Failed to store schema: {}", e)))?;

        self.flush()
    }

    pub fn flush(&self) -> PulseResult<()> {
        self.metrics.flushes.fetch_add(1, Ordering::Relaxed);
        self.db
            .flush()
            .map_err(|e| PulseError::Storage(format!("Flush error: {}", e)))?;
        Ok(())
    }

    pub fn size_on_disk(&self) -> PulseResult<u64> {
        self.db
            .size_on_disk()
            .map_err(|e| PulseError::Storage(format!("Size error: {}", e)))
    }

    pub fn storage_metrics(&self) -> Arc<StorageMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn data_path(&self) -> &Path {
        &self.path
    }

    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

#[async_trait]
impl FleetStore for SledFleetStore {
    async fn upsert_nodes(&self, nodes: &[NodeRecord]) -> PulseResult<usize> {
        self.store_nodes(nodes)
    }

    async fn append_snapshot(&self, snapshot: &NetworkSnapshot) -> PulseResult<u64> {
        self.store_snapshot(snapshot)
    }

    async fn probe(&self) -> PulseResult<()> {
        self.nodes
            .iter()
            .next()
            .transpose()
            .map(|_| ())
            .map_err(|e| {
                self.metrics.record_error();
                PulseError::Storage(format!("Probe failed: {}", e))
            })
    }

    async fn load_node(&self, identity: &str) -> PulseResult<Option<NodeRecord>> {
        self.read_node(identity)
    }

    async fn list_nodes(&self) -> PulseResult<Vec<NodeRecord>> {
        self.read_all_nodes()
    }

    async fn latest_snapshots(&self, count: usize) -> PulseResult<Vec<NetworkSnapshot>> {
        self.read_latest_snapshots(count)
    }

    async fn node_count(&self) -> PulseResult<usize> {
        Ok(self.nodes.len())
    }
}

fn open_tree(db: &Db, name: &str) -> PulseResult<Tree> {
    db.open_tree(name)
        .map_err(|e| PulseError::Storage(format!("Failed to open {} tree: {}", name, e)))
}

pub(crate) fn encode<T: serde::Serialize>(value: &T, what: &str) -> PulseResult<Vec<u8>> {
    bincode::serialize(value)
        .map_err(|e| PulseError::Serialization(format!("Failed to serialize {}: {}", what, e)))
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8], what: &str) -> PulseResult<T> {
    bincode::deserialize(bytes)
        .map_err(|e| PulseError::Serialization(format!("Failed to deserialize {}: {}", what, e)))
}
