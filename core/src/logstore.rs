//! Append-only storage for search events.
//!
//! Records are never updated or deleted, and duplicates are expected:
//! grouping happens when the stats are read, not when events are written.

use crate::error::{Result, SearchError};
use crate::model::LogEvent;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};

/// Lazy, finite, single-pass sequence of stored events. Each item is decoded on demand.
pub type EventScan<'a> = Box<dyn Iterator<Item = Result<LogEvent>> + 'a>;

pub trait LogStore: Send + Sync {
    fn append(&self, event: &LogEvent) -> Result<()>;

    /// Every stored event, in no particular order. Each call re-reads the current state.
    fn scan(&self) -> Result<EventScan<'_>>;

    fn len(&self) -> Result<usize>;

    /// Make every appended event durable. A no-op for stores without buffering.
    fn flush(&self) -> Result<()> { Ok(()) }

    fn is_empty(&self) -> Result<bool> { Ok(self.len()? == 0) }
}

const TREE_NAME: &str = "search_log";

/// Persistent log on sled. Keys are big-endian ids from `Db::generate_id`,
/// values are JSON log documents.
pub struct SledLogStore {
    root: PathBuf,
    db: sled::Db,
    tree: sled::Tree,
}

impl SledLogStore {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let db = sled::open(&root)?;
        let tree = db.open_tree(TREE_NAME)?;
        tracing::info!(path = %root.display(), records = tree.len(), "query log opened");
        Ok(Self { root, db, tree })
    }

    pub fn root(&self) -> &Path { &self.root }
}

impl LogStore for SledLogStore {
    fn append(&self, event: &LogEvent) -> Result<()> {
        let id = self.db.generate_id()?;
        let doc = serde_json::to_vec(event).map_err(|e| SearchError::Corrupt(e.to_string()))?;
        self.tree.insert(id.to_be_bytes(), doc)?;
        Ok(())
    }

    fn scan(&self) -> Result<EventScan<'_>> {
        let iter = self.tree.iter().map(|entry| {
            let (key, value) = entry?;
            serde_json::from_slice::<LogEvent>(&value)
                .map_err(|e| SearchError::Corrupt(format!("record {}: {e}", hex_key(&key))))
        });
        Ok(Box::new(iter))
    }

    fn len(&self) -> Result<usize> { Ok(self.tree.len()) }

    fn flush(&self) -> Result<()> {
        self.tree.flush()?;
        Ok(())
    }
}

fn hex_key(key: &[u8]) -> String {
    key.iter().map(|b| format!("{b:02x}")).collect()
}

/// In-process log, used by tests and when no persistent log is configured.
#[derive(Default)]
pub struct MemoryLogStore {
    events: RwLock<Vec<LogEvent>>,
}

impl MemoryLogStore {
    pub fn new() -> Self { Self::default() }

    pub fn with_events(events: Vec<LogEvent>) -> Self {
        Self { events: RwLock::new(events) }
    }
}

impl LogStore for MemoryLogStore {
    fn append(&self, event: &LogEvent) -> Result<()> {
        self.events.write().push(event.clone());
        Ok(())
    }

    fn scan(&self) -> Result<EventScan<'_>> {
        let snapshot = self.events.read().clone();
        Ok(Box::new(snapshot.into_iter().map(Ok)))
    }

    fn len(&self) -> Result<usize> { Ok(self.events.read().len()) }
}
