//! In-memory document-replication backend.
//!
//! A local stand-in for the real-time document store: one document per
//! record keyed by id, with every write fanned out to all live subscribers
//! as a full-collection snapshot. The writer's own changes echo back
//! through its subscription, exactly like the remote backend. Used by tests
//! and local runs; a production deployment reaches its replication service
//! through the same gateway traits.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use repflow_core::store::ports::{CollectionGateway, DocumentGateway, Record};
use repflow_core::LibraryGateways;
use repflow_domain::{Category, Entry, Result, WatchTimeMap, WorkoutSession};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// A replicated collection held in memory.
pub struct MemoryCollection<T> {
    docs: Mutex<BTreeMap<String, T>>,
    subscribers: Mutex<Vec<UnboundedSender<Vec<T>>>>,
}

impl<T: Record> MemoryCollection<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { docs: Mutex::new(BTreeMap::new()), subscribers: Mutex::new(Vec::new()) }
    }

    /// Seed the collection with existing records.
    #[must_use]
    pub fn with_records(records: Vec<T>) -> Self {
        let collection = Self::new();
        {
            let mut docs = collection.docs.lock();
            for record in records {
                docs.insert(record.id().to_string(), record);
            }
        }
        collection
    }

    /// Current documents, in key order.
    pub fn documents(&self) -> Vec<T> {
        self.docs.lock().values().cloned().collect()
    }

    fn broadcast(&self) {
        let snapshot = self.documents();
        self.subscribers.lock().retain(|tx| tx.send(snapshot.clone()).is_ok());
    }
}

impl<T: Record> Default for MemoryCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Record> CollectionGateway<T> for MemoryCollection<T> {
    fn subscribe(&self) -> UnboundedReceiver<Vec<T>> {
        let (tx, rx) = mpsc::unbounded_channel();
        // New subscribers receive the current snapshot immediately.
        let _ = tx.send(self.documents());
        self.subscribers.lock().push(tx);
        rx
    }

    async fn save_all(&self, records: &[T]) -> Result<()> {
        {
            let mut docs = self.docs.lock();
            for record in records {
                docs.insert(record.id().to_string(), record.clone());
            }
        }
        self.broadcast();
        Ok(())
    }

    async fn delete_one(&self, id: &str) -> Result<()> {
        let removed = self.docs.lock().remove(id).is_some();
        if removed {
            self.broadcast();
        } else {
            debug!(id, "delete_one on absent record");
        }
        Ok(())
    }
}

/// A single replicated document held in memory.
pub struct MemoryDocument<T> {
    value: Mutex<Option<T>>,
    subscribers: Mutex<Vec<UnboundedSender<T>>>,
}

impl<T: Clone + Default + Send + Sync + 'static> MemoryDocument<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { value: Mutex::new(None), subscribers: Mutex::new(Vec::new()) }
    }

    fn current(&self) -> T {
        self.value.lock().clone().unwrap_or_default()
    }

    fn broadcast(&self) {
        let snapshot = self.current();
        self.subscribers.lock().retain(|tx| tx.send(snapshot.clone()).is_ok());
    }
}

impl<T: Clone + Default + Send + Sync + 'static> Default for MemoryDocument<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Clone + Default + Send + Sync + 'static> DocumentGateway<T> for MemoryDocument<T> {
    fn subscribe(&self) -> UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(self.current());
        self.subscribers.lock().push(tx);
        rx
    }

    async fn save(&self, value: &T) -> Result<()> {
        *self.value.lock() = Some(value.clone());
        self.broadcast();
        Ok(())
    }

    async fn load(&self) -> Result<T> {
        Ok(self.current())
    }
}

/// The four in-memory gateways bundled under one namespace.
///
/// The collection handles stay public so tests can act as a second client
/// writing to the backend directly.
pub struct MemoryBackend {
    pub categories: Arc<MemoryCollection<Category>>,
    pub entries: Arc<MemoryCollection<Entry>>,
    pub sessions: Arc<MemoryCollection<WorkoutSession>>,
    pub watch_time: Arc<MemoryDocument<WatchTimeMap>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            categories: Arc::new(MemoryCollection::new()),
            entries: Arc::new(MemoryCollection::new()),
            sessions: Arc::new(MemoryCollection::new()),
            watch_time: Arc::new(MemoryDocument::new()),
        }
    }

    /// Gateway handles for wiring a `LibraryService`.
    #[must_use]
    pub fn gateways(&self) -> LibraryGateways {
        LibraryGateways {
            categories: self.categories.clone(),
            entries: self.entries.clone(),
            sessions: self.sessions.clone(),
            watch_time: self.watch_time.clone(),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}
