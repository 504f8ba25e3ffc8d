//! In-memory mock gateways for store and timer tests.
//!
//! Call-counting, failure injection via builder helpers, and a
//! `push_snapshot` hook to simulate another client writing to the backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use repflow_domain::{Category, Entry, RepFlowError, Result, WatchTimeMap, WorkoutSession};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::ports::{CollectionGateway, DocumentGateway, Record};
use super::{LibraryGateways, LibraryService};

pub(crate) struct MockCollection<T> {
    records: Mutex<Vec<T>>,
    subscribers: Mutex<Vec<UnboundedSender<Vec<T>>>>,
    save_calls: AtomicUsize,
    deleted: Mutex<Vec<String>>,
    fail_writes: bool,
}

impl<T: Record> MockCollection<T> {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
            save_calls: AtomicUsize::new(0),
            deleted: Mutex::new(Vec::new()),
            fail_writes: false,
        }
    }

    pub fn failing() -> Self {
        Self { fail_writes: true, ..Self::new() }
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.deleted.lock().clone()
    }

    pub fn records(&self) -> Vec<T> {
        self.records.lock().clone()
    }

    /// Deliver a snapshot to every live subscriber, as if another client had
    /// changed the remote collection.
    pub fn push_snapshot(&self, records: Vec<T>) {
        self.subscribers.lock().retain(|tx| tx.send(records.clone()).is_ok());
    }
}

#[async_trait]
impl<T: Record> CollectionGateway<T> for MockCollection<T> {
    fn subscribe(&self) -> UnboundedReceiver<Vec<T>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    async fn save_all(&self, records: &[T]) -> Result<()> {
        if self.fail_writes {
            return Err(RepFlowError::Persistence("write rejected".to_string()));
        }
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        let mut stored = self.records.lock();
        for record in records {
            match stored.iter_mut().find(|r| r.id() == record.id()) {
                Some(slot) => *slot = record.clone(),
                None => stored.push(record.clone()),
            }
        }
        Ok(())
    }

    async fn delete_one(&self, id: &str) -> Result<()> {
        if self.fail_writes {
            return Err(RepFlowError::Persistence("delete rejected".to_string()));
        }
        self.records.lock().retain(|r| r.id() != id);
        self.deleted.lock().push(id.to_string());
        Ok(())
    }
}

pub(crate) struct MockDocument<T> {
    value: Mutex<T>,
    subscribers: Mutex<Vec<UnboundedSender<T>>>,
    save_calls: AtomicUsize,
    fail_writes: bool,
}

impl<T: Clone + Default + Send + Sync + 'static> MockDocument<T> {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(T::default()),
            subscribers: Mutex::new(Vec::new()),
            save_calls: AtomicUsize::new(0),
            fail_writes: false,
        }
    }

    pub fn failing() -> Self {
        Self { fail_writes: true, ..Self::new() }
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn value(&self) -> T {
        self.value.lock().clone()
    }

    pub fn push_snapshot(&self, value: T) {
        self.subscribers.lock().retain(|tx| tx.send(value.clone()).is_ok());
    }
}

#[async_trait]
impl<T: Clone + Default + Send + Sync + 'static> DocumentGateway<T> for MockDocument<T> {
    fn subscribe(&self) -> UnboundedReceiver<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        rx
    }

    async fn save(&self, value: &T) -> Result<()> {
        if self.fail_writes {
            return Err(RepFlowError::Persistence("write rejected".to_string()));
        }
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        *self.value.lock() = value.clone();
        Ok(())
    }

    async fn load(&self) -> Result<T> {
        Ok(self.value.lock().clone())
    }
}

/// Mock gateways plus the service built over them.
pub(crate) struct Harness {
    pub categories: Arc<MockCollection<Category>>,
    pub entries: Arc<MockCollection<Entry>>,
    pub sessions: Arc<MockCollection<WorkoutSession>>,
    pub watch_time: Arc<MockDocument<WatchTimeMap>>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            categories: Arc::new(MockCollection::new()),
            entries: Arc::new(MockCollection::new()),
            sessions: Arc::new(MockCollection::new()),
            watch_time: Arc::new(MockDocument::new()),
        }
    }

    /// Every gateway rejects writes with a persistence error.
    pub fn failing() -> Self {
        Self {
            categories: Arc::new(MockCollection::failing()),
            entries: Arc::new(MockCollection::failing()),
            sessions: Arc::new(MockCollection::failing()),
            watch_time: Arc::new(MockDocument::failing()),
        }
    }

    pub fn gateways(&self) -> LibraryGateways {
        LibraryGateways {
            categories: self.categories.clone(),
            entries: self.entries.clone(),
            sessions: self.sessions.clone(),
            watch_time: self.watch_time.clone(),
        }
    }

    pub fn service(&self) -> LibraryService {
        LibraryService::new(self.gateways())
    }
}
