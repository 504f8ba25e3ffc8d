//! Port interfaces for the sync gateway
//!
//! These traits define the boundary between the domain store and the
//! real-time document-replication backend. The backend itself is a black
//! box: one document per record, addressed under an implicit single-user
//! namespace, with live subscriptions delivering full-collection snapshots
//! rather than deltas.

use async_trait::async_trait;
use repflow_domain::{Category, Entry, Result, WorkoutSession};
use tokio::sync::mpsc::UnboundedReceiver;

/// A record addressable by its identifier within a replicated collection.
pub trait Record: Clone + Send + Sync + 'static {
    /// Stable unique identifier of this record.
    fn id(&self) -> &str;
}

impl Record for Category {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Entry {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for WorkoutSession {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Trait for a replicated collection of records keyed by id.
#[async_trait]
pub trait CollectionGateway<T: Record>: Send + Sync {
    /// Register a live subscription.
    ///
    /// The receiver is handed the full current snapshot immediately and a
    /// fresh snapshot after every change, including this gateway's own
    /// writes echoing back. Delivery order across subscribers is
    /// unspecified, but each subscriber sees a consistent sequence of
    /// snapshots. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> UnboundedReceiver<Vec<T>>;

    /// Upsert every given record by identifier.
    ///
    /// Writes are issued per record, at-least-once: a single failing record
    /// surfaces as `RepFlowError::Persistence` without rolling back records
    /// already written.
    async fn save_all(&self, records: &[T]) -> Result<()>;

    /// Remove a single record by identifier. Succeeds when the id is absent.
    async fn delete_one(&self, id: &str) -> Result<()>;
}

/// Trait for a single replicated document holding one whole value.
///
/// The watch-time map is stored this way: one document, replaced atomically
/// from the caller's perspective.
#[async_trait]
pub trait DocumentGateway<T>: Send + Sync
where
    T: Clone + Default + Send + Sync + 'static,
{
    /// Live subscription delivering the full value on every change,
    /// starting with the current value.
    fn subscribe(&self) -> UnboundedReceiver<T>;

    /// Replace the stored value.
    async fn save(&self, value: &T) -> Result<()>;

    /// Load the current value; `T::default()` when the document is missing.
    async fn load(&self) -> Result<T>;
}
