use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::errors::CoreError;
use crate::models::document::{Collection, Document, Fields};

/// Trait abstraction for the document store holding the three collections.
///
/// Each backend (in-memory, Firestore) implements this trait; the rest of
/// the library only ever talks to `dyn StorageGateway`. Every call targets
/// exactly one collection, and there are no cross-collection transactions.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    /// Human-readable name of this backend (for logs/errors).
    fn name(&self) -> &str;

    /// Live snapshots of one collection, starting with the current contents.
    async fn subscribe(&self, collection: Collection) -> Result<Subscription, CoreError>;

    /// Store a new record and return the id the store assigned to it.
    async fn create(&self, collection: Collection, fields: Fields) -> Result<String, CoreError>;

    /// Overwrite the given fields of an existing record.
    /// Fails with `CoreError::NotFound` if `id` does not exist.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), CoreError>;

    /// Fails with `CoreError::NotFound` if `id` does not exist.
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), CoreError>;

    /// One-off read of the whole collection.
    async fn list_once(&self, collection: Collection) -> Result<Vec<Document>, CoreError>;
}

/// Handle on a collection subscription.
///
/// Backed by a `watch` channel: only the most recent snapshot is kept, so a
/// slow consumer skips intermediate snapshots instead of replaying them.
/// Dropping the handle (or calling [`unsubscribe`](Self::unsubscribe)) ends
/// the subscription and stops any polling task behind it.
#[derive(Debug)]
pub struct Subscription {
    collection: Collection,
    receiver: watch::Receiver<Vec<Document>>,
    initial_pending: bool,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(collection: Collection, receiver: watch::Receiver<Vec<Document>>) -> Self {
        Self {
            collection,
            receiver,
            initial_pending: true,
            task: None,
        }
    }

    /// Subscription fed by a background task, aborted on teardown.
    pub fn with_task(
        collection: Collection,
        receiver: watch::Receiver<Vec<Document>>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            collection,
            receiver,
            initial_pending: true,
            task: Some(task),
        }
    }

    #[must_use]
    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// The latest snapshot, without waiting.
    #[must_use]
    pub fn current(&self) -> Vec<Document> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next snapshot. The first call returns the initial
    /// contents immediately. Returns `None` once the store side is gone.
    ///
    /// Cancel safe.
    pub async fn next(&mut self) -> Option<Vec<Document>> {
        if self.initial_pending {
            self.initial_pending = false;
            return Some(self.receiver.borrow_and_update().clone());
        }
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    pub fn unsubscribe(self) {
        tracing::info!("unsubscribed from {}", self.collection);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
