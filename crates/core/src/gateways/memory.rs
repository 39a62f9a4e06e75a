use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::document::{Collection, Document, Fields};
use super::traits::{StorageGateway, Subscription};

const NAME: &str = "Memory";

/// In-process document store.
///
/// Keeps each collection in insertion order, assigns uuid v4 ids and
/// publishes the full collection to subscribers after every write. Used
/// when no remote store is configured, and as the test double.
pub struct MemoryGateway {
    state: Mutex<State>,
    channels: HashMap<Collection, watch::Sender<Vec<Document>>>,
}

#[derive(Default)]
struct State {
    documents: HashMap<Collection, Vec<Document>>,
    /// Messages of injected failures, consumed one per call.
    failures: Vec<String>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        let channels = Collection::ALL
            .iter()
            .map(|c| (*c, watch::channel(Vec::new()).0))
            .collect();
        Self {
            state: Mutex::new(State::default()),
            channels,
        }
    }

    /// Pre-populate a collection (ids are kept as given).
    pub fn with_documents(self, collection: Collection, documents: Vec<Document>) -> Self {
        {
            let mut state = self.lock();
            state.documents.insert(collection, documents);
            self.publish(&state, collection);
        }
        self
    }

    /// Make the next gateway call fail with a storage error.
    /// Several calls queue several failures.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.lock().failures.push(message.into());
    }

    pub fn document_count(&self, collection: Collection) -> usize {
        self.lock().documents.get(&collection).map_or(0, Vec::len)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_failure(state: &mut State) -> Result<(), CoreError> {
        if state.failures.is_empty() {
            return Ok(());
        }
        let message = state.failures.remove(0);
        Err(CoreError::Storage {
            gateway: NAME.into(),
            message,
        })
    }

    fn publish(&self, state: &State, collection: Collection) {
        if let Some(sender) = self.channels.get(&collection) {
            let snapshot = state.documents.get(&collection).cloned().unwrap_or_default();
            sender.send_replace(snapshot);
        }
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageGateway for MemoryGateway {
    fn name(&self) -> &str {
        NAME
    }

    async fn subscribe(&self, collection: Collection) -> Result<Subscription, CoreError> {
        Self::take_failure(&mut self.lock())?;
        let sender = self.channels.get(&collection).ok_or_else(|| CoreError::Storage {
            gateway: NAME.into(),
            message: format!("no channel for {collection}"),
        })?;
        Ok(Subscription::new(collection, sender.subscribe()))
    }

    async fn create(&self, collection: Collection, fields: Fields) -> Result<String, CoreError> {
        let mut state = self.lock();
        Self::take_failure(&mut state)?;

        let id = Uuid::new_v4().to_string();
        state
            .documents
            .entry(collection)
            .or_default()
            .push(Document::new(id.clone(), fields));
        self.publish(&state, collection);
        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), CoreError> {
        let mut state = self.lock();
        Self::take_failure(&mut state)?;

        let doc = state
            .documents
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| CoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        doc.fields.extend(fields);
        self.publish(&state, collection);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), CoreError> {
        let mut state = self.lock();
        Self::take_failure(&mut state)?;

        let docs = state.documents.entry(collection).or_default();
        let idx = docs
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| CoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        docs.remove(idx);
        self.publish(&state, collection);
        Ok(())
    }

    async fn list_once(&self, collection: Collection) -> Result<Vec<Document>, CoreError> {
        let mut state = self.lock();
        Self::take_failure(&mut state)?;
        Ok(state.documents.get(&collection).cloned().unwrap_or_default())
    }
}
