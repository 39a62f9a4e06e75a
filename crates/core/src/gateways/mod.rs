pub mod feed;
pub mod firestore;
pub mod memory;
pub mod traits;

use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::settings::Settings;
use firestore::FirestoreGateway;
use memory::MemoryGateway;
use traits::StorageGateway;

/// Build the gateway the settings ask for: Firestore when configured,
/// the in-memory store otherwise.
pub fn from_settings(settings: &Settings) -> Result<Arc<dyn StorageGateway>, CoreError> {
    match &settings.firestore {
        Some(firestore) => {
            tracing::info!(
                "using Firestore project '{}' ({})",
                firestore.project_id,
                firestore.database
            );
            Ok(Arc::new(FirestoreGateway::new(firestore.clone())?))
        }
        None => {
            tracing::info!("no remote store configured, using in-memory store");
            Ok(Arc::new(MemoryGateway::new()))
        }
    }
}
