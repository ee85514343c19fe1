// file: src/store/mod.rs
// description: persistence collaborator interface for extracted case records

pub mod embeddings;
pub mod lance;
pub mod memory;

pub use embeddings::EmbeddingClient;
pub use lance::LanceStore;
pub use memory::MemoryStore;

use crate::config::StoreConfig;
use crate::error::Result;
use crate::models::ExtractedRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// One stored case returned by a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub case_id: String,
    pub case_text: String,
    pub drug_name: String,
    pub event_description: String,
    pub score: f32,
    pub distance: Option<f32>,
}

/// Persistence collaborator for extracted records. Implementations must not
/// let storage problems break a pipeline run; the in-memory stub exists so
/// the pipeline stays runnable without live infrastructure.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Persists one record and returns the identifiers of the stored cases.
    async fn add_record(&self, text: &str, metadata: &ExtractedRecord) -> Result<Vec<String>>;

    async fn similarity_search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;

    async fn count(&self) -> Result<u64>;

    fn name(&self) -> &'static str;
}

/// Opens the configured LanceDB store, degrading to the in-memory stub when
/// the database cannot be reached so a missing credential or data directory
/// never blocks a run.
pub async fn connect_store(
    config: &StoreConfig,
    api_key: Option<String>,
) -> Arc<dyn VectorStore> {
    if config.uri.trim().is_empty() {
        warn!("No vector store URI configured, using in-memory stub");
        return Arc::new(MemoryStore::new());
    }

    match LanceStore::connect(config.clone(), api_key).await {
        Ok(store) => {
            info!("Connected to LanceDB at {}", config.uri);
            Arc::new(store)
        }
        Err(e) => {
            warn!("Vector store unavailable ({}), using in-memory stub", e);
            Arc::new(MemoryStore::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn test_empty_uri_degrades_to_stub() {
        let mut config = Config::default_config().store;
        config.uri = String::new();

        let store = connect_store(&config, None).await;
        assert_eq!(store.name(), "memory");
    }
}
