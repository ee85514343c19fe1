// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod backend;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod store;
pub mod utils;

pub use backend::{ClassificationBackend, GroqChatClient, StageBackend};
pub use config::{Config, ModelConfig, PipelineConfig, StoreConfig};
pub use error::{PipelineError, Result};
pub use loader::DocumentLoader;
pub use models::{
    AdverseEventCall, CaseReport, Document, DocumentKind, ExtractedRecord, FormType,
    SeriousnessCriterion, SeriousnessReport, StorageReceipt, Verdict,
};
pub use pipeline::Pipeline;
pub use store::{LanceStore, MemoryStore, SearchHit, VectorStore, connect_store};
pub use utils::Validator;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let _config = Config::default_config();
        let _loader = DocumentLoader::new(10);
    }
}
