// file: src/pipeline/mod.rs
// description: pipeline module exports

pub mod orchestrator;
pub mod stages;

pub use orchestrator::Pipeline;
pub use stages::{ExtractionStage, SafetyStage, SeriousnessStage, TriageStage};
