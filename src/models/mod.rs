// file: src/models/mod.rs
// description: data model exports

pub mod document;
pub mod record;
pub mod report;

pub use document::{Document, DocumentKind};
pub use record::{ExtractedRecord, NOT_FOUND, StorageReceipt};
pub use report::{
    AdverseEventCall, CaseReport, ExtractionSection, FormType, SeriousnessCriterion,
    SeriousnessReport, Verdict,
};
