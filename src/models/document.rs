// file: src/models/document.rs
// description: ingested safety report document model
// reference: internal data structures

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Text,
    Pdf,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Text => "text",
            DocumentKind::Pdf => "pdf",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" | "text" => Some(DocumentKind::Text),
            "pdf" => Some(DocumentKind::Pdf),
            _ => None,
        }
    }
}

/// Raw safety report text plus its source identifier. Immutable once loaded;
/// the pipeline owns it for the duration of a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub source: String,
    pub kind: DocumentKind,
    pub text: String,
    pub content_hash: String,
    pub loaded_at: u64,
}

impl Document {
    pub fn new(source: String, kind: DocumentKind, text: String) -> Self {
        let content_hash = Self::compute_hash(&text);
        let loaded_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            source,
            kind,
            text,
            content_hash,
            loaded_at,
        }
    }

    fn compute_hash(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_creation() {
        let doc = Document::new(
            "report.txt".to_string(),
            DocumentKind::Text,
            "Patient experienced a rash.".to_string(),
        );

        assert_eq!(doc.source, "report.txt");
        assert_eq!(doc.kind, DocumentKind::Text);
        assert!(!doc.content_hash.is_empty());
    }

    #[test]
    fn test_hash_consistency() {
        let a = Document::new("a".to_string(), DocumentKind::Text, "same".to_string());
        let b = Document::new("b".to_string(), DocumentKind::Text, "same".to_string());
        assert_eq!(a.content_hash, b.content_hash);
    }

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(DocumentKind::from_extension("PDF"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_extension("txt"), Some(DocumentKind::Text));
        assert_eq!(DocumentKind::from_extension("docx"), None);
    }
}
