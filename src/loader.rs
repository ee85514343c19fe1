// file: src/loader.rs
// description: reads source documents (plain text or pdf) into raw text
// reference: https://docs.rs/pdf-extract

use crate::error::{PipelineError, Result};
use crate::models::{Document, DocumentKind};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

pub struct DocumentLoader {
    max_file_size_mb: usize,
}

impl DocumentLoader {
    pub fn new(max_file_size_mb: usize) -> Self {
        Self { max_file_size_mb }
    }

    /// Loads a document from disk. The kind is taken from the hint when
    /// given, otherwise inferred from the file extension.
    pub fn load_path(&self, path: &Path, kind_hint: Option<DocumentKind>) -> Result<Document> {
        let kind = match kind_hint {
            Some(kind) => kind,
            None => path
                .extension()
                .and_then(|e| e.to_str())
                .and_then(DocumentKind::from_extension)
                .ok_or_else(|| PipelineError::UnsupportedFormat {
                    path: path.display().to_string(),
                    reason: "cannot determine document kind from extension".to_string(),
                })?,
        };

        let bytes = fs::read(path).map_err(|source| PipelineError::FileOperation {
            path: path.to_path_buf(),
            source,
        })?;

        let max_bytes = self.max_file_size_mb * 1_048_576;
        if max_bytes > 0 && bytes.len() > max_bytes {
            return Err(PipelineError::Validation(format!(
                "File too large ({} bytes): {}",
                bytes.len(),
                path.display()
            )));
        }

        self.load_bytes(&bytes, &path.display().to_string(), kind)
    }

    /// Loads a document from an in-memory byte buffer.
    pub fn load_bytes(&self, bytes: &[u8], source: &str, kind: DocumentKind) -> Result<Document> {
        let text = match kind {
            DocumentKind::Text => String::from_utf8_lossy(bytes).into_owned(),
            DocumentKind::Pdf => self.extract_pdf_text(bytes, source)?,
        };

        if text.trim().is_empty() {
            return Err(PipelineError::UnsupportedFormat {
                path: source.to_string(),
                reason: "document yielded no extractable text".to_string(),
            });
        }

        debug!("Loaded {} ({} chars, {})", source, text.len(), kind.as_str());
        Ok(Document::new(source.to_string(), kind, text))
    }

    /// Concatenates per-page text in page order. Pages with no extractable
    /// text contribute an empty string; only a document where every page is
    /// empty fails.
    fn extract_pdf_text(&self, bytes: &[u8], source: &str) -> Result<String> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| {
            PipelineError::UnsupportedFormat {
                path: source.to_string(),
                reason: format!("PDF text extraction failed: {}", e),
            }
        })?;

        let empty_pages = pages.iter().filter(|p| p.trim().is_empty()).count();
        if empty_pages > 0 {
            warn!(
                "{}: {} of {} pages had no extractable text",
                source,
                empty_pages,
                pages.len()
            );
        }

        Ok(pages.join("\n"))
    }
}
