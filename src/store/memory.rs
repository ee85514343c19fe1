// file: src/store/memory.rs
// description: in-memory vector store stub with synthetic case IDs

use crate::error::Result;
use crate::models::ExtractedRecord;
use crate::store::{SearchHit, VectorStore};
use async_trait::async_trait;
use std::sync::Mutex;
use uuid::Uuid;

struct StoredCase {
    case_id: String,
    case_text: String,
    record: ExtractedRecord,
}

/// Credential-free fallback store. Never fails, so the pipeline can always
/// produce a receipt even with no infrastructure behind it.
#[derive(Default)]
pub struct MemoryStore {
    cases: Mutex<Vec<StoredCase>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn add_record(&self, text: &str, metadata: &ExtractedRecord) -> Result<Vec<String>> {
        let case_id = Uuid::new_v4().to_string();
        let mut cases = self.cases.lock().expect("memory store lock poisoned");
        cases.push(StoredCase {
            case_id: case_id.clone(),
            case_text: text.to_string(),
            record: metadata.clone(),
        });
        Ok(vec![case_id])
    }

    /// Term-overlap scoring stands in for vector similarity: the fraction of
    /// query terms present in the stored case text.
    async fn similarity_search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let terms: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let cases = self.cases.lock().expect("memory store lock poisoned");
        let mut hits: Vec<SearchHit> = cases
            .iter()
            .filter_map(|case| {
                let haystack = case.case_text.to_lowercase();
                let matched = terms.iter().filter(|t| haystack.contains(*t)).count();
                if matched == 0 {
                    return None;
                }
                Some(SearchHit {
                    case_id: case.case_id.clone(),
                    case_text: case.case_text.clone(),
                    drug_name: case.record.drug_name.clone(),
                    event_description: case.record.event_description.clone(),
                    score: matched as f32 / terms.len() as f32,
                    distance: None,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn count(&self) -> Result<u64> {
        let cases = self.cases.lock().expect("memory store lock poisoned");
        Ok(cases.len() as u64)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(drug: &str, event: &str) -> ExtractedRecord {
        ExtractedRecord::new(
            None,
            Some(drug.to_string()),
            Some(event.to_string()),
            None,
        )
    }

    #[tokio::test]
    async fn test_add_record_returns_synthetic_id() {
        let store = MemoryStore::new();
        let record = record("DrugX", "cardiac arrest");

        let ids = store
            .add_record(&record.embed_text(), &record)
            .await
            .unwrap();

        assert_eq!(ids.len(), 1);
        assert!(!ids[0].is_empty());
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_ranks_by_term_overlap() {
        let store = MemoryStore::new();
        let a = record("DrugX", "cardiac arrest");
        let b = record("DrugY", "mild rash");
        store.add_record(&a.embed_text(), &a).await.unwrap();
        store.add_record(&b.embed_text(), &b).await.unwrap();

        let hits = store.similarity_search("cardiac arrest", 5).await.unwrap();
        assert_eq!(hits[0].drug_name, "DrugX");
        assert!(hits[0].score >= hits.last().unwrap().score);
    }

    #[tokio::test]
    async fn test_search_with_no_match_is_empty() {
        let store = MemoryStore::new();
        let hits = store.similarity_search("anything", 5).await.unwrap();
        assert!(hits.is_empty());
    }
}
