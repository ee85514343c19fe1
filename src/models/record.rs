// file: src/models/record.rs
// description: extracted medical record fields and storage receipt
// reference: internal data structures

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Sentinel carried in any field the extractor could not locate. Absence is
/// explicit so downstream consumers can tell a missing field from a silently
/// dropped one.
pub const NOT_FOUND: &str = "not found";

/// The four named medical fields extracted from a report. `parse_error`
/// distinguishes a record that genuinely had no data from one whose backend
/// response could not be parsed at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub patient_id: String,
    pub drug_name: String,
    pub event_description: String,
    pub event_date: String,
    pub parse_error: bool,
}

impl ExtractedRecord {
    pub fn new(
        patient_id: Option<String>,
        drug_name: Option<String>,
        event_description: Option<String>,
        event_date: Option<String>,
    ) -> Self {
        Self {
            patient_id: field_or_sentinel(patient_id),
            drug_name: field_or_sentinel(drug_name),
            event_description: field_or_sentinel(event_description),
            event_date: field_or_sentinel(event_date),
            parse_error: false,
        }
    }

    /// Record returned when the backend response is irrecoverably unparseable.
    /// Extraction failure is a valid terminal outcome, not an error.
    pub fn degraded() -> Self {
        Self {
            patient_id: NOT_FOUND.to_string(),
            drug_name: NOT_FOUND.to_string(),
            event_description: NOT_FOUND.to_string(),
            event_date: NOT_FOUND.to_string(),
            parse_error: true,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.parse_error
    }

    /// Text chunk embedded into the vector store for similarity retrieval.
    pub fn embed_text(&self) -> String {
        format!(
            "Event Description: {} for Drug: {}",
            self.event_description, self.drug_name
        )
    }
}

fn field_or_sentinel(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => NOT_FOUND.to_string(),
    }
}

/// Correlates one extracted record with the persisted-record identifiers
/// returned by the store. Attached for display only; classification logic
/// never reads it back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageReceipt {
    pub case_ids: Vec<String>,
    pub stored_at: u64,
}

impl StorageReceipt {
    pub fn new(case_ids: Vec<String>) -> Self {
        let stored_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self { case_ids, stored_at }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_fields_become_sentinel() {
        let record = ExtractedRecord::new(
            Some("P-001".to_string()),
            None,
            Some("  ".to_string()),
            Some("2024-01-05".to_string()),
        );

        assert_eq!(record.patient_id, "P-001");
        assert_eq!(record.drug_name, NOT_FOUND);
        assert_eq!(record.event_description, NOT_FOUND);
        assert_eq!(record.event_date, "2024-01-05");
        assert!(!record.parse_error);
    }

    #[test]
    fn test_degraded_record() {
        let record = ExtractedRecord::degraded();
        assert!(record.is_degraded());
        assert_eq!(record.patient_id, NOT_FOUND);
        assert_eq!(record.event_description, NOT_FOUND);
    }

    #[test]
    fn test_embed_text_format() {
        let record = ExtractedRecord::new(
            None,
            Some("DrugX".to_string()),
            Some("cardiac arrest".to_string()),
            None,
        );
        assert_eq!(
            record.embed_text(),
            "Event Description: cardiac arrest for Drug: DrugX"
        );
    }
}
