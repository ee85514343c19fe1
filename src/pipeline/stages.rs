// file: src/pipeline/stages.rs
// description: the four sequential classification stages
// reference: stage contracts over the pluggable backend

use crate::backend::{
    ClassificationBackend, StageBackend, find_json_array, find_json_object, heuristic, prompts,
    strip_code_fences,
};
use crate::models::{
    AdverseEventCall, Document, ExtractedRecord, FormType, SeriousnessCriterion,
    SeriousnessReport, StorageReceipt, Verdict,
};
use crate::store::VectorStore;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Identifies the report's template variant. The document text flows through
/// verbatim; triage never summarizes or truncates.
pub struct TriageStage {
    backend: StageBackend,
}

impl TriageStage {
    pub fn new(model: Option<Arc<dyn ClassificationBackend>>) -> Self {
        Self {
            backend: StageBackend::new("triage", model, heuristic::triage),
        }
    }

    pub async fn run(&self, document: &Document) -> FormType {
        let response = self.backend.classify(prompts::TRIAGE, &document.text).await;
        let form_type = FormType::from_response(&response);
        info!("Triage: {} classified as {}", document.source, form_type.as_str());
        form_type
    }

    pub fn backend(&self) -> &StageBackend {
        &self.backend
    }
}

/// Extracts the four named fields and persists the record. Parse failure is
/// a degraded outcome, not an error; storage failure yields a stub receipt
/// so the run always continues.
pub struct ExtractionStage {
    backend: StageBackend,
    store: Arc<dyn VectorStore>,
}

#[derive(Debug, Deserialize)]
struct RawFields {
    #[serde(default)]
    patient_id: Option<String>,
    #[serde(default)]
    drug_name: Option<String>,
    #[serde(default)]
    event_description: Option<String>,
    #[serde(default)]
    event_date: Option<String>,
}

impl ExtractionStage {
    pub fn new(model: Option<Arc<dyn ClassificationBackend>>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            backend: StageBackend::new("extraction", model, heuristic::extract_fields),
            store,
        }
    }

    pub async fn run(&self, text: &str) -> (ExtractedRecord, StorageReceipt) {
        let response = self.backend.classify(prompts::EXTRACTION, text).await;
        let record = Self::parse_record(&response);

        if record.is_degraded() {
            warn!("Extraction produced a degraded record (unparseable response)");
        }

        let receipt = match self.store.add_record(&record.embed_text(), &record).await {
            Ok(case_ids) => StorageReceipt::new(case_ids),
            Err(e) => {
                warn!("Case storage failed ({}), issuing unstored receipt", e);
                StorageReceipt::new(vec![format!("unstored-{}", Uuid::new_v4())])
            }
        };

        info!("Extraction: stored case {:?}", receipt.case_ids);
        (record, receipt)
    }

    /// Parses the backend response, stripping fenced-code wrappers first and
    /// falling back to the first balanced JSON object embedded in prose.
    fn parse_record(response: &str) -> ExtractedRecord {
        let cleaned = strip_code_fences(response);

        let raw: Option<RawFields> = serde_json::from_str(&cleaned).ok().or_else(|| {
            find_json_object(&cleaned).and_then(|candidate| serde_json::from_str(candidate).ok())
        });

        match raw {
            Some(fields) => ExtractedRecord::new(
                fields.patient_id,
                fields.drug_name,
                fields.event_description,
                fields.event_date,
            ),
            None => ExtractedRecord::degraded(),
        }
    }

    pub fn backend(&self) -> &StageBackend {
        &self.backend
    }
}

/// Classifies the event description as adverse or not. Sees only the
/// description, never the full document or the other extracted fields.
pub struct SafetyStage {
    backend: StageBackend,
}

impl SafetyStage {
    pub fn new(model: Option<Arc<dyn ClassificationBackend>>) -> Self {
        Self {
            backend: StageBackend::new("safety", model, heuristic::adverse_event),
        }
    }

    pub async fn run(&self, event_description: &str) -> Verdict {
        let response = self
            .backend
            .classify(prompts::ADVERSE_EVENT, event_description)
            .await;
        let call = AdverseEventCall::from_response(&response);
        info!("Safety assessment: {}", call.as_str());
        Verdict::new(call, event_description.to_string())
    }

    pub fn backend(&self) -> &StageBackend {
        &self.backend
    }
}

/// Grades an adverse event against the fixed seriousness vocabulary. A
/// non-adverse verdict short-circuits without touching the backend; an
/// irrelevant classification call risks hallucinated criteria on a
/// non-event.
pub struct SeriousnessStage {
    backend: StageBackend,
}

impl SeriousnessStage {
    pub fn new(model: Option<Arc<dyn ClassificationBackend>>) -> Self {
        Self {
            backend: StageBackend::new("seriousness", model, heuristic::seriousness),
        }
    }

    pub async fn run(&self, verdict: &Verdict) -> SeriousnessReport {
        if verdict.call == AdverseEventCall::No {
            return SeriousnessReport::new(
                verdict.clone(),
                Vec::new(),
                Some("No seriousness classification needed for a non-adverse event".to_string()),
            );
        }

        let response = self
            .backend
            .classify(prompts::SERIOUSNESS, &verdict.event_description)
            .await;
        let criteria = Self::parse_criteria(&response);
        info!(
            "Seriousness: {} criteria apply",
            criteria.len()
        );
        SeriousnessReport::new(verdict.clone(), criteria, None)
    }

    /// Parses the list-like response. Prefers a JSON array; falls back to
    /// scanning the text for criterion names. Unrecognized labels are
    /// dropped, never propagated.
    fn parse_criteria(response: &str) -> Vec<SeriousnessCriterion> {
        let cleaned = strip_code_fences(response);

        let labels: Option<Vec<String>> = serde_json::from_str(&cleaned).ok().or_else(|| {
            find_json_array(&cleaned).and_then(|candidate| serde_json::from_str(candidate).ok())
        });

        if let Some(labels) = labels {
            return labels
                .iter()
                .filter_map(|label| SeriousnessCriterion::parse(label))
                .collect();
        }

        // Last resort: name scan over the raw text.
        let lower = cleaned.to_lowercase();
        let mentions: [(SeriousnessCriterion, &[&str]); 5] = [
            (SeriousnessCriterion::Death, &["death"]),
            (
                SeriousnessCriterion::LifeThreatening,
                &["life-threatening", "life threatening"],
            ),
            (
                SeriousnessCriterion::Hospitalization,
                &["hospitalization", "hospitalisation"],
            ),
            (SeriousnessCriterion::Disability, &["disability"]),
            (
                SeriousnessCriterion::CongenitalAnomaly,
                &["congenital anomaly", "congenital"],
            ),
        ];

        mentions
            .into_iter()
            .filter(|(_, needles)| needles.iter().any(|n| lower.contains(n)))
            .map(|(criterion, _)| criterion)
            .collect()
    }

    pub fn backend(&self) -> &StageBackend {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::ScriptedBackend;
    use crate::models::{DocumentKind, NOT_FOUND};
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn document(text: &str) -> Document {
        Document::new("report.txt".to_string(), DocumentKind::Text, text.to_string())
    }

    #[tokio::test]
    async fn test_triage_never_leaves_closed_vocabulary() {
        let responses = [
            "MedWatch",
            "it looks like a CIOMS form",
            "I am not sure, possibly a fax cover sheet",
            "",
        ];
        for response in responses {
            let stage = TriageStage::new(Some(Arc::new(ScriptedBackend::answering(response))));
            let form_type = stage.run(&document("some report")).await;
            assert!(matches!(
                form_type,
                FormType::MedWatch | FormType::Cioms | FormType::E2b | FormType::Unknown
            ));
        }
    }

    #[tokio::test]
    async fn test_extraction_fenced_response_equals_unwrapped() {
        let body = r#"{"patient_id": "P-1", "drug_name": "DrugX", "event_description": "rash", "event_date": "2024-01-05"}"#;
        let fenced = format!("```json\n{}\n```", body);

        let direct = ExtractionStage::parse_record(body);
        let unwrapped = ExtractionStage::parse_record(&fenced);
        assert_eq!(direct, unwrapped);
        assert_eq!(direct.drug_name, "DrugX");
    }

    #[tokio::test]
    async fn test_extraction_recovers_object_embedded_in_prose() {
        let response = "Sure! Here is the extraction:\n{\"drug_name\": \"DrugX\"}\nLet me know.";
        let record = ExtractionStage::parse_record(response);
        assert_eq!(record.drug_name, "DrugX");
        assert_eq!(record.patient_id, NOT_FOUND);
        assert!(!record.parse_error);
    }

    #[tokio::test]
    async fn test_extraction_unparseable_degrades_but_still_stores() {
        let stage = ExtractionStage::new(
            Some(Arc::new(ScriptedBackend::answering("I could not find any data, sorry."))),
            Arc::new(MemoryStore::new()),
        );

        let (record, receipt) = stage.run("some report text").await;

        assert!(record.parse_error);
        assert_eq!(record.patient_id, NOT_FOUND);
        assert_eq!(record.drug_name, NOT_FOUND);
        assert_eq!(record.event_description, NOT_FOUND);
        assert_eq!(record.event_date, NOT_FOUND);
        assert_eq!(receipt.case_ids.len(), 1);
    }

    #[tokio::test]
    async fn test_safety_ambiguous_response_is_indeterminate() {
        let stage = SafetyStage::new(Some(Arc::new(ScriptedBackend::answering(
            "It might be, depending on context",
        ))));
        let verdict = stage.run("mild headache").await;
        assert_eq!(verdict.call, AdverseEventCall::Indeterminate);
        assert_eq!(verdict.event_description, "mild headache");
    }

    #[tokio::test]
    async fn test_seriousness_short_circuits_without_backend_call() {
        let model = Arc::new(ScriptedBackend::answering("[\"Death\"]"));
        let stage = SeriousnessStage::new(Some(model.clone()));

        let verdict = Verdict::new(AdverseEventCall::No, "mild headache".to_string());
        let report = stage.run(&verdict).await;

        assert!(report.criteria.is_empty());
        assert!(report.note.is_some());
        assert_eq!(model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_seriousness_runs_for_indeterminate_verdict() {
        let model = Arc::new(ScriptedBackend::answering("[\"Hospitalization\"]"));
        let stage = SeriousnessStage::new(Some(model.clone()));

        let verdict = Verdict::new(AdverseEventCall::Indeterminate, "admitted".to_string());
        let report = stage.run(&verdict).await;

        assert_eq!(report.criteria, vec![SeriousnessCriterion::Hospitalization]);
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_seriousness_drops_unrecognized_labels() {
        let criteria =
            SeriousnessStage::parse_criteria("[\"Death\", \"Severe\", \"Hospitalization\"]");
        assert_eq!(
            criteria,
            vec![
                SeriousnessCriterion::Death,
                SeriousnessCriterion::Hospitalization
            ]
        );
    }

    #[tokio::test]
    async fn test_seriousness_name_scan_fallback() {
        let criteria = SeriousnessStage::parse_criteria(
            "The event meets Death and Life-Threatening criteria.",
        );
        assert_eq!(
            criteria,
            vec![
                SeriousnessCriterion::Death,
                SeriousnessCriterion::LifeThreatening
            ]
        );
    }
}
