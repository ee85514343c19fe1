// file: src/pipeline/orchestrator.rs
// description: sequences the four stages and aggregates the final case report

use crate::backend::ClassificationBackend;
use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::models::{CaseReport, Document};
use crate::pipeline::stages::{ExtractionStage, SafetyStage, SeriousnessStage, TriageStage};
use crate::store::VectorStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// The sequential case pipeline. Stages receive their backend and store via
/// the constructor; a single instance may process many documents, sharing
/// each stage's sticky-fallback state across them.
pub struct Pipeline {
    triage: TriageStage,
    extraction: ExtractionStage,
    safety: SafetyStage,
    seriousness: SeriousnessStage,
    run_timeout_secs: u64,
}

impl Pipeline {
    pub fn new(
        config: &Config,
        model: Option<Arc<dyn ClassificationBackend>>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        let model = if config.pipeline.fast_mode {
            info!("Fast mode enabled, running heuristics only");
            None
        } else {
            model
        };

        Self {
            triage: TriageStage::new(model.clone()),
            extraction: ExtractionStage::new(model.clone(), store),
            safety: SafetyStage::new(model.clone()),
            seriousness: SeriousnessStage::new(model),
            run_timeout_secs: config.pipeline.run_timeout_secs,
        }
    }

    /// Processes one document through all four stages. Stage-local failures
    /// degrade in place, so the only fatal outcomes are the run-level
    /// timeout here and ingestion failures upstream of the pipeline.
    pub async fn process(&self, document: Document) -> Result<CaseReport> {
        if self.run_timeout_secs == 0 {
            return Ok(self.run(document).await);
        }

        let seconds = self.run_timeout_secs;
        tokio::time::timeout(Duration::from_secs(seconds), self.run(document))
            .await
            .map_err(|_| PipelineError::TimedOut { seconds })
    }

    async fn run(&self, document: Document) -> CaseReport {
        info!("Processing {}", document.source);

        let form_type = self.triage.run(&document).await;
        let (record, receipt) = self.extraction.run(&document.text).await;
        let verdict = self.safety.run(&record.event_description).await;
        let seriousness = self.seriousness.run(&verdict).await;

        CaseReport::assemble(document.source, form_type, record, receipt, seriousness)
    }

    /// Names of the stages currently downgraded to their heuristics.
    pub fn degraded_stages(&self) -> Vec<&'static str> {
        [
            self.triage.backend(),
            self.extraction.backend(),
            self.safety.backend(),
            self.seriousness.backend(),
        ]
        .into_iter()
        .filter(|b| b.is_degraded())
        .map(|b| b.stage())
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::ScriptedBackend;
    use crate::models::{AdverseEventCall, DocumentKind, FormType, SeriousnessCriterion};
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    const NARRATIVE: &str =
        "Patient experienced cardiac arrest after taking DrugX on 2024-01-05.";

    fn fast_config() -> Config {
        let mut config = Config::default_config();
        config.pipeline.fast_mode = true;
        config
    }

    fn document(text: &str) -> Document {
        Document::new("report.txt".to_string(), DocumentKind::Text, text.to_string())
    }

    #[tokio::test]
    async fn test_end_to_end_heuristic_run() {
        let config = fast_config();
        let pipeline = Pipeline::new(&config, None, Arc::new(MemoryStore::new()));

        let report = pipeline.process(document(NARRATIVE)).await.unwrap();

        assert_eq!(report.adverse_event, AdverseEventCall::Yes);
        assert_eq!(
            report.seriousness_criteria,
            vec![
                SeriousnessCriterion::Death,
                SeriousnessCriterion::LifeThreatening
            ]
        );
        assert_eq!(report.extraction.drug_name, "DrugX");
        assert_eq!(report.extraction.event_description, "cardiac arrest");
        assert_eq!(report.extraction.event_date, "2024-01-05");
        assert_eq!(report.extraction.case_ids.len(), 1);
        assert!(!report.extraction.parse_error);
    }

    #[tokio::test]
    async fn test_non_adverse_run_has_empty_criteria_and_note() {
        let config = fast_config();
        let pipeline = Pipeline::new(&config, None, Arc::new(MemoryStore::new()));

        let report = pipeline
            .process(document("Patient ID: P-2\nDrug: VitaPlus\nReaction: none noted\nPatient tolerated the dose well."))
            .await
            .unwrap();

        assert_eq!(report.adverse_event, AdverseEventCall::No);
        assert!(report.seriousness_criteria.is_empty());
        assert!(report.note.is_some());
    }

    #[tokio::test]
    async fn test_failing_model_degrades_every_stage_once() {
        let config = Config::default_config();
        let model = Arc::new(ScriptedBackend::failing());
        let pipeline = Pipeline::new(&config, Some(model.clone()), Arc::new(MemoryStore::new()));

        let first = pipeline.process(document(NARRATIVE)).await.unwrap();
        assert_eq!(first.adverse_event, AdverseEventCall::Yes);
        // Triage, extraction, safety, seriousness each tried the model once.
        let calls_after_first = model.call_count();
        assert_eq!(calls_after_first, 4);
        assert_eq!(
            pipeline.degraded_stages(),
            vec!["triage", "extraction", "safety", "seriousness"]
        );

        // Second document: the model is never consulted again.
        pipeline.process(document(NARRATIVE)).await.unwrap();
        assert_eq!(model.call_count(), calls_after_first);
    }

    #[tokio::test]
    async fn test_form_type_is_informational_only() {
        let config = fast_config();
        let pipeline = Pipeline::new(&config, None, Arc::new(MemoryStore::new()));

        let report = pipeline
            .process(document(&format!("MedWatch FDA Form 3500\n{}", NARRATIVE)))
            .await
            .unwrap();

        assert_eq!(report.form_type, FormType::MedWatch);
        // Downstream outcomes match the form-less narrative run.
        assert_eq!(report.adverse_event, AdverseEventCall::Yes);
    }

    #[tokio::test]
    async fn test_run_timeout_disabled_by_default() {
        let config = fast_config();
        assert_eq!(config.pipeline.run_timeout_secs, 0);

        let pipeline = Pipeline::new(&config, None, Arc::new(MemoryStore::new()));
        assert!(pipeline.process(document(NARRATIVE)).await.is_ok());
    }
}
