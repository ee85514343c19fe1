// file: src/backend/mod.rs
// description: pluggable classification capability with sticky heuristic fallback

pub mod heuristic;
pub mod model;
pub mod patterns;
pub mod prompts;
pub mod response;

pub use model::GroqChatClient;
pub use response::{find_json_array, find_json_object, strip_code_fences};

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// The capability every stage calls into: ask a question about some input,
/// get a text answer back.
#[async_trait]
pub trait ClassificationBackend: Send + Sync {
    async fn classify(&self, prompt: &str, input: &str) -> Result<String>;

    fn name(&self) -> &str;
}

/// Deterministic per-stage fallback. Must never fail on well-formed text and
/// answers in the same shape the stage's prompt asks the model for.
pub type HeuristicFn = fn(&str) -> String;

/// Pairs a stage's optional model backend with its heuristic fallback. After
/// one observed model failure the stage is permanently downgraded to the
/// heuristic for the rest of the process lifetime, bounding latency under
/// repeated failures. The flag is atomic because one backend instance may
/// serve many documents concurrently.
pub struct StageBackend {
    stage: &'static str,
    model: Option<Arc<dyn ClassificationBackend>>,
    heuristic: HeuristicFn,
    degraded: AtomicBool,
}

impl StageBackend {
    pub fn new(
        stage: &'static str,
        model: Option<Arc<dyn ClassificationBackend>>,
        heuristic: HeuristicFn,
    ) -> Self {
        Self {
            stage,
            model,
            heuristic,
            degraded: AtomicBool::new(false),
        }
    }

    /// Heuristic-only backend, used in fast mode.
    pub fn heuristic_only(stage: &'static str, heuristic: HeuristicFn) -> Self {
        Self::new(stage, None, heuristic)
    }

    /// Classifies the input, falling back to the heuristic on model failure.
    /// Infallible: the heuristic always produces a best-effort answer.
    pub async fn classify(&self, prompt: &str, input: &str) -> String {
        if let Some(model) = &self.model
            && !self.degraded.load(Ordering::Acquire)
        {
            match model.classify(prompt, input).await {
                Ok(response) => return response,
                Err(e) => {
                    warn!(
                        "{} stage: model backend {} failed, downgrading to fast mode for the rest of this run: {}",
                        self.stage,
                        model.name(),
                        e
                    );
                    self.degraded.store(true, Ordering::Release);
                }
            }
        }

        (self.heuristic)(input)
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedBackend;
    use super::*;

    fn echo_heuristic(input: &str) -> String {
        format!("heuristic:{}", input)
    }

    #[tokio::test]
    async fn test_model_answer_wins_when_healthy() {
        let model = Arc::new(ScriptedBackend::answering("MedWatch"));
        let backend = StageBackend::new("triage", Some(model.clone()), echo_heuristic);

        let answer = backend.classify("prompt", "text").await;
        assert_eq!(answer, "MedWatch");
        assert!(!backend.is_degraded());
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_heuristic() {
        let model = Arc::new(ScriptedBackend::failing());
        let backend = StageBackend::new("triage", Some(model.clone()), echo_heuristic);

        let answer = backend.classify("prompt", "text").await;
        assert_eq!(answer, "heuristic:text");
        assert!(backend.is_degraded());
    }

    #[tokio::test]
    async fn test_fallback_is_sticky() {
        let model = Arc::new(ScriptedBackend::failing());
        let backend = StageBackend::new("triage", Some(model.clone()), echo_heuristic);

        backend.classify("prompt", "first").await;
        let second = backend.classify("prompt", "second").await;

        assert_eq!(second, "heuristic:second");
        // The model is never retried after the first observed failure.
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_heuristic_only_never_touches_model() {
        let backend = StageBackend::heuristic_only("triage", echo_heuristic);
        let answer = backend.classify("prompt", "text").await;
        assert_eq!(answer, "heuristic:text");
        assert!(!backend.is_degraded());
    }
}
