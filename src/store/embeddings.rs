// file: src/store/embeddings.rs
// description: Groq API embeddings with a deterministic offline fallback
// reference: https://console.groq.com/docs/embeddings

use crate::error::{PipelineError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    input: Vec<String>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

pub struct EmbeddingClient {
    client: Client,
    api_key: String,
    model: String,
}

impl EmbeddingClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model,
        }
    }

    pub async fn generate(&self, text: &str) -> Result<Vec<f32>> {
        let url = "https://api.groq.com/openai/v1/embeddings";

        let request = EmbeddingRequest {
            input: vec![text.to_string()],
            model: self.model.clone(),
        };

        debug!("Requesting embedding for {} chars", text.len());

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Store(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PipelineError::Store(format!(
                "Embedding API returned status {}: {}",
                status, error_text
            )));
        }

        let embedding_response: EmbeddingResponse = response.json().await.map_err(|e| {
            PipelineError::Store(format!("Failed to parse embedding response: {}", e))
        })?;

        embedding_response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| PipelineError::Store("No embedding data returned".to_string()))
    }

    /// Deterministic hash-derived embedding used when no API key is
    /// configured or the API call fails, so ingestion still works offline.
    pub fn fallback_embedding(text: &str, dim: usize) -> Vec<f32> {
        warn!("Using fallback embedding generation");
        let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_add(b as u64));
        (0..dim)
            .map(|i| (hash.wrapping_add(i as u64) % 1000) as f32 / 1000.0)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_embedding_dimension() {
        let embedding = EmbeddingClient::fallback_embedding("case text", 768);
        assert_eq!(embedding.len(), 768);
        assert!(embedding.iter().all(|&x| (0.0..=1.0).contains(&x)));
    }

    #[test]
    fn test_fallback_embedding_deterministic() {
        let a = EmbeddingClient::fallback_embedding("same text", 128);
        let b = EmbeddingClient::fallback_embedding("same text", 128);
        assert_eq!(a, b);
    }
}
