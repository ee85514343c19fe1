// file: src/backend/model.rs
// description: Groq chat-completions backend over the OpenAI-compatible API
// reference: https://console.groq.com/docs

use crate::backend::ClassificationBackend;
use crate::config::ModelConfig;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

pub struct GroqChatClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
}

impl GroqChatClient {
    /// Builds a client when an API key is configured; None means the caller
    /// runs heuristics only.
    pub fn from_config(config: &ModelConfig) -> Option<Self> {
        let api_key = config.api_key.clone()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .ok()?;

        Some(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl ClassificationBackend for GroqChatClient {
    /// One attempted call, no retries at this layer. Timeouts surface as
    /// errors and trigger the caller's sticky fallback.
    async fn classify(&self, prompt: &str, input: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: format!("{}\n\n{}", prompt, input),
            }],
            temperature: self.temperature,
        };

        debug!(
            "Requesting classification from {} ({} input chars)",
            self.model,
            input.len()
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Backend(format!("Groq API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PipelineError::Backend(format!(
                "Groq API returned status {}: {}",
                status, error_text
            )));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            PipelineError::Backend(format!("Failed to parse Groq API response: {}", e))
        })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| PipelineError::Backend("Groq API returned no choices".to_string()))
    }

    fn name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_no_api_key_yields_no_client() {
        let config = Config::default_config();
        assert!(GroqChatClient::from_config(&config.model).is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let mut model = Config::default_config().model;
        model.api_key = Some("gsk_test".to_string());
        model.base_url = "https://api.groq.com/openai/v1/".to_string();

        let client = GroqChatClient::from_config(&model).unwrap();
        assert_eq!(client.base_url, "https://api.groq.com/openai/v1");
    }
}
