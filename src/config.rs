// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub model: ModelConfig,
    pub store: StoreConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    pub uri: String,
    pub table_name: String,
    pub embedding_model: String,
    pub embedding_dim: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub fast_mode: bool,
    pub run_timeout_secs: u64,
    pub parallel_workers: usize,
    pub max_file_size_mb: usize,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new("config/default.toml")));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("PHARMAVIGIL")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            model: ModelConfig {
                api_key: None,
                model: "openai/gpt-oss-120b".to_string(),
                base_url: "https://api.groq.com/openai/v1".to_string(),
                temperature: 0.0,
                request_timeout_secs: 60,
            },
            store: StoreConfig {
                uri: "data/lancedb".to_string(),
                table_name: "safety_reports".to_string(),
                embedding_model: "openai/gpt-oss-120b".to_string(),
                embedding_dim: 768,
            },
            pipeline: PipelineConfig {
                fast_mode: false,
                run_timeout_secs: 0,
                parallel_workers: 4,
                max_file_size_mb: 10,
            },
        }
    }

    fn validate(&self) -> Result<()> {
        if self.pipeline.parallel_workers == 0 {
            return Err(PipelineError::Config(
                "parallel_workers must be greater than 0".to_string(),
            ));
        }

        if self.store.embedding_dim == 0 {
            return Err(PipelineError::Config(
                "embedding_dim must be greater than 0".to_string(),
            ));
        }

        if self.model.request_timeout_secs == 0 {
            return Err(PipelineError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
