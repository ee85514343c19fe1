// file: src/store/lance.rs
// description: LanceDB-backed case store with vector embeddings
// reference: https://docs.rs/lancedb

use crate::config::StoreConfig;
use crate::error::{PipelineError, Result};
use crate::models::ExtractedRecord;
use crate::store::embeddings::EmbeddingClient;
use crate::store::{SearchHit, VectorStore};
use arrow_array::{
    BooleanArray, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
    UInt64Array,
};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use futures::StreamExt;
use lance_arrow::FixedSizeListArrayExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, Table, connect};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct LanceStore {
    connection: Connection,
    config: StoreConfig,
    embeddings: Option<EmbeddingClient>,
}

impl LanceStore {
    pub async fn connect(config: StoreConfig, api_key: Option<String>) -> Result<Self> {
        info!("Connecting to LanceDB at {}", config.uri);

        let connection = connect(&config.uri)
            .execute()
            .await
            .map_err(|e| PipelineError::Store(format!("Failed to connect to LanceDB: {}", e)))?;

        let embeddings =
            api_key.map(|key| EmbeddingClient::new(key, config.embedding_model.clone()));
        if embeddings.is_none() {
            warn!("LanceStore initialized without API key - using fallback embeddings");
        }

        Ok(Self {
            connection,
            config,
            embeddings,
        })
    }

    fn case_schema(&self) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("case_text", DataType::Utf8, false),
            Field::new("patient_id", DataType::Utf8, false),
            Field::new("drug_name", DataType::Utf8, false),
            Field::new("event_description", DataType::Utf8, false),
            Field::new("event_date", DataType::Utf8, false),
            Field::new("parse_error", DataType::Boolean, false),
            Field::new("stored_at", DataType::UInt64, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    self.config.embedding_dim as i32,
                ),
                false,
            ),
        ]))
    }

    async fn table_exists(&self, table_name: &str) -> Result<bool> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| PipelineError::Store(format!("Failed to list tables: {}", e)))?;

        Ok(table_names.iter().any(|name| name == table_name))
    }

    async fn get_table(&self, table_name: &str) -> Result<Table> {
        self.connection
            .open_table(table_name)
            .execute()
            .await
            .map_err(|e| {
                PipelineError::Store(format!("Failed to open table {}: {}", table_name, e))
            })
    }

    async fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let dim = self.config.embedding_dim;
        if let Some(ref client) = self.embeddings {
            match client.generate(text).await {
                Ok(embedding) if embedding.len() == dim => {
                    debug!("Generated API embedding for {} chars", text.len());
                    return embedding;
                }
                Ok(embedding) => {
                    warn!(
                        "Embedding API returned dimension {}, expected {}. Using fallback.",
                        embedding.len(),
                        dim
                    );
                }
                Err(e) => {
                    warn!("Embedding API failed: {}. Using fallback.", e);
                }
            }
        }
        EmbeddingClient::fallback_embedding(text, dim)
    }

    fn create_record_batch(
        &self,
        schema: Arc<Schema>,
        case_id: &str,
        case_text: &str,
        record: &ExtractedRecord,
        embedding: Vec<f32>,
    ) -> Result<RecordBatch> {
        let stored_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let embedding_values: Float32Array = embedding.iter().copied().collect();
        let embedding_list =
            FixedSizeListArray::try_new_from_values(embedding_values, embedding.len() as i32)
                .map_err(|e| {
                    PipelineError::Store(format!("Failed to create embedding array: {}", e))
                })?;

        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec![case_id.to_string()])),
                Arc::new(StringArray::from(vec![case_text.to_string()])),
                Arc::new(StringArray::from(vec![record.patient_id.clone()])),
                Arc::new(StringArray::from(vec![record.drug_name.clone()])),
                Arc::new(StringArray::from(vec![record.event_description.clone()])),
                Arc::new(StringArray::from(vec![record.event_date.clone()])),
                Arc::new(BooleanArray::from(vec![record.parse_error])),
                Arc::new(UInt64Array::from(vec![stored_at])),
                Arc::new(embedding_list),
            ],
        )
        .map_err(|e| PipelineError::Store(format!("Failed to create record batch: {}", e)))
    }

    fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
        batch
            .column_by_name(name)
            .ok_or_else(|| PipelineError::Store(format!("Missing '{}' column", name)))?
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| PipelineError::Store(format!("Invalid '{}' column type", name)))
    }
}

#[async_trait]
impl VectorStore for LanceStore {
    async fn add_record(&self, text: &str, metadata: &ExtractedRecord) -> Result<Vec<String>> {
        let case_id = Uuid::new_v4().to_string();
        let schema = self.case_schema();
        let embedding = self.generate_embedding(text).await;
        let batch = self.create_record_batch(schema.clone(), &case_id, text, metadata, embedding)?;

        let table_name = &self.config.table_name;

        if !self.table_exists(table_name).await? {
            self.connection
                .create_table(
                    table_name,
                    RecordBatchIterator::new(vec![Ok(batch)], schema),
                )
                .execute()
                .await
                .map_err(|e| PipelineError::Store(format!("Failed to create table: {}", e)))?;
            info!("Created new table: {}", table_name);
        } else {
            let table = self.get_table(table_name).await?;
            table
                .add(RecordBatchIterator::new(vec![Ok(batch)], schema))
                .execute()
                .await
                .map_err(|e| PipelineError::Store(format!("Failed to insert case: {}", e)))?;
        }

        debug!("Stored case {}", case_id);
        Ok(vec![case_id])
    }

    async fn similarity_search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        if !self.table_exists(&self.config.table_name).await? {
            warn!("Table does not exist, returning empty results");
            return Ok(Vec::new());
        }

        let table = self.get_table(&self.config.table_name).await?;
        let query_embedding = self.generate_embedding(query).await;

        let mut results_stream = table
            .vector_search(query_embedding)
            .map_err(|e| PipelineError::Store(format!("Failed to create vector search: {}", e)))?
            .limit(limit)
            .execute()
            .await
            .map_err(|e| PipelineError::Store(format!("Vector search failed: {}", e)))?;

        let mut hits = Vec::new();

        while let Some(batch_result) = results_stream.next().await {
            let batch = batch_result
                .map_err(|e| PipelineError::Store(format!("Failed to read result batch: {}", e)))?;

            let ids = Self::string_column(&batch, "id")?;
            let case_texts = Self::string_column(&batch, "case_text")?;
            let drug_names = Self::string_column(&batch, "drug_name")?;
            let event_descriptions = Self::string_column(&batch, "event_description")?;

            let distances = batch
                .column_by_name("_distance")
                .and_then(|col| col.as_any().downcast_ref::<Float32Array>());

            for i in 0..batch.num_rows() {
                let (score, distance) = match distances {
                    Some(dist_array) => {
                        let dist = dist_array.value(i);
                        (1.0 / (1.0 + dist), Some(dist))
                    }
                    None => (1.0, None),
                };

                hits.push(SearchHit {
                    case_id: ids.value(i).to_string(),
                    case_text: case_texts.value(i).to_string(),
                    drug_name: drug_names.value(i).to_string(),
                    event_description: event_descriptions.value(i).to_string(),
                    score,
                    distance,
                });
            }
        }

        info!("Vector search returned {} results", hits.len());
        Ok(hits)
    }

    async fn count(&self) -> Result<u64> {
        if !self.table_exists(&self.config.table_name).await? {
            return Ok(0);
        }

        let table = self.get_table(&self.config.table_name).await?;
        let count = table
            .count_rows(None)
            .await
            .map_err(|e| PipelineError::Store(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    fn name(&self) -> &'static str {
        "lancedb"
    }
}
