//! External embedding provider (step 5 of the ingestion lifecycle) —
//! OpenAI-compatible `/v1/embeddings`, with exponential backoff on
//! rate limits.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

const MAX_EMBEDDING_CHARS: usize = 8_000;

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds `text`, truncating to the provider's input limit first.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, String>;
}

pub struct OpenAiEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_retries: u32,
}

impl OpenAiEmbeddingProvider {
    pub fn new(api_key: String, base_url: String, model: String, max_retries: u32) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model,
            max_retries,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, String> {
        let truncated: String = text.chars().take(MAX_EMBEDDING_CHARS).collect();
        let url = format!("{}/v1/embeddings", self.base_url);

        for attempt in 0..=self.max_retries {
            let resp = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&serde_json::json!({
                    "model": self.model,
                    "input": truncated,
                    "encoding_format": "float",
                }))
                .send()
                .await
                .map_err(|e| e.to_string())?;

            if resp.status().as_u16() == 429 {
                if attempt < self.max_retries {
                    let wait = Duration::from_secs(1 << attempt);
                    warn!(attempt, ?wait, "embedding rate limited, backing off");
                    tokio::time::sleep(wait).await;
                    continue;
                }
                return Err("rate limit exceeded after max retries".to_string());
            }

            if !resp.status().is_success() {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                if attempt < self.max_retries {
                    let wait = Duration::from_secs(1 << attempt);
                    warn!(attempt, %status, "embedding provider error, retrying");
                    tokio::time::sleep(wait).await;
                    continue;
                }
                return Err(format!("embedding provider error ({status}): {body}"));
            }

            let parsed: EmbeddingResponse = resp.json().await.map_err(|e| e.to_string())?;
            return parsed
                .data
                .into_iter()
                .next()
                .map(|d| d.embedding)
                .ok_or_else(|| "embedding response had no data".to_string());
        }

        Err("embedding request exhausted retries".to_string())
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
