//! External vector-index client (step 7 of the ingestion lifecycle) —
//! a generic REST upsert/query surface any Pinecone-alike index exposes.

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

/// Per-vector metadata stored alongside the embedding, used both for
/// filtering and for rendering search results without a round trip to
/// the article store.
#[derive(Debug, Clone, Serialize)]
pub struct VectorMetadata {
    pub title: String,
    pub source: String,
    pub published_date: Option<String>,
    pub url: String,
    pub sentiment: f64,
    pub content_hash: String,
    pub article_id: i64,
}

impl VectorMetadata {
    /// Applies the index's metadata field length limits.
    pub fn truncated(mut self) -> Self {
        self.title.truncate(512);
        self.url.truncate(512);
        self
    }
}

#[derive(Debug, Clone)]
pub struct VectorMatch {
    pub vector_id: String,
    pub score: f64,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(
        &self,
        vector_id: &str,
        embedding: &[f32],
        metadata: VectorMetadata,
    ) -> Result<(), String>;

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<VectorMatch>, String>;
}

pub struct HttpVectorIndex {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    index_name: String,
    namespace: String,
}

impl HttpVectorIndex {
    pub fn new(base_url: String, api_key: String, index_name: String, namespace: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            index_name,
            namespace,
        }
    }
}

#[async_trait]
impl VectorIndex for HttpVectorIndex {
    async fn upsert(
        &self,
        vector_id: &str,
        embedding: &[f32],
        metadata: VectorMetadata,
    ) -> Result<(), String> {
        let url = format!("{}/vectors/upsert", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "index": self.index_name,
                "namespace": self.namespace,
                "vectors": [{
                    "id": vector_id,
                    "values": embedding,
                    "metadata": metadata.truncated(),
                }],
            }))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, "vector upsert rejected");
            return Err(format!("upsert error ({status}): {body}"));
        }
        Ok(())
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<VectorMatch>, String> {
        let url = format!("{}/query", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "index": self.index_name,
                "namespace": self.namespace,
                "vector": embedding,
                "topK": top_k,
                "includeMetadata": false,
            }))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("query error ({status}): {body}"));
        }

        let parsed: QueryResponse = resp.json().await.map_err(|e| e.to_string())?;
        Ok(parsed
            .matches
            .into_iter()
            .map(|m| VectorMatch { vector_id: m.id, score: m.score })
            .collect())
    }
}

#[derive(Debug, serde::Deserialize)]
struct QueryResponse {
    matches: Vec<QueryMatch>,
}

#[derive(Debug, serde::Deserialize)]
struct QueryMatch {
    id: String,
    score: f64,
}
