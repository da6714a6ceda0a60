use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use crate::db::ArticleStore;
use crate::embedding::EmbeddingProvider;
use crate::error::{IngestError, Result};
use crate::sentiment::calculate_sentiment;
use crate::types::{BatchStats, EmbeddingStatus};
use crate::vector_index::{VectorIndex, VectorMetadata};

/// Pause between articles within one batch, easing load on the embedding
/// and vector-index providers.
const INTER_ITEM_PAUSE: Duration = Duration::from_millis(200);

/// Outcome of processing one article — a distinct failure mode from a
/// hard [`IngestError`]: the article row itself is updated to `failed`
/// and the worker moves on rather than aborting the batch.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub succeeded: bool,
    pub message: String,
}

impl ProcessOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self { succeeded: true, message: message.into() }
    }
    fn failed(message: impl Into<String>) -> Self {
        Self { succeeded: false, message: message.into() }
    }
}

/// Background worker that keeps the external vector index in sync with
/// articles whose embedding status is `pending` or `failed`.
pub struct IngestWorker {
    store: Arc<ArticleStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    batch_size: usize,
    processing_interval_secs: u64,
}

impl IngestWorker {
    pub fn new(
        store: Arc<ArticleStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        batch_size: usize,
        processing_interval_secs: u64,
    ) -> Self {
        Self { store, embedder, index, batch_size, processing_interval_secs }
    }

    /// Runs the full 8-step lifecycle for one article id.
    #[instrument(skip(self), fields(article_id = id))]
    pub async fn process_single_article(&self, id: i64) -> Result<ProcessOutcome> {
        let article = match self.store.get(id)? {
            Some(a) if !a.is_deleted => a,
            _ => return Ok(ProcessOutcome::ok(format!("article {id} not found or deleted, skipping"))),
        };

        let text = article.embedding_text();
        let content_hash = hex::encode(Sha256::digest(text.as_bytes()));

        if article.embedding_status == EmbeddingStatus::Completed
            && article.content_hash.as_deref() == Some(content_hash.as_str())
            && article.vector_id.is_some()
        {
            return Ok(ProcessOutcome::ok(format!("article {id} already processed with current content")));
        }

        match self.store.mark_processing(id) {
            Ok(()) => {}
            Err(IngestError::AlreadyProcessing { .. }) => {
                return Ok(ProcessOutcome::failed(format!("article {id} is already being processed")));
            }
            Err(e) => return Err(e),
        }

        let embedding = match self.embedder.embed(&text).await {
            Ok(e) => e,
            Err(reason) => {
                self.store.mark_failed(id)?;
                warn!(id, %reason, "embedding failed");
                return Ok(ProcessOutcome::failed(format!("failed to generate embedding: {reason}")));
            }
        };

        let sentiment_score = calculate_sentiment(&text);
        let vector_id = format!("article_{id}");
        let metadata = VectorMetadata {
            title: article.title.clone(),
            source: article.source.clone(),
            published_date: article.published_date.map(|d| d.to_rfc3339()),
            url: article.url.clone(),
            sentiment: sentiment_score,
            content_hash: content_hash.clone(),
            article_id: id,
        };

        if let Err(reason) = self.index.upsert(&vector_id, &embedding, metadata).await {
            self.store.mark_failed(id)?;
            warn!(id, %reason, "vector upsert failed");
            return Ok(ProcessOutcome::failed(format!("failed to store vector: {reason}")));
        }

        self.store.persist_ingestion_result(id, &vector_id, &content_hash, sentiment_score)?;
        Ok(ProcessOutcome::ok(format!("successfully processed article {id}: {}", truncate(&article.title, 50))))
    }

    /// Processes `ids` one at a time (concurrency 1, to avoid interleaving
    /// the article store's transactions), pausing between items.
    pub async fn process_batch(&self, ids: &[i64]) -> BatchStats {
        let mut stats = BatchStats::default();
        for &id in ids {
            stats.processed += 1;
            match self.process_single_article(id).await {
                Ok(outcome) => {
                    if outcome.succeeded {
                        stats.succeeded += 1;
                        info!(id, "{}", outcome.message);
                    } else {
                        stats.failed += 1;
                        warn!(id, "{}", outcome.message);
                    }
                    stats.messages.push(format!("article {id}: {}", outcome.message));
                }
                Err(e) => {
                    stats.failed += 1;
                    error!(id, error = %e, "ingestion worker error");
                    stats.messages.push(format!("article {id}: {e}"));
                }
            }
            tokio::time::sleep(INTER_ITEM_PAUSE).await;
        }
        stats
    }

    /// Sweeps and processes whatever is currently pending.
    pub async fn process_pending(&self) -> BatchStats {
        match self.store.list_pending(self.batch_size) {
            Ok(pending) if !pending.is_empty() => {
                let ids: Vec<i64> = pending.iter().map(|a| a.id).collect();
                info!(count = ids.len(), "processing pending articles");
                self.process_batch(&ids).await
            }
            Ok(_) => {
                info!("no pending articles to process");
                BatchStats::default()
            }
            Err(e) => {
                error!(error = %e, "failed to list pending articles");
                BatchStats::default()
            }
        }
    }

    /// Main loop: recovers crashed `processing` rows, then sweeps on a
    /// fixed interval until `shutdown` broadcasts `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("ingestion worker started");
        match self.store.reset_stuck_processing() {
            Ok(n) if n > 0 => warn!(count = n, "articles reset from stuck processing state"),
            Err(e) => error!(error = %e, "reset_stuck_processing failed"),
            _ => {}
        }

        let mut interval = tokio::time::interval(Duration::from_secs(self.processing_interval_secs));
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let stats = self.process_pending().await;
                    if stats.processed > 0 {
                        info!(succeeded = stats.succeeded, failed = stats.failed, "ingestion sweep complete");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("ingestion worker shutting down");
                        break;
                    }
                }
            }
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use rusqlite::Connection;

    use crate::types::Article;

    use super::*;

    struct FixedEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, _text: &str) -> std::result::Result<Vec<f32>, String> {
            Ok(vec![0.1, 0.2, 0.3])
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        async fn embed(&self, _text: &str) -> std::result::Result<Vec<f32>, String> {
            Err("provider unavailable".to_string())
        }
    }

    #[derive(Default)]
    struct RecordingIndex {
        upserts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl VectorIndex for RecordingIndex {
        async fn upsert(
            &self,
            vector_id: &str,
            _embedding: &[f32],
            _metadata: VectorMetadata,
        ) -> std::result::Result<(), String> {
            self.upserts.lock().unwrap().push(vector_id.to_string());
            Ok(())
        }

        async fn query(&self, _embedding: &[f32], _top_k: usize) -> std::result::Result<Vec<crate::vector_index::VectorMatch>, String> {
            Ok(Vec::new())
        }
    }

    fn seed_article(store: &ArticleStore, id: i64) {
        store.insert_article(&Article {
            id,
            title: "Haaland scores a hat-trick in amazing victory".to_string(),
            url: "https://example.com/a".to_string(),
            content: "An incredible performance from the striker.".to_string(),
            source: "Example FC".to_string(),
            published_date: Some(chrono::Utc::now()),
            sentiment_score: None,
            content_hash: None,
            embedding_status: EmbeddingStatus::Pending,
            vector_id: None,
            is_deleted: false,
        }).unwrap();
    }

    #[tokio::test]
    async fn process_single_article_completes_and_is_idempotent() {
        let store = Arc::new(ArticleStore::new(Connection::open_in_memory().unwrap()).unwrap());
        seed_article(&store, 1);
        let index = Arc::new(RecordingIndex::default());
        let worker = IngestWorker::new(store.clone(), Arc::new(FixedEmbedder), index.clone(), 10, 60);

        let first = worker.process_single_article(1).await.unwrap();
        assert!(first.succeeded);
        assert_eq!(index.upserts.lock().unwrap().len(), 1);

        let article = store.get(1).unwrap().unwrap();
        assert_eq!(article.embedding_status, EmbeddingStatus::Completed);
        assert!(article.vector_id.is_some());

        // Re-running with unchanged content is a no-op: no second upsert.
        let second = worker.process_single_article(1).await.unwrap();
        assert!(second.succeeded);
        assert_eq!(index.upserts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn embedding_failure_marks_article_failed() {
        let store = Arc::new(ArticleStore::new(Connection::open_in_memory().unwrap()).unwrap());
        seed_article(&store, 1);
        let index = Arc::new(RecordingIndex::default());
        let worker = IngestWorker::new(store.clone(), Arc::new(FailingEmbedder), index, 10, 60);

        let outcome = worker.process_single_article(1).await.unwrap();
        assert!(!outcome.succeeded);
        assert_eq!(store.get(1).unwrap().unwrap().embedding_status, EmbeddingStatus::Failed);
    }

    #[tokio::test]
    async fn missing_article_is_a_soft_skip() {
        let store = Arc::new(ArticleStore::new(Connection::open_in_memory().unwrap()).unwrap());
        let worker = IngestWorker::new(store, Arc::new(FixedEmbedder), Arc::new(RecordingIndex::default()), 10, 60);
        let outcome = worker.process_single_article(999).await.unwrap();
        assert!(outcome.succeeded);
    }
}
