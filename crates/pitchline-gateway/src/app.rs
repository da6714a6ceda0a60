use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use dashmap::DashMap;
use tokio::sync::watch;
use tracing::{info, warn};

use pitchline_agent::tools::context::ArticleSearch;
use pitchline_agent::tools::{fpl_analysis::FplAnalysisTool, news_search::NewsSearchTool, player_stats::PlayerStatsTool, Tool};
use pitchline_agent::{LlmProvider, PromptBuilder};
use pitchline_cache::ResponseCache;
use pitchline_core::config::PitchlineConfig;
use pitchline_ingest::{ArticleStore, EmbeddingProvider, IngestWorker, OpenAiEmbeddingProvider, VectorIndex, HttpVectorIndex};
use pitchline_limiter::RateLimiter;
use pitchline_memory::ConversationMemory;
use pitchline_rank::Ranker;
use pitchline_store::{sqlite::SqliteStore, KvStore};

use crate::adapters::{FplHttpStats, StorePlayerDirectory, VectorArticleSearch};

/// Central shared state handed to every Axum handler as `Arc<AppState>`.
pub struct AppState {
    pub config: PitchlineConfig,
    pub limiter: RateLimiter,
    pub cache: ResponseCache,
    pub memory: ConversationMemory,
    pub provider: Arc<dyn LlmProvider>,
    pub prompt: PromptBuilder,
    pub tools: Vec<Box<dyn Tool>>,
    pub articles: Arc<ArticleStore>,
    pub ranker: Arc<Ranker>,
    pub search: Arc<dyn ArticleSearch>,
    /// Live WS connections, tracked only for `/stats`.
    pub ws_clients: DashMap<String, ()>,
}

impl AppState {
    pub fn build(config: PitchlineConfig) -> anyhow::Result<(Arc<Self>, IngestWorker, watch::Sender<bool>)> {
        let kv: Arc<dyn KvStore> = Arc::new(SqliteStore::open(&config.store.path)?);
        let limiter = RateLimiter::new(kv.clone(), config.limiter.clone());
        let cache = ResponseCache::new(kv.clone(), config.cache.clone());
        let memory = ConversationMemory::new(kv, config.memory.window_turns, config.memory.durable_ttl_days);

        let provider: Arc<dyn LlmProvider> = Arc::new(pitchline_agent::openai::OpenAiProvider::new(
            config.agent.api_key.clone().unwrap_or_default(),
            Some(config.agent.base_url.clone()),
        ));

        let articles = Arc::new(ArticleStore::new(rusqlite::Connection::open(&config.store.path)?)?);
        let ranker = Arc::new(Ranker::new(config.ranker.clone())?);

        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(OpenAiEmbeddingProvider::new(
            config.agent.api_key.clone().unwrap_or_default(),
            config
                .ingest
                .embedding_base_url
                .clone()
                .unwrap_or_else(|| config.agent.base_url.clone()),
            config.ingest.embedding_model.clone(),
            config.ingest.max_retries,
        ));
        let vector_index: Arc<dyn VectorIndex> = Arc::new(HttpVectorIndex::new(
            config
                .ingest
                .vector_index_base_url
                .clone()
                .unwrap_or_default(),
            config.agent.api_key.clone().unwrap_or_default(),
            config.ingest.index_name.clone(),
            config.ingest.namespace.clone(),
        ));

        let search: Arc<dyn ArticleSearch> = Arc::new(VectorArticleSearch::new(
            articles.clone(),
            embedder.clone(),
            vector_index.clone(),
            ranker.clone(),
            20,
        ));
        let players = Arc::new(StorePlayerDirectory::new(articles.clone()));
        let fantasy = Arc::new(FplHttpStats::new(config.agent.fpl_endpoint.clone()));

        let tools: Vec<Box<dyn Tool>> = vec![
            Box::new(NewsSearchTool::new(search.clone())),
            Box::new(PlayerStatsTool::new(players, fantasy, search.clone())),
            Box::new(FplAnalysisTool::new(search.clone())),
        ];

        let mut prompt = PromptBuilder::new();
        prompt.set_tool_defs(&pitchline_agent::tools::tool_catalog());

        let worker = IngestWorker::new(
            articles.clone(),
            embedder,
            vector_index,
            config.ingest.batch_size,
            config.ingest.processing_interval_secs,
        );
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);

        let state = Arc::new(Self {
            config,
            limiter,
            cache,
            memory,
            provider,
            prompt,
            tools,
            articles,
            ranker,
            search,
            ws_clients: DashMap::new(),
        });

        Ok((state, worker, shutdown_tx))
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/chat", post(crate::http::chat::chat_handler))
        .route("/chat/stream", get(crate::http::chat::chat_stream_handler))
        .route("/chat/feedback", post(crate::http::chat::feedback_handler))
        .route(
            "/conversations/{id}",
            get(crate::http::chat::get_conversation).delete(crate::http::chat::delete_conversation),
        )
        .route("/ws/chat/{conn_id}", get(crate::ws::connection::ws_handler))
        .route("/search/enhanced-search", post(crate::http::search::enhanced_search))
        .route("/rate-limit/config", get(crate::http::admin::rate_limit_config))
        .route("/rate-limit/classify", post(crate::http::admin::classify))
        .route(
            "/users/{id}/tier",
            get(crate::http::admin::get_tier).post(crate::http::admin::set_tier),
        )
        .route("/stats", get(crate::http::admin::stats))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Spawns the ingestion worker as a background task, returning a shutdown
/// handle the caller triggers on process exit.
pub fn spawn_ingest_worker(worker: IngestWorker, shutdown_rx: watch::Receiver<bool>) {
    tokio::spawn(async move {
        info!("spawning vector-ingestion worker");
        worker.run(shutdown_rx).await;
        warn!("vector-ingestion worker exited");
    });
}
