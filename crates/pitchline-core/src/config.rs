use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const VECTOR_DIMENSIONS: usize = 1536;
pub const MAX_PAYLOAD_BYTES: usize = 128 * 1024;

/// Top-level configuration, loaded from `config.toml` (or `PITCHLINE_CONFIG`)
/// merged with `PITCHLINE_`-prefixed environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PitchlineConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub limiter: LimiterConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub ranker: RankerConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl PitchlineConfig {
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(|| std::env::var("PITCHLINE_CONFIG").unwrap_or_else(|_| "config.toml".to_string()));

        let config: PitchlineConfig = Figment::from(figment::providers::Serialized::defaults(
            PitchlineConfig::default(),
        ))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("PITCHLINE_").split("_"))
        .extract()
        .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        Ok(config)
    }
}

/// C1 — KV-store backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Filesystem path of the sqlite database backing the KV-store trait.
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> String {
    "pitchline-store.sqlite3".to_string()
}

/// C3 — rate limiter tunables. Mirrors §3/§4.3's sliding-window parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    #[serde(default = "default_quotas")]
    pub quotas: HashMap<String, u64>,
    /// Total sliding-window duration in seconds (default: 24h).
    #[serde(default = "default_window_duration")]
    pub window_duration_secs: u64,
    /// Number of sub-windows the window is divided into (default: 24, i.e. 1h each).
    #[serde(default = "default_sub_windows")]
    pub sub_windows: u64,
    /// Extra seconds added to the store key's expiry beyond the window duration.
    #[serde(default = "default_expiry_buffer")]
    pub expiry_buffer_secs: u64,
    #[serde(default = "default_tier")]
    pub default_tier: String,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            quotas: default_quotas(),
            window_duration_secs: default_window_duration(),
            sub_windows: default_sub_windows(),
            expiry_buffer_secs: default_expiry_buffer(),
            default_tier: default_tier(),
        }
    }
}

impl LimiterConfig {
    pub fn sub_window_duration_secs(&self) -> u64 {
        self.window_duration_secs / self.sub_windows.max(1)
    }

    pub fn quota_for(&self, tier: &str) -> u64 {
        self.quotas
            .get(tier)
            .copied()
            .unwrap_or_else(|| self.quotas.get("free").copied().unwrap_or(50))
    }
}

fn default_quotas() -> HashMap<String, u64> {
    [("free", 50), ("premium", 500), ("admin", 10_000)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
fn default_window_duration() -> u64 {
    24 * 3600
}
fn default_sub_windows() -> u64 {
    24
}
fn default_expiry_buffer() -> u64 {
    300
}
fn default_tier() -> String {
    "free".to_string()
}

/// C4 — response cache TTLs by classified category, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_factual_ttl")]
    pub factual_ttl_secs: u64,
    #[serde(default = "default_news_ttl")]
    pub news_ttl_secs: u64,
    #[serde(default = "default_opinion_ttl")]
    pub opinion_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            factual_ttl_secs: default_factual_ttl(),
            news_ttl_secs: default_news_ttl(),
            opinion_ttl_secs: default_opinion_ttl(),
        }
    }
}

fn default_factual_ttl() -> u64 {
    21_600
}
fn default_news_ttl() -> u64 {
    7_200
}
fn default_opinion_ttl() -> u64 {
    86_400
}

/// C5 — conversation memory window and durable-persistence TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_window")]
    pub window_turns: usize,
    #[serde(default = "default_memory_ttl_days")]
    pub durable_ttl_days: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            window_turns: default_memory_window(),
            durable_ttl_days: default_memory_ttl_days(),
        }
    }
}

fn default_memory_window() -> usize {
    10
}
fn default_memory_ttl_days() -> u64 {
    7
}

/// C6/C7 — orchestrator and LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_max_iterations")]
    pub max_tool_iterations: u32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_fpl_endpoint")]
    pub fpl_endpoint: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            chat_model: default_chat_model(),
            base_url: default_base_url(),
            api_key: None,
            max_tool_iterations: default_max_iterations(),
            max_tokens: default_max_tokens(),
            fpl_endpoint: default_fpl_endpoint(),
        }
    }
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}
fn default_max_iterations() -> u32 {
    3
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_fpl_endpoint() -> String {
    "https://fantasy.premierleague.com/api/bootstrap-static/".to_string()
}

/// C8 — hybrid ranker weight tables and content-quality heuristics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerConfig {
    #[serde(default = "default_source_weights")]
    pub source_weights: HashMap<String, f64>,
    #[serde(default = "default_source_weight")]
    pub default_source_weight: f64,
    #[serde(default = "default_temporal_decay")]
    pub temporal_decay_rate: f64,
    #[serde(default = "default_hybrid_decay")]
    pub hybrid_decay_rate: f64,
    #[serde(default = "default_time_decay")]
    pub default_time_decay: f64,
    #[serde(default = "default_min_content_len")]
    pub optimal_content_len_min: usize,
    #[serde(default = "default_max_content_len")]
    pub optimal_content_len_max: usize,
    #[serde(default = "default_min_title_len")]
    pub min_title_len: usize,
    #[serde(default = "default_max_title_len")]
    pub max_title_len: usize,
    #[serde(default = "default_clickbait_penalty")]
    pub clickbait_penalty: f64,
    #[serde(default = "default_clickbait_patterns")]
    pub clickbait_patterns: Vec<String>,
    #[serde(default = "default_title_match_weight")]
    pub title_match_weight: f64,
    #[serde(default = "default_neutral_sentiment_base")]
    pub neutral_sentiment_base: f64,
    #[serde(default = "default_positive_sentiment_multiplier")]
    pub positive_sentiment_multiplier: f64,
    #[serde(default = "default_negative_sentiment_multiplier")]
    pub negative_sentiment_multiplier: f64,
    #[serde(default = "default_scoring_weights")]
    pub scoring_weights: HashMap<String, HashMap<String, f64>>,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            source_weights: default_source_weights(),
            default_source_weight: default_source_weight(),
            temporal_decay_rate: default_temporal_decay(),
            hybrid_decay_rate: default_hybrid_decay(),
            default_time_decay: default_time_decay(),
            optimal_content_len_min: default_min_content_len(),
            optimal_content_len_max: default_max_content_len(),
            min_title_len: default_min_title_len(),
            max_title_len: default_max_title_len(),
            clickbait_penalty: default_clickbait_penalty(),
            clickbait_patterns: default_clickbait_patterns(),
            title_match_weight: default_title_match_weight(),
            neutral_sentiment_base: default_neutral_sentiment_base(),
            positive_sentiment_multiplier: default_positive_sentiment_multiplier(),
            negative_sentiment_multiplier: default_negative_sentiment_multiplier(),
            scoring_weights: default_scoring_weights(),
        }
    }
}

fn default_source_weights() -> HashMap<String, f64> {
    [
        ("BBC Sport", 1.0),
        ("Sky Sports", 0.95),
        ("Guardian", 0.95),
        ("Telegraph", 0.9),
        ("Fantasy Football Scout", 0.85),
        ("ESPN", 0.8),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}
fn default_source_weight() -> f64 {
    0.7
}
fn default_temporal_decay() -> f64 {
    0.1
}
fn default_hybrid_decay() -> f64 {
    0.05
}
fn default_time_decay() -> f64 {
    0.5
}
fn default_min_content_len() -> usize {
    500
}
fn default_max_content_len() -> usize {
    2000
}
fn default_min_title_len() -> usize {
    20
}
fn default_max_title_len() -> usize {
    150
}
fn default_clickbait_penalty() -> f64 {
    0.7
}
fn default_clickbait_patterns() -> Vec<String> {
    vec![
        r"\d+\s+(things|ways|reasons|facts)".to_string(),
        r"you won't believe".to_string(),
        r"shocking".to_string(),
        r"amazing".to_string(),
        r"incredible".to_string(),
    ]
}
fn default_title_match_weight() -> f64 {
    2.0
}
fn default_neutral_sentiment_base() -> f64 {
    0.5
}
fn default_positive_sentiment_multiplier() -> f64 {
    0.3
}
fn default_negative_sentiment_multiplier() -> f64 {
    0.2
}
fn default_scoring_weights() -> HashMap<String, HashMap<String, f64>> {
    let mut weights = HashMap::new();
    weights.insert(
        "semantic_only".to_string(),
        [("semantic", 1.0)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    );
    weights.insert(
        "temporal".to_string(),
        [("semantic", 0.6), ("temporal", 0.3), ("text_relevance", 0.1)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    );
    weights.insert(
        "engagement".to_string(),
        [
            ("semantic", 0.5),
            ("source_credibility", 0.2),
            ("content_quality", 0.15),
            ("text_relevance", 0.1),
            ("sentiment", 0.05),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect(),
    );
    weights.insert(
        "hybrid".to_string(),
        [
            ("semantic", 0.4),
            ("temporal", 0.25),
            ("source_credibility", 0.15),
            ("text_relevance", 0.1),
            ("content_quality", 0.07),
            ("sentiment", 0.03),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect(),
    );
    weights
}

/// C9 — vector-ingestion worker tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_vector_dims")]
    pub vector_dimensions: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_processing_interval")]
    pub processing_interval_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_index_name")]
    pub index_name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub embedding_base_url: Option<String>,
    #[serde(default)]
    pub vector_index_base_url: Option<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            embedding_model: default_embedding_model(),
            vector_dimensions: default_vector_dims(),
            batch_size: default_batch_size(),
            processing_interval_secs: default_processing_interval(),
            max_retries: default_max_retries(),
            index_name: default_index_name(),
            namespace: default_namespace(),
            embedding_base_url: None,
            vector_index_base_url: None,
        }
    }
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_vector_dims() -> usize {
    VECTOR_DIMENSIONS
}
fn default_batch_size() -> usize {
    10
}
fn default_processing_interval() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_index_name() -> String {
    "football-news".to_string()
}
fn default_namespace() -> String {
    "articles".to_string()
}

/// C10 — HTTP/WS surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_admin_token")]
    pub admin_token: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            admin_token: default_admin_token(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_admin_token() -> String {
    "change-me".to_string()
}
