use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an article sits in the embed-and-index pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl std::fmt::Display for EmbeddingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EmbeddingStatus::Pending => "pending",
            EmbeddingStatus::Processing => "processing",
            EmbeddingStatus::Completed => "completed",
            EmbeddingStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for EmbeddingStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EmbeddingStatus::Pending),
            "processing" => Ok(EmbeddingStatus::Processing),
            "completed" => Ok(EmbeddingStatus::Completed),
            "failed" => Ok(EmbeddingStatus::Failed),
            other => Err(format!("unknown embedding status: {other}")),
        }
    }
}

/// The fields of an article this repo actually reads/writes — the full
/// crawler-fed schema is out of scope, this is the locally-owned slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub content: String,
    pub source: String,
    pub published_date: Option<DateTime<Utc>>,
    pub sentiment_score: Option<f64>,
    pub content_hash: Option<String>,
    pub embedding_status: EmbeddingStatus,
    pub vector_id: Option<String>,
    pub is_deleted: bool,
}

impl Article {
    /// `title\n\ncontent`, the exact text the embedding and content hash
    /// are derived from.
    pub fn embedding_text(&self) -> String {
        format!("{}\n\n{}", self.title, self.content)
    }
}

/// Minimal roster row backing the `player_stats` tool's lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRow {
    pub id: i64,
    pub name: String,
    pub position: Option<String>,
    pub team: Option<String>,
    pub status: Option<String>,
    pub nationality: Option<String>,
    pub age: Option<i32>,
}

/// Tallies from one `process_batch` run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    pub processed: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub messages: Vec<String>,
}
