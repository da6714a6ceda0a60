//! Capability traits the football tools are built against.
//!
//! These sit at the boundary between the tool registry and the concrete
//! article store / ranker — the gateway wires real implementations in at
//! startup, keeping the tool registry itself free of storage concerns.

use async_trait::async_trait;
use pitchline_rank::{RankedCandidate, Strategy};
use serde::{Deserialize, Serialize};

/// Biographic/roster fields the relational article store tracks for a player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub name: String,
    pub position: Option<String>,
    pub team: Option<String>,
    pub status: Option<String>,
    pub nationality: Option<String>,
    pub age: Option<i32>,
}

/// Case-insensitive substring lookup over the player roster.
#[async_trait]
pub trait PlayerDirectory: Send + Sync {
    async fn find(&self, name_query: &str) -> Result<Vec<PlayerProfile>, String>;
}

/// Re-ranked semantic search over ingested articles (backed by C8 + the
/// vector index).
#[async_trait]
pub trait ArticleSearch: Send + Sync {
    async fn search(
        &self,
        query: &str,
        strategy: Strategy,
        top_k: usize,
    ) -> Result<Vec<RankedCandidate>, String>;
}

/// Fetches the current-season Fantasy Premier League snapshot for a player
/// by exact first+last name match against the public bootstrap endpoint.
#[async_trait]
pub trait FantasyStats: Send + Sync {
    async fn lookup(&self, full_name: &str) -> Result<Option<FantasyPlayerStats>, String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FantasyPlayerStats {
    pub price_millions: f64,
    pub total_points: i64,
    pub goals_scored: i64,
    pub assists: i64,
    pub clean_sheets: i64,
    pub minutes: i64,
    pub yellow_cards: i64,
    pub red_cards: i64,
    pub form: String,
    pub points_per_game: String,
    pub is_goalkeeper: bool,
    pub saves: i64,
    pub goals_conceded: i64,
}
