//! Bridges the storage/search primitives (C8, C9, C13) into the capability
//! traits the tool registry (C6) is built against, so the tools themselves
//! stay free of storage and HTTP concerns.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use pitchline_agent::tools::context::{
    ArticleSearch, FantasyPlayerStats, FantasyStats, PlayerDirectory, PlayerProfile,
};
use pitchline_ingest::{ArticleStore, EmbeddingProvider, VectorIndex};
use pitchline_rank::{Candidate, RankedCandidate, Ranker, Strategy};

/// `news_search`/`fpl_analysis`/`player_stats`' article-search backend:
/// embeds the query, queries the external vector index for nearest
/// neighbours, hydrates each hit from the local article store, then
/// re-ranks with [`Ranker`].
pub struct VectorArticleSearch {
    store: Arc<ArticleStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    ranker: Arc<Ranker>,
    /// How many nearest neighbours to pull from the vector index before
    /// re-ranking locally; always ≥ the caller's requested `top_k`.
    candidate_pool: usize,
}

impl VectorArticleSearch {
    pub fn new(
        store: Arc<ArticleStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        ranker: Arc<Ranker>,
        candidate_pool: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            index,
            ranker,
            candidate_pool,
        }
    }
}

#[async_trait]
impl ArticleSearch for VectorArticleSearch {
    async fn search(
        &self,
        query: &str,
        strategy: Strategy,
        top_k: usize,
    ) -> Result<Vec<RankedCandidate>, String> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(query).await?;
        let matches = self
            .index
            .query(&embedding, self.candidate_pool.max(top_k))
            .await?;

        let mut candidates = Vec::with_capacity(matches.len());
        for m in matches {
            let Some(id) = parse_vector_id(&m.vector_id) else {
                continue;
            };
            match self.store.get(id) {
                Ok(Some(article)) if !article.is_deleted => {
                    candidates.push(Candidate {
                        article_id: article.id.to_string(),
                        title: article.title,
                        content: article.content,
                        source: article.source,
                        url: Some(article.url),
                        published_date: article.published_date,
                        sentiment_score: article.sentiment_score,
                        semantic_score: m.score,
                    });
                }
                Ok(_) => {}
                Err(e) => warn!(id, error = %e, "article lookup failed during search"),
            }
        }

        Ok(self.ranker.rank(candidates, query, strategy, top_k))
    }
}

fn parse_vector_id(vector_id: &str) -> Option<i64> {
    vector_id.strip_prefix("article_")?.parse().ok()
}

/// `player_stats`' roster lookup, backed directly by the local article
/// store's players table.
pub struct StorePlayerDirectory {
    store: Arc<ArticleStore>,
}

impl StorePlayerDirectory {
    pub fn new(store: Arc<ArticleStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PlayerDirectory for StorePlayerDirectory {
    async fn find(&self, name_query: &str) -> Result<Vec<PlayerProfile>, String> {
        let rows = self
            .store
            .find_players_by_name(name_query)
            .map_err(|e| e.to_string())?;
        Ok(rows
            .into_iter()
            .map(|p| PlayerProfile {
                name: p.name,
                position: p.position,
                team: p.team,
                status: p.status,
                nationality: p.nationality,
                age: p.age,
            })
            .collect())
    }
}

/// `player_stats`' live-season Fantasy Premier League snapshot, fetched
/// from the public bootstrap-static endpoint and matched by exact
/// case-insensitive full name.
pub struct FplHttpStats {
    client: reqwest::Client,
    endpoint: String,
}

impl FplHttpStats {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl FantasyStats for FplHttpStats {
    async fn lookup(&self, full_name: &str) -> Result<Option<FantasyPlayerStats>, String> {
        let resp = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !resp.status().is_success() {
            return Err(format!("FPL endpoint returned {}", resp.status()));
        }
        let body: BootstrapResponse = resp.json().await.map_err(|e| e.to_string())?;

        let needle = full_name.to_lowercase();
        let hit = body.elements.into_iter().find(|p| {
            format!("{} {}", p.first_name, p.second_name).to_lowercase() == needle
        });

        Ok(hit.map(|p| {
            let is_goalkeeper = p.element_type == 1;
            FantasyPlayerStats {
                price_millions: p.now_cost as f64 / 10.0,
                total_points: p.total_points,
                goals_scored: p.goals_scored,
                assists: p.assists,
                clean_sheets: p.clean_sheets,
                minutes: p.minutes,
                yellow_cards: p.yellow_cards,
                red_cards: p.red_cards,
                form: p.form,
                points_per_game: p.points_per_game,
                is_goalkeeper,
                saves: p.saves,
                goals_conceded: p.goals_conceded,
            }
        }))
    }
}

#[derive(Debug, Deserialize)]
struct BootstrapResponse {
    elements: Vec<BootstrapElement>,
}

#[derive(Debug, Deserialize)]
struct BootstrapElement {
    first_name: String,
    second_name: String,
    element_type: i64,
    now_cost: i64,
    total_points: i64,
    goals_scored: i64,
    assists: i64,
    clean_sheets: i64,
    minutes: i64,
    yellow_cards: i64,
    red_cards: i64,
    form: String,
    points_per_game: String,
    saves: i64,
    goals_conceded: i64,
}
