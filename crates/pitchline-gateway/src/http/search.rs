//! `POST /search/enhanced-search` — direct hybrid-ranker search, not
//! gated behind the conversational agent. Never rate-limited. Date-range
//! and sentiment bounds are applied as a post-filter over the ranker's
//! output rather than pushed into the vector query itself.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use pitchline_rank::Strategy;

use crate::app::AppState;
use crate::error::{GatewayError, Result};

#[derive(Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_strategy")]
    pub ranking_strategy: String,
    #[serde(default)]
    pub min_relevance_score: Option<f64>,
    /// Keep only candidates published on or after this instant.
    #[serde(default)]
    pub published_after: Option<chrono::DateTime<chrono::Utc>>,
    /// Keep only candidates published on or before this instant.
    #[serde(default)]
    pub published_before: Option<chrono::DateTime<chrono::Utc>>,
    /// Keep only candidates whose sentiment score falls in `[min_sentiment, max_sentiment]`;
    /// candidates with no sentiment score are never filtered out by this pair.
    #[serde(default)]
    pub min_sentiment: Option<f64>,
    #[serde(default)]
    pub max_sentiment: Option<f64>,
}

fn default_top_k() -> usize {
    10
}
fn default_strategy() -> String {
    "hybrid".to_string()
}

#[derive(Serialize)]
pub struct SearchHit {
    pub article_id: String,
    pub title: String,
    pub source: String,
    pub url: Option<String>,
    pub score: f64,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
}

pub async fn enhanced_search(State(state): State<Arc<AppState>>, Json(req): Json<SearchRequest>) -> Result<Json<SearchResponse>> {
    if !(1..=50).contains(&req.top_k) {
        return Err(GatewayError::Validation("top_k must be between 1 and 50".to_string()));
    }
    let strategy: Strategy = req
        .ranking_strategy
        .parse()
        .map_err(|_| GatewayError::Validation(format!("unknown ranking_strategy: {}", req.ranking_strategy)))?;

    let ranked = state
        .search
        .search(&req.query, strategy, req.top_k)
        .await
        .map_err(GatewayError::Internal)?;

    let min_score = req.min_relevance_score.unwrap_or(f64::MIN);
    let results = ranked
        .into_iter()
        .filter(|r| r.breakdown.total >= min_score)
        .filter(|r| match r.candidate.published_date {
            Some(d) => {
                req.published_after.is_none_or(|after| d >= after)
                    && req.published_before.is_none_or(|before| d <= before)
            }
            None => req.published_after.is_none() && req.published_before.is_none(),
        })
        .filter(|r| match r.candidate.sentiment_score {
            Some(s) => {
                req.min_sentiment.is_none_or(|min| s >= min) && req.max_sentiment.is_none_or(|max| s <= max)
            }
            None => true,
        })
        .map(|r| SearchHit {
            article_id: r.candidate.article_id,
            title: r.candidate.title,
            source: r.candidate.source,
            url: r.candidate.url,
            score: r.breakdown.total,
        })
        .collect();

    Ok(Json(SearchResponse { results }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_top_k_is_ten() {
        assert_eq!(default_top_k(), 10);
    }

    #[test]
    fn default_strategy_is_hybrid() {
        assert_eq!(default_strategy(), "hybrid");
        assert!(default_strategy().parse::<Strategy>().is_ok());
    }

    #[test]
    fn unknown_ranking_strategy_is_rejected_before_search_runs() {
        let req = SearchRequest {
            query: "mo salah injury".to_string(),
            top_k: 5,
            ranking_strategy: "not_a_real_strategy".to_string(),
            min_relevance_score: None,
            published_after: None,
            published_before: None,
            min_sentiment: None,
            max_sentiment: None,
        };
        let parsed: std::result::Result<Strategy, _> = req.ranking_strategy.parse();
        assert!(parsed.is_err());
    }

    #[test]
    fn top_k_bounds_reject_zero_and_over_fifty() {
        assert!(!(1..=50).contains(&0usize));
        assert!(!(1..=50).contains(&51usize));
        assert!((1..=50).contains(&50usize));
    }
}
