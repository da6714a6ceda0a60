use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RankError;

/// One vector-search hit plus the article metadata needed to re-rank it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub article_id: String,
    pub title: String,
    pub content: String,
    pub source: String,
    pub url: Option<String>,
    pub published_date: Option<chrono::DateTime<chrono::Utc>>,
    pub sentiment_score: Option<f64>,
    /// Cosine similarity from the vector index, already in `[0, 1]`.
    pub semantic_score: f64,
}

/// Which relevance model to combine scoring factors with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Semantic,
    Temporal,
    Engagement,
    Hybrid,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Semantic => "semantic_only",
            Strategy::Temporal => "temporal",
            Strategy::Engagement => "engagement",
            Strategy::Hybrid => "hybrid",
        }
    }
}

impl FromStr for Strategy {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "semantic" | "semantic_only" => Ok(Strategy::Semantic),
            "temporal" => Ok(Strategy::Temporal),
            "engagement" => Ok(Strategy::Engagement),
            "hybrid" => Ok(Strategy::Hybrid),
            other => Err(RankError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Per-factor breakdown alongside the combined score, so callers (and the
/// `/search/enhanced-search` response) can show their work.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScoreBreakdown {
    pub semantic: f64,
    pub temporal: Option<f64>,
    pub source_credibility: Option<f64>,
    pub text_relevance: Option<f64>,
    pub content_quality: Option<f64>,
    pub sentiment: Option<f64>,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    pub candidate: Candidate,
    pub breakdown: ScoreBreakdown,
}
