use std::collections::HashSet;

use pitchline_core::config::RankerConfig;
use regex::RegexSet;

use crate::error::Result;
use crate::types::{Candidate, RankedCandidate, ScoreBreakdown, Strategy};

/// Hybrid relevance ranker (C8): re-scores an initial semantic-search result
/// set against one of four strategies and returns the top `final_k`,
/// breaking ties deterministically so repeated queries over unchanged data
/// always return the same order.
pub struct Ranker {
    config: RankerConfig,
    clickbait: RegexSet,
}

impl Ranker {
    pub fn new(config: RankerConfig) -> Result<Self> {
        let clickbait = RegexSet::new(
            config
                .clickbait_patterns
                .iter()
                .map(|p| format!("(?i){p}")),
        )?;
        Ok(Self { config, clickbait })
    }

    /// Scores `candidates` under `strategy`, sorts by total score descending
    /// with the tie-break chain (source credibility, published date, input
    /// order), and returns the top `final_k`.
    pub fn rank(
        &self,
        candidates: Vec<Candidate>,
        query: &str,
        strategy: Strategy,
        final_k: usize,
    ) -> Vec<RankedCandidate> {
        let query_terms = tokenize(query);
        let now = chrono::Utc::now();

        let mut scored: Vec<(usize, RankedCandidate)> = candidates
            .into_iter()
            .enumerate()
            .map(|(idx, candidate)| {
                let breakdown = self.score(&candidate, &query_terms, strategy, now);
                (idx, RankedCandidate { candidate, breakdown })
            })
            .collect();

        scored.sort_by(|(idx_a, a), (idx_b, b)| {
            b.breakdown
                .total
                .total_cmp(&a.breakdown.total)
                .then_with(|| self.source_weight(&b.candidate.source).total_cmp(&self.source_weight(&a.candidate.source)))
                .then_with(|| b.candidate.published_date.cmp(&a.candidate.published_date))
                .then_with(|| idx_a.cmp(idx_b))
        });

        scored
            .into_iter()
            .take(final_k)
            .map(|(_, ranked)| ranked)
            .collect()
    }

    fn score(
        &self,
        candidate: &Candidate,
        query_terms: &HashSet<String>,
        strategy: Strategy,
        now: chrono::DateTime<chrono::Utc>,
    ) -> ScoreBreakdown {
        let weights = self
            .config
            .scoring_weights
            .get(strategy.as_str())
            .cloned()
            .unwrap_or_default();
        let w = |key: &str| weights.get(key).copied().unwrap_or(0.0);

        match strategy {
            Strategy::Semantic => ScoreBreakdown {
                semantic: candidate.semantic_score,
                total: candidate.semantic_score * w("semantic"),
                ..Default::default()
            },
            Strategy::Temporal => {
                let temporal = self.time_decay(candidate, now, self.config.temporal_decay_rate);
                let text_relevance = self.text_relevance_boost(query_terms, candidate);
                let total = candidate.semantic_score * w("semantic")
                    + temporal * w("temporal")
                    + text_relevance * w("text_relevance");
                ScoreBreakdown {
                    semantic: candidate.semantic_score,
                    temporal: Some(temporal),
                    text_relevance: Some(text_relevance),
                    total,
                    ..Default::default()
                }
            }
            Strategy::Engagement => {
                let source_credibility = self.source_weight(&candidate.source);
                let content_quality = self.content_quality_score(candidate);
                let text_relevance = self.text_relevance_boost(query_terms, candidate);
                let sentiment = self.sentiment_relevance(candidate.sentiment_score);
                let total = candidate.semantic_score * w("semantic")
                    + source_credibility * w("source_credibility")
                    + content_quality * w("content_quality")
                    + text_relevance * w("text_relevance")
                    + sentiment * w("sentiment");
                ScoreBreakdown {
                    semantic: candidate.semantic_score,
                    source_credibility: Some(source_credibility),
                    content_quality: Some(content_quality),
                    text_relevance: Some(text_relevance),
                    sentiment: Some(sentiment),
                    total,
                    ..Default::default()
                }
            }
            Strategy::Hybrid => {
                let temporal = self.time_decay(candidate, now, self.config.hybrid_decay_rate);
                let source_credibility = self.source_weight(&candidate.source);
                let text_relevance = self.text_relevance_boost(query_terms, candidate);
                let content_quality = self.content_quality_score(candidate);
                let sentiment = self.sentiment_relevance(candidate.sentiment_score);
                let total = candidate.semantic_score * w("semantic")
                    + temporal * w("temporal")
                    + source_credibility * w("source_credibility")
                    + text_relevance * w("text_relevance")
                    + content_quality * w("content_quality")
                    + sentiment * w("sentiment");
                ScoreBreakdown {
                    semantic: candidate.semantic_score,
                    temporal: Some(temporal),
                    source_credibility: Some(source_credibility),
                    text_relevance: Some(text_relevance),
                    content_quality: Some(content_quality),
                    sentiment: Some(sentiment),
                    total,
                }
            }
        }
    }

    fn time_decay(
        &self,
        candidate: &Candidate,
        now: chrono::DateTime<chrono::Utc>,
        decay_rate: f64,
    ) -> f64 {
        match candidate.published_date {
            Some(published) => {
                let days_old = (now - published).num_days().max(0) as f64;
                (-decay_rate * days_old).exp()
            }
            None => self.config.default_time_decay,
        }
    }

    fn source_weight(&self, source: &str) -> f64 {
        self.config
            .source_weights
            .get(source)
            .copied()
            .unwrap_or(self.config.default_source_weight)
    }

    fn text_relevance_boost(&self, query_terms: &HashSet<String>, candidate: &Candidate) -> f64 {
        if query_terms.is_empty() {
            return 0.0;
        }
        let title = candidate.title.to_lowercase();
        let content = candidate.content.to_lowercase();

        let title_matches = query_terms.iter().filter(|t| title.contains(t.as_str())).count() as f64;
        let title_boost = (title_matches / query_terms.len() as f64) * self.config.title_match_weight;

        let content_matches = query_terms
            .iter()
            .filter(|t| content.contains(t.as_str()))
            .count() as f64;
        let content_boost = content_matches / query_terms.len() as f64;

        (title_boost + content_boost).min(1.0)
    }

    fn content_quality_score(&self, candidate: &Candidate) -> f64 {
        let content_len = candidate.content.chars().count();
        let min_len = self.config.optimal_content_len_min;
        let max_len = self.config.optimal_content_len_max;

        let length_score = if content_len >= min_len && content_len <= max_len {
            1.0
        } else if content_len < min_len {
            content_len as f64 / min_len as f64
        } else {
            (max_len as f64 / content_len as f64).max(0.5)
        };

        let title_len = candidate.title.chars().count();
        let mut title_score = if title_len < self.config.min_title_len || title_len > self.config.max_title_len {
            0.8
        } else {
            1.0
        };
        if self.clickbait.is_match(&candidate.title) {
            title_score *= self.config.clickbait_penalty;
        }

        (length_score + title_score) / 2.0
    }

    fn sentiment_relevance(&self, sentiment_score: Option<f64>) -> f64 {
        let base = self.config.neutral_sentiment_base;
        match sentiment_score {
            None => base,
            Some(s) if s >= 0.0 => base + s * self.config.positive_sentiment_multiplier,
            Some(s) => base + s * self.config.negative_sentiment_multiplier,
        }
    }
}

fn tokenize(query: &str) -> HashSet<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(|s| s.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(source: &str, days_old: i64, semantic_score: f64) -> Candidate {
        Candidate {
            article_id: format!("a-{source}-{days_old}"),
            title: "Club completes transfer of star midfielder".to_string(),
            content: "a".repeat(1000),
            source: source.to_string(),
            url: None,
            published_date: Some(chrono::Utc::now() - chrono::Duration::days(days_old)),
            sentiment_score: Some(0.2),
            semantic_score,
        }
    }

    fn ranker() -> Ranker {
        Ranker::new(RankerConfig::default()).unwrap()
    }

    #[test]
    fn semantic_only_strategy_ignores_other_factors() {
        let ranker = ranker();
        let candidates = vec![candidate("Unknown Blog", 0, 0.9), candidate("BBC Sport", 0, 0.5)];
        let ranked = ranker.rank(candidates, "transfer", Strategy::Semantic, 2);
        assert_eq!(ranked[0].candidate.source, "Unknown Blog");
    }

    #[test]
    fn hybrid_strategy_favours_credible_recent_source() {
        let ranker = ranker();
        let candidates = vec![candidate("Unknown Blog", 30, 0.6), candidate("BBC Sport", 0, 0.6)];
        let ranked = ranker.rank(candidates, "transfer midfielder", Strategy::Hybrid, 2);
        assert_eq!(ranked[0].candidate.source, "BBC Sport");
    }

    #[test]
    fn missing_published_date_uses_default_time_decay() {
        let ranker = ranker();
        let mut c = candidate("BBC Sport", 0, 0.5);
        c.published_date = None;
        let ranked = ranker.rank(vec![c], "transfer", Strategy::Hybrid, 1);
        assert_eq!(ranked[0].breakdown.temporal, Some(0.5));
    }

    #[test]
    fn clickbait_title_is_penalised() {
        let ranker = ranker();
        let mut c = candidate("BBC Sport", 0, 0.5);
        c.title = "10 Things You Won't Believe About This Shocking Transfer".to_string();
        let quality = ranker.content_quality_score(&c);
        let mut clean = c.clone();
        clean.title = "Club completes transfer of star midfielder today".to_string();
        let clean_quality = ranker.content_quality_score(&clean);
        assert!(quality < clean_quality);
    }

    #[test]
    fn tie_break_prefers_higher_source_credibility() {
        let ranker = ranker();
        let a = candidate("ESPN", 0, 0.5);
        let b = candidate("BBC Sport", 0, 0.5);
        let ranked = ranker.rank(vec![a, b], "", Strategy::Semantic, 2);
        assert_eq!(ranked[0].candidate.source, "BBC Sport");
    }

    #[test]
    fn unknown_strategy_string_is_rejected() {
        assert!("bogus".parse::<Strategy>().is_err());
    }
}
