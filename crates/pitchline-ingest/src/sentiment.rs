//! Lexicon-based sentiment scoring — step 6 of the ingestion lifecycle.
//!
//! Deliberately simple: a real sentiment model is out of scope for this
//! pipeline, this just needs a stable, bounded score to feed the ranker's
//! sentiment signal.

const POSITIVE_WORDS: &[&str] = &[
    "win", "won", "victory", "champion", "excellent", "amazing", "great", "good", "success",
    "celebrate", "triumph", "outstanding", "brilliant", "fantastic", "superb", "perfect", "best",
    "incredible", "spectacular",
];

const NEGATIVE_WORDS: &[&str] = &[
    "lose", "lost", "defeat", "failure", "terrible", "awful", "bad", "worst", "disaster",
    "disappointing", "poor", "injured", "injury", "suspended", "banned", "controversy",
    "scandal", "crisis", "problem",
];

/// Scores `text` in `[-1.0, 1.0]` from the ratio of positive to negative
/// lexicon hits, scaled by 10 so a handful of charged words moves the
/// needle and clamped to the valid range.
pub fn calculate_sentiment(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    let words: Vec<String> = cleaned.to_lowercase().split_whitespace().map(String::from).collect();
    if words.is_empty() {
        return 0.0;
    }

    let positive = words.iter().filter(|w| POSITIVE_WORDS.contains(&w.as_str())).count();
    let negative = words.iter().filter(|w| NEGATIVE_WORDS.contains(&w.as_str())).count();
    if positive + negative == 0 {
        return 0.0;
    }

    let score = (positive as f64 - negative as f64) / words.len() as f64;
    (score * 10.0).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_text_scores_zero() {
        assert_eq!(calculate_sentiment("The match kicks off at three o'clock."), 0.0);
    }

    #[test]
    fn positive_words_skew_positive() {
        assert!(calculate_sentiment("An amazing victory, a brilliant triumph for the champions.") > 0.0);
    }

    #[test]
    fn negative_words_skew_negative() {
        assert!(calculate_sentiment("A terrible defeat, a disaster, the worst performance.") < 0.0);
    }

    #[test]
    fn empty_text_scores_zero() {
        assert_eq!(calculate_sentiment(""), 0.0);
    }
}
