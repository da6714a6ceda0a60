use std::sync::LazyLock;

use regex::RegexSet;
use serde::{Deserialize, Serialize};

/// Classification label. `NoCache` means the message is personalised and
/// must never be read from or written to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Factual,
    News,
    Opinion,
    NoCache,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Factual => "factual",
            Category::News => "news",
            Category::Opinion => "opinion",
            Category::NoCache => "no_cache",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

static PERSONALISED: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\bmy team\b",
        r"(?i)\brecommend\b",
        r"(?i)\bshould i\b",
        r"(?i)\bfor me\b",
        r"(?i)\bfpl\b.*\b(recommend|suggest|advice|team|squad)\b",
    ])
    .expect("personalised pattern set is valid")
});

static FACTUAL: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\bstats?\b",
        r"(?i)\brecord\b",
        r"(?i)\bage\b",
        r"(?i)\bgoals?\b",
        r"(?i)\bborn\b",
        r"(?i)\bwhen\b",
        r"(?i)\bwhere\b",
        r"(?i)\bhow many\b",
        r"(?i)\bassists?\b",
        r"(?i)\bheight\b",
    ])
    .expect("factual pattern set is valid")
});

static NEWS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\bnews\b",
        r"(?i)\blatest\b",
        r"(?i)\btoday\b",
        r"(?i)\binjury\b",
        r"(?i)\btransfer\b",
        r"(?i)\bmatch\b",
        r"(?i)\bresult\b",
        r"(?i)\bfixture\b",
        r"(?i)\bsigning\b",
    ])
    .expect("news pattern set is valid")
});

static OPINION: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\bthink\b",
        r"(?i)\bbest\b",
        r"(?i)\brate\b",
        r"(?i)\bprediction\b",
        r"(?i)\bshould\b",
        r"(?i)\bwould\b",
        r"(?i)\bopinion\b",
        r"(?i)\boverrated\b",
        r"(?i)\bunderrated\b",
    ])
    .expect("opinion pattern set is valid")
});

/// Deterministic, pure, stateless query classification (C2).
///
/// Personalised intent always wins and short-circuits to `NoCache`.
/// Otherwise the group with the most matches wins; ties prefer
/// `factual > news > opinion`; an all-zero count defaults to `opinion`.
pub fn classify(message: &str) -> Category {
    if PERSONALISED.is_match(message) {
        return Category::NoCache;
    }

    let factual = FACTUAL.matches(message).iter().count();
    let news = NEWS.matches(message).iter().count();
    let opinion = OPINION.matches(message).iter().count();

    let max = factual.max(news).max(opinion);
    if max == 0 {
        return Category::Opinion;
    }
    if factual == max {
        Category::Factual
    } else if news == max {
        Category::News
    } else {
        Category::Opinion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn personalised_wins_regardless_of_other_matches() {
        assert_eq!(
            classify("Should I captain Salah this gameweek, what are his stats?"),
            Category::NoCache
        );
    }

    #[test]
    fn factual_query_classifies_factual() {
        assert_eq!(
            classify("How many goals has Haaland scored this season?"),
            Category::Factual
        );
    }

    #[test]
    fn news_query_classifies_news() {
        assert_eq!(
            classify("What's the latest transfer news today?"),
            Category::News
        );
    }

    #[test]
    fn opinion_query_classifies_opinion() {
        assert_eq!(
            classify("Who do you think is the best striker in the league?"),
            Category::Opinion
        );
    }

    #[test]
    fn ties_prefer_factual_over_news_over_opinion() {
        // "goals" (factual) and "match" (news) both match once; factual wins.
        assert_eq!(classify("goals match"), Category::Factual);
        // "match" (news) and "think" (opinion) both match once; news wins.
        assert_eq!(classify("match think"), Category::News);
    }

    #[test]
    fn empty_message_defaults_to_opinion() {
        assert_eq!(classify(""), Category::Opinion);
        assert_eq!(classify("hello there"), Category::Opinion);
    }

    #[test]
    fn classification_is_deterministic() {
        let msg = "What's the latest news on City's injury list?";
        assert_eq!(classify(msg), classify(msg));
    }
}
