use serde::{Deserialize, Serialize};

/// Which side of the conversation spoke a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Human,
    Ai,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::Human => "human",
            Speaker::Ai => "ai",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single human or AI turn in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub content: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl Turn {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Human,
            content: content.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Ai,
            content: content.into(),
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Fixed-window buffer of the last `window` turns, the on-the-wire shape
/// persisted under `conversation:{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationBuffer {
    pub turns: Vec<Turn>,
}
