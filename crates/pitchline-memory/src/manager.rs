use std::sync::Arc;

use pitchline_store::KvStore;
use tracing::{instrument, warn};

use crate::error::Result;
use crate::types::{ConversationBuffer, Speaker, Turn};

fn key(conversation_id: &str) -> String {
    format!("conversation:{conversation_id}")
}

/// Fixed-window conversation memory (C5): keeps the last `window_turns`
/// human/AI turns for a conversation, durably persisted through the
/// key-value store under `conversation:{id}` with a TTL so idle
/// conversations fall out of the store on their own.
///
/// A missing or expired key is not an error — it simply rehydrates as an
/// empty buffer, the same "cold start" the rate limiter and cache apply to
/// a never-seen identity.
pub struct ConversationMemory {
    store: Arc<dyn KvStore>,
    window_turns: usize,
    ttl_secs: u64,
}

impl ConversationMemory {
    pub fn new(store: Arc<dyn KvStore>, window_turns: usize, ttl_days: u64) -> Self {
        Self {
            store,
            window_turns,
            ttl_secs: ttl_days * 24 * 3600,
        }
    }

    /// Loads the current buffer for a conversation, empty if absent/expired.
    pub fn recent(&self, conversation_id: &str) -> Result<Vec<Turn>> {
        Ok(self.load(conversation_id)?.turns)
    }

    /// Appends a turn, trims to the configured window, and persists.
    #[instrument(skip(self, content), fields(conversation_id, speaker = %speaker))]
    pub fn append(&self, conversation_id: &str, speaker: Speaker, content: &str) -> Result<()> {
        let mut buffer = self.load(conversation_id)?;
        buffer.turns.push(Turn {
            speaker,
            content: content.to_string(),
            timestamp: chrono::Utc::now(),
        });
        if buffer.turns.len() > self.window_turns {
            let excess = buffer.turns.len() - self.window_turns;
            buffer.turns.drain(0..excess);
        }
        self.store
            .set_ex(&key(conversation_id), &serde_json::to_string(&buffer)?, self.ttl_secs)?;
        Ok(())
    }

    /// Drops the stored buffer for a conversation entirely.
    pub fn clear(&self, conversation_id: &str) -> Result<()> {
        self.store.delete(&key(conversation_id))?;
        Ok(())
    }

    /// Renders the last `max_turns` turns as a flat transcript, for
    /// injection into a cache key or a model prompt. Empty string if the
    /// conversation has no history.
    pub fn serialise(&self, conversation_id: &str, max_turns: usize) -> Result<String> {
        let turns = self.recent(conversation_id)?;
        let start = turns.len().saturating_sub(max_turns);
        Ok(turns[start..]
            .iter()
            .map(|t| format!("{}: {}", t.speaker, t.content))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Renders the last 3 turns as `T:content[0:100]` pairs joined by `|`,
    /// the exact context fingerprint the response cache folds into its key.
    pub fn cache_context(&self, conversation_id: &str) -> Result<String> {
        let turns = self.recent(conversation_id)?;
        let start = turns.len().saturating_sub(3);
        Ok(turns[start..]
            .iter()
            .map(|t| {
                let tag = match t.speaker {
                    Speaker::Human => "H",
                    Speaker::Ai => "A",
                };
                let truncated: String = t.content.chars().take(100).collect();
                format!("{tag}:{truncated}")
            })
            .collect::<Vec<_>>()
            .join("|"))
    }

    fn load(&self, conversation_id: &str) -> Result<ConversationBuffer> {
        match self.store.get(&key(conversation_id)) {
            Ok(Some(raw)) => Ok(serde_json::from_str(&raw)?),
            Ok(None) => Ok(ConversationBuffer::default()),
            Err(e) => {
                warn!(conversation_id, error = %e, "conversation store unavailable, starting empty");
                Ok(ConversationBuffer::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitchline_store::sqlite::SqliteStore;

    fn memory() -> ConversationMemory {
        let store: Arc<dyn KvStore> = Arc::new(SqliteStore::open(":memory:").unwrap());
        ConversationMemory::new(store, 4, 7)
    }

    #[test]
    fn unknown_conversation_starts_empty() {
        let mem = memory();
        assert!(mem.recent("unknown").unwrap().is_empty());
    }

    #[test]
    fn append_and_recent_round_trip() {
        let mem = memory();
        mem.append("c1", Speaker::Human, "hello").unwrap();
        mem.append("c1", Speaker::Ai, "hi there").unwrap();
        let turns = mem.recent("c1").unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].content, "hello");
        assert_eq!(turns[1].speaker, Speaker::Ai);
    }

    #[test]
    fn window_trims_oldest_turns() {
        let mem = memory();
        for i in 0..6 {
            mem.append("c1", Speaker::Human, &format!("turn {i}")).unwrap();
        }
        let turns = mem.recent("c1").unwrap();
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[0].content, "turn 2");
        assert_eq!(turns.last().unwrap().content, "turn 5");
    }

    #[test]
    fn clear_removes_history() {
        let mem = memory();
        mem.append("c1", Speaker::Human, "hello").unwrap();
        mem.clear("c1").unwrap();
        assert!(mem.recent("c1").unwrap().is_empty());
    }

    #[test]
    fn serialise_formats_last_n_turns() {
        let mem = memory();
        mem.append("c1", Speaker::Human, "first").unwrap();
        mem.append("c1", Speaker::Ai, "second").unwrap();
        mem.append("c1", Speaker::Human, "third").unwrap();
        let rendered = mem.serialise("c1", 2).unwrap();
        assert_eq!(rendered, "ai: second\nhuman: third");
    }

    #[test]
    fn cache_context_uses_type_tagged_last_three_turns() {
        let mem = memory();
        mem.append("c1", Speaker::Human, "hello there").unwrap();
        mem.append("c1", Speaker::Ai, "hi").unwrap();
        let ctx = mem.cache_context("c1").unwrap();
        assert_eq!(ctx, "H:hello there|A:hi");
    }
}
