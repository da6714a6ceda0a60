//! Orchestration pipeline (C7) — the single entry point a gateway handler
//! calls for one inbound chat message.
//!
//! `process_message` runs the full turn: classify → consult the cache →
//! on a hit, replay the cached reply as simulated tokens; on a miss, run
//! the tool-calling loop against the LLM → persist to conversation memory
//! → write through to the cache. Every step along the way emits an
//! `OrchestratorEvent` to the optional sink, which is how the WebSocket
//! layer turns a single call into the wire protocol's event sequence.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use pitchline_cache::{Category, ResponseCache};
use pitchline_memory::{ConversationMemory, Speaker};

use crate::provider::{ChatRequest, LlmProvider, Message, Role};
use crate::prompt::PromptBuilder;
use crate::tools::{tool_loop, Tool};

/// Simulated per-token delay when replaying a cached response, matching the
/// pacing a real streaming completion would have.
const SIMULATED_TOKEN_DELAY: Duration = Duration::from_millis(10);

/// Control/data events emitted over the course of one `process_message` call.
/// The WebSocket layer serialises each of these to one wire message.
#[derive(Debug, Clone)]
pub enum OrchestratorEvent {
    MessageReceived,
    Typing,
    CacheHit { category: &'static str },
    CacheMiss { category: &'static str, ttl_hours: f64 },
    NoCache,
    Token { text: String },
    FinalResponse { content: String },
    MessageComplete,
    Error { message: String },
}

/// Result of a completed turn, for callers that don't need the event stream.
pub struct ProcessedMessage {
    pub content: String,
    pub model: String,
    pub tokens_in: u32,
    pub tokens_out: u32,
    pub cache_hit: bool,
    pub tools_used: Vec<String>,
}

/// Runs one conversational turn end to end.
///
/// `events`, when present, receives every `OrchestratorEvent` as it happens;
/// a closed receiver is not an error — sends are best-effort.
#[allow(clippy::too_many_arguments)]
#[instrument(skip(provider, cache, memory, prompt, tools, message, events), fields(conversation_id, model))]
pub async fn process_message(
    provider: &dyn LlmProvider,
    cache: &ResponseCache,
    memory: &ConversationMemory,
    prompt: &PromptBuilder,
    tools: &[Box<dyn Tool>],
    conversation_id: &str,
    message: &str,
    model: &str,
    max_tokens: u32,
    max_tool_iterations: u32,
    events: Option<mpsc::Sender<OrchestratorEvent>>,
) -> ProcessedMessage {
    emit(&events, OrchestratorEvent::MessageReceived).await;
    emit(&events, OrchestratorEvent::Typing).await;

    let category = pitchline_cache::classify(message);
    let context = memory.cache_context(conversation_id).unwrap_or_default();

    if category != Category::NoCache {
        match cache.get(message, &context) {
            Ok(Some(cached)) => {
                emit(&events, OrchestratorEvent::CacheHit { category: category.as_str() }).await;
                stream_simulated_tokens(&events, &cached).await;
                emit(&events, OrchestratorEvent::FinalResponse { content: cached.clone() }).await;
                record_turn(memory, conversation_id, message, &cached);
                emit(&events, OrchestratorEvent::MessageComplete).await;
                return ProcessedMessage {
                    content: cached,
                    model: model.to_string(),
                    tokens_in: 0,
                    tokens_out: 0,
                    cache_hit: true,
                    tools_used: Vec::new(),
                };
            }
            Ok(None) => {
                emit(
                    &events,
                    OrchestratorEvent::CacheMiss {
                        category: category.as_str(),
                        ttl_hours: cache.planned_ttl_hours(category),
                    },
                )
                .await;
            }
            Err(e) => {
                warn!(error = %e, "cache lookup failed, treating as miss");
                emit(
                    &events,
                    OrchestratorEvent::CacheMiss {
                        category: category.as_str(),
                        ttl_hours: cache.planned_ttl_hours(category),
                    },
                )
                .await;
            }
        }
    } else {
        emit(&events, OrchestratorEvent::NoCache).await;
    }

    let history = memory.recent(conversation_id).unwrap_or_default();
    let mut messages: Vec<Message> = history
        .iter()
        .map(|t| Message {
            role: match t.speaker {
                Speaker::Human => Role::User,
                Speaker::Ai => Role::Assistant,
            },
            content: t.content.clone(),
        })
        .collect();
    messages.push(Message { role: Role::User, content: message.to_string() });

    let request = ChatRequest {
        model: model.to_string(),
        system: prompt.build(),
        messages,
        max_tokens,
        stream: false,
        tools: crate::tools::to_definitions(tools),
        raw_messages: None,
    };

    match tool_loop::run_tool_loop(provider, request, tools, max_tool_iterations as usize).await {
        Ok((response, tools_used)) => {
            record_turn(memory, conversation_id, message, &response.content);

            if category != Category::NoCache {
                if let Err(e) = cache.set(message, &context, &response.content) {
                    warn!(error = %e, "failed to write response cache");
                }
            }

            emit(&events, OrchestratorEvent::FinalResponse { content: response.content.clone() }).await;
            emit(&events, OrchestratorEvent::MessageComplete).await;

            ProcessedMessage {
                content: response.content,
                model: response.model,
                tokens_in: response.tokens_in,
                tokens_out: response.tokens_out,
                cache_hit: false,
                tools_used,
            }
        }
        Err(e) => {
            let reason = e.to_string();
            debug!(error = %reason, "tool loop failed");
            emit(&events, OrchestratorEvent::Error { message: reason.clone() }).await;

            let fallback = format!("I encountered an error processing your request: {reason}");
            record_turn(memory, conversation_id, message, &fallback);
            // The cache is intentionally not written on failure.

            emit(&events, OrchestratorEvent::FinalResponse { content: fallback.clone() }).await;
            emit(&events, OrchestratorEvent::MessageComplete).await;

            ProcessedMessage {
                content: fallback,
                model: model.to_string(),
                tokens_in: 0,
                tokens_out: 0,
                cache_hit: false,
                tools_used: Vec::new(),
            }
        }
    }
}

fn record_turn(memory: &ConversationMemory, conversation_id: &str, user_message: &str, reply: &str) {
    if let Err(e) = memory.append(conversation_id, Speaker::Human, user_message) {
        warn!(error = %e, "failed to persist human turn");
    }
    if let Err(e) = memory.append(conversation_id, Speaker::Ai, reply) {
        warn!(error = %e, "failed to persist assistant turn");
    }
}

async fn stream_simulated_tokens(events: &Option<mpsc::Sender<OrchestratorEvent>>, text: &str) {
    if events.is_none() {
        return;
    }
    for word in text.split_whitespace() {
        emit(events, OrchestratorEvent::Token { text: format!("{word} ") }).await;
        tokio::time::sleep(SIMULATED_TOKEN_DELAY).await;
    }
}

async fn emit(events: &Option<mpsc::Sender<OrchestratorEvent>>, event: OrchestratorEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use pitchline_core::config::CacheConfig;
    use pitchline_store::{sqlite::SqliteStore, KvStore};

    use crate::provider::{ChatResponse, ProviderError};

    use super::*;

    struct EchoProvider;

    #[async_trait]
    impl LlmProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
            Ok(ChatResponse {
                content: format!(
                    "echo: {}",
                    req.messages.last().map(|m| m.content.clone()).unwrap_or_default()
                ),
                model: req.model.clone(),
                tokens_in: 10,
                tokens_out: 5,
                stop_reason: "stop".to_string(),
                tool_calls: Vec::new(),
            })
        }
    }

    fn harness() -> (ResponseCache, ConversationMemory) {
        let store: Arc<dyn KvStore> = Arc::new(SqliteStore::open(":memory:").unwrap());
        let cache = ResponseCache::new(store.clone(), CacheConfig::default());
        let memory = ConversationMemory::new(store, 10, 7);
        (cache, memory)
    }

    #[tokio::test]
    async fn miss_then_hit_round_trip() {
        let (cache, memory) = harness();
        let prompt = PromptBuilder::new();
        let provider = EchoProvider;
        let tools: Vec<Box<dyn Tool>> = Vec::new();

        let first = process_message(
            &provider, &cache, &memory, &prompt, &tools,
            "conv-1", "How many goals has Haaland scored this season?",
            "gpt-4o-mini", 512, 3, None,
        ).await;
        assert!(!first.cache_hit);
        assert!(first.content.contains("echo:"));

        let second = process_message(
            &provider, &cache, &memory, &prompt, &tools,
            "conv-1", "How many goals has Haaland scored this season?",
            "gpt-4o-mini", 512, 3, None,
        ).await;
        assert!(second.cache_hit);
        assert_eq!(second.content, first.content);
    }

    #[tokio::test]
    async fn personalised_messages_never_cache() {
        let (cache, memory) = harness();
        let prompt = PromptBuilder::new();
        let provider = EchoProvider;
        let tools: Vec<Box<dyn Tool>> = Vec::new();

        let first = process_message(
            &provider, &cache, &memory, &prompt, &tools,
            "conv-2", "Should I captain Salah this week for my team?",
            "gpt-4o-mini", 512, 3, None,
        ).await;
        let second = process_message(
            &provider, &cache, &memory, &prompt, &tools,
            "conv-2", "Should I captain Salah this week for my team?",
            "gpt-4o-mini", 512, 3, None,
        ).await;
        assert!(!first.cache_hit);
        assert!(!second.cache_hit);
    }

    #[tokio::test]
    async fn emits_expected_event_sequence_on_miss() {
        let (cache, memory) = harness();
        let prompt = PromptBuilder::new();
        let provider = EchoProvider;
        let tools: Vec<Box<dyn Tool>> = Vec::new();
        let (tx, mut rx) = mpsc::channel(16);

        process_message(
            &provider, &cache, &memory, &prompt, &tools,
            "conv-3", "What's the latest transfer news today?",
            "gpt-4o-mini", 512, 3, Some(tx),
        ).await;

        let mut count = 0;
        while rx.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, 5); // MessageReceived, Typing, CacheMiss, FinalResponse, MessageComplete
    }
}
