//! `POST /chat`, `GET /chat/stream` (SSE), `POST /chat/feedback`, and the
//! `/conversations/{id}` read/clear pair.
//!
//! `/chat` and `/chat/stream` run the same orchestrator
//! ([`pitchline_agent::process_message`]); the only difference is whether
//! the caller wants one JSON object back or a live SSE feed of the turn's
//! events.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

use pitchline_agent::{process_message, OrchestratorEvent};
use pitchline_core::types::ConversationId;
use pitchline_memory::Speaker;

use crate::app::AppState;
use crate::error::{GatewayError, Result};
use crate::rate_limit;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Serialize)]
pub struct ChatReply {
    pub response: String,
    pub conversation_id: String,
    pub timestamp: String,
}

/// `POST /chat` — one-shot, non-streaming turn.
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Result<axum::response::Response> {
    if req.message.trim().is_empty() {
        return Err(GatewayError::Validation("message cannot be empty".to_string()));
    }
    let info = rate_limit::check(&state, &headers, Some(peer))?;

    let conversation_id = req
        .conversation_id
        .unwrap_or_else(|| ConversationId::new().to_string());

    let result = process_message(
        state.provider.as_ref(),
        &state.cache,
        &state.memory,
        &state.prompt,
        &state.tools,
        &conversation_id,
        &req.message,
        req.model.as_deref().unwrap_or(&state.config.agent.chat_model),
        state.config.agent.max_tokens,
        state.config.agent.max_tool_iterations,
        None,
    )
    .await;

    let body = Json(ChatReply {
        response: result.content,
        conversation_id,
        timestamp: chrono::Utc::now().to_rfc3339(),
    });
    Ok(rate_limit::apply_headers(body.into_response(), &info))
}

#[derive(Deserialize)]
pub struct StreamQuery {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

/// `GET /chat/stream` — Server-Sent-Events feed of the turn's lifecycle.
pub async fn chat_stream_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(q): Query<StreamQuery>,
) -> Result<axum::response::Response> {
    if q.message.trim().is_empty() {
        return Err(GatewayError::Validation("message cannot be empty".to_string()));
    }
    let info = rate_limit::check(&state, &headers, Some(peer))?;

    let conversation_id = q
        .conversation_id
        .unwrap_or_else(|| ConversationId::new().to_string());

    let (tx, mut rx) = mpsc::channel::<OrchestratorEvent>(32);
    let stream_state = state.clone();
    let message = q.message.clone();
    let conv_for_task = conversation_id.clone();
    tokio::spawn(async move {
        process_message(
            stream_state.provider.as_ref(),
            &stream_state.cache,
            &stream_state.memory,
            &stream_state.prompt,
            &stream_state.tools,
            &conv_for_task,
            &message,
            &stream_state.config.agent.chat_model,
            stream_state.config.agent.max_tokens,
            stream_state.config.agent.max_tool_iterations,
            Some(tx),
        )
        .await;
    });

    let events = async_stream::stream! {
        yield Ok::<Event, Infallible>(Event::default().data(serde_json::json!({"type": "start"}).to_string()));
        while let Some(event) = rx.recv().await {
            let payload = sse_payload(event);
            yield Ok(Event::default().data(payload.to_string()));
        }
        yield Ok(Event::default().data(serde_json::json!({"type": "end"}).to_string()));
    };

    let events: std::pin::Pin<Box<dyn Stream<Item = std::result::Result<Event, Infallible>> + Send>> =
        Box::pin(events);
    let resp = Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response();
    Ok(rate_limit::apply_headers(resp, &info))
}

fn sse_payload(event: OrchestratorEvent) -> serde_json::Value {
    use serde_json::json;
    match event {
        OrchestratorEvent::MessageReceived => json!({"type": "message_received"}),
        OrchestratorEvent::Typing => json!({"type": "typing"}),
        OrchestratorEvent::CacheHit { category } => json!({"type": "cache_hit", "category": category}),
        OrchestratorEvent::CacheMiss { category, ttl_hours } => {
            json!({"type": "cache_miss", "category": category, "ttl_hours": ttl_hours})
        }
        OrchestratorEvent::NoCache => json!({"type": "no_cache"}),
        OrchestratorEvent::Token { text } => json!({"type": "chunk", "text": text}),
        OrchestratorEvent::FinalResponse { content } => json!({"type": "final_response", "content": content}),
        OrchestratorEvent::MessageComplete => json!({"type": "message_complete"}),
        OrchestratorEvent::Error { message } => json!({"type": "error", "message": message}),
    }
}

#[derive(Deserialize)]
pub struct FeedbackRequest {
    pub conversation_id: String,
    pub message_index: usize,
    pub rating: i32,
}

/// `POST /chat/feedback` — acknowledged and logged, not scored against
/// anything this repo stores.
pub async fn feedback_handler(Json(req): Json<FeedbackRequest>) -> Json<serde_json::Value> {
    info!(
        conversation_id = %req.conversation_id,
        message_index = req.message_index,
        rating = req.rating,
        "chat feedback received"
    );
    Json(serde_json::json!({"acknowledged": true}))
}

#[derive(Serialize)]
pub struct ConversationTurn {
    pub speaker: String,
    pub content: String,
    pub timestamp: String,
}

/// `GET /conversations/{id}` — reads C5's durable buffer directly.
pub async fn get_conversation(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<Json<Vec<ConversationTurn>>> {
    let turns = state
        .memory
        .recent(&id)
        .map_err(|e| GatewayError::Internal(e.to_string()))?;
    Ok(Json(
        turns
            .into_iter()
            .map(|t| ConversationTurn {
                speaker: match t.speaker {
                    Speaker::Human => "human".to_string(),
                    Speaker::Ai => "ai".to_string(),
                },
                content: t.content,
                timestamp: t.timestamp.to_rfc3339(),
            })
            .collect(),
    ))
}

/// `DELETE /conversations/{id}` — clears the durable key.
pub async fn delete_conversation(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<Json<serde_json::Value>> {
    state.memory.clear(&id).map_err(|e| GatewayError::Internal(e.to_string()))?;
    Ok(Json(serde_json::json!({"cleared": true})))
}
