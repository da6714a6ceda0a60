//! `WS /ws/chat/{conn_id}` — full-duplex chat. Inbound frames are
//! `{"message": "...", "conversation_id": "..."}`; outbound frames are the
//! nine [`OrchestratorEvent`] variants serialized to the wire shape in
//! §6 (`message_received`, `typing`, `cache_hit`, `cache_miss`, `no_cache`,
//! `token`, `final_response`, `message_complete`, `error`).

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{ConnectInfo, Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use pitchline_agent::{process_message, OrchestratorEvent};

use crate::app::AppState;
use crate::rate_limit;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Path(conn_id): Path<String>,
    headers: axum::http::HeaderMap,
) -> impl IntoResponse {
    if let Err(e) = rate_limit::check(&state, &headers, Some(peer)) {
        return e.into_response();
    }
    ws.on_upgrade(move |socket| handle_connection(socket, state, conn_id)).into_response()
}

#[derive(Deserialize)]
struct InboundFrame {
    message: String,
    #[serde(default)]
    conversation_id: Option<String>,
}

async fn handle_connection(socket: WebSocket, state: Arc<AppState>, conn_id: String) {
    info!(conn_id = %conn_id, "new WS connection");
    state.ws_clients.insert(conn_id.clone(), ());

    let (mut tx, mut rx) = socket.split();

    while let Some(Ok(msg)) = rx.next().await {
        let Message::Text(text) = msg else {
            if matches!(msg, Message::Close(_)) {
                break;
            }
            continue;
        };

        let frame: InboundFrame = match serde_json::from_str(&text) {
            Ok(f) => f,
            Err(e) => {
                warn!(conn_id = %conn_id, error = %e, "malformed WS frame");
                continue;
            }
        };

        let conversation_id = frame
            .conversation_id
            .unwrap_or_else(|| pitchline_core::types::ConversationId::new().to_string());

        let (events_tx, mut events_rx) = mpsc::channel::<OrchestratorEvent>(32);
        let task_state = state.clone();
        let message = frame.message.clone();
        let conv = conversation_id.clone();
        tokio::spawn(async move {
            process_message(
                task_state.provider.as_ref(),
                &task_state.cache,
                &task_state.memory,
                &task_state.prompt,
                &task_state.tools,
                &conv,
                &message,
                &task_state.config.agent.chat_model,
                task_state.config.agent.max_tokens,
                task_state.config.agent.max_tool_iterations,
                Some(events_tx),
            )
            .await;
        });

        while let Some(event) = events_rx.recv().await {
            let payload = frame_payload(event);
            let json = serde_json::to_string(&payload).unwrap_or_default();
            if tx.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    }

    state.ws_clients.remove(&conn_id);
    info!(conn_id = %conn_id, "WS connection closed");
}

fn frame_payload(event: OrchestratorEvent) -> serde_json::Value {
    use serde_json::json;
    match event {
        OrchestratorEvent::MessageReceived => json!({"type": "message_received"}),
        OrchestratorEvent::Typing => json!({"type": "typing"}),
        OrchestratorEvent::CacheHit { category } => json!({"type": "cache_hit", "category": category}),
        OrchestratorEvent::CacheMiss { category, ttl_hours } => {
            json!({"type": "cache_miss", "category": category, "ttl_hours": ttl_hours})
        }
        OrchestratorEvent::NoCache => json!({"type": "no_cache"}),
        OrchestratorEvent::Token { text } => json!({"type": "token", "text": text}),
        OrchestratorEvent::FinalResponse { content } => json!({"type": "final_response", "content": content}),
        OrchestratorEvent::MessageComplete => json!({"type": "message_complete"}),
        OrchestratorEvent::Error { message } => json!({"type": "error", "message": message}),
    }
}
