//! `GET /health` — liveness probe. Never consumes rate-limit quota.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

use crate::app::AppState;

static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let start = START.get_or_init(Instant::now);
    let store_ok = state.articles.get(0).is_ok();

    Json(json!({
        "status": "ok",
        "uptime_secs": start.elapsed().as_secs(),
        "store_connected": store_ok,
        "ws_clients": state.ws_clients.len(),
    }))
}
