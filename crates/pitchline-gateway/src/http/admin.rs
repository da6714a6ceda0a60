//! Admin and introspection routes: `/rate-limit/config`, `/users/{id}/tier`,
//! `/stats`, `/rate-limit/classify`.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::{Deserialize, Serialize};

use pitchline_cache::classify as classify_message;
use pitchline_core::types::{Identity, Tier};

use crate::app::AppState;
use crate::error::{GatewayError, Result};

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<()> {
    let token = headers
        .get("x-admin-token")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if token == state.config.gateway.admin_token {
        Ok(())
    } else {
        Err(GatewayError::AuthFailed("invalid or missing X-Admin-Token".to_string()))
    }
}

#[derive(Serialize)]
pub struct RateLimitConfigResponse {
    pub quotas: std::collections::HashMap<String, u64>,
    pub window_duration_secs: u64,
    pub sub_windows: u64,
    pub default_tier: String,
}

/// `GET /rate-limit/config` — admin.
pub async fn rate_limit_config(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Result<Json<RateLimitConfigResponse>> {
    require_admin(&state, &headers)?;
    let cfg = &state.config.limiter;
    Ok(Json(RateLimitConfigResponse {
        quotas: cfg.quotas.clone(),
        window_duration_secs: cfg.window_duration_secs,
        sub_windows: cfg.sub_windows,
        default_tier: cfg.default_tier.clone(),
    }))
}

#[derive(Serialize)]
pub struct TierResponse {
    pub identity: String,
    pub tier: String,
}

/// `GET /users/{id}/tier` — admin.
pub async fn get_tier(State(state): State<Arc<AppState>>, headers: HeaderMap, Path(id): Path<String>) -> Result<Json<TierResponse>> {
    require_admin(&state, &headers)?;
    let identity = Identity::from(id.clone());
    let tier = state.limiter.get_tier(&identity);
    Ok(Json(TierResponse {
        identity: id,
        tier: tier.as_str().to_string(),
    }))
}

#[derive(Deserialize)]
pub struct SetTierRequest {
    pub tier: String,
}

/// `POST /users/{id}/tier` — admin.
pub async fn set_tier(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<SetTierRequest>,
) -> Result<Json<TierResponse>> {
    require_admin(&state, &headers)?;
    let tier: Tier = req
        .tier
        .parse()
        .map_err(|e: String| GatewayError::Validation(e))?;
    let identity = Identity::from(id.clone());
    state
        .limiter
        .set_tier(&identity, tier)
        .map_err(|e| GatewayError::Internal(e.to_string()))?;
    Ok(Json(TierResponse {
        identity: id,
        tier: tier.as_str().to_string(),
    }))
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub rate_limit: pitchline_limiter::RateLimitStatsSnapshot,
    pub cache: pitchline_cache::CacheStatsSnapshot,
}

/// `GET /stats` — not rate-limited, no admin guard.
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        rate_limit: state.limiter.stats.snapshot(),
        cache: state.cache.statistics(),
    })
}

#[derive(Deserialize)]
pub struct ClassifyRequest {
    pub message: String,
}

#[derive(Serialize)]
pub struct ClassifyResponse {
    pub category: String,
}

/// `POST /rate-limit/classify` — debug endpoint, never touches C3/C4.
pub async fn classify(Json(req): Json<ClassifyRequest>) -> Json<ClassifyResponse> {
    Json(ClassifyResponse {
        category: classify_message(&req.message).as_str().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn classify_route_reflects_the_cache_categoriser() {
        let Json(resp) = classify(Json(ClassifyRequest {
            message: "What's the score of the Arsenal game right now?".to_string(),
        }))
        .await;
        assert_eq!(resp.category, pitchline_cache::classify("What's the score of the Arsenal game right now?").as_str());
    }
}
