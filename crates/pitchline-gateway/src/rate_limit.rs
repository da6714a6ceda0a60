//! Shared admission check for the rate-limited routes — `/chat`,
//! `/chat/stream`, and `/ws/chat/{conn_id}`. Not middleware: each handler
//! needs the resulting `RateLimitInfo` to set response headers, so the
//! check is called explicitly at the top of each.

use axum::http::HeaderMap;
use axum::response::Response;
use std::net::SocketAddr;

use pitchline_limiter::RateLimitInfo;

use crate::app::AppState;
use crate::error::GatewayError;

pub fn check(state: &AppState, headers: &HeaderMap, peer: Option<SocketAddr>) -> Result<RateLimitInfo, GatewayError> {
    let identity = crate::identity::derive(headers, peer);
    let result = state.limiter.check(&identity);
    if result.allowed {
        Ok(result.info)
    } else {
        Err(GatewayError::QuotaExceeded(result.info))
    }
}

/// Stamps the standard `X-RateLimit-*` headers onto an allowed response.
/// `Retry-After` is reserved for the 429 path (see [`GatewayError`]'s
/// `IntoResponse` impl) — allowed responses carry only the budget headers.
pub fn apply_headers(mut resp: Response, info: &RateLimitInfo) -> Response {
    let headers = resp.headers_mut();
    headers.insert("X-RateLimit-Limit", info.limit.to_string().parse().unwrap());
    headers.insert("X-RateLimit-Remaining", info.remaining.to_string().parse().unwrap());
    headers.insert("X-RateLimit-Reset", info.reset_at.to_string().parse().unwrap());
    headers.insert("X-RateLimit-Tier", info.tier.parse().unwrap());
    resp
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn apply_headers_stamps_all_four_rate_limit_headers() {
        let info = RateLimitInfo {
            identity: "ip:127.0.0.1".to_string(),
            tier: "free".to_string(),
            limit: 100,
            current_usage: 5,
            remaining: 95,
            reset_at: 1_700_000_060,
            reset_in_secs: 60,
            window_duration_secs: 60,
            degraded: false,
        };
        let resp = apply_headers(().into_response(), &info);
        let headers = resp.headers();
        assert_eq!(headers.get("X-RateLimit-Limit").unwrap(), "100");
        assert_eq!(headers.get("X-RateLimit-Remaining").unwrap(), "95");
        assert_eq!(headers.get("X-RateLimit-Reset").unwrap(), "1700000060");
        assert_eq!(headers.get("X-RateLimit-Tier").unwrap(), "free");
        assert!(headers.get("Retry-After").is_none());
    }
}
