//! Maps every crate-level error into the HTTP status + JSON body shape
//! clients see: `{"error": "<code>", "message": "<human text>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("authentication failed: {0}")]
    AuthFailed(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rate limit exceeded")]
    QuotaExceeded(pitchline_limiter::RateLimitInfo),
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    fn code(&self) -> &'static str {
        match self {
            GatewayError::Validation(_) => "VALIDATION_ERROR",
            GatewayError::AuthFailed(_) => "AUTH_FAILED",
            GatewayError::NotFound(_) => "NOT_FOUND",
            GatewayError::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            GatewayError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::AuthFailed(_) => StatusCode::UNAUTHORIZED,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::QuotaExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let GatewayError::QuotaExceeded(ref info) = self {
            let mut resp = (
                status,
                Json(json!({
                    "error": self.code(),
                    "message": "rate limit exceeded",
                    "rate_limit": info,
                    "retry_after": info.reset_in_secs.max(1),
                })),
            )
                .into_response();
            let headers = resp.headers_mut();
            headers.insert("Retry-After", info.reset_in_secs.max(1).to_string().parse().unwrap());
            headers.insert("X-RateLimit-Limit", info.limit.to_string().parse().unwrap());
            headers.insert("X-RateLimit-Remaining", info.remaining.to_string().parse().unwrap());
            headers.insert("X-RateLimit-Reset", info.reset_at.to_string().parse().unwrap());
            headers.insert("X-RateLimit-Tier", info.tier.parse().unwrap());
            return resp;
        }

        (
            status,
            Json(ErrorBody {
                error: self.code(),
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    fn sample_rate_limit_info() -> pitchline_limiter::RateLimitInfo {
        pitchline_limiter::RateLimitInfo {
            identity: "ip:127.0.0.1".to_string(),
            tier: "free".to_string(),
            limit: 10,
            current_usage: 10,
            remaining: 0,
            reset_at: 1_700_000_000,
            reset_in_secs: 30,
            window_duration_secs: 60,
            degraded: false,
        }
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let err = GatewayError::Validation("bad input".to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn quota_exceeded_maps_to_429() {
        let err = GatewayError::QuotaExceeded(sample_rate_limit_info());
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn quota_exceeded_response_carries_retry_after_and_rate_limit_body() {
        let err = GatewayError::QuotaExceeded(sample_rate_limit_info());
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        let retry_after = resp.headers().get("Retry-After").unwrap().to_str().unwrap().to_string();
        assert_eq!(retry_after, "30");

        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "QUOTA_EXCEEDED");
        assert_eq!(json["rate_limit"]["remaining"], 0);
        assert_eq!(json["retry_after"], 30);
    }

    #[tokio::test]
    async fn not_found_response_has_plain_error_body() {
        let err = GatewayError::NotFound("conversation missing".to_string());
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "NOT_FOUND");
        assert!(json.get("rate_limit").is_none());
    }
}
