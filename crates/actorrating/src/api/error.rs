use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::ratelimit::{RateLimitDecision, RateLimitError, UnknownAction};
use crate::rating::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("too many requests, try again after {reset_time}")]
    RateLimited { reset_time: DateTime<Utc> },

    #[error("rate limiter unavailable")]
    RateLimiterUnavailable(#[source] RateLimitError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn rate_limited(decision: &RateLimitDecision) -> Self {
        ApiError::RateLimited {
            reset_time: decision.reset_time,
        }
    }
}

impl From<RateLimitError> for ApiError {
    fn from(err: RateLimitError) -> Self {
        match err {
            RateLimitError::UnconfiguredAction(_) | RateLimitError::InvalidPolicy { .. } => {
                ApiError::Internal(err.into())
            }
            RateLimitError::StoreUnavailable { .. } | RateLimitError::StoreTimeout { .. } => {
                ApiError::RateLimiterUnavailable(err)
            }
        }
    }
}

impl From<UnknownAction> for ApiError {
    fn from(err: UnknownAction) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(err) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": err.to_string(),
                    "fields": err.fields,
                })),
            )
                .into_response(),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("{what} not found") })),
            )
                .into_response(),
            ApiError::RateLimited { reset_time } => {
                let retry_after = (reset_time - Utc::now()).num_seconds().max(1);
                let mut resp = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({
                        "error": "Too many requests. Please try again later.",
                        "resetTime": reset_time,
                    })),
                )
                    .into_response();
                if let Ok(v) = HeaderValue::from_str(&retry_after.to_string()) {
                    resp.headers_mut().insert(header::RETRY_AFTER, v);
                }
                resp
            }
            ApiError::RateLimiterUnavailable(err) => {
                tracing::error!(error = %err, "rejecting request, rate limiter unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "error": "service temporarily unavailable" })),
                )
                    .into_response()
            }
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal error" })),
                )
                    .into_response()
            }
        }
    }
}
