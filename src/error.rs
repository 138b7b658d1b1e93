//! Error handling

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{HeaderValue, StatusCode, header::RETRY_AFTER};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};
use tracing::{error, info, warn};

use crate::brief::BriefError;
use crate::providers::{Provider, ProviderError};

/// Message callers see in place of internal error detail.
pub const GENERIC_INTERNAL_DETAIL: &str = "An unexpected error occurred";

/// Internal error detail, attached to 500 responses so debug mode can show it.
#[derive(Clone, Debug)]
pub struct InternalDetail(pub String);

/// Errors surfaced at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or out of range input
    #[error("{0}")]
    Validation(String),
    /// No key for a provider was supplied
    #[error("{0} API key required.")]
    MissingCredential(Provider),
    /// Daily free tier quota used up
    #[error("Daily free generation limit reached. Try again after the reset or use your own API keys.")]
    QuotaExceeded {
        /// always zero
        remaining: u32,
        /// configured daily limit
        limit: u32,
        /// when the quota resets
        resets_at: DateTime<Utc>,
    },
    /// Too many requests from this caller on this route
    #[error("Too many requests. Please wait before trying again.")]
    RateLimited {
        /// Seconds until the window closes
        retry_after: u64,
    },
    /// Free tier switched off
    #[error("The free tier is currently disabled.")]
    FreeTierDisabled,
    /// Free tier has no shared provider key
    #[error("The free tier is not available on this server.")]
    FreeTierUnavailable,
    /// Provider call failed
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// Requested resource doesn't exist
    #[error("{0}")]
    NotFound(String),
    /// When DB operations fail
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    /// When an internal server error occurs
    #[error("{0}")]
    Internal(String),
}

impl From<BriefError> for ApiError {
    fn from(err: BriefError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl ApiError {
    /// Machine readable code for the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "invalid_input",
            ApiError::MissingCredential(_) => "missing_api_key",
            ApiError::QuotaExceeded { .. } => "quota_exceeded",
            ApiError::RateLimited { .. } => "rate_limit_exceeded",
            ApiError::FreeTierDisabled => "free_tier_disabled",
            ApiError::FreeTierUnavailable => "free_tier_unavailable",
            ApiError::Provider(ProviderError::Authentication { .. }) => "invalid_api_key",
            ApiError::Provider(_) => "upstream_provider_error",
            ApiError::NotFound(_) => "not_found",
            ApiError::Database(_) | ApiError::Internal(_) => "internal_error",
        }
    }

    /// HTTP status for the response.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingCredential(_)
            | ApiError::Provider(ProviderError::Authentication { .. }) => StatusCode::UNAUTHORIZED,
            ApiError::QuotaExceeded { .. } | ApiError::RateLimited { .. } => {
                StatusCode::TOO_MANY_REQUESTS
            }
            ApiError::FreeTierDisabled | ApiError::FreeTierUnavailable => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Provider(_) => StatusCode::BAD_GATEWAY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn extra(&self) -> Map<String, Value> {
        let mut extra = Map::new();
        match self {
            ApiError::MissingCredential(provider) => {
                extra.insert("service".into(), provider.slug().into());
            }
            ApiError::Provider(err) => {
                extra.insert("service".into(), err.provider().slug().into());
            }
            ApiError::QuotaExceeded {
                remaining,
                limit,
                resets_at,
            } => {
                extra.insert("remaining".into(), (*remaining).into());
                extra.insert("daily_limit".into(), (*limit).into());
                let resets_at = resets_at.to_rfc3339_opts(SecondsFormat::AutoSi, true);
                extra.insert("resets_at".into(), resets_at.into());
            }
            ApiError::RateLimited { retry_after } => {
                extra.insert("retry_after".into(), (*retry_after).into());
            }
            _ => {}
        }
        extra
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut internal = None;
        let detail = match &self {
            ApiError::Database(err) => {
                error!("Database error: {}", err);
                internal = Some(err.to_string());
                GENERIC_INTERNAL_DETAIL.to_string()
            }
            ApiError::Internal(message) => {
                error!("Internal server error: {}", message);
                internal = Some(message.clone());
                GENERIC_INTERNAL_DETAIL.to_string()
            }
            ApiError::Provider(err) => {
                warn!(service = err.provider().slug(), "Provider error: {}", err);
                self.to_string()
            }
            ApiError::NotFound(what) => {
                info!("404 {what}");
                self.to_string()
            }
            _ => {
                info!(code = self.code(), "Request rejected: {}", self);
                self.to_string()
            }
        };

        let mut body = Map::new();
        body.insert("success".into(), false.into());
        body.insert("error".into(), self.code().into());
        body.insert("detail".into(), detail.into());
        body.extend(self.extra());

        let mut response = (status, Json(Value::Object(body))).into_response();
        if let ApiError::RateLimited { retry_after } = &self {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(*retry_after));
        }
        if let Some(detail) = internal {
            response.extensions_mut().insert(InternalDetail(detail));
        }
        response
    }
}

/// Envelope for an internal error with its detail shown.
pub fn internal_error_body(detail: &str) -> Value {
    json!({
        "success": false,
        "error": "internal_error",
        "detail": detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> Value {
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn quota_exceeded_carries_counts() {
        let resets_at = DateTime::parse_from_rfc3339("2026-10-19T00:00:00Z")
            .expect("timestamp")
            .with_timezone(&Utc);
        let response = ApiError::QuotaExceeded {
            remaining: 0,
            limit: 5,
            resets_at,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "quota_exceeded");
        assert_eq!(body["remaining"], 0);
        assert_eq!(body["daily_limit"], 5);
        assert_eq!(body["resets_at"], "2026-10-19T00:00:00Z");
    }

    #[tokio::test]
    async fn rate_limited_sets_retry_after() {
        let response = ApiError::RateLimited { retry_after: 42 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(RETRY_AFTER).expect("retry-after"),
            "42"
        );
        let body = body_json(response).await;
        assert_eq!(body["error"], "rate_limit_exceeded");
        assert_eq!(body["retry_after"], 42);
    }

    #[tokio::test]
    async fn provider_errors_split_auth_from_upstream() {
        let auth = ApiError::from(ProviderError::Authentication {
            provider: Provider::OpenAi,
        })
        .into_response();
        assert_eq!(auth.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(auth).await;
        assert_eq!(body["error"], "invalid_api_key");
        assert_eq!(body["service"], "openai");

        let upstream = ApiError::from(ProviderError::RateLimited {
            provider: Provider::Anthropic,
        })
        .into_response();
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(upstream).await;
        assert_eq!(body["error"], "upstream_provider_error");
        assert_eq!(body["service"], "anthropic");
    }

    #[tokio::test]
    async fn internal_detail_is_hidden_but_attached() {
        let response = ApiError::Internal("disk on fire".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response
                .extensions()
                .get::<InternalDetail>()
                .map(|detail| detail.0.as_str()),
            Some("disk on fire")
        );
        let body = body_json(response).await;
        assert_eq!(body["detail"], GENERIC_INTERNAL_DETAIL);
    }

    #[test]
    fn unavailable_and_disabled_have_distinct_codes() {
        assert_ne!(
            ApiError::FreeTierDisabled.code(),
            ApiError::FreeTierUnavailable.code()
        );
        assert_eq!(
            ApiError::FreeTierUnavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::MissingCredential(Provider::Anthropic).to_string(),
            "Anthropic API key required."
        );
    }
}
