use std::convert::Infallible;
use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tower_http::cors::{Any, CorsLayer};

use super::prelude::*;
use crate::config::AppConfig;
use crate::constants::{UNKNOWN_CALLER, X_FORWARDED_FOR};
use crate::error::{InternalDetail, internal_error_body};
use crate::rate_limit::{Decision, retry_after_secs};

/// Who is calling, for quota and rate limiting purposes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CallerId(pub(crate) String);

impl CallerId {
    /// First `X-Forwarded-For` entry, then the socket peer, then a fixed
    /// placeholder.
    fn from_parts(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let forwarded = headers
            .get(X_FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned);

        Self(
            forwarded
                .or_else(|| peer.map(|addr| addr.ip().to_string()))
                .unwrap_or_else(|| UNKNOWN_CALLER.to_string()),
        )
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let caller = Self::from_parts(&parts.headers, peer);

        async move { Ok(caller) }
    }
}

/// Throttles generation routes per caller and path.
pub(crate) async fn rate_limit(
    State(state): State<AppState>,
    caller: CallerId,
    request: Request<Body>,
    next: Next,
) -> Response {
    match state.limiter.check(caller.as_str(), request.uri().path()) {
        Decision::Allowed => next.run(request).await,
        Decision::Limited { retry_after } => {
            warn!(
                caller = caller.as_str(),
                path = request.uri().path(),
                "Rate limit exceeded"
            );
            ApiError::RateLimited {
                retry_after: retry_after_secs(retry_after),
            }
            .into_response()
        }
    }
}

/// In debug mode, swaps the generic 500 body for the real error.
pub(crate) async fn expose_internal_detail(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    if !state.config.debug {
        return response;
    }
    let Some(InternalDetail(detail)) = response.extensions_mut().remove::<InternalDetail>() else {
        return response;
    };
    (response.status(), Json(internal_error_body(&detail))).into_response()
}

pub(crate) fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("Ignoring invalid CORS origin {origin:?}: {err}");
                None
            }
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
