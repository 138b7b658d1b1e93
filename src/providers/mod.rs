//! Clients for the external text and image generation APIs.
//!
//! Both adapters map provider failures onto [`ProviderError`]; the web layer
//! turns that into a 401 for rejected keys and a 502 for everything else.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::constants::{X_ANTHROPIC_KEY, X_OPENAI_KEY};

pub mod copy;
pub mod image;
#[cfg(test)]
pub(crate) mod mock;

/// Longest provider error body passed through to callers.
const MAX_ERROR_DETAIL: usize = 300;

/// Which upstream a call went to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
    /// Copy generation
    Anthropic,
    /// Image generation
    OpenAi,
}

impl Provider {
    /// Lower case identifier used in error bodies.
    pub fn slug(self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
            Provider::OpenAi => "openai",
        }
    }

    /// Request header that carries a caller-supplied key for this provider.
    pub fn key_header(self) -> &'static str {
        match self {
            Provider::Anthropic => X_ANTHROPIC_KEY,
            Provider::OpenAi => X_OPENAI_KEY,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Anthropic => f.write_str("Anthropic"),
            Provider::OpenAi => f.write_str("OpenAI"),
        }
    }
}

/// Ways a provider call can fail.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The key was rejected
    #[error("Your {provider} API key is invalid or has been revoked. Please check your key and try again.")]
    Authentication {
        /// Upstream
        provider: Provider,
    },
    /// The provider throttled us
    #[error("{provider} rate limit exceeded. Please wait a moment and try again.")]
    RateLimited {
        /// Upstream
        provider: Provider,
    },
    /// Connect failure or timeout
    #[error("Could not connect to the {provider} API: {detail}")]
    Unreachable {
        /// Upstream
        provider: Provider,
        /// Transport error text
        detail: String,
    },
    /// Any other error reply, or a reply we couldn't read
    #[error("{provider} API error: {message}")]
    Api {
        /// Upstream
        provider: Provider,
        /// Provider supplied message
        message: String,
    },
}

impl ProviderError {
    /// Upstream the error came from.
    pub fn provider(&self) -> Provider {
        match self {
            ProviderError::Authentication { provider }
            | ProviderError::RateLimited { provider }
            | ProviderError::Unreachable { provider, .. }
            | ProviderError::Api { provider, .. } => *provider,
        }
    }

    /// Classifies a non-success HTTP reply.
    pub(crate) fn from_status(provider: Provider, status: StatusCode, body: &[u8]) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ProviderError::Authentication { provider }
            }
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { provider },
            _ => ProviderError::Api {
                provider,
                message: format!("{status}: {}", error_message(body)),
            },
        }
    }

    /// Classifies a transport level failure.
    pub(crate) fn from_transport(provider: Provider, err: &reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            ProviderError::Unreachable {
                provider,
                detail: err.to_string(),
            }
        } else {
            ProviderError::Api {
                provider,
                message: err.to_string(),
            }
        }
    }

    /// The reply was 2xx but not the shape we expected.
    pub(crate) fn malformed(provider: Provider, detail: impl fmt::Display) -> Self {
        ProviderError::Api {
            provider,
            message: format!("unexpected response: {detail}"),
        }
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Both providers reply `{"error": {"message": ..}}`; anything else is passed
/// through truncated.
fn error_message(body: &[u8]) -> String {
    if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) {
        return envelope.error.message;
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        "no error detail returned".to_string()
    } else {
        text.chars().take(MAX_ERROR_DETAIL).collect()
    }
}

/// HTTP client shared by the adapters.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_taxonomy() {
        assert!(matches!(
            ProviderError::from_status(Provider::Anthropic, StatusCode::UNAUTHORIZED, b""),
            ProviderError::Authentication {
                provider: Provider::Anthropic
            }
        ));
        assert!(matches!(
            ProviderError::from_status(Provider::OpenAi, StatusCode::TOO_MANY_REQUESTS, b""),
            ProviderError::RateLimited {
                provider: Provider::OpenAi
            }
        ));
        let err = ProviderError::from_status(
            Provider::Anthropic,
            StatusCode::INTERNAL_SERVER_ERROR,
            br#"{"type":"error","error":{"type":"api_error","message":"Overloaded"}}"#,
        );
        assert_eq!(
            err.to_string(),
            "Anthropic API error: 500 Internal Server Error: Overloaded"
        );
    }

    #[test]
    fn plain_error_bodies_are_truncated() {
        let body = "x".repeat(1000);
        assert_eq!(error_message(body.as_bytes()).len(), MAX_ERROR_DETAIL);
        assert_eq!(error_message(b"  "), "no error detail returned");
    }
}
