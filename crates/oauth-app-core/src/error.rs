//! Error types
//!
//! `OAuthAppError` is what every facade operation fails with. Its `Display`
//! is the user-facing message the router puts into `{"error": ...}` bodies,
//! so each variant renders with the package prefix.

use serde::Deserialize;
use std::fmt;

use crate::branding::ERROR_PREFIX;
use crate::domain::{ClientType, EventKey};

pub type Result<T> = std::result::Result<T, OAuthAppError>;

#[derive(Debug, thiserror::Error)]
pub enum OAuthAppError {
    /// Missing or malformed input, detected before any network call
    #[error("{} {}", ERROR_PREFIX, .0)]
    Validation(String),

    /// Operation not available for the configured client type
    #[error(
        "{} app.{}() is not supported for {}",
        ERROR_PREFIX,
        .operation,
        .client_type.display_name()
    )]
    UnsupportedOperation {
        operation: &'static str,
        client_type: ClientType,
    },

    /// The OAuth provider rejected the request or could not be reached
    #[error("{0}")]
    Provider(#[from] ProviderError),

    /// Request issued through an unauthenticated client
    #[error("{} {}", ERROR_PREFIX, .reason)]
    Unauthenticated { reason: String },

    /// An event handler failed; emission stopped at this handler
    #[error("{} \"{}\" event handler failed: {}", ERROR_PREFIX, .key, .source)]
    EventHandler {
        key: EventKey,
        #[source]
        source: anyhow::Error,
    },
}

impl OAuthAppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unsupported(operation: &'static str, client_type: ClientType) -> Self {
        Self::UnsupportedOperation {
            operation,
            client_type,
        }
    }
}

/// Errors of the external OAuth operations provider
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// OAuth error payload returned with a 200 status
    #[error("{0}")]
    OAuth(OAuthErrorBody),

    /// Non-2xx REST API response
    #[error("{message} (HTTP {status})")]
    Http { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Decode(String),

    /// Verification callback of the device flow failed
    #[error("device verification failed: {0}")]
    Verification(String),
}

/// `error`, `error_description`, `error_uri` of a GitHub OAuth error response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OAuthErrorBody {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error_uri: Option<String>,
}

impl fmt::Display for OAuthErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.error_description, &self.error_uri) {
            (Some(description), Some(uri)) => {
                write!(f, "{} ({}, {})", description, self.error, uri)
            }
            (Some(description), None) => write!(f, "{} ({})", description, self.error),
            (None, _) => f.write_str(&self.error),
        }
    }
}
