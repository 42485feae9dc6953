//! Normalized user authentication
//!
//! Every provider response is folded into one shape so callers never need to
//! care whether the token came from the web flow, the device flow, a reset or
//! a refresh.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ClientType;

/// Authentication kind; always `"token"` for user authentications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticationType {
    #[default]
    Token,
}

/// Token kind; always `"oauth"` for user-to-server tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    #[default]
    Oauth,
}

/// A user access token together with the app credentials it belongs to.
///
/// Serializes in camelCase (`tokenType`, `clientSecret`, `expiresAt`...), the
/// shape HTTP clients receive from the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authentication {
    #[serde(rename = "type", default)]
    pub kind: AuthenticationType,
    #[serde(default)]
    pub token_type: TokenType,
    pub client_type: ClientType,
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    pub token: String,
    /// Granted scopes (OAuth Apps only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
}

impl Authentication {
    /// Create an authentication for a bare token
    pub fn new(
        client_type: ClientType,
        client_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            kind: AuthenticationType::Token,
            token_type: TokenType::Oauth,
            client_type,
            client_id: client_id.into(),
            client_secret: None,
            token: token.into(),
            scopes: None,
            refresh_token: None,
            expires_at: None,
            refresh_token_expires_at: None,
        }
    }

    pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(client_secret.into());
        self
    }

    /// Set scopes; ignored for GitHub Apps which have no scopes
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        if self.client_type.has_scopes() {
            self.scopes = Some(scopes);
        }
        self
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_refresh_token_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.refresh_token_expires_at = Some(expires_at);
        self
    }

    /// Copy without the client secret, safe to hand to HTTP clients
    pub fn without_client_secret(&self) -> Self {
        Self {
            client_secret: None,
            ..self.clone()
        }
    }

    /// Check if the token is expired (tokens without expiry never expire)
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|expires_at| Utc::now() >= expires_at)
    }

    /// Short token prefix for logs
    pub fn token_preview(&self) -> &str {
        token_preview(&self.token)
    }
}

/// First few characters of a token, never the whole value
pub fn token_preview(token: &str) -> &str {
    let end = token
        .char_indices()
        .nth(6)
        .map(|(index, _)| index)
        .unwrap_or(token.len());
    &token[..end]
}
