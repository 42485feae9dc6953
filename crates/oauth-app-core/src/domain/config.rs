//! App configuration
//!
//! Immutable after construction. Shared by reference with every operation of
//! an `OAuthApp`.

use std::fmt;
use zeroize::Zeroizing;

use super::ClientType;
use crate::provider::ClientCredentials;

/// Configuration of one GitHub OAuth App or GitHub App
#[derive(Clone)]
pub struct OAuthAppConfig {
    pub client_type: ClientType,
    pub client_id: String,
    pub client_secret: Zeroizing<String>,
    /// Scopes requested when none are given (OAuth Apps only)
    pub default_scopes: Vec<String>,
    /// Whether the login page offers to sign up; `None` leaves GitHub's default
    pub allow_signup: Option<bool>,
    /// GitHub base URL override (GitHub Enterprise Server)
    pub base_url: Option<String>,
    /// Redirect URL sent with the web flow
    pub redirect_url: Option<String>,
}

impl OAuthAppConfig {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        let client_id = client_id.into();
        Self {
            client_type: ClientType::infer_from_client_id(&client_id),
            client_id,
            client_secret: Zeroizing::new(client_secret.into()),
            default_scopes: Vec::new(),
            allow_signup: None,
            base_url: None,
            redirect_url: None,
        }
    }

    /// Credentials handed to the provider for every call
    pub fn credentials(&self) -> ClientCredentials {
        ClientCredentials {
            client_type: self.client_type,
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.to_string(),
        }
    }

    /// Whether `refresh_token` may be called for this app
    pub fn supports_refresh(&self) -> bool {
        self.client_type == ClientType::GitHubApp
    }
}

impl fmt::Debug for OAuthAppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthAppConfig")
            .field("client_type", &self.client_type)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("default_scopes", &self.default_scopes)
            .field("allow_signup", &self.allow_signup)
            .field("base_url", &self.base_url)
            .field("redirect_url", &self.redirect_url)
            .finish()
    }
}
