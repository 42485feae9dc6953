//! OAuth operations provider
//!
//! The network side of every token operation sits behind [`OAuthProvider`].
//! [`GitHubOAuthProvider`] talks to github.com (or GitHub Enterprise Server);
//! tests plug in their own implementation.

mod github;

pub use github::{GitHubEndpoints, GitHubOAuthProvider};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use crate::domain::{Authentication, ClientType};
use crate::error::ProviderError;

/// App credentials passed with every provider call
#[derive(Clone)]
pub struct ClientCredentials {
    pub client_type: ClientType,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_type", &self.client_type)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .finish()
    }
}

/// Code exchange input of the web flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebFlowExchange {
    pub code: String,
    pub state: Option<String>,
    pub redirect_url: Option<String>,
}

/// What the user must see to complete the device flow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceVerification {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    /// Seconds until `device_code` expires
    pub expires_in: u64,
    /// Minimum seconds between polls
    pub interval: u64,
}

/// Receives the device flow verification record.
///
/// Called once, before polling starts. Closures returning
/// `impl Future<Output = anyhow::Result<()>>` implement this trait.
#[async_trait]
pub trait VerificationHandler: Send + Sync {
    async fn on_verification(&self, verification: DeviceVerification) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> VerificationHandler for F
where
    F: Fn(DeviceVerification) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    async fn on_verification(&self, verification: DeviceVerification) -> anyhow::Result<()> {
        (self)(verification).await
    }
}

/// Input of `scope_token` (GitHub Apps only).
///
/// Deserializes from the camelCase JSON body of `POST /token/scoped`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeTokenOptions {
    pub token: String,
    /// Login of the user or organization to scope the token to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repositories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository_ids: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<BTreeMap<String, String>>,
}

/// Normalized result of check/reset/refresh/scope.
///
/// `data` is the raw provider payload; `authentication` the credential it
/// describes (for reset/refresh/scope, the new one).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenResponse {
    pub data: Value,
    pub authentication: Authentication,
}

impl TokenResponse {
    /// Same response with `clientSecret` removed from the authentication
    pub fn without_client_secret(&self) -> Self {
        Self {
            data: self.data.clone(),
            authentication: self.authentication.without_client_secret(),
        }
    }
}

/// External OAuth operations provider
///
/// Implementations dispatch on `credentials.client_type` where OAuth Apps
/// and GitHub Apps use different endpoints or response shapes, and always
/// return the normalized shapes above.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Exchange a web flow `code` for a user access token
    async fn exchange_web_flow_code(
        &self,
        credentials: &ClientCredentials,
        exchange: WebFlowExchange,
    ) -> Result<Authentication, ProviderError>;

    /// Run the device flow until the user authorizes (or it fails)
    async fn device_flow(
        &self,
        credentials: &ClientCredentials,
        scopes: Vec<String>,
        on_verification: Arc<dyn VerificationHandler>,
    ) -> Result<Authentication, ProviderError>;

    async fn check_token(
        &self,
        credentials: &ClientCredentials,
        token: &str,
    ) -> Result<TokenResponse, ProviderError>;

    async fn reset_token(
        &self,
        credentials: &ClientCredentials,
        token: &str,
    ) -> Result<TokenResponse, ProviderError>;

    async fn refresh_token(
        &self,
        credentials: &ClientCredentials,
        refresh_token: &str,
    ) -> Result<TokenResponse, ProviderError>;

    async fn scope_token(
        &self,
        credentials: &ClientCredentials,
        options: &ScopeTokenOptions,
    ) -> Result<TokenResponse, ProviderError>;

    async fn delete_token(
        &self,
        credentials: &ClientCredentials,
        token: &str,
    ) -> Result<(), ProviderError>;

    /// Revoke the whole grant, invalidating every token of the user for this app
    async fn delete_authorization(
        &self,
        credentials: &ClientCredentials,
        token: &str,
    ) -> Result<(), ProviderError>;
}
