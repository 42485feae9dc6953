//! Authenticated GitHub client
//!
//! `GitHubClientFactory` builds request-capable clients bound to a user
//! credential, or unauthenticated clients that refuse every request with a
//! stated reason. Event contexts carry a `LazyClient` so no client is built
//! unless a handler asks for one.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::debug;

use crate::branding;
use crate::domain::{api_base_url, Authentication};
use crate::error::{OAuthAppError, ProviderError, Result};

/// Credential a client issues requests with
#[derive(Debug, Clone)]
pub enum ClientAuth {
    /// `authorization: token <token>`
    User(Authentication),
    /// No credential; every request fails with `reason`
    Unauthenticated { reason: String },
}

/// Builds [`GitHubClient`]s sharing one connection pool
#[derive(Debug, Clone)]
pub struct GitHubClientFactory {
    http: reqwest::Client,
    api_url: String,
}

impl GitHubClientFactory {
    /// Factory for `https://api.github.com` or a GitHub Enterprise base URL
    pub fn new(base_url: Option<&str>) -> Self {
        Self::with_http_client(reqwest::Client::new(), base_url)
    }

    pub fn with_http_client(http: reqwest::Client, base_url: Option<&str>) -> Self {
        Self {
            http,
            api_url: api_base_url(base_url),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn build(&self, auth: ClientAuth) -> GitHubClient {
        GitHubClient {
            http: self.http.clone(),
            api_url: self.api_url.clone(),
            auth,
        }
    }

    pub fn user(&self, authentication: Authentication) -> GitHubClient {
        self.build(ClientAuth::User(authentication))
    }

    pub fn unauthenticated(&self, reason: impl Into<String>) -> GitHubClient {
        self.build(ClientAuth::Unauthenticated {
            reason: reason.into(),
        })
    }

    /// Deferred client; built on first [`LazyClient::get`]
    pub fn lazy(&self, auth: ClientAuth) -> LazyClient {
        LazyClient {
            factory: self.clone(),
            auth,
            client: OnceLock::new(),
        }
    }
}

/// Minimal GitHub REST client
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    auth: ClientAuth,
}

impl GitHubClient {
    pub fn auth(&self) -> &ClientAuth {
        &self.auth
    }

    /// The user authentication, if this client is authenticated
    pub fn authentication(&self) -> Option<&Authentication> {
        match &self.auth {
            ClientAuth::User(authentication) => Some(authentication),
            ClientAuth::Unauthenticated { .. } => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authentication().is_some()
    }

    /// `GET {api}{path}`
    pub async fn get(&self, path: &str) -> Result<Value> {
        self.request::<()>(Method::GET, path, None).await
    }

    /// Send a request to the REST API and decode the JSON response.
    ///
    /// Empty responses (e.g. `204 No Content`) decode to `Value::Null`.
    pub async fn request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value> {
        let authentication = match &self.auth {
            ClientAuth::User(authentication) => authentication,
            ClientAuth::Unauthenticated { reason } => {
                return Err(OAuthAppError::Unauthenticated {
                    reason: reason.clone(),
                })
            }
        };

        let url = format!("{}{}", self.api_url, path);
        debug!(
            method = %method,
            url = %url,
            token = authentication.token_preview(),
            "[GitHubClient] Sending request"
        );

        let mut request = self
            .http
            .request(method, &url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header(reqwest::header::USER_AGENT, branding::user_agent())
            .header(
                reqwest::header::AUTHORIZATION,
                format!("token {}", authentication.token),
            );
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(ProviderError::from)?;
        let status = response.status();
        let text = response.text().await.map_err(ProviderError::from)?;

        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
                message: api_error_message(&text, status.canonical_reason()),
            }
            .into());
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ProviderError::Decode(e.to_string()).into())
    }
}

/// GitHub's `message` field of an error body, falling back to the status text
pub(crate) fn api_error_message(body: &str, fallback: Option<&str>) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("message")?.as_str().map(str::to_string))
        .unwrap_or_else(|| fallback.unwrap_or("request failed").to_string())
}

/// A client built on first access and then reused
#[derive(Debug)]
pub struct LazyClient {
    factory: GitHubClientFactory,
    auth: ClientAuth,
    client: OnceLock<GitHubClient>,
}

impl LazyClient {
    pub fn get(&self) -> &GitHubClient {
        self.client.get_or_init(|| {
            debug!("[GitHubClient] Building client for event handler");
            self.factory.build(self.auth.clone())
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.client.get().is_some()
    }
}
