//! Create, check, reset, refresh and scope tokens

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::OAuthApp;
use crate::domain::{Authentication, ClientType, EventAction, EventName};
use crate::error::{OAuthAppError, Result};
use crate::provider::{ScopeTokenOptions, TokenResponse, VerificationHandler, WebFlowExchange};

/// How to obtain a new user token
#[derive(Clone)]
pub enum CreateTokenOptions {
    /// Exchange the `code` GitHub redirected back with
    WebFlow {
        code: String,
        state: Option<String>,
        redirect_url: Option<String>,
    },
    /// Run the device flow; `on_verification` shows the user code to the user
    DeviceFlow {
        on_verification: Arc<dyn VerificationHandler>,
        /// OAuth Apps only; defaults to the configured scopes
        scopes: Option<Vec<String>>,
    },
}

impl CreateTokenOptions {
    pub fn web_flow(code: impl Into<String>) -> Self {
        Self::WebFlow {
            code: code.into(),
            state: None,
            redirect_url: None,
        }
    }

    pub fn device_flow<H: VerificationHandler + 'static>(on_verification: H) -> Self {
        Self::DeviceFlow {
            on_verification: Arc::new(on_verification),
            scopes: None,
        }
    }
}

impl fmt::Debug for CreateTokenOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WebFlow {
                state,
                redirect_url,
                ..
            } => f
                .debug_struct("WebFlow")
                .field("state", state)
                .field("redirect_url", redirect_url)
                .finish_non_exhaustive(),
            Self::DeviceFlow { scopes, .. } => f
                .debug_struct("DeviceFlow")
                .field("scopes", scopes)
                .finish_non_exhaustive(),
        }
    }
}

/// Result of `create_token`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateTokenResult {
    pub authentication: Authentication,
}

impl CreateTokenResult {
    pub fn without_client_secret(&self) -> Self {
        Self {
            authentication: self.authentication.without_client_secret(),
        }
    }
}

impl OAuthApp {
    /// Create a user token through the web flow or the device flow.
    ///
    /// Emits: `token.created`
    pub async fn create_token(&self, options: CreateTokenOptions) -> Result<CreateTokenResult> {
        let credentials = self.config.credentials();

        let authentication = match options {
            CreateTokenOptions::WebFlow {
                code,
                state,
                redirect_url,
            } => {
                debug!("[OAuthApp] Creating token via web flow");
                self.provider
                    .exchange_web_flow_code(
                        &credentials,
                        WebFlowExchange {
                            code,
                            state,
                            redirect_url: redirect_url.or_else(|| self.config.redirect_url.clone()),
                        },
                    )
                    .await?
            }
            CreateTokenOptions::DeviceFlow {
                on_verification,
                scopes,
            } => {
                debug!("[OAuthApp] Creating token via device flow");
                let scopes = match self.config.client_type {
                    ClientType::OAuthApp => {
                        scopes.unwrap_or_else(|| self.config.default_scopes.clone())
                    }
                    ClientType::GitHubApp => Vec::new(),
                };
                self.provider
                    .device_flow(&credentials, scopes, on_verification)
                    .await?
            }
        };

        info!(
            token = authentication.token_preview(),
            "[OAuthApp] Token created"
        );
        self.events
            .emit(self.authenticated_event(EventName::Token, EventAction::Created, &authentication))
            .await?;

        Ok(CreateTokenResult { authentication })
    }

    /// Check a token. Read-only; emits nothing.
    pub async fn check_token(&self, token: &str) -> Result<TokenResponse> {
        Ok(self
            .provider
            .check_token(&self.config.credentials(), token)
            .await?)
    }

    /// Invalidate a token and issue a new one.
    ///
    /// Emits: `token.reset` (for the new token)
    pub async fn reset_token(&self, token: &str) -> Result<TokenResponse> {
        let response = self
            .provider
            .reset_token(&self.config.credentials(), token)
            .await?;

        info!(
            token = response.authentication.token_preview(),
            "[OAuthApp] Token reset"
        );
        self.events
            .emit(self.authenticated_event(
                EventName::Token,
                EventAction::Reset,
                &response.authentication,
            ))
            .await?;

        Ok(response)
    }

    /// Exchange a refresh token for a new token (GitHub Apps with expiring tokens).
    ///
    /// Emits: `token.refreshed`
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        if !self.config.supports_refresh() {
            return Err(OAuthAppError::unsupported(
                "refresh_token",
                self.config.client_type,
            ));
        }

        let response = self
            .provider
            .refresh_token(&self.config.credentials(), refresh_token)
            .await?;

        info!(
            token = response.authentication.token_preview(),
            "[OAuthApp] Token refreshed"
        );
        self.events
            .emit(self.authenticated_event(
                EventName::Token,
                EventAction::Refreshed,
                &response.authentication,
            ))
            .await?;

        Ok(response)
    }

    /// Create a token limited to a target and repositories (GitHub Apps only).
    ///
    /// Emits: `token.scoped`
    pub async fn scope_token(&self, options: ScopeTokenOptions) -> Result<TokenResponse> {
        if self.config.client_type != ClientType::GitHubApp {
            return Err(OAuthAppError::unsupported(
                "scope_token",
                self.config.client_type,
            ));
        }

        let response = self
            .provider
            .scope_token(&self.config.credentials(), &options)
            .await?;

        info!(
            token = response.authentication.token_preview(),
            target = ?options.target,
            "[OAuthApp] Token scoped"
        );
        self.events
            .emit(self.authenticated_event(
                EventName::Token,
                EventAction::Scoped,
                &response.authentication,
            ))
            .await?;

        Ok(response)
    }
}
