//! Token Operations Facade
//!
//! `OAuthApp` sits between the HTTP layer (router, adapters) and the
//! external OAuth provider. Every operation:
//!
//! 1. **Validates** inputs against the app configuration
//! 2. **Calls** the provider
//! 3. **Emits** lifecycle events through the app's [`EventRegistry`]
//! 4. **Returns** a normalized result
//!
//! # Architecture
//!
//! ```text
//! Router / adapters
//!         │  OAuthOperations
//!         ▼
//! ┌─────────────────────────────────────┐
//! │             OAuthApp                │
//! │  ┌───────────────┐  ┌────────────┐  │
//! │  │ OAuthAppConfig│  │EventRegistry│ │
//! │  └───────────────┘  └─────┬──────┘  │
//! │          │                │         │
//! │          ▼                ▼         │
//! │   OAuthProvider     event handlers  │
//! └─────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let app = OAuthAppBuilder::new("lv1.1234", secret).build()?;
//!
//! app.on(EventKey::TOKEN_CREATED, |ctx: EventContext| async move {
//!     let user = ctx.client().get("/user").await?;
//!     Ok(())
//! });
//!
//! let result = app.create_token(CreateTokenOptions::web_flow(code)).await?;
//! // -> Emits token.created
//! ```

mod revocation;
mod tokens;
mod user_client;
mod web_flow;

pub use tokens::{CreateTokenOptions, CreateTokenResult};
pub use user_client::UserClientOptions;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::client::{ClientAuth, GitHubClientFactory};
use crate::domain::{
    Authentication, ClientType, EventAction, EventContext, EventName, OAuthAppConfig,
    WebFlowAuthorization, WebFlowUrlOptions,
};
use crate::error::{OAuthAppError, Result};
use crate::event_bus::{EventHandler, EventRegistry, IntoEventKeys};
use crate::provider::{GitHubOAuthProvider, OAuthProvider, ScopeTokenOptions, TokenResponse};

/// Operations the HTTP router dispatches to.
///
/// Implemented by [`OAuthApp`]; the router only sees this trait.
#[async_trait]
pub trait OAuthOperations: Send + Sync {
    /// Build the web flow authorization URL. No network call, no events.
    fn web_flow_authorization_url(&self, options: WebFlowUrlOptions)
        -> Result<WebFlowAuthorization>;

    async fn create_token(&self, options: CreateTokenOptions) -> Result<CreateTokenResult>;

    async fn check_token(&self, token: &str) -> Result<TokenResponse>;

    async fn reset_token(&self, token: &str) -> Result<TokenResponse>;

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse>;

    async fn scope_token(&self, options: ScopeTokenOptions) -> Result<TokenResponse>;

    async fn delete_token(&self, token: &str) -> Result<()>;

    async fn delete_authorization(&self, token: &str) -> Result<()>;
}

/// Builder for [`OAuthApp`]
pub struct OAuthAppBuilder {
    config: OAuthAppConfig,
    provider: Option<Arc<dyn OAuthProvider>>,
    client_factory: Option<GitHubClientFactory>,
}

impl OAuthAppBuilder {
    /// Start from app credentials; the client type is inferred from the id
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::from_config(OAuthAppConfig::new(client_id, client_secret))
    }

    pub fn from_config(config: OAuthAppConfig) -> Self {
        Self {
            config,
            provider: None,
            client_factory: None,
        }
    }

    pub fn with_client_type(mut self, client_type: ClientType) -> Self {
        self.config.client_type = client_type;
        self
    }

    pub fn with_default_scopes(mut self, scopes: Vec<String>) -> Self {
        self.config.default_scopes = scopes;
        self
    }

    pub fn with_allow_signup(mut self, allow_signup: bool) -> Self {
        self.config.allow_signup = Some(allow_signup);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = Some(base_url.into());
        self
    }

    pub fn with_redirect_url(mut self, redirect_url: impl Into<String>) -> Self {
        self.config.redirect_url = Some(redirect_url.into());
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn OAuthProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_client_factory(mut self, factory: GitHubClientFactory) -> Self {
        self.client_factory = Some(factory);
        self
    }

    pub fn build(self) -> Result<OAuthApp> {
        let config = self.config;
        if config.client_id.trim().is_empty() {
            return Err(OAuthAppError::validation("client_id is required"));
        }
        if config.client_secret.trim().is_empty() {
            return Err(OAuthAppError::validation("client_secret is required"));
        }

        let base_url = config.base_url.as_deref();
        let provider = self
            .provider
            .unwrap_or_else(|| Arc::new(GitHubOAuthProvider::new(base_url)));
        let clients = self
            .client_factory
            .unwrap_or_else(|| GitHubClientFactory::new(base_url));

        info!(
            client_type = %config.client_type,
            client_id = %config.client_id,
            "[OAuthApp] Created"
        );

        Ok(OAuthApp {
            config,
            provider,
            clients,
            events: EventRegistry::new(),
        })
    }
}

/// GitHub OAuth App / GitHub App token lifecycle facade
pub struct OAuthApp {
    config: OAuthAppConfig,
    provider: Arc<dyn OAuthProvider>,
    clients: GitHubClientFactory,
    events: EventRegistry,
}

impl OAuthApp {
    pub fn builder(client_id: impl Into<String>, client_secret: impl Into<String>) -> OAuthAppBuilder {
        OAuthAppBuilder::new(client_id, client_secret)
    }

    pub fn config(&self) -> &OAuthAppConfig {
        &self.config
    }

    pub fn client_type(&self) -> ClientType {
        self.config.client_type
    }

    pub fn events(&self) -> &EventRegistry {
        &self.events
    }

    /// Register an event handler under one or many keys
    pub fn on<K, H>(&self, keys: K, handler: H)
    where
        K: IntoEventKeys,
        H: EventHandler + 'static,
    {
        self.events.register(keys, handler);
    }

    /// Context for an event whose client is authenticated as `authentication`
    fn authenticated_event(
        &self,
        name: EventName,
        action: EventAction,
        authentication: &Authentication,
    ) -> EventContext {
        EventContext::new(
            name,
            action,
            authentication.token.clone(),
            self.clients.lazy(ClientAuth::User(authentication.clone())),
        )
        .with_scopes(authentication.scopes.clone())
        .with_authentication(authentication.clone())
    }

    /// Context for a post-revocation event; its client refuses every request
    fn revoked_event(
        &self,
        name: EventName,
        action: EventAction,
        token: &str,
        reason: String,
    ) -> EventContext {
        EventContext::new(
            name,
            action,
            token,
            self.clients.lazy(ClientAuth::Unauthenticated { reason }),
        )
    }

    /// Authentication for a token the caller already holds
    fn authentication_for(&self, token: &str) -> Authentication {
        Authentication::new(self.config.client_type, self.config.client_id.clone(), token)
            .with_client_secret(self.config.client_secret.to_string())
    }
}

#[async_trait]
impl OAuthOperations for OAuthApp {
    fn web_flow_authorization_url(
        &self,
        options: WebFlowUrlOptions,
    ) -> Result<WebFlowAuthorization> {
        OAuthApp::web_flow_authorization_url(self, options)
    }

    async fn create_token(&self, options: CreateTokenOptions) -> Result<CreateTokenResult> {
        OAuthApp::create_token(self, options).await
    }

    async fn check_token(&self, token: &str) -> Result<TokenResponse> {
        OAuthApp::check_token(self, token).await
    }

    async fn reset_token(&self, token: &str) -> Result<TokenResponse> {
        OAuthApp::reset_token(self, token).await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        OAuthApp::refresh_token(self, refresh_token).await
    }

    async fn scope_token(&self, options: ScopeTokenOptions) -> Result<TokenResponse> {
        OAuthApp::scope_token(self, options).await
    }

    async fn delete_token(&self, token: &str) -> Result<()> {
        OAuthApp::delete_token(self, token).await
    }

    async fn delete_authorization(&self, token: &str) -> Result<()> {
        OAuthApp::delete_authorization(self, token).await
    }
}
