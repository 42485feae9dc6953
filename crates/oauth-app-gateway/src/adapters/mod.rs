//! Runtime adapters
//!
//! Each adapter converts one host's native request into an
//! [`OAuthRequest`](crate::router::OAuthRequest), runs the router and converts
//! the [`OAuthResponse`](crate::router::OAuthResponse) back.
//!
//! - `axum` - middleware and standalone router for axum / tower servers
//! - `lambda` - AWS Lambda behind API Gateway (HTTP API, payload v2)

pub mod axum;
pub mod lambda;

use oauth_app_core::OAuthOperations;
use std::sync::Arc;

use crate::router::{handle_request, HandlerOptions, OAuthRequest, OAuthResponse};

/// An app plus router options, shared by every adapter
#[derive(Clone)]
pub struct OAuthHandler {
    app: Arc<dyn OAuthOperations>,
    options: HandlerOptions,
}

impl OAuthHandler {
    pub fn new(app: Arc<dyn OAuthOperations>) -> Self {
        Self::with_options(app, HandlerOptions::default())
    }

    pub fn with_options(app: Arc<dyn OAuthOperations>, options: HandlerOptions) -> Self {
        Self { app, options }
    }

    pub fn app(&self) -> &Arc<dyn OAuthOperations> {
        &self.app
    }

    pub fn options(&self) -> &HandlerOptions {
        &self.options
    }

    /// Run the router; `None` for requests outside the path prefix
    pub async fn handle(&self, request: OAuthRequest) -> Option<OAuthResponse> {
        handle_request(self.app.as_ref(), &self.options, request).await
    }
}
