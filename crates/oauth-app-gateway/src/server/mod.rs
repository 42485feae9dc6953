//! HTTP server
//!
//! Serves `GET /health` and the OAuth routes through the axum middleware.

mod config;
mod handlers;

pub use config::{ConfigError, ServerConfig, DEFAULT_HOST, DEFAULT_PORT};
pub use handlers::HealthResponse;

use axum::{middleware, routing::get, Router};
use oauth_app_core::OAuthOperations;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::adapters::axum::oauth_middleware;
use crate::adapters::OAuthHandler;
use crate::logging::http_logging_middleware;

pub struct OAuthGatewayServer {
    config: ServerConfig,
    handler: OAuthHandler,
}

impl OAuthGatewayServer {
    pub fn new(config: ServerConfig, app: Arc<dyn OAuthOperations>) -> Self {
        let handler = OAuthHandler::with_options(app, config.handler_options());
        Self { config, handler }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Router with health check, OAuth routes and request logging
    pub fn build_router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .fallback(handlers::not_found)
            .layer(middleware::from_fn_with_state(
                self.handler.clone(),
                oauth_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn_with_state(
                self.handler.options().clone(),
                http_logging_middleware,
            ))
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.config.bind_addr();
        let router = self.build_router();
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!(
            "[Server] Listening on http://{} (OAuth routes under {})",
            listener.local_addr()?,
            self.handler.options().path_prefix
        );

        axum::serve(listener, router).await?;
        Ok(())
    }

    /// Start the server in the background
    pub fn spawn(self) -> tokio::task::JoinHandle<anyhow::Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
