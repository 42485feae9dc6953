//! Standalone OAuth server
//!
//! ```text
//! GITHUB_CLIENT_ID=... GITHUB_CLIENT_SECRET=... oauth-app-server
//! ```
//!
//! See `ServerConfig` for every supported environment variable.

use anyhow::Context;
use oauth_app_core::{EventContext, EventKey};
use oauth_app_gateway::logging::init_tracing;
use oauth_app_gateway::{OAuthGatewayServer, ServerConfig};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env().context("failed to load server configuration")?;
    let _guard = init_tracing(config.log_dir.as_deref())?;

    let app = config
        .app_builder()
        .build()
        .context("failed to build OAuth app")?;
    info!(
        client_id = %app.config().client_id,
        client_type = %app.client_type(),
        "[Server] OAuth app configured"
    );

    app.on(
        [EventKey::TOKEN, EventKey::AUTHORIZATION],
        |context: EventContext| async move {
            info!(
                event = %context.key(),
                token = context.token_preview(),
                "[Events] Event emitted"
            );
            Ok::<(), anyhow::Error>(())
        },
    );

    OAuthGatewayServer::new(config, Arc::new(app)).run().await
}
