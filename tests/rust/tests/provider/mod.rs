//! GitHub provider tests against a mock GitHub (wiremock)

mod github_provider;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use oauth_app_core::{ClientCredentials, ClientType, GitHubEndpoints, GitHubOAuthProvider};
use std::time::Duration;
use wiremock::MockServer;

pub const CLIENT_SECRET: &str = "0123secret";

pub fn credentials(client_type: ClientType) -> ClientCredentials {
    let client_id = match client_type {
        ClientType::OAuthApp => "0123",
        ClientType::GitHubApp => "lv1.0123",
    };
    ClientCredentials {
        client_type,
        client_id: client_id.to_string(),
        client_secret: CLIENT_SECRET.to_string(),
    }
}

/// `authorization` header value GitHub expects for the app credentials
pub fn basic_auth(credentials: &ClientCredentials) -> String {
    format!(
        "Basic {}",
        STANDARD.encode(format!(
            "{}:{}",
            credentials.client_id, credentials.client_secret
        ))
    )
}

/// Provider whose web host and API both point at the mock server.
/// Device flow polls as fast as the mock server says.
pub fn provider_for(server: &MockServer) -> GitHubOAuthProvider {
    GitHubOAuthProvider::with_endpoints(GitHubEndpoints::new(server.uri(), server.uri()))
        .with_min_poll_interval(Duration::ZERO)
}
