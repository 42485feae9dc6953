//! Web flow authorization URL

use tracing::debug;

use super::OAuthApp;
use crate::domain::{
    authorization_url, AuthorizationUrlParams, ClientType, WebFlowAuthorization,
    WebFlowUrlOptions,
};
use crate::error::{OAuthAppError, Result};

impl OAuthApp {
    /// Build the URL to redirect users to for the web flow.
    ///
    /// Options take precedence over the app configuration. The client type
    /// is the explicit option, else `github-app` for a `lv1.` client id,
    /// else the configured type. Pure: no network call, no events.
    pub fn web_flow_authorization_url(
        &self,
        options: WebFlowUrlOptions,
    ) -> Result<WebFlowAuthorization> {
        let config = &self.config;
        let client_id = options
            .client_id
            .unwrap_or_else(|| config.client_id.clone());

        let client_type = options.client_type.unwrap_or_else(|| {
            match ClientType::infer_from_client_id(&client_id) {
                ClientType::GitHubApp => ClientType::GitHubApp,
                ClientType::OAuthApp => config.client_type,
            }
        });

        let params = AuthorizationUrlParams {
            client_type,
            client_id,
            state: options.state,
            scopes: options
                .scopes
                .unwrap_or_else(|| config.default_scopes.clone()),
            allow_signup: options.allow_signup.or(config.allow_signup),
            redirect_url: options.redirect_url.or_else(|| config.redirect_url.clone()),
            login: options.login,
            base_url: options.base_url.or_else(|| config.base_url.clone()),
        };

        let result = authorization_url(params)
            .map_err(|e| OAuthAppError::validation(format!("invalid base URL: {}", e)))?;
        debug!(client_type = %result.client_type, "[OAuthApp] Built authorization URL");
        Ok(result)
    }
}
