//! Web flow authorization URL
//!
//! Builds the `https://github.com/login/oauth/authorize` URL users are
//! redirected to. Pure; no network access.

use rand::{distributions::Alphanumeric, Rng};
use serde::Serialize;
use url::Url;

use super::ClientType;
use crate::branding::{DEFAULT_API_URL, DEFAULT_WEB_URL};

const AUTHORIZE_PATH: &str = "/login/oauth/authorize";
const STATE_LENGTH: usize = 16;

/// Options for [`OAuthApp::web_flow_authorization_url`](crate::OAuthApp::web_flow_authorization_url).
///
/// Every field falls back to the app configuration when unset.
#[derive(Debug, Clone, Default)]
pub struct WebFlowUrlOptions {
    pub client_type: Option<ClientType>,
    pub client_id: Option<String>,
    pub state: Option<String>,
    pub scopes: Option<Vec<String>>,
    pub allow_signup: Option<bool>,
    pub redirect_url: Option<String>,
    /// Suggest a specific account to sign in with
    pub login: Option<String>,
    pub base_url: Option<String>,
}

impl WebFlowUrlOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = Some(scopes);
        self
    }

    pub fn with_allow_signup(mut self, allow_signup: bool) -> Self {
        self.allow_signup = Some(allow_signup);
        self
    }

    pub fn with_redirect_url(mut self, redirect_url: impl Into<String>) -> Self {
        self.redirect_url = Some(redirect_url.into());
        self
    }

    pub fn with_login(mut self, login: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self
    }
}

/// Fully resolved input of the URL builder
#[derive(Debug, Clone)]
pub struct AuthorizationUrlParams {
    pub client_type: ClientType,
    pub client_id: String,
    pub state: Option<String>,
    pub scopes: Vec<String>,
    pub allow_signup: Option<bool>,
    pub redirect_url: Option<String>,
    pub login: Option<String>,
    pub base_url: Option<String>,
}

/// Result of building an authorization URL
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebFlowAuthorization {
    pub url: String,
    pub client_type: ClientType,
    pub client_id: String,
    pub state: String,
    pub allow_signup: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    /// Requested scopes (OAuth Apps only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
}

/// Build the authorization URL.
///
/// Query parameters are appended in the order `client_id`, `login`,
/// `redirect_uri`, `scope`, `state`, `allow_signup`. `scope` is only sent for
/// OAuth Apps with at least one scope. A random state is generated when none
/// is given.
pub fn authorization_url(params: AuthorizationUrlParams) -> Result<WebFlowAuthorization, url::ParseError> {
    let mut url = Url::parse(&web_base_url(params.base_url.as_deref()))?;
    url.set_path(&format!(
        "{}{}",
        url.path().trim_end_matches('/'),
        AUTHORIZE_PATH
    ));

    let state = params.state.unwrap_or_else(generate_state);
    let allow_signup = params.allow_signup != Some(false);
    let scopes = match params.client_type {
        ClientType::OAuthApp => Some(params.scopes),
        ClientType::GitHubApp => None,
    };

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("client_id", &params.client_id);
        if let Some(login) = &params.login {
            query.append_pair("login", login);
        }
        if let Some(redirect_url) = &params.redirect_url {
            query.append_pair("redirect_uri", redirect_url);
        }
        if let Some(scopes) = scopes.as_ref().filter(|scopes| !scopes.is_empty()) {
            query.append_pair("scope", &scopes.join(","));
        }
        query.append_pair("state", &state);
        query.append_pair("allow_signup", if allow_signup { "true" } else { "false" });
    }

    Ok(WebFlowAuthorization {
        url: url.to_string(),
        client_type: params.client_type,
        client_id: params.client_id,
        state,
        allow_signup,
        redirect_url: params.redirect_url,
        login: params.login,
        scopes,
    })
}

/// GitHub web host for a configured base URL.
///
/// `None` and the public API host map to `https://github.com`; a GitHub
/// Enterprise Server API URL (`https://host/api/v3`) maps to `https://host`.
pub fn web_base_url(base_url: Option<&str>) -> String {
    match base_url.map(|url| url.trim_end_matches('/')) {
        None | Some("") => DEFAULT_WEB_URL.to_string(),
        Some(url) if url == DEFAULT_API_URL || url == DEFAULT_WEB_URL => {
            DEFAULT_WEB_URL.to_string()
        }
        Some(url) => url.trim_end_matches("/api/v3").to_string(),
    }
}

/// GitHub REST API host for a configured base URL.
pub fn api_base_url(base_url: Option<&str>) -> String {
    match base_url.map(|url| url.trim_end_matches('/')) {
        None | Some("") => DEFAULT_API_URL.to_string(),
        Some(url) if url == DEFAULT_API_URL || url == DEFAULT_WEB_URL => {
            DEFAULT_API_URL.to_string()
        }
        Some(url) if url.ends_with("/api/v3") => url.to_string(),
        Some(url) => format!("{}/api/v3", url),
    }
}

fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}
