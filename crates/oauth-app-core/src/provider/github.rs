//! GitHub implementation of the OAuth operations provider
//!
//! - Web host (`https://github.com`): code exchange, device flow, refresh
//! - REST API (`https://api.github.com`): check, reset, scope, delete
//!
//! REST calls authenticate with basic auth `client_id:client_secret`.

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{
    ClientCredentials, DeviceVerification, OAuthProvider, ScopeTokenOptions, TokenResponse,
    VerificationHandler, WebFlowExchange,
};
use crate::branding;
use crate::client::api_error_message;
use crate::domain::{api_base_url, web_base_url, Authentication, ClientType};
use crate::error::{OAuthErrorBody, ProviderError};

const ACCESS_TOKEN_PATH: &str = "/login/oauth/access_token";
const DEVICE_CODE_PATH: &str = "/login/device/code";
const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// Seconds added to the poll interval when GitHub answers `slow_down`
const SLOW_DOWN_STEP_SECS: u64 = 5;

/// GitHub's documented lower bound for device flow polling
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Base URLs of the GitHub web host and REST API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubEndpoints {
    pub web: String,
    pub api: String,
}

impl GitHubEndpoints {
    pub fn new(web: impl Into<String>, api: impl Into<String>) -> Self {
        Self {
            web: web.into().trim_end_matches('/').to_string(),
            api: api.into().trim_end_matches('/').to_string(),
        }
    }

    /// Endpoints for github.com or a GitHub Enterprise Server base URL
    pub fn from_base_url(base_url: Option<&str>) -> Self {
        Self::new(web_base_url(base_url), api_base_url(base_url))
    }
}

impl Default for GitHubEndpoints {
    fn default() -> Self {
        Self::from_base_url(None)
    }
}

/// Successful `access_token` response
#[derive(Debug, Deserialize)]
struct AccessTokenBody {
    access_token: String,
    #[serde(default)]
    scope: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token_expires_in: Option<i64>,
}

/// OAuth operations provider backed by GitHub's HTTP endpoints
#[derive(Debug, Clone)]
pub struct GitHubOAuthProvider {
    http: reqwest::Client,
    endpoints: GitHubEndpoints,
    min_poll_interval: Duration,
}

impl GitHubOAuthProvider {
    pub fn new(base_url: Option<&str>) -> Self {
        Self::with_endpoints(GitHubEndpoints::from_base_url(base_url))
    }

    pub fn with_endpoints(endpoints: GitHubEndpoints) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoints,
            min_poll_interval: MIN_POLL_INTERVAL,
        }
    }

    /// Lower bound for the device flow poll interval, whatever GitHub sends
    pub fn with_min_poll_interval(mut self, min_poll_interval: Duration) -> Self {
        self.min_poll_interval = min_poll_interval;
        self
    }

    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn endpoints(&self) -> &GitHubEndpoints {
        &self.endpoints
    }

    /// POST to the web host; a 200 carrying `error` is an OAuth error
    async fn post_web(&self, path: &str, body: &Value) -> Result<Value, ProviderError> {
        let url = format!("{}{}", self.endpoints.web, path);
        debug!(url = %url, "[GitHubProvider] POST");

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::USER_AGENT, branding::user_agent())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
                message: api_error_message(&text, status.canonical_reason()),
            });
        }

        let value: Value =
            serde_json::from_str(&text).map_err(|e| ProviderError::Decode(e.to_string()))?;
        if value.get("error").is_some() {
            let error: OAuthErrorBody = serde_json::from_value(value)
                .map_err(|e| ProviderError::Decode(e.to_string()))?;
            return Err(ProviderError::OAuth(error));
        }
        Ok(value)
    }

    /// Request to `{api}/applications/{client_id}{path}` with basic auth
    async fn applications_request(
        &self,
        method: Method,
        credentials: &ClientCredentials,
        path: &str,
        body: &Value,
    ) -> Result<Value, ProviderError> {
        let url = format!(
            "{}/applications/{}{}",
            self.endpoints.api, credentials.client_id, path
        );
        debug!(method = %method, url = %url, "[GitHubProvider] API request");

        let response = self
            .http
            .request(method, &url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header(reqwest::header::USER_AGENT, branding::user_agent())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
                message: api_error_message(&text, status.canonical_reason()),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

/// Build an authentication from an `access_token` response
fn authentication_from_access_token(
    credentials: &ClientCredentials,
    value: &Value,
) -> Result<Authentication, ProviderError> {
    let body: AccessTokenBody =
        serde_json::from_value(value.clone()).map_err(|e| ProviderError::Decode(e.to_string()))?;
    let now = Utc::now();

    let mut authentication = Authentication::new(
        credentials.client_type,
        credentials.client_id.clone(),
        body.access_token,
    )
    .with_client_secret(credentials.client_secret.clone());

    if credentials.client_type == ClientType::OAuthApp {
        authentication = authentication.with_scopes(parse_scopes(body.scope.as_deref()));
    }
    if let Some(refresh_token) = body.refresh_token {
        authentication = authentication.with_refresh_token(refresh_token);
    }
    if let Some(expires_in) = body.expires_in {
        authentication = authentication.with_expires_at(now + ChronoDuration::seconds(expires_in));
    }
    if let Some(expires_in) = body.refresh_token_expires_in {
        authentication = authentication
            .with_refresh_token_expires_at(now + ChronoDuration::seconds(expires_in));
    }
    Ok(authentication)
}

/// Build an authentication from a `/applications/{client_id}/token` response
fn authentication_from_api(
    credentials: &ClientCredentials,
    data: &Value,
    fallback_token: &str,
) -> Authentication {
    let token = data
        .get("token")
        .and_then(Value::as_str)
        .unwrap_or(fallback_token);

    let mut authentication =
        Authentication::new(credentials.client_type, credentials.client_id.clone(), token)
            .with_client_secret(credentials.client_secret.clone());

    if credentials.client_type == ClientType::OAuthApp {
        let scopes = data
            .get("scopes")
            .and_then(Value::as_array)
            .map(|scopes| {
                scopes
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        authentication = authentication.with_scopes(scopes);
    }

    if let Some(expires_at) = data
        .get("expires_at")
        .and_then(Value::as_str)
        .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
    {
        authentication = authentication.with_expires_at(expires_at.with_timezone(&Utc));
    }
    authentication
}

/// Split GitHub's `scope` value (`"repo,gist"` or `"repo, gist"`)
fn parse_scopes(scope: Option<&str>) -> Vec<String> {
    scope
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|scope| !scope.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl OAuthProvider for GitHubOAuthProvider {
    async fn exchange_web_flow_code(
        &self,
        credentials: &ClientCredentials,
        exchange: WebFlowExchange,
    ) -> Result<Authentication, ProviderError> {
        info!(
            client_id = %credentials.client_id,
            "[GitHubProvider] Exchanging web flow code"
        );

        let mut body = Map::new();
        body.insert("client_id".into(), json!(credentials.client_id));
        body.insert("client_secret".into(), json!(credentials.client_secret));
        body.insert("code".into(), json!(exchange.code));
        if let Some(redirect_url) = exchange.redirect_url {
            body.insert("redirect_uri".into(), json!(redirect_url));
        }
        if let Some(state) = exchange.state {
            body.insert("state".into(), json!(state));
        }

        let value = self.post_web(ACCESS_TOKEN_PATH, &Value::Object(body)).await?;
        authentication_from_access_token(credentials, &value)
    }

    async fn device_flow(
        &self,
        credentials: &ClientCredentials,
        scopes: Vec<String>,
        on_verification: Arc<dyn VerificationHandler>,
    ) -> Result<Authentication, ProviderError> {
        let mut body = Map::new();
        body.insert("client_id".into(), json!(credentials.client_id));
        if credentials.client_type == ClientType::OAuthApp {
            body.insert("scope".into(), json!(scopes.join(" ")));
        }

        let value = self.post_web(DEVICE_CODE_PATH, &Value::Object(body)).await?;
        let verification: DeviceVerification =
            serde_json::from_value(value).map_err(|e| ProviderError::Decode(e.to_string()))?;

        info!(
            verification_uri = %verification.verification_uri,
            expires_in = verification.expires_in,
            "[GitHubProvider] Device flow started"
        );

        let device_code = verification.device_code.clone();
        let mut interval = poll_interval(verification.interval, self.min_poll_interval);
        on_verification
            .on_verification(verification)
            .await
            .map_err(|e| ProviderError::Verification(e.to_string()))?;

        let poll_body = json!({
            "client_id": credentials.client_id,
            "device_code": device_code,
            "grant_type": DEVICE_GRANT_TYPE,
        });

        loop {
            tokio::time::sleep(interval).await;

            match self.post_web(ACCESS_TOKEN_PATH, &poll_body).await {
                Ok(value) => {
                    info!("[GitHubProvider] Device flow authorized");
                    return authentication_from_access_token(credentials, &value);
                }
                Err(ProviderError::OAuth(error)) if error.error == "authorization_pending" => {
                    debug!("[GitHubProvider] Authorization pending");
                }
                Err(ProviderError::OAuth(error)) if error.error == "slow_down" => {
                    interval += Duration::from_secs(SLOW_DOWN_STEP_SECS);
                    warn!(
                        interval_secs = interval.as_secs(),
                        "[GitHubProvider] Asked to slow down polling"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn check_token(
        &self,
        credentials: &ClientCredentials,
        token: &str,
    ) -> Result<TokenResponse, ProviderError> {
        let data = self
            .applications_request(
                Method::POST,
                credentials,
                "/token",
                &json!({ "access_token": token }),
            )
            .await?;
        let authentication = authentication_from_api(credentials, &data, token);
        Ok(TokenResponse {
            data,
            authentication,
        })
    }

    async fn reset_token(
        &self,
        credentials: &ClientCredentials,
        token: &str,
    ) -> Result<TokenResponse, ProviderError> {
        info!(client_id = %credentials.client_id, "[GitHubProvider] Resetting token");
        let data = self
            .applications_request(
                Method::PATCH,
                credentials,
                "/token",
                &json!({ "access_token": token }),
            )
            .await?;
        let authentication = authentication_from_api(credentials, &data, token);
        Ok(TokenResponse {
            data,
            authentication,
        })
    }

    async fn refresh_token(
        &self,
        credentials: &ClientCredentials,
        refresh_token: &str,
    ) -> Result<TokenResponse, ProviderError> {
        info!(client_id = %credentials.client_id, "[GitHubProvider] Refreshing token");
        let data = self
            .post_web(
                ACCESS_TOKEN_PATH,
                &json!({
                    "client_id": credentials.client_id,
                    "client_secret": credentials.client_secret,
                    "grant_type": "refresh_token",
                    "refresh_token": refresh_token,
                }),
            )
            .await?;
        let authentication = authentication_from_access_token(credentials, &data)?;
        Ok(TokenResponse {
            data,
            authentication,
        })
    }

    async fn scope_token(
        &self,
        credentials: &ClientCredentials,
        options: &ScopeTokenOptions,
    ) -> Result<TokenResponse, ProviderError> {
        let mut body = Map::new();
        body.insert("access_token".into(), json!(options.token));
        if let Some(target) = &options.target {
            body.insert("target".into(), json!(target));
        }
        if let Some(target_id) = options.target_id {
            body.insert("target_id".into(), json!(target_id));
        }
        if let Some(repositories) = &options.repositories {
            body.insert("repositories".into(), json!(repositories));
        }
        if let Some(repository_ids) = &options.repository_ids {
            body.insert("repository_ids".into(), json!(repository_ids));
        }
        if let Some(permissions) = &options.permissions {
            body.insert("permissions".into(), json!(permissions));
        }

        let data = self
            .applications_request(
                Method::POST,
                credentials,
                "/token/scoped",
                &Value::Object(body),
            )
            .await?;
        let authentication = authentication_from_api(credentials, &data, &options.token);
        Ok(TokenResponse {
            data,
            authentication,
        })
    }

    async fn delete_token(
        &self,
        credentials: &ClientCredentials,
        token: &str,
    ) -> Result<(), ProviderError> {
        self.applications_request(
            Method::DELETE,
            credentials,
            "/token",
            &json!({ "access_token": token }),
        )
        .await?;
        Ok(())
    }

    async fn delete_authorization(
        &self,
        credentials: &ClientCredentials,
        token: &str,
    ) -> Result<(), ProviderError> {
        self.applications_request(
            Method::DELETE,
            credentials,
            "/grant",
            &json!({ "access_token": token }),
        )
        .await?;
        Ok(())
    }
}

fn poll_interval(server_secs: u64, min: Duration) -> Duration {
    Duration::from_secs(server_secs).max(min)
}
