//! Request Router
//!
//! Maps normalized requests under a path prefix to the nine OAuth routes:
//!
//! | Route                  | Operation                       | Success |
//! |------------------------|---------------------------------|---------|
//! | `GET /login`           | `web_flow_authorization_url`    | 302     |
//! | `GET /callback`        | `create_token` (HTML)           | 200     |
//! | `POST /token`          | `create_token`                  | 201     |
//! | `GET /token`           | `check_token`                   | 200     |
//! | `PATCH /token`         | `reset_token`                   | 200     |
//! | `PATCH /refresh-token` | `refresh_token`                 | 200     |
//! | `POST /token/scoped`   | `scope_token`                   | 200     |
//! | `DELETE /token`        | `delete_token`                  | 204     |
//! | `DELETE /grant`        | `delete_authorization`          | 204     |
//!
//! Requests outside the prefix are not handled (`None`) so the host can fall
//! through to its own routing. Known prefix with unknown route is a 404.
//! Every error after routing becomes a `400 {"error": message}`.

mod request;

pub use request::{BodyError, BodyFuture, OAuthRequest, OAuthResponse};

use http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use oauth_app_core::branding::{self, DEFAULT_PATH_PREFIX};
use oauth_app_core::{
    CreateTokenOptions, OAuthAppError, OAuthOperations, ScopeTokenOptions, WebFlowUrlOptions,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, warn};
use url::Url;

/// Base for resolving relative request URLs
const URL_BASE: &str = "http://localhost";

const AUTHORIZATION_PREFIX: &str = "token ";

const CORS_ALLOW_HEADERS: &str = "Content-Type, User-Agent, Authorization";

/// Router options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerOptions {
    /// Prefix all routes live under, without trailing slash
    pub path_prefix: String,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
        }
    }
}

impl HandlerOptions {
    pub fn with_path_prefix(path_prefix: impl Into<String>) -> Self {
        let path_prefix = path_prefix.into();
        Self {
            path_prefix: path_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Whether `path` lives under `{path_prefix}/`
    pub fn claims(&self, path: &str) -> bool {
        path.strip_prefix(self.path_prefix.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Route a request under the prefix would be dispatched to
    pub fn route_for(&self, method: &Method, path: &str) -> Option<RouteId> {
        path.strip_prefix(self.path_prefix.as_str())
            .and_then(|rest| RouteId::resolve(method, rest))
    }
}

/// The fixed route table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteId {
    GetLogin,
    GetCallback,
    CreateToken,
    GetToken,
    PatchToken,
    PatchRefreshToken,
    PostScopedToken,
    DeleteToken,
    DeleteGrant,
}

impl RouteId {
    pub const ALL: [Self; 9] = [
        Self::GetLogin,
        Self::GetCallback,
        Self::CreateToken,
        Self::GetToken,
        Self::PatchToken,
        Self::PatchRefreshToken,
        Self::PostScopedToken,
        Self::DeleteToken,
        Self::DeleteGrant,
    ];

    pub fn method(&self) -> Method {
        match self {
            Self::GetLogin | Self::GetCallback | Self::GetToken => Method::GET,
            Self::CreateToken | Self::PostScopedToken => Method::POST,
            Self::PatchToken | Self::PatchRefreshToken => Method::PATCH,
            Self::DeleteToken | Self::DeleteGrant => Method::DELETE,
        }
    }

    /// Path after the prefix
    pub fn path(&self) -> &'static str {
        match self {
            Self::GetLogin => "/login",
            Self::GetCallback => "/callback",
            Self::CreateToken | Self::GetToken | Self::PatchToken | Self::DeleteToken => "/token",
            Self::PatchRefreshToken => "/refresh-token",
            Self::PostScopedToken => "/token/scoped",
            Self::DeleteGrant => "/grant",
        }
    }

    /// Exact match of method and path after the prefix
    pub fn resolve(method: &Method, path: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|route| route.method() == *method && route.path() == path)
    }
}

impl std::fmt::Display for RouteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}

/// 404 response for requests no route matches
pub fn unknown_route_response(request: &OAuthRequest) -> OAuthResponse {
    unknown_route(request.method.as_str(), &request.url)
}

/// 404 response for a method and URL that never made it into an [`OAuthRequest`]
pub fn unknown_route(method: &str, url: &str) -> OAuthResponse {
    OAuthResponse::error(
        StatusCode::NOT_FOUND,
        format!("Unknown route: {} {}", method, url),
    )
}

/// Handle a normalized request.
///
/// Returns `None` when the path is outside the prefix.
pub async fn handle_request(
    app: &dyn OAuthOperations,
    options: &HandlerOptions,
    mut request: OAuthRequest,
) -> Option<OAuthResponse> {
    let url = Url::parse(URL_BASE)
        .and_then(|base| base.join(&request.url))
        .ok()?;
    if !options.claims(url.path()) {
        return None;
    }

    if request.method == Method::OPTIONS {
        debug!(url = %request.url, "[Router] CORS preflight");
        return Some(preflight_response());
    }

    let Some(route) = options.route_for(&request.method, url.path()) else {
        debug!(method = %request.method, url = %request.url, "[Router] Unknown route");
        return Some(with_cors(unknown_route_response(&request)));
    };
    debug!(route = ?route, "[Router] Dispatching");

    let body = match request.text().await {
        Ok(text) => parse_body(&text),
        Err(e) => Err(e.to_string()),
    };
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            warn!(route = ?route, error = %e, "[Router] Invalid request body");
            return Some(with_cors(OAuthResponse::error(
                StatusCode::BAD_REQUEST,
                branding::error_message("request error"),
            )));
        }
    };

    let query: HashMap<String, String> = url.query_pairs().into_owned().collect();

    let response = match dispatch(app, route, &query, &request.headers, body).await {
        Ok(response) => response,
        Err(e) => {
            debug!(route = ?route, error = %e, "[Router] Request failed");
            OAuthResponse::error(StatusCode::BAD_REQUEST, e.to_string())
        }
    };
    Some(with_cors(response))
}

async fn dispatch(
    app: &dyn OAuthOperations,
    route: RouteId,
    query: &HashMap<String, String>,
    headers: &HeaderMap,
    body: Map<String, Value>,
) -> Result<OAuthResponse, OAuthAppError> {
    match route {
        RouteId::GetLogin => {
            let options = WebFlowUrlOptions {
                state: query.get("state").cloned(),
                scopes: query
                    .get("scopes")
                    .map(|scopes| scopes.split(',').map(str::to_string).collect()),
                allow_signup: query.get("allowSignup").map(|value| value != "false"),
                redirect_url: query.get("redirectUrl").cloned(),
                ..Default::default()
            };
            let result = app.web_flow_authorization_url(options)?;
            Ok(OAuthResponse::redirect(&result.url))
        }

        RouteId::GetCallback => {
            if let Some(error) = query.get("error") {
                let message = match query.get("error_description") {
                    Some(description) => format!("{} {}", error, description),
                    None => error.clone(),
                };
                return Err(OAuthAppError::validation(message));
            }
            let code = query
                .get("code")
                .filter(|code| !code.is_empty())
                .ok_or_else(|| OAuthAppError::validation("\"code\" parameter is required"))?;

            let result = app
                .create_token(CreateTokenOptions::web_flow(code.clone()))
                .await?;
            Ok(OAuthResponse::html(
                StatusCode::OK,
                token_created_html(&result.authentication.token),
            ))
        }

        RouteId::CreateToken => {
            let code = body_string(&body, "code")
                .ok_or_else(|| OAuthAppError::validation("\"code\" parameter is required"))?;
            let options = CreateTokenOptions::WebFlow {
                code,
                state: body_string(&body, "state"),
                redirect_url: body_string(&body, "redirectUrl"),
            };

            let result = app.create_token(options).await?;
            Ok(OAuthResponse::json(
                StatusCode::CREATED,
                &result.without_client_secret(),
            ))
        }

        RouteId::GetToken => {
            let token = require_token(headers)?;
            let result = app.check_token(token).await?;
            Ok(OAuthResponse::json(StatusCode::OK, &result.without_client_secret()))
        }

        RouteId::PatchToken => {
            let token = require_token(headers)?;
            let result = app.reset_token(token).await?;
            Ok(OAuthResponse::json(StatusCode::OK, &result.without_client_secret()))
        }

        RouteId::PatchRefreshToken => {
            require_token(headers)?;
            let refresh_token = body_string(&body, "refreshToken").ok_or_else(|| {
                OAuthAppError::validation("refreshToken must be sent in request body")
            })?;
            let result = app.refresh_token(&refresh_token).await?;
            Ok(OAuthResponse::json(StatusCode::OK, &result.without_client_secret()))
        }

        RouteId::PostScopedToken => {
            let token = require_token(headers)?;
            let mut fields = body;
            fields
                .entry("token")
                .or_insert_with(|| Value::String(token.to_string()));
            let options: ScopeTokenOptions =
                serde_json::from_value(Value::Object(fields)).map_err(|e| {
                    OAuthAppError::validation(format!("invalid scoped token options: {}", e))
                })?;

            let result = app.scope_token(options).await?;
            Ok(OAuthResponse::json(StatusCode::OK, &result.without_client_secret()))
        }

        RouteId::DeleteToken => {
            let token = require_token(headers)?;
            app.delete_token(token).await?;
            Ok(OAuthResponse::new(StatusCode::NO_CONTENT))
        }

        RouteId::DeleteGrant => {
            let token = require_token(headers)?;
            app.delete_authorization(token).await?;
            Ok(OAuthResponse::new(StatusCode::NO_CONTENT))
        }
    }
}

/// Empty body is `{}`; anything else must be JSON. Non-object JSON carries
/// no fields.
fn parse_body(text: &str) -> Result<Map<String, Value>, String> {
    if text.is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Ok(Map::new()),
        Err(e) => Err(e.to_string()),
    }
}

fn body_string(body: &Map<String, Value>, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Token from `authorization: token <token>`.
///
/// Strips exactly the length of `"token "` without checking what it was.
/// Empty remainders count as missing.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .get(AUTHORIZATION_PREFIX.len()..)
        .filter(|token| !token.is_empty())
}

fn require_token(headers: &HeaderMap) -> Result<&str, OAuthAppError> {
    token_from_headers(headers)
        .ok_or_else(|| OAuthAppError::validation("\"Authorization\" header is required"))
}

fn token_created_html(token: &str) -> String {
    format!(
        "<h1>Token created successfully</h1>\n\n<p>Your token is: <strong>{}</strong>. Copy it now as it cannot be shown again.</p>",
        token
    )
}

fn preflight_response() -> OAuthResponse {
    with_cors(OAuthResponse::new(StatusCode::OK))
        .with_header(
            HeaderName::from_static("access-control-allow-methods"),
            HeaderValue::from_static("*"),
        )
        .with_header(
            HeaderName::from_static("access-control-allow-headers"),
            HeaderValue::from_static(CORS_ALLOW_HEADERS),
        )
}

fn with_cors(response: OAuthResponse) -> OAuthResponse {
    response.with_header(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    )
}
