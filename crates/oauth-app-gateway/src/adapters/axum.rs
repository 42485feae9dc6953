//! axum adapter
//!
//! Two ways to mount the OAuth routes:
//!
//! ```text
//! // next to other routes; requests outside the prefix fall through
//! Router::new()
//!     .route("/health", get(health))
//!     .layer(middleware::from_fn_with_state(handler, oauth_middleware))
//!
//! // standalone; anything unhandled gets the unknown-route 404
//! oauth_router(handler)
//! ```

use ::axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Router,
};
use http_body_util::BodyExt;
use tracing::debug;

use super::OAuthHandler;
use crate::router::{unknown_route_response, BodyError, OAuthRequest, OAuthResponse};

/// Convert an axum request. The body is collected only when the route reads it.
pub fn normalize(request: Request) -> OAuthRequest {
    let (parts, body) = request.into_parts();
    let url = parts
        .uri
        .path_and_query()
        .map(|path_and_query| path_and_query.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());

    OAuthRequest::new(parts.method, url)
        .with_headers(parts.headers)
        .with_body_future(Box::pin(read_body(body)))
}

async fn read_body(body: Body) -> Result<String, BodyError> {
    let bytes = body
        .collect()
        .await
        .map_err(|e| BodyError::Read(e.to_string()))?
        .to_bytes();
    String::from_utf8(bytes.to_vec()).map_err(|_| BodyError::InvalidUtf8)
}

impl IntoResponse for OAuthResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(match self.body {
            Some(body) => Body::from(body),
            None => Body::empty(),
        });
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Middleware serving the OAuth routes and passing everything else to `next`
pub async fn oauth_middleware(
    State(handler): State<OAuthHandler>,
    request: Request,
    next: Next,
) -> Response {
    if !handler.options().claims(request.uri().path()) {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let url = request.uri().to_string();
    match handler.handle(normalize(request)).await {
        Some(response) => response.into_response(),
        None => {
            debug!(%method, %url, "[OAuthMiddleware] Request not handled");
            unknown_route_response(&OAuthRequest::new(method, url)).into_response()
        }
    }
}

/// Router that serves only the OAuth routes
pub fn oauth_router(handler: OAuthHandler) -> Router {
    Router::new().fallback(dispatch).with_state(handler)
}

async fn dispatch(State(handler): State<OAuthHandler>, request: Request) -> Response {
    let method = request.method().clone();
    let url = request.uri().to_string();
    match handler.handle(normalize(request)).await {
        Some(response) => response.into_response(),
        None => unknown_route_response(&OAuthRequest::new(method, url)).into_response(),
    }
}
