//! HTTP request/response logging middleware
//!
//! One entry and one exit line per request, inside a span carrying the trace
//! id. Bodies are never logged: every OAuth route carries a token or code in
//! either the request or the response.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::{debug, Instrument};

use super::{RequestSpan, TraceContext};
use crate::router::HandlerOptions;

const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie", "x-api-key"];

/// Headers in `name=value` form with credentials redacted
pub fn redact_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            if SENSITIVE_HEADERS.contains(&name.as_str()) {
                format!("{}=[REDACTED]", name)
            } else {
                format!("{}={:?}", name, value)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Logging middleware; the state resolves which OAuth route a request hits
pub async fn http_logging_middleware(
    State(options): State<HandlerOptions>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let route = options
        .route_for(request.method(), &path)
        .map(|route| route.to_string());
    let ctx = TraceContext::new(request.method().as_str(), &path).with_route(route);
    let span = RequestSpan::enter(&ctx);

    async move {
        RequestSpan::log_entry(&ctx);
        debug!(
            trace_id = %ctx.trace_id,
            headers = %redact_headers(request.headers()),
            "Request headers"
        );

        let mut request = request;
        request.extensions_mut().insert(ctx.clone());
        let response = next.run(request).await;

        RequestSpan::log_exit(&ctx, response.status().as_u16());
        response
    }
    .instrument(span)
    .await
}
