//! AWS Lambda adapter for API Gateway HTTP APIs (payload format 2.0)
//!
//! Only the event fields the router needs are modelled. Deserialize the raw
//! invocation payload into [`ApiGatewayV2Event`] and serialize the returned
//! [`ApiGatewayV2Response`] back.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use super::OAuthHandler;
use crate::router::{
    unknown_route, unknown_route_response, BodyError, OAuthRequest, OAuthResponse,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayV2Event {
    pub raw_path: String,
    #[serde(default)]
    pub raw_query_string: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
    pub request_context: RequestContext,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestContext {
    #[serde(default)]
    pub stage: String,
    pub http: HttpContext,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpContext {
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayV2Response {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Event whose `requestContext.http.method` is not an HTTP method
#[derive(Debug, thiserror::Error)]
#[error("invalid request method \"{method}\" for {url}")]
pub struct InvalidMethod {
    pub method: String,
    pub url: String,
}

/// Convert an API Gateway event.
///
/// The `/{stage}` prefix API Gateway adds to `rawPath` is removed and
/// `rawQueryString` re-attached.
pub fn parse_request(event: ApiGatewayV2Event) -> Result<OAuthRequest, InvalidMethod> {
    let stage_prefix = format!("/{}", event.request_context.stage);
    let mut url = match event.raw_path.strip_prefix(&stage_prefix) {
        Some(rest) if !event.request_context.stage.is_empty() => rest.to_string(),
        _ => event.raw_path,
    };
    if !event.raw_query_string.is_empty() {
        url.push('?');
        url.push_str(&event.raw_query_string);
    }

    let method = match Method::from_bytes(event.request_context.http.method.as_bytes()) {
        Ok(method) => method,
        Err(_) => {
            return Err(InvalidMethod {
                method: event.request_context.http.method,
                url,
            })
        }
    };

    let mut headers = HeaderMap::new();
    for (name, value) in &event.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => warn!(header = %name, "[Lambda] Dropping invalid header"),
        }
    }

    let body = decode_body(event.body, event.is_base64_encoded);
    Ok(OAuthRequest::new(method, url)
        .with_headers(headers)
        .with_body_future(Box::pin(async move { body })))
}

fn decode_body(body: Option<String>, is_base64_encoded: bool) -> Result<String, BodyError> {
    let Some(body) = body else {
        return Ok(String::new());
    };
    if !is_base64_encoded {
        return Ok(body);
    }
    let bytes = STANDARD
        .decode(body.as_bytes())
        .map_err(|e| BodyError::Read(format!("invalid base64 body: {}", e)))?;
    String::from_utf8(bytes).map_err(|_| BodyError::InvalidUtf8)
}

pub fn send_response(response: OAuthResponse) -> ApiGatewayV2Response {
    let headers = response
        .headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    ApiGatewayV2Response {
        status_code: response.status.as_u16(),
        headers,
        body: response.body,
    }
}

/// Lambda entry point around an [`OAuthHandler`]
#[derive(Clone)]
pub struct LambdaHandler {
    handler: OAuthHandler,
}

impl LambdaHandler {
    pub fn new(handler: OAuthHandler) -> Self {
        Self { handler }
    }

    /// Handle one invocation. Requests outside the path prefix get the
    /// unknown-route 404.
    pub async fn handle(&self, event: ApiGatewayV2Event) -> ApiGatewayV2Response {
        let request = match parse_request(event) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "[Lambda] Rejecting event");
                return send_response(unknown_route(&e.method, &e.url));
            }
        };
        let fallback = OAuthRequest::new(request.method.clone(), request.url.clone());

        let response = match self.handler.handle(request).await {
            Some(response) => response,
            None => unknown_route_response(&fallback),
        };
        send_response(response)
    }
}
