//! Normalized request and response
//!
//! Runtime adapters translate their native types to and from these shapes;
//! the router never sees anything else.

use futures::future::BoxFuture;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde::Serialize;
use std::fmt;

/// Errors of the request body accessor
#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("request body already consumed")]
    AlreadyConsumed,

    #[error("request body is not valid UTF-8")]
    InvalidUtf8,

    #[error("failed to read request body: {0}")]
    Read(String),
}

/// Deferred body text, resolved on first read
pub type BodyFuture = BoxFuture<'static, Result<String, BodyError>>;

enum Body {
    Empty,
    Pending(BodyFuture),
    Consumed,
}

/// Host-independent inbound request
pub struct OAuthRequest {
    pub method: Method,
    /// Path plus optional query string (`/api/github/oauth/login?state=abc`),
    /// or an absolute URL
    pub url: String,
    pub headers: HeaderMap,
    body: Body,
}

impl OAuthRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: Body::Empty,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Add a header; invalid names or values are ignored
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Body already held in memory
    pub fn with_body(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.body = Body::Pending(Box::pin(async move { Ok(text) }));
        self
    }

    /// Body read lazily from the host on first access
    pub fn with_body_future(mut self, body: BodyFuture) -> Self {
        self.body = Body::Pending(body);
        self
    }

    /// Read the body text. Single-consume: a second call fails with
    /// [`BodyError::AlreadyConsumed`].
    pub async fn text(&mut self) -> Result<String, BodyError> {
        match std::mem::replace(&mut self.body, Body::Consumed) {
            Body::Empty => Ok(String::new()),
            Body::Pending(body) => body.await,
            Body::Consumed => Err(BodyError::AlreadyConsumed),
        }
    }
}

impl fmt::Debug for OAuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

/// Host-independent outbound response
#[derive(Debug, Clone, PartialEq)]
pub struct OAuthResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl OAuthResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// `application/json` response
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, body: &T) -> Self {
        let text = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
        Self::new(status)
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .with_body(text)
    }

    /// `{"error": message}` with the given status
    pub fn error(status: StatusCode, message: impl AsRef<str>) -> Self {
        Self::json(status, &serde_json::json!({ "error": message.as_ref() }))
    }

    pub fn html(status: StatusCode, body: impl Into<String>) -> Self {
        Self::new(status)
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static("text/html"))
            .with_body(body)
    }

    pub fn redirect(location: &str) -> Self {
        let mut response = Self::new(StatusCode::FOUND);
        if let Ok(value) = HeaderValue::from_str(location) {
            response.headers.insert(header::LOCATION, value);
        }
        response
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Header value as text, for assertions and adapters
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Body parsed as JSON
    pub fn json_body(&self) -> Option<serde_json::Value> {
        serde_json::from_str(self.body.as_deref()?).ok()
    }
}
