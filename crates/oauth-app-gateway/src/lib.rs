//! # GitHub OAuth App Gateway
//!
//! HTTP surface of the OAuth app.
//!
//! ## Modules
//!
//! - `router` - Host-independent request router for the OAuth routes
//! - `adapters` - axum and AWS Lambda adapters around the router
//! - `logging` - Trace ids, request logging middleware, subscriber setup
//! - `server` - Standalone axum server used by the `oauth-app-server` binary

pub mod adapters;
pub mod logging;
pub mod router;
pub mod server;

pub use adapters::axum::{oauth_middleware, oauth_router};
pub use adapters::lambda::{ApiGatewayV2Event, ApiGatewayV2Response, LambdaHandler};
pub use adapters::OAuthHandler;
pub use router::{
    handle_request, unknown_route_response, BodyError, HandlerOptions, OAuthRequest,
    OAuthResponse, RouteId,
};
pub use server::{ConfigError, OAuthGatewayServer, ServerConfig};
