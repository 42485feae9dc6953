//! Domain types and value objects
//!
//! - Client type (OAuth App vs GitHub App)
//! - App configuration (the immutable State shared by every operation)
//! - Normalized user authentication
//! - Event keys and the context handed to event handlers
//! - Web flow authorization URL

mod authentication;
mod client_type;
pub mod config;
mod event;
pub mod web_flow;

pub use authentication::{token_preview, Authentication, AuthenticationType, TokenType};
pub use client_type::ClientType;
pub use config::OAuthAppConfig;
pub use event::{EventAction, EventContext, EventKey, EventName};
pub use web_flow::{
    api_base_url, authorization_url, web_base_url, AuthorizationUrlParams, WebFlowAuthorization,
    WebFlowUrlOptions,
};
