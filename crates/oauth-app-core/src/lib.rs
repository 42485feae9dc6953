//! # GitHub OAuth App Core
//!
//! Token lifecycle logic for GitHub OAuth Apps and GitHub Apps.
//!
//! ## Modules
//!
//! - `branding` - Product naming, default endpoints and message prefixes
//! - `domain` - Client type, configuration, authentication and event types
//! - `event_bus` - Event registry with sequential, ordered emission
//! - `provider` - External OAuth operations provider (trait + GitHub implementation)
//! - `client` - Authenticated GitHub client factory and lazily built clients
//! - `application` - The `OAuthApp` facade orchestrating provider calls and events
//! - `error` - Error types

pub mod application;
pub mod branding;
pub mod client;
pub mod domain;
pub mod error;
pub mod event_bus;
pub mod provider;

pub use domain::*;

pub use application::{
    CreateTokenOptions, CreateTokenResult, OAuthApp, OAuthAppBuilder, OAuthOperations,
    UserClientOptions,
};
pub use client::{ClientAuth, GitHubClient, GitHubClientFactory, LazyClient};
pub use error::{OAuthAppError, OAuthErrorBody, ProviderError, Result};
pub use event_bus::{EventHandler, EventRegistry, IntoEventKeys};
pub use provider::{
    ClientCredentials, DeviceVerification, GitHubEndpoints, GitHubOAuthProvider, OAuthProvider,
    ScopeTokenOptions, TokenResponse, VerificationHandler, WebFlowExchange,
};
