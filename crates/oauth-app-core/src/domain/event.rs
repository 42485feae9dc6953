//! Lifecycle events
//!
//! Events are named by a category (`token`, `authorization`) and an action
//! (`created`, `reset`, ...). Handlers subscribe either to a specific
//! `category.action` key or to a bare category, which matches every action.
//!
//! | Key                                | Emitted by                                  |
//! |------------------------------------|---------------------------------------------|
//! | `token.created`                    | `create_token`, `user_client` (fresh flows) |
//! | `token.reset`                      | `reset_token`                               |
//! | `token.refreshed`                  | `refresh_token`                             |
//! | `token.scoped`                     | `scope_token`                               |
//! | `token.before_deleted`             | `delete_token`, `delete_authorization`      |
//! | `token.deleted`                    | `delete_token`, `delete_authorization`      |
//! | `authorization.before_deleted`     | `delete_authorization`                      |
//! | `authorization.deleted`            | `delete_authorization`                      |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::Authentication;
use crate::client::{GitHubClient, LazyClient};

/// Event category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    Token,
    Authorization,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Authorization => "authorization",
        }
    }
}

/// Event action within a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    Created,
    Reset,
    Refreshed,
    Scoped,
    BeforeDeleted,
    Deleted,
}

impl EventAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Reset => "reset",
            Self::Refreshed => "refreshed",
            Self::Scoped => "scoped",
            Self::BeforeDeleted => "before_deleted",
            Self::Deleted => "deleted",
        }
    }
}

/// Registration key: a bare category or a `category.action` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKey {
    Category(EventName),
    Action(EventName, EventAction),
}

impl EventKey {
    pub const TOKEN: Self = Self::Category(EventName::Token);
    pub const TOKEN_CREATED: Self = Self::Action(EventName::Token, EventAction::Created);
    pub const TOKEN_RESET: Self = Self::Action(EventName::Token, EventAction::Reset);
    pub const TOKEN_REFRESHED: Self = Self::Action(EventName::Token, EventAction::Refreshed);
    pub const TOKEN_SCOPED: Self = Self::Action(EventName::Token, EventAction::Scoped);
    pub const TOKEN_BEFORE_DELETED: Self =
        Self::Action(EventName::Token, EventAction::BeforeDeleted);
    pub const TOKEN_DELETED: Self = Self::Action(EventName::Token, EventAction::Deleted);
    pub const AUTHORIZATION: Self = Self::Category(EventName::Authorization);
    pub const AUTHORIZATION_BEFORE_DELETED: Self =
        Self::Action(EventName::Authorization, EventAction::BeforeDeleted);
    pub const AUTHORIZATION_DELETED: Self =
        Self::Action(EventName::Authorization, EventAction::Deleted);

    /// Every key a handler can subscribe to
    pub const ALL: [Self; 10] = [
        Self::TOKEN,
        Self::TOKEN_CREATED,
        Self::TOKEN_RESET,
        Self::TOKEN_REFRESHED,
        Self::TOKEN_SCOPED,
        Self::TOKEN_BEFORE_DELETED,
        Self::TOKEN_DELETED,
        Self::AUTHORIZATION,
        Self::AUTHORIZATION_BEFORE_DELETED,
        Self::AUTHORIZATION_DELETED,
    ];

    pub fn name(&self) -> EventName {
        match self {
            Self::Category(name) | Self::Action(name, _) => *name,
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category(name) => f.write_str(name.as_str()),
            Self::Action(name, action) => write!(f, "{}.{}", name.as_str(), action.as_str()),
        }
    }
}

impl FromStr for EventKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.to_string() == s)
            .ok_or_else(|| format!("unknown event \"{}\"", s))
    }
}

/// Payload handed to event handlers.
///
/// Cheap to clone; the client is shared and only built when a handler asks
/// for it via [`EventContext::client`].
#[derive(Clone)]
pub struct EventContext {
    pub name: EventName,
    pub action: EventAction,
    /// The affected token
    pub token: String,
    /// Token scopes (OAuth Apps only)
    pub scopes: Option<Vec<String>>,
    pub authentication: Option<Authentication>,
    client: Arc<LazyClient>,
}

impl EventContext {
    pub fn new(
        name: EventName,
        action: EventAction,
        token: impl Into<String>,
        client: LazyClient,
    ) -> Self {
        Self {
            name,
            action,
            token: token.into(),
            scopes: None,
            authentication: None,
            client: Arc::new(client),
        }
    }

    pub fn with_scopes(mut self, scopes: Option<Vec<String>>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_authentication(mut self, authentication: Authentication) -> Self {
        self.authentication = Some(authentication);
        self
    }

    /// The specific `name.action` key of this event
    pub fn key(&self) -> EventKey {
        EventKey::Action(self.name, self.action)
    }

    /// The bare category key of this event
    pub fn category(&self) -> EventKey {
        EventKey::Category(self.name)
    }

    /// GitHub client bound to this event's credential, built on first access.
    ///
    /// For `deleted` events the client is unauthenticated and rejects every
    /// request with the reason it was created with.
    pub fn client(&self) -> &GitHubClient {
        self.client.get()
    }

    pub fn token_preview(&self) -> &str {
        super::token_preview(&self.token)
    }

    /// Whether a handler has already asked for the client
    pub fn client_initialized(&self) -> bool {
        self.client.is_initialized()
    }
}

impl fmt::Debug for EventContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventContext")
            .field("key", &self.key().to_string())
            .field("token", &super::token_preview(&self.token))
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}
