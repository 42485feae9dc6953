//! User-scoped GitHub clients

use tracing::debug;

use super::{CreateTokenOptions, OAuthApp};
use crate::client::GitHubClient;
use crate::domain::Authentication;
use crate::error::Result;

/// Where the user credential of [`OAuthApp::user_client`] comes from
#[derive(Debug, Clone)]
pub enum UserClientOptions {
    /// An authentication obtained earlier
    Authentication(Authentication),
    /// A bare token obtained earlier
    Token(String),
    /// Run a flow to obtain a new token
    Create(CreateTokenOptions),
}

impl From<CreateTokenOptions> for UserClientOptions {
    fn from(options: CreateTokenOptions) -> Self {
        Self::Create(options)
    }
}

impl From<Authentication> for UserClientOptions {
    fn from(authentication: Authentication) -> Self {
        Self::Authentication(authentication)
    }
}

impl OAuthApp {
    /// Get a client authenticated as a user.
    ///
    /// Existing credentials emit nothing. Running a flow emits
    /// `token.created` exactly once, through [`OAuthApp::create_token`].
    pub async fn user_client(&self, options: impl Into<UserClientOptions>) -> Result<GitHubClient> {
        let authentication = match options.into() {
            UserClientOptions::Authentication(authentication) => authentication,
            UserClientOptions::Token(token) => self.authentication_for(&token),
            UserClientOptions::Create(options) => {
                debug!("[OAuthApp] Creating token for user client");
                self.create_token(options).await?.authentication
            }
        };
        Ok(self.clients.user(authentication))
    }
}
