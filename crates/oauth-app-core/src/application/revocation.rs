//! Token and authorization revocation
//!
//! `before_deleted` handlers get a client still authenticated as the token,
//! so they can make last requests on the user's behalf. `deleted` handlers get
//! an unauthenticated client that explains why it cannot be used.

use tracing::info;

use super::OAuthApp;
use crate::domain::{token_preview, EventAction, EventName};
use crate::error::Result;

const TOKEN_DELETED_REASON: &str =
    "Handling \"token.deleted\" event. The access for the token has been revoked.";
const AUTHORIZATION_DELETED_REASON: &str =
    "Handling \"authorization.deleted\" event. The access for the app has been revoked.";

impl OAuthApp {
    /// Revoke a single token.
    ///
    /// Emits: `token.before_deleted`, then `token.deleted`
    pub async fn delete_token(&self, token: &str) -> Result<()> {
        let authentication = self.authentication_for(token);

        self.events
            .emit(self.authenticated_event(
                EventName::Token,
                EventAction::BeforeDeleted,
                &authentication,
            ))
            .await?;

        self.provider
            .delete_token(&self.config.credentials(), token)
            .await?;
        info!(token = token_preview(token), "[OAuthApp] Token deleted");

        self.events
            .emit(self.revoked_event(
                EventName::Token,
                EventAction::Deleted,
                token,
                TOKEN_DELETED_REASON.to_string(),
            ))
            .await
    }

    /// Revoke the app's whole grant for the token's user. Every token the
    /// user has for this app stops working.
    ///
    /// Emits, in order: `authorization.before_deleted`, `token.before_deleted`,
    /// `token.deleted`, `authorization.deleted`
    pub async fn delete_authorization(&self, token: &str) -> Result<()> {
        let authentication = self.authentication_for(token);

        self.events
            .emit(self.authenticated_event(
                EventName::Authorization,
                EventAction::BeforeDeleted,
                &authentication,
            ))
            .await?;
        self.events
            .emit(self.authenticated_event(
                EventName::Token,
                EventAction::BeforeDeleted,
                &authentication,
            ))
            .await?;

        self.provider
            .delete_authorization(&self.config.credentials(), token)
            .await?;
        info!(
            token = token_preview(token),
            "[OAuthApp] Authorization deleted"
        );

        self.events
            .emit(self.revoked_event(
                EventName::Token,
                EventAction::Deleted,
                token,
                TOKEN_DELETED_REASON.to_string(),
            ))
            .await?;
        self.events
            .emit(self.revoked_event(
                EventName::Authorization,
                EventAction::Deleted,
                token,
                AUTHORIZATION_DELETED_REASON.to_string(),
            ))
            .await
    }
}
