//! Client type - which kind of GitHub app this is

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Client id prefix used by GitHub Apps
const GITHUB_APP_CLIENT_ID_PREFIX: &str = "lv1.";

/// The two kinds of GitHub apps that can run the OAuth web/device flow.
///
/// OAuth Apps have scopes and non-expiring tokens. GitHub Apps use
/// fine-grained permissions and may issue expiring tokens with refresh
/// tokens, which unlocks `refresh_token` and `scope_token`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ClientType {
    #[default]
    #[serde(rename = "oauth-app")]
    OAuthApp,
    #[serde(rename = "github-app")]
    GitHubApp,
}

impl ClientType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OAuthApp => "oauth-app",
            Self::GitHubApp => "github-app",
        }
    }

    /// Human readable name, used in error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::OAuthApp => "OAuth Apps",
            Self::GitHubApp => "GitHub Apps",
        }
    }

    /// Infer the client type from a client id.
    ///
    /// GitHub App client ids start with `lv1.`; everything else is
    /// treated as an OAuth App.
    pub fn infer_from_client_id(client_id: &str) -> Self {
        if client_id.starts_with(GITHUB_APP_CLIENT_ID_PREFIX) {
            Self::GitHubApp
        } else {
            Self::OAuthApp
        }
    }

    /// Whether tokens issued for this client type carry scopes
    pub fn has_scopes(&self) -> bool {
        matches!(self, Self::OAuthApp)
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClientType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oauth-app" => Ok(Self::OAuthApp),
            "github-app" => Ok(Self::GitHubApp),
            other => Err(format!(
                "unknown client type \"{}\" (expected \"oauth-app\" or \"github-app\")",
                other
            )),
        }
    }
}
