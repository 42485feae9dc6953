//! Server configuration from environment variables

use oauth_app_core::{branding, ClientType, OAuthAppBuilder};
use std::fmt;
use std::path::PathBuf;
use zeroize::Zeroizing;

use crate::router::HandlerOptions;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {message}")]
    Invalid { name: &'static str, message: String },
}

/// Configuration of the `oauth-app-server` binary
#[derive(Clone)]
pub struct ServerConfig {
    pub client_id: String,
    pub client_secret: Zeroizing<String>,
    /// Inferred from the client id when unset
    pub client_type: Option<ClientType>,
    pub default_scopes: Vec<String>,
    pub allow_signup: Option<bool>,
    pub base_url: Option<String>,
    pub redirect_url: Option<String>,
    pub path_prefix: String,
    pub host: String,
    pub port: u16,
    pub log_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Read the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let client_id = get("GITHUB_CLIENT_ID").ok_or(ConfigError::Missing("GITHUB_CLIENT_ID"))?;
        let client_secret =
            get("GITHUB_CLIENT_SECRET").ok_or(ConfigError::Missing("GITHUB_CLIENT_SECRET"))?;

        let client_type = get("GITHUB_CLIENT_TYPE")
            .map(|value| {
                value.parse::<ClientType>().map_err(|message| ConfigError::Invalid {
                    name: "GITHUB_CLIENT_TYPE",
                    message,
                })
            })
            .transpose()?;

        let default_scopes = get("GITHUB_DEFAULT_SCOPES")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|scope| !scope.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let port = match get("OAUTH_APP_PORT") {
            Some(value) => value.parse().map_err(|e| ConfigError::Invalid {
                name: "OAUTH_APP_PORT",
                message: format!("{}", e),
            })?,
            None => DEFAULT_PORT,
        };

        let path_prefix = get("OAUTH_PATH_PREFIX")
            .unwrap_or_else(|| branding::DEFAULT_PATH_PREFIX.to_string());
        if !path_prefix.starts_with('/') {
            return Err(ConfigError::Invalid {
                name: "OAUTH_PATH_PREFIX",
                message: "must start with '/'".to_string(),
            });
        }

        Ok(Self {
            client_id,
            client_secret: Zeroizing::new(client_secret),
            client_type,
            default_scopes,
            allow_signup: parse_bool(get("GITHUB_ALLOW_SIGNUP"), "GITHUB_ALLOW_SIGNUP")?,
            base_url: get("GITHUB_BASE_URL"),
            redirect_url: get("GITHUB_REDIRECT_URL"),
            path_prefix,
            host: get("OAUTH_APP_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            log_dir: get("OAUTH_APP_LOG_DIR").map(PathBuf::from),
        })
    }

    /// Builder for the app this configuration describes
    pub fn app_builder(&self) -> OAuthAppBuilder {
        let mut builder = OAuthAppBuilder::new(self.client_id.clone(), self.client_secret.to_string())
            .with_default_scopes(self.default_scopes.clone());

        if let Some(client_type) = self.client_type {
            builder = builder.with_client_type(client_type);
        }
        if let Some(allow_signup) = self.allow_signup {
            builder = builder.with_allow_signup(allow_signup);
        }
        if let Some(base_url) = &self.base_url {
            builder = builder.with_base_url(base_url.clone());
        }
        if let Some(redirect_url) = &self.redirect_url {
            builder = builder.with_redirect_url(redirect_url.clone());
        }
        builder
    }

    pub fn handler_options(&self) -> HandlerOptions {
        HandlerOptions::with_path_prefix(self.path_prefix.clone())
    }

    /// `host:port` to bind
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_bool(value: Option<String>, name: &'static str) -> Result<Option<bool>, ConfigError> {
    match value.as_deref().map(str::trim) {
        None => Ok(None),
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(other) => Err(ConfigError::Invalid {
            name,
            message: format!("expected true or false, got {:?}", other),
        }),
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("client_type", &self.client_type)
            .field("default_scopes", &self.default_scopes)
            .field("path_prefix", &self.path_prefix)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}
