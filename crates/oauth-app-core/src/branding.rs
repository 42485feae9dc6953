//! Centralized branding constants
//!
//! Product naming, default GitHub endpoints and the prefix carried by every
//! user-facing error message.

/// Package name used in user agents
pub const PACKAGE_NAME: &str = "github-oauth-app";

/// Log file name prefix of the server binary
pub const LOG_PREFIX: &str = "oauth-app-server";

/// Prefix for every user-facing error message
pub const ERROR_PREFIX: &str = "[github-oauth-app]";

/// Default GitHub web host (authorize, access_token, device code)
pub const DEFAULT_WEB_URL: &str = "https://github.com";

/// Default GitHub REST API host
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default path prefix for the HTTP routes
pub const DEFAULT_PATH_PREFIX: &str = "/api/github/oauth";

/// User agent sent with every outbound request
pub fn user_agent() -> String {
    format!("{}/{}", PACKAGE_NAME, env!("CARGO_PKG_VERSION"))
}

/// Format a user-facing error message with the package prefix
///
/// # Example
/// ```
/// use oauth_app_core::branding;
///
/// assert_eq!(
///     branding::error_message("request error"),
///     "[github-oauth-app] request error"
/// );
/// ```
pub fn error_message(message: impl AsRef<str>) -> String {
    format!("{} {}", ERROR_PREFIX, message.as_ref())
}
