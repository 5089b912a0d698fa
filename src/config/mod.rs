//! Configuration system (layered: code > env > built-in defaults).

use std::sync::OnceLock;

use regex::Regex;
use strum::{Display, EnumString};

use crate::auth::AuthError;

/// Default OAuth scopes requested at sign-in.
pub const DEFAULT_SCOPES: &str = "openid email profile";
/// Provider authorization endpoint.
pub const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
/// Provider userinfo endpoint.
pub const DEFAULT_PROFILE_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
/// Dev-server origin used for the local redirect URI.
pub const DEFAULT_LOCAL_SITE_URL: &str = "http://localhost:8888";
/// Path the provider redirects back to after consent.
pub const CALLBACK_PATH: &str = "/oauth2/callback";

/// Client IDs issued by the provider always carry this shape.
const CLIENT_ID_PATTERN: &str = r"^[a-z0-9-]+\.apps\.googleusercontent\.com$";

static CLIENT_ID_RE: OnceLock<Regex> = OnceLock::new();

fn client_id_re() -> &'static Regex {
    CLIENT_ID_RE.get_or_init(|| Regex::new(CLIENT_ID_PATTERN).expect("valid client ID pattern"))
}

/// Deployment environment, which picks the redirect URI origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Environment {
    Local,
    Production,
}

/// Configuration for the sign-in flow and the relay/service endpoints.
///
/// # Example
/// ```no_run
/// use sheaf::config::{Environment, SheafConfig};
///
/// let config = SheafConfig::new("1234-abcd.apps.googleusercontent.com")
///     .with_site_url("https://docs.example.com")
///     .with_environment(Environment::Production);
/// assert_eq!(config.redirect_uri(), "https://docs.example.com/oauth2/callback");
/// ```
#[derive(Debug, Clone)]
pub struct SheafConfig {
    client_id: String,
    scopes: String,
    environment: Environment,
    site_url: String,
    local_site_url: String,
    auth_url: String,
    profile_url: String,
    relay_url: String,
    api_url: Option<String>,
    audience: Option<String>,
}

impl SheafConfig {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            scopes: DEFAULT_SCOPES.to_string(),
            environment: Environment::Local,
            site_url: String::new(),
            local_site_url: DEFAULT_LOCAL_SITE_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            profile_url: DEFAULT_PROFILE_URL.to_string(),
            relay_url: DEFAULT_LOCAL_SITE_URL.to_string(),
            api_url: None,
            audience: None,
        }
    }

    /// Load from environment variables (SHEAF_CLIENT_ID, SHEAF_SITE_URL,
    /// SHEAF_ENV, ...).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let mut config = Self::new(std::env::var("SHEAF_CLIENT_ID").unwrap_or_default());

        if let Ok(value) = std::env::var("SHEAF_ENV") {
            if let Ok(environment) = value.parse() {
                config.environment = environment;
            }
        }
        if let Ok(value) = std::env::var("SHEAF_SITE_URL") {
            config.site_url = value.trim_end_matches('/').to_string();
            config.relay_url = config.site_url.clone();
        }
        if let Ok(value) = std::env::var("SHEAF_LOCAL_SITE_URL") {
            config.local_site_url = value.trim_end_matches('/').to_string();
        }
        if let Ok(value) = std::env::var("SHEAF_RELAY_URL") {
            config.relay_url = value.trim_end_matches('/').to_string();
        }
        if let Ok(value) = std::env::var("SHEAF_API_URL") {
            config.api_url = Some(value.trim_end_matches('/').to_string());
        }
        if let Ok(value) = std::env::var("SHEAF_AUDIENCE") {
            config.audience = Some(value);
        }
        if let Ok(value) = std::env::var("SHEAF_SCOPES") {
            config.scopes = value;
        }

        config
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_site_url(mut self, url: impl Into<String>) -> Self {
        self.site_url = trim_url(url);
        if self.relay_url == DEFAULT_LOCAL_SITE_URL {
            self.relay_url = self.site_url.clone();
        }
        self
    }

    pub fn with_local_site_url(mut self, url: impl Into<String>) -> Self {
        self.local_site_url = trim_url(url);
        self
    }

    pub fn with_relay_url(mut self, url: impl Into<String>) -> Self {
        self.relay_url = trim_url(url);
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(trim_url(url));
        self
    }

    pub fn with_auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = trim_url(url);
        self
    }

    pub fn with_profile_url(mut self, url: impl Into<String>) -> Self {
        self.profile_url = trim_url(url);
        self
    }

    pub fn with_scopes(mut self, scopes: impl Into<String>) -> Self {
        self.scopes = scopes.into();
        self
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn scopes(&self) -> &str {
        &self.scopes
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Redirect URI registered with the provider. Environment-dependent:
    /// the dev server origin locally, the deployed origin in production.
    pub fn redirect_uri(&self) -> String {
        let origin = match self.environment {
            Environment::Local => &self.local_site_url,
            Environment::Production => &self.site_url,
        };
        format!("{origin}{CALLBACK_PATH}")
    }

    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    pub fn profile_url(&self) -> &str {
        &self.profile_url
    }

    pub fn exchange_url(&self) -> String {
        format!("{}/api/auth/exchange", self.relay_url)
    }

    pub fn refresh_url(&self) -> String {
        format!("{}/api/auth/refresh", self.relay_url)
    }

    pub fn audience_token_url(&self) -> String {
        format!("{}/api/auth/audience-token", self.relay_url)
    }

    /// Base URL for the document service endpoints.
    pub fn api_url(&self) -> String {
        self.api_url
            .clone()
            .unwrap_or_else(|| format!("{}/api", self.relay_url))
    }

    /// Audience identifier minted tokens are scoped to. Defaults to the
    /// document service base URL.
    pub fn audience(&self) -> String {
        self.audience.clone().unwrap_or_else(|| self.api_url())
    }

    /// Reject unusable client IDs before any network round-trip: empty,
    /// obvious placeholders, or values without the provider's suffix.
    pub fn validate_client_id(&self) -> Result<(), AuthError> {
        let id = self.client_id.trim();
        if id.is_empty() {
            return Err(AuthError::Configuration(
                "OAuth client ID is not set".to_string(),
            ));
        }
        if is_placeholder(id) {
            return Err(AuthError::Configuration(format!(
                "OAuth client ID looks like a placeholder: {id}"
            )));
        }
        if !client_id_re().is_match(id) {
            return Err(AuthError::Configuration(format!(
                "OAuth client ID does not match the provider's expected shape \
                 (*.apps.googleusercontent.com): {id}"
            )));
        }
        Ok(())
    }
}

fn trim_url(url: impl Into<String>) -> String {
    url.into().trim_end_matches('/').to_string()
}

fn is_placeholder(id: &str) -> bool {
    let upper = id.to_ascii_uppercase();
    upper.contains("YOUR_") || upper.contains("REPLACE") || upper.contains("CHANGEME")
}
