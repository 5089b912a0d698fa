use thiserror::Error;

use crate::error::SheafError;

/// Normalized errors for the sign-in and token-lifecycle flows.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Provider returned an error: {code}")]
    Provider { code: String },
    #[error("Code exchange failed (status {status}): {detail}")]
    Exchange { status: u16, detail: String },
    #[error("No refresh token stored")]
    NoRefreshToken,
    #[error("Token refresh failed (status {status}): {detail}")]
    Refresh { status: u16, detail: String },
    #[error("Profile fetch failed (status {status}): {detail}")]
    ProfileFetch { status: u16, detail: String },
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("Token mint failed (status {status}): {detail}")]
    TokenMint { status: u16, detail: String },
    #[error("Malformed callback: {0}")]
    MalformedCallback(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        Self::Network(error.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::de::Error> for AuthError {
    fn from(error: toml::de::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<toml::ser::Error> for AuthError {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<AuthError> for SheafError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Configuration(message) => SheafError::Configuration(message),
            other => SheafError::Authentication(other.to_string()),
        }
    }
}
