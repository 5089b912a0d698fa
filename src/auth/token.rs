use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::util::mask;

/// Token bundle persisted after a successful exchange or refresh.
///
/// # Example
/// ```no_run
/// use sheaf::auth::TokenBundle;
/// use chrono::{Duration, Utc};
///
/// let bundle = TokenBundle {
///     access_token: "access".to_string(),
///     id_token: "id".to_string(),
///     refresh_token: Some("refresh".to_string()),
///     expires_at: Utc::now() + Duration::seconds(3600),
///     token_type: "Bearer".to_string(),
///     scope: "openid email profile".to_string(),
/// };
/// assert!(!bundle.is_expired());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenBundle {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub token_type: String,
    pub scope: String,
}

impl TokenBundle {
    /// Whether the bundle has reached its expiry instant. The boundary
    /// itself counts as expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Build a bundle from a wire response, stamping the absolute expiry
    /// from the relative `expires_in` at this moment.
    pub fn from_response(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            expires_at: Utc::now() + Duration::seconds(response.expires_in),
            token_type: response.token_type,
            scope: response.scope,
        }
    }
}

/// Raw token payload as the relay returns it from exchange and refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub id_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds, relative to receipt.
    pub expires_in: i64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Diagnostic view of a stored bundle's expiry. Reading this never
/// mutates storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenExpiration {
    pub expires_at: DateTime<Utc>,
    pub is_expired: bool,
    pub expires_in_minutes: i64,
}

impl TokenExpiration {
    pub fn of(bundle: &TokenBundle) -> Self {
        let remaining = bundle.expires_at - Utc::now();
        Self {
            expires_at: bundle.expires_at,
            is_expired: bundle.is_expired(),
            expires_in_minutes: remaining.num_minutes(),
        }
    }
}

/// Masked preview of a token for logs and debug surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskedToken {
    pub preview: String,
    pub length: usize,
}

impl MaskedToken {
    pub fn of(token: &str) -> Self {
        Self {
            preview: mask(token),
            length: token.len(),
        }
    }
}

/// Debug aggregate over the stored bundle. Raw token material never
/// appears here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    pub has_bundle: bool,
    pub access_token: Option<MaskedToken>,
    pub id_token: Option<MaskedToken>,
    pub has_refresh_token: bool,
    pub token_type: Option<String>,
    pub scope: Option<String>,
    pub expiration: Option<TokenExpiration>,
}

impl TokenInfo {
    pub fn absent() -> Self {
        Self {
            has_bundle: false,
            access_token: None,
            id_token: None,
            has_refresh_token: false,
            token_type: None,
            scope: None,
            expiration: None,
        }
    }

    pub fn of(bundle: &TokenBundle) -> Self {
        Self {
            has_bundle: true,
            access_token: Some(MaskedToken::of(&bundle.access_token)),
            id_token: Some(MaskedToken::of(&bundle.id_token)),
            has_refresh_token: bundle.refresh_token.is_some(),
            token_type: Some(bundle.token_type.clone()),
            scope: Some(bundle.scope.clone()),
            expiration: Some(TokenExpiration::of(bundle)),
        }
    }
}
