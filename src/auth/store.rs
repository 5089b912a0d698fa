use std::sync::Arc;

use tracing::{debug, warn};

use super::error::AuthError;
use super::storage::{MemoryStorage, StorageBackend};
use super::token::{TokenBundle, TokenExpiration, TokenInfo, TokenResponse};
use super::user::UserProfile;

/// Storage key for the serialized token bundle.
pub const TOKEN_KEY: &str = "sheaf_auth_tokens";
/// Storage key for the cached user profile.
pub const USER_KEY: &str = "sheaf_auth_user";

/// Token lifecycle service over an injected storage backend.
///
/// Bundles are replaced wholesale on every save; reads enforce expiry
/// lazily. A corrupt record is treated as signed-out rather than an
/// error, so a bad write can never brick the client.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn StorageBackend>,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

impl TokenStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Store backed by process-local memory. Handy for tests and
    /// short-lived tools.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// Persist a wire response, stamping its absolute expiry now.
    /// Replaces any previous bundle wholesale.
    pub fn save_response(&self, response: TokenResponse) -> Result<TokenBundle, AuthError> {
        let bundle = TokenBundle::from_response(response);
        self.save_bundle(&bundle)?;
        Ok(bundle)
    }

    pub fn save_bundle(&self, bundle: &TokenBundle) -> Result<(), AuthError> {
        let serialized = serde_json::to_string(bundle)?;
        self.backend.set(TOKEN_KEY, &serialized)?;
        debug!(
            access_len = bundle.access_token.len(),
            id_len = bundle.id_token.len(),
            has_refresh = bundle.refresh_token.is_some(),
            expires_at = %bundle.expires_at,
            "stored token bundle"
        );
        Ok(())
    }

    /// The stored bundle if present and unexpired. An expired or corrupt
    /// record is deleted and reported as absent.
    pub fn valid_bundle(&self) -> Result<Option<TokenBundle>, AuthError> {
        let bundle = match self.read_bundle()? {
            ReadOutcome::Missing => return Ok(None),
            ReadOutcome::Corrupt => {
                self.backend.delete(TOKEN_KEY)?;
                return Ok(None);
            }
            ReadOutcome::Present(bundle) => bundle,
        };
        if bundle.is_expired() {
            debug!(expires_at = %bundle.expires_at, "stored bundle expired, discarding");
            self.backend.delete(TOKEN_KEY)?;
            return Ok(None);
        }
        Ok(Some(bundle))
    }

    /// The stored bundle without expiry enforcement. The refresh flow
    /// reads its refresh token out of an already-expired bundle.
    pub fn peek_bundle(&self) -> Result<Option<TokenBundle>, AuthError> {
        match self.read_bundle()? {
            ReadOutcome::Present(bundle) => Ok(Some(bundle)),
            _ => Ok(None),
        }
    }

    /// Expiry diagnostics for the stored bundle. Pure read: an expired
    /// record is reported, not deleted.
    pub fn expiration_info(&self) -> Result<Option<TokenExpiration>, AuthError> {
        Ok(self.peek_bundle()?.map(|bundle| TokenExpiration::of(&bundle)))
    }

    /// Debug aggregate over the stored bundle, with token material
    /// masked. Pure read.
    pub fn token_info(&self) -> Result<TokenInfo, AuthError> {
        Ok(self
            .peek_bundle()?
            .map(|bundle| TokenInfo::of(&bundle))
            .unwrap_or_else(TokenInfo::absent))
    }

    pub fn save_user(&self, user: &UserProfile) -> Result<(), AuthError> {
        let serialized = serde_json::to_string(user)?;
        self.backend.set(USER_KEY, &serialized)?;
        Ok(())
    }

    /// The cached profile, if any. Corruption reads as absent.
    pub fn load_user(&self) -> Result<Option<UserProfile>, AuthError> {
        let raw = match self.backend.get(USER_KEY)? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(err) => {
                warn!(error = %err, "cached profile unreadable, treating as absent");
                Ok(None)
            }
        }
    }

    /// Remove the token bundle and the cached profile together.
    pub fn clear(&self) -> Result<(), AuthError> {
        self.backend.delete(TOKEN_KEY)?;
        self.backend.delete(USER_KEY)?;
        debug!("cleared stored auth state");
        Ok(())
    }

    fn read_bundle(&self) -> Result<ReadOutcome, AuthError> {
        let raw = match self.backend.get(TOKEN_KEY)? {
            Some(raw) => raw,
            None => return Ok(ReadOutcome::Missing),
        };
        match serde_json::from_str(&raw) {
            Ok(bundle) => Ok(ReadOutcome::Present(bundle)),
            Err(err) => {
                warn!(error = %err, "stored token bundle unreadable");
                Ok(ReadOutcome::Corrupt)
            }
        }
    }
}

enum ReadOutcome {
    Missing,
    Corrupt,
    Present(TokenBundle),
}
