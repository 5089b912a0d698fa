use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::api::http::{error_detail, shared_client};
use crate::config::SheafConfig;

use super::error::AuthError;
use super::store::TokenStore;
use super::token::{TokenBundle, TokenResponse};
use super::user::UserProfile;

/// Drives the sign-in flow end to end: authorization URL, code exchange
/// through the relay, profile fetch, and token refresh.
///
/// The client secret never touches this code; exchange and refresh go
/// through the same-origin relay, which holds the secret server-side.
///
/// # Example
/// ```no_run
/// use sheaf::auth::{AuthOrchestrator, TokenStore};
/// use sheaf::config::SheafConfig;
///
/// let config = SheafConfig::from_env();
/// let auth = AuthOrchestrator::new(config, TokenStore::in_memory());
/// let url = auth.authorization_url()?;
/// println!("open {url} in a browser");
/// # Ok::<(), sheaf::auth::AuthError>(())
/// ```
pub struct AuthOrchestrator {
    client: reqwest::Client,
    config: SheafConfig,
    store: TokenStore,
    refresh_gate: Mutex<()>,
}

impl AuthOrchestrator {
    pub fn new(config: SheafConfig, store: TokenStore) -> Self {
        Self {
            client: shared_client().clone(),
            config,
            store,
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn config(&self) -> &SheafConfig {
        &self.config
    }

    /// Build the provider authorization URL the user is sent to. The
    /// client ID is validated first, so a misconfigured deployment fails
    /// here rather than with an opaque provider page.
    pub fn authorization_url(&self) -> Result<String, AuthError> {
        self.config.validate_client_id()?;
        let redirect_uri = self.config.redirect_uri();
        let url = reqwest::Url::parse_with_params(
            self.config.auth_url(),
            &[
                ("client_id", self.config.client_id()),
                ("redirect_uri", redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", self.config.scopes()),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|err| AuthError::Configuration(format!("invalid authorization URL: {err}")))?;
        Ok(url.to_string())
    }

    /// Exchange an authorization code for a token bundle via the relay.
    ///
    /// Never retried: authorization codes are single-use, so a second
    /// attempt with the same code can only fail.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenBundle, AuthError> {
        let redirect_uri = self.config.redirect_uri();
        debug!(url = %self.config.exchange_url(), "exchanging authorization code");
        let resp = self
            .client
            .post(self.config.exchange_url())
            .json(&ExchangeRequest {
                code,
                redirect_uri: &redirect_uri,
            })
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Exchange {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }
        let payload: TokenResponse = resp.json().await?;
        let bundle = self.store.save_response(payload)?;
        debug!(expires_at = %bundle.expires_at, "authorization code exchanged");
        Ok(bundle)
    }

    /// Fetch the signed-in user's profile from the provider and cache it.
    pub async fn fetch_profile(&self) -> Result<UserProfile, AuthError> {
        let bundle = self
            .store
            .valid_bundle()?
            .ok_or(AuthError::NotAuthenticated)?;
        let resp = self
            .client
            .get(self.config.profile_url())
            .header("Accept", "application/json")
            .header("Authorization", format!("Bearer {}", bundle.access_token))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::ProfileFetch {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }
        let profile: UserProfile = resp.json().await?;
        self.store.save_user(&profile)?;
        Ok(profile)
    }

    /// Refresh the stored bundle through the relay.
    ///
    /// Concurrent callers collapse onto a single network request: the
    /// holder of the gate refreshes, everyone queued behind it re-reads
    /// the store and returns the fresh bundle. Fails with
    /// `NoRefreshToken`, without touching the network, when the stored
    /// record has no refresh token.
    pub async fn refresh(&self) -> Result<TokenBundle, AuthError> {
        let _gate = self.refresh_gate.lock().await;
        // Re-check after acquiring: another caller may have refreshed
        // while we waited.
        if let Some(bundle) = self.store.peek_bundle()? {
            if !bundle.is_expired() {
                debug!("bundle fresh after waiting on refresh gate");
                return Ok(bundle);
            }
        }
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<TokenBundle, AuthError> {
        let refresh_token = self
            .store
            .peek_bundle()?
            .and_then(|bundle| bundle.refresh_token)
            .ok_or(AuthError::NoRefreshToken)?;

        debug!(url = %self.config.refresh_url(), "refreshing token bundle");
        let resp = self
            .client
            .post(self.config.refresh_url())
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::Refresh {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }
        let mut payload: TokenResponse = resp.json().await?;
        // Providers return a refresh token only on first consent; keep
        // the one we already hold when the response omits it.
        if payload.refresh_token.is_none() {
            payload.refresh_token = Some(refresh_token);
        }
        let bundle = self.store.save_response(payload)?;
        debug!(expires_at = %bundle.expires_at, "token bundle refreshed");
        Ok(bundle)
    }

    /// A valid bundle, refreshing when the stored one has expired.
    pub async fn ensure_valid_bundle(&self) -> Result<TokenBundle, AuthError> {
        match self.store.peek_bundle()? {
            Some(bundle) if !bundle.is_expired() => Ok(bundle),
            Some(bundle) if bundle.refresh_token.is_some() => self.refresh().await,
            Some(_) => {
                // Expired with no way back; let the store sweep it.
                self.store.valid_bundle()?;
                Err(AuthError::NotAuthenticated)
            }
            None => Err(AuthError::NotAuthenticated),
        }
    }
}

#[derive(Serialize)]
struct ExchangeRequest<'a> {
    code: &'a str,
    redirect_uri: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}
