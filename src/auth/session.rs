use std::sync::{Arc, RwLock};

use strum::Display;
use tracing::{debug, warn};

use super::callback::parse_callback_query;
use super::error::AuthError;
use super::orchestrator::AuthOrchestrator;
use super::token::TokenBundle;
use super::user::UserProfile;

/// Where the sign-in state machine currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum AuthStage {
    Unauthenticated,
    AwaitingCallback,
    Exchanging,
    Authenticated,
    Refreshing,
    Failed,
}

/// Session state reported after initialization.
#[derive(Debug, Clone)]
pub enum AuthState {
    Authenticated { user: UserProfile },
    Unauthenticated,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Pure session facade over the orchestrator and store.
///
/// All I/O decisions (rendering, redirects, exit codes) belong to the
/// caller. `AuthSession` only returns typed results and errors while
/// tracking the stage of the sign-in state machine:
/// unauthenticated → awaiting_callback → exchanging → authenticated
/// (or failed), and authenticated → refreshing → authenticated (or
/// unauthenticated when the refresh is rejected).
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use sheaf::auth::{AuthOrchestrator, AuthSession, TokenStore};
/// use sheaf::config::SheafConfig;
///
/// # async fn run() -> Result<(), sheaf::auth::AuthError> {
/// let auth = Arc::new(AuthOrchestrator::new(
///     SheafConfig::from_env(),
///     TokenStore::in_memory(),
/// ));
/// let session = AuthSession::new(auth);
/// let state = session.initialize().await?;
/// println!("signed in: {}", state.is_authenticated());
/// # Ok(())
/// # }
/// ```
pub struct AuthSession {
    orchestrator: Arc<AuthOrchestrator>,
    stage: RwLock<AuthStage>,
}

impl AuthSession {
    pub fn new(orchestrator: Arc<AuthOrchestrator>) -> Self {
        Self {
            orchestrator,
            stage: RwLock::new(AuthStage::Unauthenticated),
        }
    }

    pub fn stage(&self) -> AuthStage {
        self.stage
            .read()
            .map(|guard| *guard)
            .unwrap_or(AuthStage::Unauthenticated)
    }

    /// Restore the session from storage on cold start.
    ///
    /// With a valid bundle the cached profile is used, or fetched when
    /// missing. With only an expired bundle a refresh is attempted
    /// first. Sign-in failures fold to `Unauthenticated` after clearing
    /// storage; only storage faults surface as errors.
    pub async fn initialize(&self) -> Result<AuthState, AuthError> {
        let store = self.orchestrator.store();

        // Peek here: a destructive read would sweep an expired record
        // and lose the refresh token before the refresh attempt below.
        let stored = store.peek_bundle()?;
        if matches!(&stored, Some(bundle) if !bundle.is_expired()) {
            if let Some(user) = store.load_user()? {
                debug!(email = %user.email, "restored session from storage");
                self.set_stage(AuthStage::Authenticated);
                return Ok(AuthState::Authenticated { user });
            }
            // Valid tokens but no cached profile; fetch one.
            return match self.orchestrator.fetch_profile().await {
                Ok(user) => {
                    self.set_stage(AuthStage::Authenticated);
                    Ok(AuthState::Authenticated { user })
                }
                Err(err) => {
                    warn!(error = %err, "profile fetch failed on restore, signing out");
                    store.clear()?;
                    self.set_stage(AuthStage::Unauthenticated);
                    Ok(AuthState::Unauthenticated)
                }
            };
        }

        // Only an expired record, or nothing, remains; a refresh token
        // may still get us back in.
        match self.orchestrator.refresh().await {
            Ok(_) => match self.orchestrator.fetch_profile().await {
                Ok(user) => {
                    self.set_stage(AuthStage::Authenticated);
                    Ok(AuthState::Authenticated { user })
                }
                Err(err) => {
                    warn!(error = %err, "profile fetch failed after refresh, signing out");
                    store.clear()?;
                    self.set_stage(AuthStage::Unauthenticated);
                    Ok(AuthState::Unauthenticated)
                }
            },
            Err(AuthError::NoRefreshToken) => {
                store.clear()?;
                self.set_stage(AuthStage::Unauthenticated);
                Ok(AuthState::Unauthenticated)
            }
            Err(err) => {
                warn!(error = %err, "refresh failed on restore, signing out");
                store.clear()?;
                self.set_stage(AuthStage::Unauthenticated);
                Ok(AuthState::Unauthenticated)
            }
        }
    }

    /// Start a login: returns the provider authorization URL to send the
    /// user to and moves the machine to `awaiting_callback`.
    pub fn begin_login(&self) -> Result<String, AuthError> {
        let url = self.orchestrator.authorization_url()?;
        self.set_stage(AuthStage::AwaitingCallback);
        Ok(url)
    }

    /// Finish a login from the provider redirect. Takes the callback URL
    /// or query string, exchanges the code, and fetches the profile.
    pub async fn complete_login(&self, callback_query: &str) -> Result<UserProfile, AuthError> {
        let code = match parse_callback_query(callback_query) {
            Ok(code) => code,
            Err(err) => {
                self.set_stage(AuthStage::Failed);
                return Err(err);
            }
        };
        self.set_stage(AuthStage::Exchanging);
        if let Err(err) = self.orchestrator.exchange_code(&code).await {
            self.set_stage(AuthStage::Failed);
            return Err(err);
        }
        match self.orchestrator.fetch_profile().await {
            Ok(user) => {
                self.set_stage(AuthStage::Authenticated);
                Ok(user)
            }
            Err(err) => {
                self.set_stage(AuthStage::Failed);
                Err(err)
            }
        }
    }

    /// Refresh the session's tokens. A rejected refresh signs the
    /// session out.
    pub async fn refresh(&self) -> Result<TokenBundle, AuthError> {
        self.set_stage(AuthStage::Refreshing);
        match self.orchestrator.refresh().await {
            Ok(bundle) => {
                self.set_stage(AuthStage::Authenticated);
                Ok(bundle)
            }
            Err(err) => {
                warn!(error = %err, "refresh failed, signing out");
                self.orchestrator.store().clear()?;
                self.set_stage(AuthStage::Unauthenticated);
                Err(err)
            }
        }
    }

    pub fn logout(&self) -> Result<(), AuthError> {
        self.orchestrator.store().clear()?;
        self.set_stage(AuthStage::Unauthenticated);
        Ok(())
    }

    /// Whether a valid (unexpired) bundle is currently stored.
    pub fn is_authenticated(&self) -> Result<bool, AuthError> {
        Ok(self.orchestrator.store().valid_bundle()?.is_some())
    }

    /// The cached profile, provided the stored bundle is still valid.
    pub fn current_user(&self) -> Result<Option<UserProfile>, AuthError> {
        if self.orchestrator.store().valid_bundle()?.is_none() {
            return Ok(None);
        }
        self.orchestrator.store().load_user()
    }

    fn set_stage(&self, stage: AuthStage) {
        if let Ok(mut guard) = self.stage.write() {
            *guard = stage;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenStore;
    use crate::config::SheafConfig;

    const CLIENT_ID: &str = "1234-abcd.apps.googleusercontent.com";

    fn session_with(client_id: &str) -> AuthSession {
        let config = SheafConfig::new(client_id);
        let orchestrator = Arc::new(AuthOrchestrator::new(config, TokenStore::in_memory()));
        AuthSession::new(orchestrator)
    }

    #[test]
    fn begin_login_moves_to_awaiting_callback() {
        let session = session_with(CLIENT_ID);
        assert_eq!(session.stage(), AuthStage::Unauthenticated);

        let url = session.begin_login().unwrap();
        assert!(url.starts_with("https://accounts.google.com/"));
        assert_eq!(session.stage(), AuthStage::AwaitingCallback);
    }

    #[test]
    fn begin_login_with_bad_config_stays_unauthenticated() {
        let session = session_with("YOUR_GOOGLE_CLIENT_ID");
        assert!(session.begin_login().is_err());
        assert_eq!(session.stage(), AuthStage::Unauthenticated);
    }

    #[tokio::test]
    async fn provider_error_callback_fails_the_flow() {
        let session = session_with(CLIENT_ID);
        session.begin_login().unwrap();

        let err = session
            .complete_login("?error=access_denied")
            .await
            .unwrap_err();
        match err {
            AuthError::Provider { code } => assert_eq!(code, "access_denied"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(session.stage(), AuthStage::Failed);
    }

    #[tokio::test]
    async fn initialize_with_empty_storage_is_unauthenticated() {
        let session = session_with(CLIENT_ID);
        let state = session.initialize().await.unwrap();
        assert!(!state.is_authenticated());
        assert_eq!(session.stage(), AuthStage::Unauthenticated);
        assert!(!session.is_authenticated().unwrap());
    }

    #[tokio::test]
    async fn logout_clears_state() {
        let session = session_with(CLIENT_ID);
        session.logout().unwrap();
        assert_eq!(session.stage(), AuthStage::Unauthenticated);
        assert!(session.current_user().unwrap().is_none());
    }

    #[test]
    fn stages_render_snake_case() {
        assert_eq!(AuthStage::AwaitingCallback.to_string(), "awaiting_callback");
        assert_eq!(AuthStage::Unauthenticated.to_string(), "unauthenticated");
    }
}
