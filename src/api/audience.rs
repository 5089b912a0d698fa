use serde::Deserialize;
use tracing::debug;

use crate::auth::{AuthError, TokenStore};
use crate::config::SheafConfig;

use super::http::{error_detail, shared_client};

/// Mints audience-scoped tokens for the document service.
///
/// Presents the stored id_token to the relay, which answers with a
/// short-lived token accepted by the target audience. Tokens are minted
/// fresh on every call; nothing is cached, and an upstream key rotation
/// takes effect on the next request.
#[derive(Debug, Clone)]
pub struct AudienceExchanger {
    client: reqwest::Client,
    config: SheafConfig,
    store: TokenStore,
}

impl AudienceExchanger {
    pub fn new(config: SheafConfig, store: TokenStore) -> Self {
        Self {
            client: shared_client().clone(),
            config,
            store,
        }
    }

    /// Mint a token scoped to `audience`. Requires a valid (unexpired)
    /// stored bundle; fails with `NotAuthenticated` before any network
    /// activity otherwise.
    pub async fn audience_token(&self, audience: &str) -> Result<String, AuthError> {
        let bundle = self
            .store
            .valid_bundle()?
            .ok_or(AuthError::NotAuthenticated)?;

        debug!(audience, "minting audience token");
        let resp = self
            .client
            .get(self.config.audience_token_url())
            .query(&[("audience", audience)])
            .header("Accept", "application/json")
            .header("Authorization", format!("Bearer {}", bundle.id_token))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AuthError::TokenMint {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }
        let payload: AudienceTokenResponse = resp.json().await?;
        match payload.token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(AuthError::TokenMint {
                status: status.as_u16(),
                detail: "response missing token field".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AudienceTokenResponse {
    token: Option<String>,
}
