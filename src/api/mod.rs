//! Authenticated access to the document service.

pub mod audience;
pub mod http;
pub mod jobs;
pub mod upload;

pub use audience::AudienceExchanger;
pub use jobs::{JobState, JobStatus, PollSettings};
pub use upload::{FilePart, UploadOutcome};

use std::sync::Arc;

use bon::Builder;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use tracing::warn;

use crate::auth::AuthOrchestrator;
use crate::error::{Result, SheafError};

use self::http::{error_detail, shared_client, status_to_error};
use self::upload::build_form;

/// Request body that can be rebuilt for a resend.
#[derive(Debug, Clone, Default)]
pub enum ApiBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Files(Vec<FilePart>),
}

/// Per-call options.
#[derive(Debug, Clone, Builder, Default)]
pub struct CallOptions {
    pub headers: Option<HeaderMap>,
    pub query: Option<Vec<(String, String)>>,
    pub body: Option<ApiBody>,
}

/// Authenticated client for the document service.
///
/// Every call rides a freshly minted audience token. A 401 from the
/// service triggers exactly one re-mint and resend; a second 401
/// surfaces as an authentication error with no third attempt.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
/// use sheaf::api::{ApiClient, FilePart};
/// use sheaf::auth::{AuthOrchestrator, TokenStore};
/// use sheaf::config::SheafConfig;
///
/// # async fn run() -> sheaf::error::Result<()> {
/// let auth = Arc::new(AuthOrchestrator::new(
///     SheafConfig::from_env(),
///     TokenStore::in_memory(),
/// ));
/// let client = ApiClient::new(auth);
/// let outcome = client
///     .upload_documents(vec![FilePart::new("scan.pdf", vec![0u8; 4], "application/pdf")])
///     .await?;
/// if let Some(job_id) = outcome.job_id() {
///     println!("queued as {job_id}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    orchestrator: Arc<AuthOrchestrator>,
    exchanger: AudienceExchanger,
}

impl ApiClient {
    pub fn new(orchestrator: Arc<AuthOrchestrator>) -> Self {
        let config = orchestrator.config().clone();
        let store = orchestrator.store().clone();
        Self {
            client: shared_client().clone(),
            orchestrator,
            exchanger: AudienceExchanger::new(config, store),
        }
    }

    /// Headers for a downstream call. The audience token is applied
    /// last, so it always wins over a caller-supplied Authorization
    /// header.
    pub fn build_headers(&self, audience_token: &str, extra: Option<&HeaderMap>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(extra) = extra {
            for (name, value) in extra {
                headers.insert(name.clone(), value.clone());
            }
        }
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {audience_token}")) {
            headers.insert(AUTHORIZATION, value);
        }
        headers
    }

    /// Send an authenticated request to the service.
    ///
    /// Ensures the stored bundle is valid (refreshing it when needed),
    /// mints an audience token, and sends. On a 401 the token is minted
    /// once more and the request resent; a second 401 means the service
    /// rejects even fresh tokens, which no further resend can fix.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        options: CallOptions,
    ) -> Result<reqwest::Response> {
        self.orchestrator.ensure_valid_bundle().await?;
        let audience = self.orchestrator.config().audience();
        let token = self.exchanger.audience_token(&audience).await?;

        let first = self.send_once(&method, path, &options, &token).await?;
        if first.status().as_u16() != 401 {
            return check_status(first).await;
        }

        warn!(path, "service returned 401, re-minting audience token");
        let token = self.exchanger.audience_token(&audience).await?;
        let second = self.send_once(&method, path, &options, &token).await?;
        if second.status().as_u16() == 401 {
            let body = second.text().await.unwrap_or_default();
            return Err(SheafError::Authentication(format!(
                "service rejected a freshly minted audience token: {}",
                error_detail(&body)
            )));
        }
        check_status(second).await
    }

    async fn send_once(
        &self,
        method: &Method,
        path: &str,
        options: &CallOptions,
        audience_token: &str,
    ) -> Result<reqwest::Response> {
        let url = join_path(&self.orchestrator.config().api_url(), path);
        let headers = self.build_headers(audience_token, options.headers.as_ref());

        let mut request = self.client.request(method.clone(), url).headers(headers);
        if let Some(query) = &options.query {
            request = request.query(query);
        }
        match options.body.as_ref().unwrap_or(&ApiBody::Empty) {
            ApiBody::Empty => {}
            ApiBody::Json(value) => {
                request = request.json(value);
            }
            ApiBody::Files(parts) => {
                request = request.multipart(build_form(parts)?);
            }
        }
        Ok(request.send().await?)
    }
}

fn join_path(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(status_to_error(status.as_u16(), &body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenStore;
    use crate::config::SheafConfig;

    fn api_client() -> ApiClient {
        let config = SheafConfig::new("1234-abcd.apps.googleusercontent.com");
        let orchestrator = Arc::new(AuthOrchestrator::new(config, TokenStore::in_memory()));
        ApiClient::new(orchestrator)
    }

    #[test]
    fn audience_token_wins_over_caller_authorization() {
        let client = api_client();
        let mut extra = HeaderMap::new();
        extra.insert(AUTHORIZATION, HeaderValue::from_static("Bearer caller"));
        extra.insert("x-request-id", HeaderValue::from_static("abc"));

        let headers = client.build_headers("minted", Some(&extra));
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer minted");
        assert_eq!(headers.get("x-request-id").unwrap(), "abc");
    }

    #[test]
    fn join_path_handles_slashes() {
        assert_eq!(join_path("http://x/api", "/status"), "http://x/api/status");
        assert_eq!(join_path("http://x/api", "status"), "http://x/api/status");
    }
}
