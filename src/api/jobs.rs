//! Status polling for asynchronous processing jobs.

use std::time::Duration;

use bon::Builder;
use futures::stream::BoxStream;
use reqwest::Method;
use serde::Deserialize;
use strum::{Display, EnumString};
use tracing::debug;

use crate::error::{Result, SheafError};

use super::{ApiClient, CallOptions};

/// Lifecycle state reported by the status endpoint.
///
/// Unknown values are carried verbatim and treated as still running;
/// the service may introduce intermediate states at any time.
#[derive(Debug, Clone, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum JobState {
    Queued,
    Processing,
    Completed,
    Failed,
    #[strum(default)]
    Other(String),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// One observation of a processing job.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatus {
    pub status: String,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl JobStatus {
    pub fn state(&self) -> JobState {
        self.status
            .parse()
            .unwrap_or_else(|_| JobState::Other(self.status.clone()))
    }

    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }
}

/// Polling cadence for [`ApiClient::watch_job`].
#[derive(Debug, Clone, Builder)]
pub struct PollSettings {
    /// Delay between consecutive status checks.
    #[builder(default = 2000)]
    pub interval_ms: u64,
    /// Overall deadline for the job to reach a terminal state.
    #[builder(default = 300)]
    pub timeout_secs: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            timeout_secs: 300,
        }
    }
}

impl ApiClient {
    /// Current status of a processing job.
    pub async fn job_status(&self, job_id: &str) -> Result<JobStatus> {
        let options = CallOptions::builder()
            .query(vec![("jobId".to_string(), job_id.to_string())])
            .build();
        let resp = self.call(Method::GET, "/status", options).await?;
        Ok(resp.json::<JobStatus>().await?)
    }

    /// Poll a job until it reaches a terminal state, yielding every
    /// observation along the way.
    ///
    /// The stream ends after `completed` or `failed`, at the first
    /// error, or with a timeout error once the overall deadline passes.
    pub fn watch_job(
        &self,
        job_id: &str,
        settings: PollSettings,
    ) -> BoxStream<'static, Result<JobStatus>> {
        let client = self.clone();
        let job_id = job_id.to_string();

        let stream = async_stream::stream! {
            let interval = Duration::from_millis(settings.interval_ms);
            let deadline =
                tokio::time::Instant::now() + Duration::from_secs(settings.timeout_secs);

            loop {
                match client.job_status(&job_id).await {
                    Ok(status) => {
                        let done = status.is_terminal();
                        debug!(job_id = %job_id, status = %status.status, "job poll");
                        yield Ok(status);
                        if done {
                            break;
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }

                tokio::time::sleep(interval).await;
                if tokio::time::Instant::now() >= deadline {
                    yield Err(SheafError::Timeout(
                        settings.timeout_secs.saturating_mul(1000),
                    ));
                    break;
                }
            }
        };

        Box::pin(stream)
    }
}
