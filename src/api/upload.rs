//! Document upload over multipart form data.

use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, SheafError};

use super::{ApiBody, ApiClient, CallOptions};

/// One file in an upload batch.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl FilePart {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
            mime: mime.into(),
        }
    }
}

/// Service answer to an upload: a queued job for large batches, or the
/// processed payload directly for small ones.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UploadOutcome {
    Queued(QueuedJob),
    Completed(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueuedJob {
    #[serde(rename = "jobId")]
    pub job_id: String,
}

impl UploadOutcome {
    /// Job id to poll, when the service queued the batch.
    pub fn job_id(&self) -> Option<&str> {
        match self {
            Self::Queued(job) => Some(&job.job_id),
            Self::Completed(_) => None,
        }
    }
}

/// Form parts are named `file_0`, `file_1`, ... in batch order. The
/// form is rebuilt from the retained bytes on every send.
pub(crate) fn build_form(parts: &[FilePart]) -> Result<Form> {
    let mut form = Form::new();
    for (index, file) in parts.iter().enumerate() {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.filename.clone())
            .mime_str(&file.mime)
            .map_err(|_| {
                SheafError::InvalidArgument(format!("invalid MIME type: {}", file.mime))
            })?;
        form = form.part(format!("file_{index}"), part);
    }
    Ok(form)
}

impl ApiClient {
    /// Upload a batch of documents for processing.
    pub async fn upload_documents(&self, files: Vec<FilePart>) -> Result<UploadOutcome> {
        if files.is_empty() {
            return Err(SheafError::InvalidArgument(
                "upload batch is empty".to_string(),
            ));
        }
        debug!(count = files.len(), "uploading documents");
        let options = CallOptions::builder().body(ApiBody::Files(files)).build();
        let resp = self.call(Method::POST, "/upload-process", options).await?;
        Ok(resp.json::<UploadOutcome>().await?)
    }
}
