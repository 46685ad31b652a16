//! Resume upload to object storage: `upload(file) -> URL` with byte progress.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::{normalize_base_url, PortalConfig};
use crate::error::FailureKind;
use crate::portal::candidates::AssessmentId;

/// Chunk size for streamed uploads; progress is reported once per chunk.
const UPLOAD_CHUNK_BYTES: usize = 16 * 1024;

/// Resume file picked for a candidate row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ResumeFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Incremental upload progress for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    /// Rounded percentage, 100 for empty files.
    pub fn percent(&self) -> u8 {
        if self.total_bytes == 0 {
            return 100;
        }
        let pct = (self.bytes_transferred as f64 / self.total_bytes as f64 * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }
}

/// Callback receiving upload progress.
pub type ProgressSink = Arc<dyn Fn(UploadProgress) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("resume upload failed: {0}")]
    Transport(String),
    #[error("resume store rejected the upload ({status})")]
    Rejected { status: u16 },
    #[error("resume store returned an unreadable response: {0}")]
    MalformedResponse(String),
    #[error("resume store misconfigured: {0}")]
    Configuration(String),
}

impl StorageError {
    pub fn kind(&self) -> FailureKind {
        match self {
            StorageError::Transport(_) => FailureKind::Transport,
            StorageError::Rejected { .. } => FailureKind::ServerRejected,
            StorageError::MalformedResponse(_) => FailureKind::MalformedResponse,
            StorageError::Configuration(_) => FailureKind::Configuration,
        }
    }
}

/// Object path for a resume: namespaced by assessment, randomized file name.
pub fn resume_object_path(assessment_id: &AssessmentId, file_name: &str) -> String {
    let token = uuid::Uuid::new_v4().simple().to_string();
    let safe_name: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("resumes/{}/{}_{}", assessment_id, &token[..7], safe_name)
}

/// Object storage seam used by candidate intake.
#[async_trait]
pub trait ResumeStorage: Send + Sync {
    /// Upload `file` to `object_path`, returning a stable retrievable URL.
    async fn upload(
        &self,
        object_path: &str,
        file: &ResumeFile,
        progress: ProgressSink,
    ) -> Result<String, StorageError>;
}

#[derive(Debug, Deserialize)]
struct UploadReceipt {
    url: String,
}

/// Uploads resumes with `PUT {base}/{object_path}` and reads `{"url": ...}` back.
#[derive(Debug, Clone)]
pub struct HttpResumeStorage {
    client: Client,
    base_url: String,
}

impl HttpResumeStorage {
    pub fn new(config: &PortalConfig) -> Result<Self, StorageError> {
        Self::with_base_url(&config.storage_base_url, config.request_timeout)
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, StorageError> {
        let base_url = normalize_base_url(base_url).ok_or_else(|| {
            StorageError::Configuration(format!("'{base_url}' is not an http(s) base URL"))
        })?;
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|err| {
                StorageError::Configuration(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self { client, base_url })
    }
}

#[async_trait]
impl ResumeStorage for HttpResumeStorage {
    async fn upload(
        &self,
        object_path: &str,
        file: &ResumeFile,
        progress: ProgressSink,
    ) -> Result<String, StorageError> {
        let total_bytes = file.size();
        let chunks: Vec<Vec<u8>> = file
            .bytes
            .chunks(UPLOAD_CHUNK_BYTES)
            .map(<[u8]>::to_vec)
            .collect();

        let mut transferred = 0u64;
        let stream = futures_util::stream::iter(chunks.into_iter().map(move |chunk| {
            transferred += chunk.len() as u64;
            progress(UploadProgress {
                bytes_transferred: transferred,
                total_bytes,
            });
            Ok::<_, std::io::Error>(chunk)
        }));

        let url = format!("{}/{}", self.base_url, object_path.trim_start_matches('/'));
        debug!(%url, total_bytes, "uploading resume");

        let response = self
            .client
            .put(&url)
            .header(reqwest::header::CONTENT_LENGTH, total_bytes)
            .body(reqwest::Body::wrap_stream(stream))
            .send()
            .await
            .map_err(|err| StorageError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Rejected {
                status: status.as_u16(),
            });
        }

        let receipt: UploadReceipt = response
            .json()
            .await
            .map_err(|err| StorageError::MalformedResponse(err.to_string()))?;
        Ok(receipt.url)
    }
}
