use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use futures::{Stream, StreamExt, TryStreamExt};
use reqwest::{Client, Response};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

use super::models::{AuthErrorBody, SupabaseConfig};
use crate::application::{ProgressCallback, TransferService};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Request failed ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Turns a non-2xx response into [`ApiError::Status`], keeping the server's
/// own message when it sends one.
pub(crate) async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<AuthErrorBody>(&body)
        .ok()
        .and_then(AuthErrorBody::into_message)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_string()
            } else {
                body
            }
        });

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Whole percent downloaded, when the total size is known.
fn percent_of(downloaded: u64, total: Option<u64>) -> Option<u8> {
    match total {
        Some(total) if total > 0 => Some((downloaded.saturating_mul(100) / total).min(100) as u8),
        _ => None,
    }
}

/// Downloads objects from the storage bucket into a local folder.
#[derive(Clone)]
pub struct StorageClient {
    config: SupabaseConfig,
    http: Client,
    access_token: Option<String>,
    download_dir: Arc<RwLock<PathBuf>>,
}

impl StorageClient {
    pub fn new(config: SupabaseConfig) -> Self {
        let download_dir = Arc::new(RwLock::new(config.download_dir.clone()));
        Self {
            config,
            http: Client::new(),
            access_token: None,
            download_dir,
        }
    }

    /// Authorize requests as the signed-in user instead of the anonymous key.
    pub fn with_access_token(mut self, access_token: impl Into<String>) -> Self {
        self.access_token = Some(access_token.into());
        self
    }

    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_download_dir(&self, dir: PathBuf) {
        *self
            .download_dir
            .write()
            .unwrap_or_else(PoisonError::into_inner) = dir;
    }

    /// `{url}/storage/v1/object/{bucket}/{remote_path}` with each segment escaped.
    pub fn object_url(&self, remote_path: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.url)?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(["storage", "v1", "object", self.config.media_bucket.as_str()])
            .extend(remote_path.split('/').filter(|segment| !segment.is_empty()));
        Ok(url)
    }

    /// Returns (total_size, stream)
    pub async fn download_file_stream(
        &self,
        remote_path: &str,
    ) -> Result<(Option<u64>, impl Stream<Item = Result<bytes::Bytes>>)> {
        let url = self.object_url(remote_path)?;
        let token = self
            .access_token
            .as_deref()
            .unwrap_or(self.config.anon_key.as_str());

        let response = self
            .http
            .get(url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let total_size = response.content_length();
        let stream = response.bytes_stream().map_err(ApiError::RequestError);

        Ok((total_size, stream))
    }

    async fn save_object(
        &self,
        remote_path: &str,
        filename: &str,
        on_progress: ProgressCallback,
    ) -> Result<PathBuf> {
        let (total, stream) = self.download_file_stream(remote_path).await?;

        let dir = self.download_dir();
        tokio::fs::create_dir_all(&dir).await?;

        let mut partial = PartialFile::new(dir.join(filename));
        write_stream(&partial.path, total, stream, &on_progress).await?;
        Ok(partial.keep())
    }
}

/// Removes a file that was not fully written, including when the download
/// future is dropped or aborted mid-stream.
struct PartialFile {
    path: PathBuf,
    done: bool,
}

impl PartialFile {
    fn new(path: PathBuf) -> Self {
        Self { path, done: false }
    }

    fn keep(&mut self) -> PathBuf {
        self.done = true;
        self.path.clone()
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "partial download removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), "could not remove partial download: {}", e),
        }
    }
}

async fn write_stream(
    path: &Path,
    total: Option<u64>,
    stream: impl Stream<Item = Result<bytes::Bytes>>,
    on_progress: &ProgressCallback,
) -> Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = std::pin::pin!(stream);
    let mut downloaded: u64 = 0;
    let mut last_percent = None;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;

        if let Some(percent) = percent_of(downloaded, total) {
            if last_percent != Some(percent) {
                on_progress(percent);
                last_percent = Some(percent);
            }
        }
    }

    file.sync_all().await?;
    debug!(path = %path.display(), bytes = downloaded, "object written");
    Ok(())
}

impl TransferService for StorageClient {
    type Error = ApiError;

    fn download_audio_file(
        &self,
        remote_path: &str,
        filename: &str,
        on_progress: ProgressCallback,
    ) -> impl Future<Output = Result<PathBuf>> + Send {
        self.save_object(remote_path, filename, on_progress)
    }
}
