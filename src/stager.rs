//! Local-upload path: copy the upload to a temp file, push it to the remote
//! File API and wait until the remote side is done processing it.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::PollPolicy;
use crate::gemini::{FileInfo, GeminiClient, GeminiError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingState {
    Processing,
    Ready,
    Failed,
}

impl ProcessingState {
    /// Unknown states (e.g. `STATE_UNSPECIFIED`) keep us polling.
    pub fn from_remote(state: &str) -> Self {
        match state {
            "ACTIVE" => Self::Ready,
            "FAILED" => Self::Failed,
            _ => Self::Processing,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileHandle {
    pub name: String,
    pub uri: String,
    pub mime_type: String,
    pub state: ProcessingState,
    /// Remote failure reason, when the backend gives one.
    pub detail: Option<String>,
}

impl From<FileInfo> for RemoteFileHandle {
    fn from(info: FileInfo) -> Self {
        Self {
            state: ProcessingState::from_remote(&info.state),
            detail: info.error.map(|e| e.message).filter(|m| !m.is_empty()),
            name: info.name,
            uri: info.uri,
            mime_type: info.mime_type,
        }
    }
}

#[derive(Debug, Error)]
pub enum StageError {
    #[error("failed to write temporary video file: {0}")]
    TempFile(#[from] io::Error),
    #[error("remote file service error: {0}")]
    Remote(#[from] GeminiError),
    #[error("remote processing of {name} failed{}", .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    RemoteProcessingFailed { name: String, detail: Option<String> },
    #[error("remote processing of {name} did not finish within {waited:?}")]
    ProcessingTimeout { name: String, waited: Duration },
}

/// Remote endpoint that accepts files and reports their processing state.
#[async_trait]
pub trait FileService: Send + Sync {
    /// `path` is the staged local copy of `bytes`; `bytes` is handed over so
    /// the video is never read back from disk.
    async fn upload(
        &self,
        path: &Path,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<RemoteFileHandle, StageError>;
    async fn refresh(&self, name: &str) -> Result<RemoteFileHandle, StageError>;
}

#[async_trait]
impl FileService for GeminiClient {
    async fn upload(
        &self,
        path: &Path,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<RemoteFileHandle, StageError> {
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        Ok(self.upload_file(bytes, mime_type, &display_name).await?.into())
    }

    async fn refresh(&self, name: &str) -> Result<RemoteFileHandle, StageError> {
        Ok(self.get_file(name).await?.into())
    }
}

#[async_trait]
impl<T: FileService + ?Sized> FileService for Arc<T> {
    async fn upload(
        &self,
        path: &Path,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> Result<RemoteFileHandle, StageError> {
        (**self).upload(path, bytes, mime_type).await
    }

    async fn refresh(&self, name: &str) -> Result<RemoteFileHandle, StageError> {
        (**self).refresh(name).await
    }
}

pub fn mime_type_for(extension: &str) -> &'static str {
    match extension {
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        _ => "video/mp4",
    }
}

/// Delete `path` if it exists. Missing files are not an error.
pub fn release(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed temporary video");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Owns one temporary file and releases it exactly once: explicitly through
/// [`TempVideo::release`], or on drop.
#[derive(Debug)]
pub struct TempVideo {
    path: PathBuf,
    released: bool,
}

impl TempVideo {
    pub fn create(bytes: &[u8], extension: &str) -> io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("video-assistant-")
            .suffix(&format!(".{extension}"))
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        let (_, path) = file.keep().map_err(|e| e.error)?;
        debug!(path = %path.display(), bytes = bytes.len(), "wrote temporary video");
        Ok(Self {
            path,
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(mut self) -> io::Result<()> {
        self.released = true;
        release(&self.path)
    }
}

impl Drop for TempVideo {
    fn drop(&mut self) {
        if !self.released {
            self.released = true;
            if let Err(e) = release(&self.path) {
                warn!(path = %self.path.display(), error = %e, "failed to remove temporary video");
            }
        }
    }
}

/// A remote file that finished processing, plus the local copy it came from.
#[derive(Debug)]
pub struct StagedVideo {
    pub handle: RemoteFileHandle,
    pub local: TempVideo,
    /// Number of sleeps spent waiting for the remote side.
    pub waits: u32,
}

pub struct Stager<S> {
    service: S,
    poll: PollPolicy,
}

impl<S: FileService> Stager<S> {
    pub fn new(service: S, poll: PollPolicy) -> Self {
        Self { service, poll }
    }

    /// Write `bytes` to a temp file, upload it and wait for `Ready`.
    /// On any error the temp file is already gone when this returns.
    pub async fn stage(&self, bytes: Vec<u8>, extension: &str) -> Result<StagedVideo, StageError> {
        let local = TempVideo::create(&bytes, extension)?;
        let mut handle = self
            .service
            .upload(local.path(), bytes, mime_type_for(extension))
            .await?;
        info!(name = %handle.name, "uploaded video, waiting for processing");

        let mut waits = 0u32;
        let mut waited = Duration::ZERO;
        while handle.state == ProcessingState::Processing {
            if waited >= self.poll.max_wait {
                return Err(StageError::ProcessingTimeout {
                    name: handle.name,
                    waited,
                });
            }
            let interval = self.poll.interval(waits).min(self.poll.max_wait - waited);
            tokio::time::sleep(interval).await;
            waited += interval;
            waits += 1;
            handle = self.service.refresh(&handle.name).await?;
            debug!(name = %handle.name, state = ?handle.state, waits, "polled file state");
        }

        match handle.state {
            ProcessingState::Failed => Err(StageError::RemoteProcessingFailed {
                name: handle.name,
                detail: handle.detail,
            }),
            _ => {
                info!(name = %handle.name, waits, "video ready");
                Ok(StagedVideo {
                    handle,
                    local,
                    waits,
                })
            }
        }
    }
}
