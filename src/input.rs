//! Turns what the user typed into an [`AnalysisRequest`].

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Video containers accepted for upload.
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["mp4", "mov", "avi"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Please provide a query to analyze the video")]
    MissingQuery,
    #[error("unsupported video format {0:?} (expected one of mp4, mov, avi)")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    YouTubeUrl,
    LocalFile,
}

/// Raw form contents. Blank strings count as not provided.
#[derive(Debug, Clone, Default)]
pub struct InputForm {
    pub url: Option<String>,
    pub file: Option<PathBuf>,
    pub query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    kind: SourceKind,
    source: String,
    query: String,
}

impl AnalysisRequest {
    pub fn youtube(url: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::YouTubeUrl,
            source: url.into(),
            query: query.into(),
        }
    }

    pub fn local_file(path: impl AsRef<Path>, query: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::LocalFile,
            source: path.as_ref().to_string_lossy().into_owned(),
            query: query.into(),
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// The URL or the local file path, depending on [`Self::kind`].
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

fn provided(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Lowercased extension if it is one of [`ALLOWED_EXTENSIONS`].
pub fn video_extension(path: &Path) -> Result<String, InputError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(InputError::UnsupportedFormat(path.display().to_string()))
    }
}

/// `Ok(None)` when no source was given. The URL wins if both are filled in.
pub fn collect(form: &InputForm) -> Result<Option<AnalysisRequest>, InputError> {
    let file = form
        .file
        .as_deref()
        .filter(|p| !p.as_os_str().is_empty());

    let query = || provided(&form.query).ok_or(InputError::MissingQuery);

    if let Some(url) = provided(&form.url) {
        return Ok(Some(AnalysisRequest::youtube(url.trim(), query()?)));
    }
    match file {
        Some(path) => {
            let query = query()?;
            video_extension(path)?;
            Ok(Some(AnalysisRequest::local_file(path, query)))
        }
        None => Ok(None),
    }
}

/// Interactive mode takes one free-form source line.
pub fn form_from_source(source: &str, query: Option<String>) -> InputForm {
    let source = source.trim();
    let is_url = url::Url::parse(source)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false);
    if is_url {
        InputForm {
            url: Some(source.to_string()),
            file: None,
            query,
        }
    } else {
        InputForm {
            url: None,
            file: Some(PathBuf::from(source)),
            query,
        }
    }
}
