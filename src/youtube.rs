//! YouTube URL helpers and oEmbed metadata lookup.

use serde::Deserialize;
use tracing::debug;

use crate::gemini::GeminiError;

pub const OEMBED_ENDPOINT: &str = "https://www.youtube.com/oembed";

pub fn is_youtube_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == "youtube.com" || host == "youtu.be" || host.ends_with(".youtube.com")
}

/// Extract the video ID from `watch?v=`, `youtu.be/`, `/shorts/` and `/embed/` URLs.
pub fn video_id(raw: &str) -> Option<String> {
    let url = url::Url::parse(raw.trim()).ok()?;
    let host = url.host_str()?;
    if !is_youtube_host(host) {
        return None;
    }

    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let id = if host.eq_ignore_ascii_case("youtu.be") {
        segments.next().map(str::to_string)
    } else if url.path() == "/watch" {
        url.query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned())
    } else {
        match (segments.next(), segments.next()) {
            (Some("shorts" | "embed" | "live"), Some(id)) => Some(id.to_string()),
            _ => None,
        }
    };
    id.filter(|id| !id.trim().is_empty())
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: String,
    pub author_name: String,
}

impl VideoMetadata {
    pub fn context_line(&self) -> String {
        format!("Video title: \"{}\" by {}.", self.title, self.author_name)
    }
}

/// Look up title and channel through the public oEmbed endpoint.
pub async fn fetch_metadata(
    http: &reqwest::Client,
    endpoint: &str,
    video_url: &str,
) -> Result<VideoMetadata, GeminiError> {
    let url = format!(
        "{endpoint}?url={}&format=json",
        urlencoding::encode(video_url)
    );
    debug!(%url, "fetching YouTube oEmbed metadata");
    let response = http.get(&url).send().await?;
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(GeminiError::Status {
            operation: "YouTube oEmbed",
            status,
            body,
        });
    }
    Ok(response.json().await?)
}
