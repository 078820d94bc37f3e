//! Agents: named Gemini configurations that turn a prompt plus media
//! references into generated text.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::gemini::{Content, GeminiClient, GeminiError, GenerateRequest, GoogleSearch, Part, Tool};
use crate::stager::RemoteFileHandle;
use crate::youtube::{self, OEMBED_ENDPOINT};

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Backend(#[from] GeminiError),
    #[error("{agent} returned no text{}", .reason.as_deref().map(|r| format!(" ({r})")).unwrap_or_default())]
    EmptyResponse {
        agent: String,
        reason: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRef {
    YouTube(String),
    File(RemoteFileHandle),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentInput {
    pub prompt: String,
    pub media: Vec<MediaRef>,
}

impl AgentInput {
    pub fn has_file(&self) -> bool {
        self.media.iter().any(|m| matches!(m, MediaRef::File(_)))
    }

    pub fn youtube_urls(&self) -> impl Iterator<Item = &str> {
        self.media.iter().filter_map(|m| match m {
            MediaRef::YouTube(url) => Some(url.as_str()),
            MediaRef::File(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentResponse {
    pub agent: String,
    pub content: String,
}

#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;
    async fn run(&self, input: &AgentInput) -> Result<AgentResponse, AgentError>;
}

#[async_trait]
impl<T: Agent + ?Sized> Agent for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn run(&self, input: &AgentInput) -> Result<AgentResponse, AgentError> {
        (**self).run(input).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentTool {
    /// Gemini's built-in Google Search grounding.
    WebSearch,
    /// Prepend title and channel of YouTube media to the prompt.
    YouTubeMetadata,
}

pub struct GeminiAgent {
    name: String,
    model: String,
    instructions: Vec<String>,
    tools: Vec<AgentTool>,
    markdown: bool,
    client: Arc<GeminiClient>,
    oembed_endpoint: String,
}

impl GeminiAgent {
    pub fn new(name: impl Into<String>, model: impl Into<String>, client: Arc<GeminiClient>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            instructions: Vec::new(),
            tools: Vec::new(),
            markdown: false,
            client,
            oembed_endpoint: OEMBED_ENDPOINT.to_string(),
        }
    }

    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instructions.push(instruction.into());
        self
    }

    pub fn tool(mut self, tool: AgentTool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn markdown(mut self, markdown: bool) -> Self {
        self.markdown = markdown;
        self
    }

    pub fn oembed_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.oembed_endpoint = endpoint.into();
        self
    }

    pub fn tools(&self) -> &[AgentTool] {
        &self.tools
    }

    fn system_instruction(&self) -> Option<Content> {
        let mut lines = self.instructions.clone();
        if self.markdown {
            lines.push("Use markdown to format your answers.".to_string());
        }
        if lines.is_empty() {
            return None;
        }
        Some(Content {
            role: None,
            parts: vec![Part::text(lines.join("\n"))],
        })
    }

    async fn metadata_context(&self, input: &AgentInput) -> Vec<String> {
        let mut context = Vec::new();
        for url in input.youtube_urls() {
            if youtube::video_id(url).is_none() {
                warn!(%url, "not a recognisable YouTube video URL, skipping metadata");
                continue;
            }
            match youtube::fetch_metadata(self.client.http(), &self.oembed_endpoint, url).await {
                Ok(meta) => context.push(meta.context_line()),
                Err(e) => warn!(%url, error = %e, "YouTube metadata lookup failed"),
            }
        }
        context
    }

    pub async fn build_request(&self, input: &AgentInput) -> GenerateRequest {
        let mut parts: Vec<Part> = input
            .media
            .iter()
            .map(|m| match m {
                MediaRef::YouTube(url) => Part::file(url.clone(), None),
                MediaRef::File(handle) => Part::file(handle.uri.clone(), Some(handle.mime_type.clone())),
            })
            .collect();

        let mut prompt = String::new();
        if self.tools.contains(&AgentTool::YouTubeMetadata) {
            for line in self.metadata_context(input).await {
                prompt.push_str(&line);
                prompt.push('\n');
            }
        }
        prompt.push_str(&input.prompt);
        parts.push(Part::text(prompt));

        let tools = if self.tools.contains(&AgentTool::WebSearch) {
            vec![Tool {
                google_search: Some(GoogleSearch {}),
            }]
        } else {
            Vec::new()
        };

        GenerateRequest {
            system_instruction: self.system_instruction(),
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            tools,
        }
    }
}

#[async_trait]
impl Agent for GeminiAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: &AgentInput) -> Result<AgentResponse, AgentError> {
        let request = self.build_request(input).await;
        info!(agent = %self.name, model = %self.model, media = input.media.len(), "running agent");
        let response = self.client.generate_content(&self.model, &request).await?;

        let reason = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.clone())
            .or_else(|| response.candidates.first().and_then(|c| c.finish_reason.clone()));
        let content = response.text().ok_or_else(|| AgentError::EmptyResponse {
            agent: self.name.clone(),
            reason,
        })?;
        debug!(agent = %self.name, chars = content.len(), "agent answered");
        Ok(AgentResponse {
            agent: self.name.clone(),
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::stager::ProcessingState;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> Arc<GeminiClient> {
        let config = Config {
            api_key: Some("k".into()),
            api_base: server.base_url(),
            ..Config::default()
        };
        Arc::new(GeminiClient::new(&config).unwrap())
    }

    fn file_handle() -> RemoteFileHandle {
        RemoteFileHandle {
            name: "files/abc".into(),
            uri: "https://example.test/files/abc".into(),
            mime_type: "video/mp4".into(),
            state: ProcessingState::Ready,
            detail: None,
        }
    }

    #[tokio::test]
    async fn request_carries_media_tools_and_instructions() {
        let server = MockServer::start_async().await;
        let agent = GeminiAgent::new("local", "m", client(&server))
            .instruction("Answer questions about the video.")
            .tool(AgentTool::WebSearch)
            .markdown(true);
        let request = agent
            .build_request(&AgentInput {
                prompt: "what happens?".into(),
                media: vec![MediaRef::File(file_handle())],
            })
            .await;
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(
            body["contents"][0]["parts"][0]["file_data"]["file_uri"],
            "https://example.test/files/abc"
        );
        assert_eq!(body["contents"][0]["parts"][1]["text"], "what happens?");
        assert!(body["tools"][0].get("google_search").is_some());
        let system = body["system_instruction"]["parts"][0]["text"].as_str().unwrap();
        assert!(system.contains("Answer questions about the video."));
        assert!(system.contains("markdown"));
    }

    #[tokio::test]
    async fn youtube_metadata_is_prepended() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/oembed");
            then.status(200)
                .json_body(json!({ "title": "Talk", "author_name": "Chan" }));
        });
        let agent = GeminiAgent::new("yt", "m", client(&server))
            .tool(AgentTool::YouTubeMetadata)
            .oembed_endpoint(server.url("/oembed"));
        let request = agent
            .build_request(&AgentInput {
                prompt: "summarise".into(),
                media: vec![MediaRef::YouTube("https://youtu.be/abc".into())],
            })
            .await;
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body["contents"][0]["parts"][1]["text"],
            "Video title: \"Talk\" by Chan.\nsummarise"
        );
        assert!(body.get("tools").is_none());
        assert!(body["contents"][0]["parts"][0]["file_data"].get("mime_type").is_none());
    }

    #[tokio::test]
    async fn failed_metadata_lookup_is_ignored() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/oembed");
            then.status(500);
        });
        let agent = GeminiAgent::new("yt", "m", client(&server))
            .tool(AgentTool::YouTubeMetadata)
            .oembed_endpoint(server.url("/oembed"));
        let request = agent
            .build_request(&AgentInput {
                prompt: "summarise".into(),
                media: vec![MediaRef::YouTube("https://youtu.be/abc".into())],
            })
            .await;
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["contents"][0]["parts"][1]["text"], "summarise");
    }

    #[tokio::test]
    async fn run_returns_text() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/v1beta/models/m:generateContent");
            then.status(200).json_body(json!({
                "candidates": [{ "content": { "parts": [{ "text": "It is about Rust." }] } }]
            }));
        });
        let agent = GeminiAgent::new("leader", "m", client(&server));
        let response = agent
            .run(&AgentInput {
                prompt: "?".into(),
                media: vec![],
            })
            .await
            .unwrap();
        assert_eq!(response.content, "It is about Rust.");
        assert_eq!(response.agent, "leader");
    }

    #[tokio::test]
    async fn empty_answer_reports_reason() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/v1beta/models/m:generateContent");
            then.status(200)
                .json_body(json!({ "promptFeedback": { "blockReason": "SAFETY" } }));
        });
        let agent = GeminiAgent::new("leader", "m", client(&server));
        let err = agent
            .run(&AgentInput {
                prompt: "?".into(),
                media: vec![],
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "leader returned no text (SAFETY)");
    }
}
