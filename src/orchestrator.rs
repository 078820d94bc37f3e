use thiserror::Error;
use tracing::info;

use crate::agent::{Agent, AgentError, AgentInput, MediaRef};
use crate::input::{AnalysisRequest, SourceKind};
use crate::stager::RemoteFileHandle;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("An error occurred during analysis: {0}")]
    AnalysisFailed(#[source] AgentError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub content: String,
}

/// What the prompt says about the video.
#[derive(Debug, Clone, Copy)]
pub enum SourceDescriptor<'a> {
    Url(&'a str),
    Uploaded,
}

pub fn build_prompt(source: SourceDescriptor<'_>, query: &str) -> String {
    let opening = match source {
        SourceDescriptor::Url(url) => format!("Analyze the YouTube video at {url}.\n"),
        SourceDescriptor::Uploaded => "Analyze the uploaded video for content and context.\n".to_string(),
    };
    format!(
        "{opening}Respond to the following query using video insights and supplementary web research:\n\
         {query}\n\n\
         Provide a detailed, user-friendly, and actionable response."
    )
}

/// Created once at startup and shared by every request.
pub struct Orchestrator<A> {
    agent: A,
}

impl<A: Agent> Orchestrator<A> {
    pub fn new(agent: A) -> Self {
        Self { agent }
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub async fn analyze(
        &self,
        request: &AnalysisRequest,
        handle: Option<&RemoteFileHandle>,
    ) -> Result<AnalysisResult, AnalyzeError> {
        let (descriptor, mut media) = match request.kind() {
            SourceKind::YouTubeUrl => (
                SourceDescriptor::Url(request.source()),
                vec![MediaRef::YouTube(request.source().to_string())],
            ),
            SourceKind::LocalFile => (SourceDescriptor::Uploaded, Vec::new()),
        };
        media.extend(handle.cloned().map(MediaRef::File));

        let input = AgentInput {
            prompt: build_prompt(descriptor, request.query()),
            media,
        };
        info!(kind = ?request.kind(), "submitting analysis");
        let response = self
            .agent
            .run(&input)
            .await
            .map_err(AnalyzeError::AnalysisFailed)?;
        Ok(AnalysisResult {
            content: response.content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentResponse;
    use crate::gemini::GeminiError;
    use crate::stager::ProcessingState;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<AgentInput>>,
        fail: bool,
    }

    #[async_trait]
    impl Agent for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        async fn run(&self, input: &AgentInput) -> Result<AgentResponse, AgentError> {
            self.seen.lock().unwrap().push(input.clone());
            if self.fail {
                return Err(AgentError::Backend(GeminiError::MissingUploadUrl));
            }
            Ok(AgentResponse {
                agent: "recording".into(),
                content: "answer".into(),
            })
        }
    }

    #[test]
    fn youtube_prompt_contains_url_and_query() {
        let prompt = build_prompt(
            SourceDescriptor::Url("https://www.youtube.com/watch?v=abc123"),
            "What is this about?",
        );
        assert!(prompt.contains("https://www.youtube.com/watch?v=abc123"));
        assert!(prompt.contains("What is this about?"));
        assert!(prompt.ends_with("Provide a detailed, user-friendly, and actionable response."));
    }

    #[test]
    fn upload_prompt_uses_generic_marker() {
        let prompt = build_prompt(SourceDescriptor::Uploaded, "Who speaks?");
        assert!(prompt.starts_with("Analyze the uploaded video for content and context.\n"));
        assert!(prompt.contains("supplementary web research:\nWho speaks?\n\n"));
    }

    #[tokio::test]
    async fn youtube_request_sends_url_as_media() {
        let orchestrator = Orchestrator::new(Recording::default());
        let request = AnalysisRequest::youtube("https://youtu.be/abc", "why?");
        let result = orchestrator.analyze(&request, None).await.unwrap();
        assert_eq!(result.content, "answer");

        let seen = orchestrator.agent().seen.lock().unwrap();
        assert_eq!(seen[0].media, vec![MediaRef::YouTube("https://youtu.be/abc".into())]);
        assert!(seen[0].prompt.contains("https://youtu.be/abc"));
    }

    #[tokio::test]
    async fn upload_request_sends_handle() {
        let orchestrator = Orchestrator::new(Recording::default());
        let handle = RemoteFileHandle {
            name: "files/a".into(),
            uri: "u".into(),
            mime_type: "video/mp4".into(),
            state: ProcessingState::Ready,
            detail: None,
        };
        let request = AnalysisRequest::local_file("/tmp/clip.mp4", "why?");
        orchestrator.analyze(&request, Some(&handle)).await.unwrap();

        let seen = orchestrator.agent().seen.lock().unwrap();
        assert_eq!(seen[0].media, vec![MediaRef::File(handle)]);
        assert!(!seen[0].prompt.contains("/tmp/clip.mp4"));
    }

    #[tokio::test]
    async fn agent_failure_becomes_analysis_failed() {
        let orchestrator = Orchestrator::new(Recording {
            fail: true,
            ..Recording::default()
        });
        let request = AnalysisRequest::youtube("https://youtu.be/abc", "why?");
        let err = orchestrator.analyze(&request, None).await.unwrap_err();
        assert!(err
            .to_string()
            .starts_with("An error occurred during analysis: upload session"));
    }
}
