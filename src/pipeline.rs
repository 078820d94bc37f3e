//! One request end to end: collect, stage (uploads only), analyze, present.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::error::{AssistantError, Result};
use crate::input::{self, AnalysisRequest, InputForm, SourceKind};
use crate::orchestrator::{AnalysisResult, Orchestrator};
use crate::presenter::Presenter;
use crate::stager::{FileService, StagedVideo, Stager};

pub const START_HINT: &str = "Enter a YouTube video URL or upload a video file to begin analysis";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    NoInput,
    Warned(String),
    Failed(String),
    Analyzed(AnalysisResult),
}

pub struct Assistant<S, A> {
    stager: Stager<S>,
    orchestrator: Orchestrator<A>,
}

impl<S: FileService, A: Agent> Assistant<S, A> {
    pub fn new(stager: Stager<S>, orchestrator: Orchestrator<A>) -> Self {
        Self {
            stager,
            orchestrator,
        }
    }

    pub async fn process(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        match request.kind() {
            SourceKind::YouTubeUrl => Ok(self.orchestrator.analyze(request, None).await?),
            SourceKind::LocalFile => self.process_upload(request).await,
        }
    }

    async fn process_upload(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        let path = Path::new(request.source());
        let extension = input::video_extension(path)?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| AssistantError::ReadUpload {
                path: request.source().to_string(),
                source,
            })?;

        let StagedVideo { handle, local, .. } = self.stager.stage(bytes, &extension).await?;
        let result = self.orchestrator.analyze(request, Some(&handle)).await;
        if let Err(e) = local.release() {
            warn!(error = %e, "failed to remove temporary video");
        }
        Ok(result?)
    }

    /// Run one form submission and render whatever came out of it.
    pub async fn handle(&self, form: &InputForm, presenter: &mut dyn Presenter) -> Outcome {
        let request = match input::collect(form) {
            Ok(Some(request)) => request,
            Ok(None) => {
                presenter.present_info(START_HINT);
                return Outcome::NoInput;
            }
            Err(e) => return report(AssistantError::from(e), presenter),
        };

        presenter.progress(match request.kind() {
            SourceKind::YouTubeUrl => "Processing YouTube video and gathering insights...",
            SourceKind::LocalFile => "Processing video and gathering insights...",
        });
        match self.process(&request).await {
            Ok(result) => {
                info!(chars = result.content.len(), "analysis complete");
                presenter.present(&result);
                Outcome::Analyzed(result)
            }
            Err(e) => report(e, presenter),
        }
    }
}

fn report(err: AssistantError, presenter: &mut dyn Presenter) -> Outcome {
    let message = err.to_string();
    if err.is_warning() {
        presenter.present_warning(&message);
        Outcome::Warned(message)
    } else {
        debug!(error = %message, "request failed");
        presenter.present_error(&message);
        Outcome::Failed(message)
    }
}
