use thiserror::Error;

use crate::config::ConfigError;
use crate::gemini::GeminiError;
use crate::input::InputError;
use crate::orchestrator::AnalyzeError;
use crate::stager::StageError;

pub type Result<T, E = AssistantError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("failed to read uploaded video {path}: {source}")]
    ReadUpload {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("An error occurred during analysis: {0}")]
    Stage(#[from] StageError),
    #[error(transparent)]
    Analyze(#[from] AnalyzeError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to initialise Gemini client: {0}")]
    Client(#[from] GeminiError),
}

impl AssistantError {
    /// Recoverable user mistakes are shown as warnings, not errors.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Input(InputError::MissingQuery))
    }
}
