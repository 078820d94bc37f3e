//! Ask questions about a YouTube video or an uploaded video file and get a
//! Gemini-generated answer grounded in the video and a web search.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use video_assistant::{Assistant, Config, GeminiClient, Orchestrator, Stager, VideoTeam};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! let client = Arc::new(GeminiClient::new(&config)?);
//! let assistant = Assistant::new(
//!     Stager::new(client.clone(), config.poll),
//!     Orchestrator::new(VideoTeam::gemini(client, &config.model)),
//! );
//! let request = video_assistant::AnalysisRequest::youtube(
//!     "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
//!     "What is this about?",
//! );
//! println!("{}", assistant.process(&request).await?.content);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod error;
pub mod gemini;
pub mod input;
pub mod orchestrator;
pub mod pipeline;
pub mod presenter;
pub mod stager;
pub mod team;
pub mod youtube;

pub use agent::{Agent, AgentError, AgentInput, AgentResponse, AgentTool, GeminiAgent, MediaRef};
pub use config::{Config, PollPolicy};
pub use error::{AssistantError, Result};
pub use gemini::{GeminiClient, GeminiError};
pub use input::{collect, AnalysisRequest, InputError, InputForm, SourceKind};
pub use orchestrator::{build_prompt, AnalysisResult, AnalyzeError, Orchestrator, SourceDescriptor};
pub use pipeline::{Assistant, Outcome};
pub use presenter::{Presenter, TerminalPresenter};
pub use stager::{release, FileService, ProcessingState, RemoteFileHandle, StageError, Stager};
pub use team::VideoTeam;
