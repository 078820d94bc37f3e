use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use video_assistant::input::{self, InputForm};
use video_assistant::{
    Assistant, Config, GeminiClient, Orchestrator, Outcome, Presenter, Stager, TerminalPresenter,
    VideoTeam,
};

/// Ask questions about a YouTube video or a local video file using Gemini
#[derive(Parser)]
#[command(name = "video-assistant")]
#[command(about = "Analyze YouTube or uploaded videos with Gemini and web search", long_about = None)]
struct Cli {
    /// Gemini model used by every agent (overrides VIDEO_ASSISTANT_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Give up waiting for remote video processing after this many seconds
    #[arg(long, global = true)]
    max_wait_secs: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a YouTube video by URL
    Youtube {
        /// YouTube video URL, e.g. https://www.youtube.com/watch?v=VIDEO_ID
        #[arg(short, long)]
        url: String,
        /// What insights are you seeking from this YouTube video?
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Upload a local video (mp4, mov, avi) and analyze it
    Upload {
        /// Path to the video file
        #[arg(short, long)]
        file: PathBuf,
        /// What insights are you seeking from this video?
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Prompt for a source and a query on stdin, repeatedly
    Interactive,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "video_assistant=debug"
    } else {
        "video_assistant=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn prompt_line(
    lines: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>,
    label: &str,
) -> Result<Option<String>> {
    let mut stderr = tokio::io::stderr();
    stderr.write_all(label.as_bytes()).await?;
    stderr.flush().await?;
    Ok(lines.next_line().await?)
}

async fn interactive<S, A>(assistant: &Assistant<S, A>, presenter: &mut dyn Presenter) -> Result<()>
where
    S: video_assistant::FileService,
    A: video_assistant::Agent,
{
    presenter.present_info(video_assistant::pipeline::START_HINT);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let source = match prompt_line(&mut lines, "\nYouTube URL or video file (blank to quit): ").await? {
            Some(line) if !line.trim().is_empty() => line,
            _ => break,
        };
        let query = prompt_line(&mut lines, "What insights are you seeking from this video? ").await?;
        let form = input::form_from_source(&source, query);
        assistant.handle(&form, presenter).await;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(secs) = cli.max_wait_secs {
        config.poll.max_wait = Duration::from_secs(secs);
    }
    if config.api_key.is_none() {
        warn!("GOOGLE_API_KEY is not set; Gemini requests will be rejected");
    }

    let client = Arc::new(GeminiClient::new(&config).context("Failed to build HTTP client")?);
    let assistant = Assistant::new(
        Stager::new(client.clone(), config.poll),
        Orchestrator::new(VideoTeam::gemini(client, &config.model)),
    );
    info!(model = %config.model, "video assistant ready");

    let mut presenter = TerminalPresenter::stdio();
    let form = match cli.command {
        Commands::Youtube { url, query } => InputForm {
            url: Some(url),
            file: None,
            query,
        },
        Commands::Upload { file, query } => InputForm {
            url: None,
            file: Some(file),
            query,
        },
        Commands::Interactive => {
            interactive(&assistant, &mut presenter).await?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    // The presenter has already reported a failure; only the exit code is left.
    match assistant.handle(&form, &mut presenter).await {
        Outcome::Failed(_) => Ok(ExitCode::FAILURE),
        Outcome::Analyzed(_) | Outcome::Warned(_) | Outcome::NoInput => Ok(ExitCode::SUCCESS),
    }
}
