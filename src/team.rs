//! The assistant team: a leader plus one member per source kind.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::agent::{Agent, AgentError, AgentInput, AgentResponse, AgentTool, GeminiAgent};
use crate::gemini::GeminiClient;

pub const LEADER_NAME: &str = "AI Video Assistant";
pub const YOUTUBE_AGENT_NAME: &str = "Youtube Link Handling Agent";
pub const LOCAL_AGENT_NAME: &str = "Local Video Handling Agent";

/// Routes each input to exactly one agent: uploaded files go to `local`,
/// YouTube URLs to `youtube`, everything else to `leader`.
pub struct VideoTeam<A = GeminiAgent> {
    leader: A,
    youtube: A,
    local: A,
}

impl<A: Agent> VideoTeam<A> {
    pub fn new(leader: A, youtube: A, local: A) -> Self {
        Self {
            leader,
            youtube,
            local,
        }
    }

    pub fn route(&self, input: &AgentInput) -> &A {
        if input.has_file() {
            &self.local
        } else if input.youtube_urls().next().is_some() {
            &self.youtube
        } else {
            &self.leader
        }
    }
}

impl VideoTeam<GeminiAgent> {
    /// Build the three Gemini agents sharing one client.
    pub fn gemini(client: Arc<GeminiClient>, model: &str) -> Self {
        let youtube = GeminiAgent::new(YOUTUBE_AGENT_NAME, model, client.clone())
            .instruction(
                "You are a YouTube agent. Obtain the captions of a YouTube video and answer questions.",
            )
            .tool(AgentTool::YouTubeMetadata)
            .tool(AgentTool::WebSearch)
            .markdown(true);
        let local = GeminiAgent::new(LOCAL_AGENT_NAME, model, client.clone())
            .tool(AgentTool::WebSearch)
            .markdown(true);
        let leader = GeminiAgent::new(LEADER_NAME, model, client).markdown(true);
        Self::new(leader, youtube, local)
    }
}

#[async_trait]
impl<A: Agent> Agent for VideoTeam<A> {
    fn name(&self) -> &str {
        self.leader.name()
    }

    async fn run(&self, input: &AgentInput) -> Result<AgentResponse, AgentError> {
        let member = self.route(input);
        debug!(member = member.name(), "team routed request");
        member.run(input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::MediaRef;
    use crate::config::Config;
    use crate::stager::{ProcessingState, RemoteFileHandle};

    struct Named(&'static str);

    #[async_trait]
    impl Agent for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn run(&self, input: &AgentInput) -> Result<AgentResponse, AgentError> {
            Ok(AgentResponse {
                agent: self.0.to_string(),
                content: input.prompt.clone(),
            })
        }
    }

    fn team() -> VideoTeam<Named> {
        VideoTeam::new(Named("leader"), Named("youtube"), Named("local"))
    }

    fn input(media: Vec<MediaRef>) -> AgentInput {
        AgentInput {
            prompt: "p".into(),
            media,
        }
    }

    #[tokio::test]
    async fn routes_by_media() {
        let team = team();
        let file = MediaRef::File(RemoteFileHandle {
            name: "files/a".into(),
            uri: "u".into(),
            mime_type: "video/mp4".into(),
            state: ProcessingState::Ready,
            detail: None,
        });

        let yt = team
            .run(&input(vec![MediaRef::YouTube("https://youtu.be/a".into())]))
            .await
            .unwrap();
        assert_eq!(yt.agent, "youtube");
        assert_eq!(team.run(&input(vec![file])).await.unwrap().agent, "local");
        assert_eq!(team.run(&input(vec![])).await.unwrap().agent, "leader");
        assert_eq!(team.name(), "leader");
    }

    #[test]
    fn gemini_team_members_carry_tools() {
        let client = Arc::new(GeminiClient::new(&Config::default()).unwrap());
        let team = VideoTeam::gemini(client, "gemini-test");
        assert_eq!(team.name(), LEADER_NAME);
        assert_eq!(team.youtube.name(), YOUTUBE_AGENT_NAME);
        assert!(team.youtube.tools().contains(&AgentTool::YouTubeMetadata));
        assert_eq!(team.local.tools(), &[AgentTool::WebSearch]);
        assert!(team.leader.tools().is_empty());
    }
}
