use super::{ToolFailure, ToolResult};
use crate::ai::TextGenerationService;
use crate::prompts::{self, messages};
use crate::ErrorKind;
use std::sync::Arc;
use tracing::{info, warn};

/// Produces a fresh household photo challenge from a fixed prompt.
///
/// Stateless: every call is one backend round-trip.
pub struct ChallengeTool {
    text: Arc<dyn TextGenerationService>,
}

impl ChallengeTool {
    pub const NAME: &'static str = "ChallengeGenerator";

    pub fn new(text: Arc<dyn TextGenerationService>) -> Self {
        Self { text }
    }

    pub async fn generate(&self) -> ToolResult {
        info!("Executing {} tool", Self::NAME);

        match self.text.generate(prompts::CHALLENGE).await {
            Ok(topic) if prompts::looks_like_placeholder(&topic) => {
                warn!("Challenge generation returned a non-ideal response: {:?}", topic);
                Err(ToolFailure::Backend {
                    kind: ErrorKind::EmptyOrBlocked,
                    apology: messages::CHALLENGE_APOLOGY,
                })
            }
            Ok(topic) => {
                info!("Challenge generated: {}", topic);
                Ok(topic)
            }
            Err(e) => {
                warn!("Challenge generation failed: {}", e);
                Err(ToolFailure::Backend {
                    kind: e.kind(),
                    apology: messages::CHALLENGE_APOLOGY,
                })
            }
        }
    }
}
