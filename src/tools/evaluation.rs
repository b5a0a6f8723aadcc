use super::{ToolFailure, ToolResult};
use crate::ai::TextGenerationService;
use crate::models::EvaluationRequest;
use crate::prompts::{self, messages};
use crate::ErrorKind;
use std::sync::Arc;
use tracing::{info, warn};

/// Asks the backend to score two captioned submissions against a topic.
///
/// The four-line answer format is a prompt contract only; the text comes back
/// as-is and callers may try [`crate::models::Verdict::parse`] on it.
pub struct EvaluationTool {
    text: Arc<dyn TextGenerationService>,
}

impl EvaluationTool {
    pub const NAME: &'static str = "SubmissionEvaluator";

    pub fn new(text: Arc<dyn TextGenerationService>) -> Self {
        Self { text }
    }

    pub fn build_prompt(request: &EvaluationRequest) -> String {
        prompts::render(
            prompts::EVALUATION,
            &[
                ("topic", &request.topic),
                ("caption1", &request.caption1),
                ("caption2", &request.caption2),
            ],
        )
    }

    pub async fn evaluate(&self, request: &EvaluationRequest) -> ToolResult {
        info!("Executing {} tool for topic: {}", Self::NAME, request.topic);

        if !request.is_valid() {
            warn!("{} called with a missing topic or caption", Self::NAME);
            return Err(ToolFailure::Validation(messages::EVALUATION_MISSING_INPUT));
        }

        match self.text.generate(&Self::build_prompt(request)).await {
            Ok(result) if prompts::looks_like_placeholder(&result) => {
                warn!("Evaluation returned a non-ideal response: {:?}", result);
                Err(ToolFailure::Backend {
                    kind: ErrorKind::EmptyOrBlocked,
                    apology: messages::EVALUATION_APOLOGY,
                })
            }
            Ok(result) => {
                info!("Evaluation successful");
                Ok(result)
            }
            Err(e) => {
                warn!("Evaluation failed: {}", e);
                Err(ToolFailure::Backend {
                    kind: e.kind(),
                    apology: messages::EVALUATION_APOLOGY,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockTextClient;
    use crate::models::ImageCaptions;
    use pretty_assertions::assert_eq;

    const VERDICT: &str = "תמונה 1 - ציון: 8/10\nתמונה 2 - ציון: 7/10\nהתמונה הזוכה היא: תמונה 1\nהסבר קצר לזכייה: יצירתיות גבוהה יותר.";

    fn request(topic: &str, caption1: &str, caption2: &str) -> EvaluationRequest {
        EvaluationRequest::new(topic, &ImageCaptions::new(caption1, caption2))
    }

    #[tokio::test]
    async fn test_evaluate_interpolates_request_into_prompt() {
        let backend = MockTextClient::new().with_response(VERDICT);
        let tool = EvaluationTool::new(Arc::new(backend.clone()));

        let result = tool
            .evaluate(&request("Build a hat from paper", "a banana", "an empty plate"))
            .await
            .unwrap();
        assert_eq!(result, VERDICT);

        let prompt = backend.last_prompt().unwrap();
        assert!(prompt.contains("בהתחשב באתגר: 'Build a hat from paper'"));
        assert!(prompt.contains("תמונה 1: a banana"));
        assert!(prompt.contains("תמונה 2: an empty plate"));
        assert!(!prompt.contains("{{"));
    }

    #[test]
    fn test_build_prompt_keeps_braces_in_topic_verbatim() {
        let prompt = EvaluationTool::build_prompt(&request(
            "draw {{caption2}}",
            "a banana",
            "an empty plate",
        ));
        assert!(prompt.contains("בהתחשב באתגר: 'draw {{caption2}}'"));
        assert_eq!(prompt.matches("an empty plate").count(), 1);
    }

    #[tokio::test]
    async fn test_missing_field_skips_backend() {
        let backend = MockTextClient::new().with_response(VERDICT);
        let tool = EvaluationTool::new(Arc::new(backend.clone()));

        for req in [
            request("", "a banana", "an empty plate"),
            request("topic", "", "an empty plate"),
            request("topic", "a banana", ""),
        ] {
            let failure = tool.evaluate(&req).await.unwrap_err();
            assert_eq!(failure, ToolFailure::Validation(messages::EVALUATION_MISSING_INPUT));
        }
        assert_eq!(backend.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_backend_failure_becomes_apology() {
        let backend = MockTextClient::new().with_failure("503").with_empty_response();
        let tool = EvaluationTool::new(Arc::new(backend));
        let req = request("topic", "a", "b");

        let first = tool.evaluate(&req).await.unwrap_err();
        assert_eq!(first.kind(), ErrorKind::Transport);
        assert_eq!(first.to_string(), messages::EVALUATION_APOLOGY);

        let second = tool.evaluate(&req).await.unwrap_err();
        assert_eq!(second.kind(), ErrorKind::EmptyOrBlocked);
        assert_eq!(second.to_string(), messages::EVALUATION_APOLOGY);
    }
}
