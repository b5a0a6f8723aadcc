//! Chat-style session orchestration.
//!
//! A [`SessionOrchestrator`] owns one game session: it classifies each
//! incoming message, dispatches to the challenge or evaluation tool or to a
//! free-form conversational reply, and renders every outcome as display text.
//! Hosts serving several players give each one its own orchestrator; `handle`
//! takes `&mut self`, so calls for one session are serialized by construction.

use crate::ai::TextGenerationService;
use crate::models::{EvaluationRequest, ImageCaptions, Verdict};
use crate::prompts::{self, messages};
use crate::tools::{ChallengeTool, EvaluationTool};
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

const RULES_KEYWORDS: &[&str] = &["כללים", "הוראות", "איך משחקים", "rules", "help", "how to play"];
const NEW_CHALLENGE_KEYWORDS: &[&str] = &["אתגר חדש", "צור אתגר", "new challenge", "create challenge"];

/// Purpose of an incoming message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Rules,
    NewChallenge,
    Evaluate,
    Conversation,
}

impl Intent {
    /// First match wins: rules, then new challenge, then evaluation, then
    /// conversation. A message naming both rules and a new challenge is a
    /// rules request.
    pub fn classify(message: &str, captions: Option<&ImageCaptions>) -> Self {
        let lowered = message.to_lowercase();
        let mentions = |keywords: &[&str]| keywords.iter().any(|k| mentions_keyword(&lowered, k));

        if mentions(RULES_KEYWORDS) {
            Intent::Rules
        } else if mentions(NEW_CHALLENGE_KEYWORDS) {
            Intent::NewChallenge
        } else if captions.is_some_and(ImageCaptions::is_complete) {
            Intent::Evaluate
        } else {
            Intent::Conversation
        }
    }
}

/// Hebrew keywords match anywhere, since prefixes such as `ה` attach to the
/// word. English keywords must stand as whole words ("help", not "helpful").
fn mentions_keyword(lowered: &str, keyword: &str) -> bool {
    if !keyword.is_ascii() {
        return lowered.contains(keyword);
    }

    lowered.match_indices(keyword).any(|(start, _)| {
        let before = lowered[..start].chars().next_back();
        let after = lowered[start + keyword.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// State held across `handle` calls. Only the active challenge topic survives.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Session {
    current_challenge_topic: Option<String>,
}

impl Session {
    pub fn current_challenge_topic(&self) -> Option<&str> {
        self.current_challenge_topic.as_deref()
    }

    fn activate(&mut self, topic: String) {
        self.current_challenge_topic = Some(topic);
    }

    fn clear(&mut self) {
        self.current_challenge_topic = None;
    }
}

pub struct SessionOrchestrator {
    id: Uuid,
    session: Session,
    text: Arc<dyn TextGenerationService>,
    challenge_tool: ChallengeTool,
    evaluation_tool: EvaluationTool,
}

impl SessionOrchestrator {
    /// Build an orchestrator whose tools share `text` as their backend.
    pub fn new(text: Arc<dyn TextGenerationService>) -> Self {
        let challenge_tool = ChallengeTool::new(Arc::clone(&text));
        let evaluation_tool = EvaluationTool::new(Arc::clone(&text));
        Self::with_tools(text, challenge_tool, evaluation_tool)
    }

    pub fn with_tools(
        text: Arc<dyn TextGenerationService>,
        challenge_tool: ChallengeTool,
        evaluation_tool: EvaluationTool,
    ) -> Self {
        let id = Uuid::new_v4();
        info!(session_id = %id, "Session orchestrator created");
        Self {
            id,
            session: Session::default(),
            text,
            challenge_tool,
            evaluation_tool,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.id
    }

    pub fn current_challenge_topic(&self) -> Option<&str> {
        self.session.current_challenge_topic()
    }

    /// Handle one player message, optionally carrying captions for two
    /// submitted images. Always returns displayable text.
    pub async fn handle(&mut self, message: &str, captions: Option<&ImageCaptions>) -> String {
        let intent = Intent::classify(message, captions);
        let span = info_span!("session", session_id = %self.id, intent = ?intent);

        async {
            info!(
                "Handling message ({} chars, captions: {})",
                message.chars().count(),
                captions.is_some()
            );

            match (intent, captions) {
                (Intent::Rules, _) => prompts::RULES.trim_end().to_string(),
                (Intent::NewChallenge, _) => self.start_challenge().await,
                (Intent::Evaluate, Some(captions)) => self.evaluate(captions).await,
                _ => self.converse(message).await,
            }
        }
        .instrument(span)
        .await
    }

    async fn start_challenge(&mut self) -> String {
        match self.challenge_tool.generate().await {
            Ok(topic) => {
                let reply = format!("{}\n{}", messages::CHALLENGE_BANNER, topic);
                info!("New challenge set: {}", topic);
                self.session.activate(topic);
                reply
            }
            Err(failure) => {
                warn!("Challenge generation failed ({:?}); clearing topic", failure.kind());
                self.session.clear();
                failure.to_string()
            }
        }
    }

    async fn evaluate(&self, captions: &ImageCaptions) -> String {
        let Some(topic) = self.session.current_challenge_topic() else {
            info!("Evaluation requested without an active challenge");
            return messages::NO_ACTIVE_CHALLENGE.to_string();
        };

        let request = EvaluationRequest::new(topic, captions);
        let body = match self.evaluation_tool.evaluate(&request).await {
            Ok(result) => {
                match Verdict::parse(&result) {
                    Some(verdict) => info!(
                        score1 = verdict.score1,
                        score2 = verdict.score2,
                        winner = ?verdict.winner,
                        "Evaluation verdict parsed"
                    ),
                    None => warn!("Evaluation text did not match the expected four-line format"),
                }
                result
            }
            Err(failure) => failure.to_string(),
        };

        format!("{}\n{}", messages::RESULTS_BANNER, body)
    }

    async fn converse(&self, message: &str) -> String {
        let topic = self
            .session
            .current_challenge_topic()
            .unwrap_or(messages::TOPIC_NOT_SET);
        let prompt = prompts::render(
            prompts::CONVERSATION,
            &[
                ("system", prompts::HOST_SYSTEM.trim_end()),
                ("topic", topic),
                ("message", message),
            ],
        );

        match self.text.generate(&prompt).await {
            Ok(reply) if !prompts::looks_like_placeholder(&reply) => reply,
            Ok(_) => messages::UNSURE_REPLY.to_string(),
            Err(e) => {
                warn!("Conversational reply failed: {}", e);
                messages::UNSURE_REPLY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::MockTextClient;
    use pretty_assertions::assert_eq;

    const TOPIC: &str = "Build a hat from paper";
    const VERDICT: &str = "תמונה 1 - ציון: 9/10\nתמונה 2 - ציון: 3/10\nהתמונה הזוכה היא: תמונה 1\nהסבר קצר לזכייה: הכובע ברור לעין.";

    fn captions() -> ImageCaptions {
        ImageCaptions::new("a banana", "an empty plate")
    }

    #[test]
    fn test_classify_priority_order() {
        let caps = captions();
        assert_eq!(Intent::classify("ספר לי את הכללים", None), Intent::Rules);
        assert_eq!(Intent::classify("rules and a new challenge", None), Intent::Rules);
        assert_eq!(Intent::classify("אתגר חדש", Some(&caps)), Intent::NewChallenge);
        assert_eq!(Intent::classify("New Challenge", None), Intent::NewChallenge);
        assert_eq!(Intent::classify("", Some(&caps)), Intent::Evaluate);
        assert_eq!(Intent::classify("what is the weather?", None), Intent::Conversation);
    }

    #[test]
    fn test_classify_english_keywords_need_whole_words() {
        assert_eq!(
            Intent::classify("new challenge, something helpful please", None),
            Intent::NewChallenge
        );
        assert_eq!(Intent::classify("Help!", None), Intent::Rules);
        assert_eq!(Intent::classify("what are the rules?", None), Intent::Rules);
        assert_eq!(Intent::classify("אני צריך עזרה עם הכללים", None), Intent::Rules);
    }

    #[test]
    fn test_classify_needs_both_captions() {
        let partial = ImageCaptions::new("a banana", "");
        assert_eq!(Intent::classify("", Some(&partial)), Intent::Conversation);
    }

    #[tokio::test]
    async fn test_rules_make_no_backend_call() {
        let backend = MockTextClient::new();
        let mut orchestrator = SessionOrchestrator::new(Arc::new(backend.clone()));

        let reply = orchestrator.handle("help me start a new challenge", None).await;
        assert_eq!(reply, prompts::RULES.trim_end());
        assert_eq!(backend.get_call_count(), 0);
        assert_eq!(orchestrator.current_challenge_topic(), None);
    }

    #[tokio::test]
    async fn test_new_challenge_sets_topic() {
        let backend = MockTextClient::new().with_response(TOPIC);
        let mut orchestrator = SessionOrchestrator::new(Arc::new(backend));

        let reply = orchestrator.handle("new challenge", None).await;
        assert_eq!(reply, format!("{}\n{}", messages::CHALLENGE_BANNER, TOPIC));
        assert_eq!(orchestrator.current_challenge_topic(), Some(TOPIC));
    }

    #[tokio::test]
    async fn test_failed_challenge_clears_topic() {
        let backend = MockTextClient::new()
            .with_response(TOPIC)
            .with_failure("offline");
        let mut orchestrator = SessionOrchestrator::new(Arc::new(backend));

        orchestrator.handle("new challenge", None).await;
        assert_eq!(orchestrator.current_challenge_topic(), Some(TOPIC));

        let reply = orchestrator.handle("new challenge", None).await;
        assert_eq!(reply, messages::CHALLENGE_APOLOGY);
        assert_eq!(orchestrator.current_challenge_topic(), None);
    }

    #[tokio::test]
    async fn test_evaluation_without_challenge_skips_tool() {
        let backend = MockTextClient::new().with_response(VERDICT);
        let mut orchestrator = SessionOrchestrator::new(Arc::new(backend.clone()));

        let reply = orchestrator.handle("", Some(&captions())).await;
        assert_eq!(reply, messages::NO_ACTIVE_CHALLENGE);
        assert_eq!(backend.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_evaluation_uses_current_topic_and_keeps_it() {
        let challenge_backend = MockTextClient::new().with_response(TOPIC);
        let judge_backend = MockTextClient::new().with_response(VERDICT);
        let mut orchestrator = SessionOrchestrator::with_tools(
            Arc::new(MockTextClient::new()),
            ChallengeTool::new(Arc::new(challenge_backend)),
            EvaluationTool::new(Arc::new(judge_backend.clone())),
        );

        orchestrator.handle("new challenge", None).await;
        let reply = orchestrator.handle("", Some(&captions())).await;

        assert_eq!(reply, format!("{}\n{}", messages::RESULTS_BANNER, VERDICT));
        let expected_prompt = EvaluationTool::build_prompt(&EvaluationRequest {
            topic: TOPIC.to_string(),
            caption1: "a banana".to_string(),
            caption2: "an empty plate".to_string(),
        });
        assert_eq!(judge_backend.get_prompts(), vec![expected_prompt]);

        orchestrator.handle("", Some(&captions())).await;
        assert_eq!(judge_backend.get_call_count(), 2);
        assert_eq!(orchestrator.current_challenge_topic(), Some(TOPIC));
    }

    #[tokio::test]
    async fn test_conversation_includes_topic_marker() {
        let backend = MockTextClient::new().with_response("שלום! רוצים אתגר?");
        let mut orchestrator = SessionOrchestrator::new(Arc::new(backend.clone()));

        let reply = orchestrator.handle("מה מזג האוויר היום?", None).await;
        assert_eq!(reply, "שלום! רוצים אתגר?");

        let prompt = backend.last_prompt().unwrap();
        assert!(prompt.contains(messages::TOPIC_NOT_SET));
        assert!(prompt.contains("מה מזג האוויר היום?"));
        assert!(prompt.contains("מנחה משחק אתגר התמונות"));
    }

    #[tokio::test]
    async fn test_conversation_failure_is_unsure_reply() {
        let backend = MockTextClient::new().with_failure("offline");
        let mut orchestrator = SessionOrchestrator::new(Arc::new(backend));

        let reply = orchestrator.handle("hello there", None).await;
        assert_eq!(reply, messages::UNSURE_REPLY);
    }

    #[tokio::test]
    async fn test_conversation_placeholder_is_unsure_reply() {
        let backend = MockTextClient::new()
            .with_response("Placeholder response")
            .with_response("  \n");
        let mut orchestrator = SessionOrchestrator::new(Arc::new(backend.clone()));

        for _ in 0..2 {
            let reply = orchestrator.handle("hello there", None).await;
            assert_eq!(reply, messages::UNSURE_REPLY);
        }
        assert_eq!(backend.get_call_count(), 2);
    }

    #[tokio::test]
    async fn test_conversation_keeps_braces_in_topic_verbatim() {
        let challenge_backend = MockTextClient::new().with_response("Write {{message}} on paper");
        let chat_backend = MockTextClient::new().with_response("נשמע טוב!");
        let mut orchestrator = SessionOrchestrator::with_tools(
            Arc::new(chat_backend.clone()),
            ChallengeTool::new(Arc::new(challenge_backend)),
            EvaluationTool::new(Arc::new(MockTextClient::new())),
        );

        orchestrator.handle("new challenge", None).await;
        orchestrator.handle("hi there", None).await;

        let prompt = chat_backend.last_prompt().unwrap();
        assert!(prompt.contains("האתגר הנוכחי הוא: Write {{message}} on paper"));
        assert!(prompt.contains("המשתמש אומר: \"hi there\""));
    }
}
