//! Host assembly: builds backends from configuration and drives one session.

use crate::ai::{
    GeminiCaptionClient, GeminiTextClient, ImageCaptionService, OpenAiCaptionClient,
    OpenAiTextClient, TextGenerationService,
};
use crate::models::{AiProvider, Config, ImageCaptions};
use crate::prompts::messages;
use crate::session::SessionOrchestrator;
use crate::{Error, Result};
use image::DynamicImage;
use std::sync::Arc;
use tracing::{error, info, warn};

/// One player session plus the captioner used to pre-process submissions.
pub struct App {
    orchestrator: SessionOrchestrator,
    captioner: Arc<dyn ImageCaptionService>,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub text: Arc<dyn TextGenerationService>,
    pub captioner: Arc<dyn ImageCaptionService>,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices) -> Self {
        Self {
            orchestrator: SessionOrchestrator::new(services.text),
            captioner: services.captioner,
        }
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub fn new() -> Result<Self> {
        let config = Config::from_env()?;
        Self::from_config(&config)
    }

    /// Build every backend described by `config`.
    ///
    /// Any construction-time configuration problem aborts assembly; a host
    /// never serves with a half-configured backend.
    pub fn from_config(config: &Config) -> Result<Self> {
        // Reuse one HTTP connection pool across provider clients.
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            info!("Host request timeout: {}s", timeout.as_secs());
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let text = Self::build_text_client(config, http_client.clone())?;
        let captioner = Self::build_caption_client(config, http_client);

        if !captioner.is_usable() {
            error!("Caption backend is not usable; refusing to start");
            return Err(Error::Configuration(format!(
                "{} captioner could not be constructed",
                config.caption_provider
            )));
        }

        Ok(Self::with_services(AppServices { text, captioner }))
    }

    fn api_key(config: &Config, provider: AiProvider) -> String {
        config.api_key_for(provider).unwrap_or_default().to_string()
    }

    fn build_text_client(
        config: &Config,
        http_client: reqwest::Client,
    ) -> Result<Arc<dyn TextGenerationService>> {
        let provider = config.text_provider;
        let api_key = Self::api_key(config, provider);
        let model = config.text_model.clone();
        info!("Text provider: {} (model: {})", provider, model);

        Ok(match provider {
            AiProvider::Gemini => Arc::new(GeminiTextClient::new_with_client(
                api_key,
                model,
                http_client,
            )?),
            AiProvider::OpenAi => Arc::new(OpenAiTextClient::new_with_client(
                api_key,
                model,
                http_client,
            )?),
        })
    }

    fn build_caption_client(
        config: &Config,
        http_client: reqwest::Client,
    ) -> Arc<dyn ImageCaptionService> {
        let provider = config.caption_provider;
        let api_key = Self::api_key(config, provider);
        let model = config.caption_model.clone();
        info!("Caption provider: {} (model: {})", provider, model);

        match provider {
            AiProvider::Gemini => Arc::new(GeminiCaptionClient::new_with_client(
                api_key,
                model,
                http_client,
            )),
            AiProvider::OpenAi => Arc::new(OpenAiCaptionClient::new_with_client(
                api_key,
                model,
                http_client,
            )),
        }
    }

    pub fn orchestrator(&self) -> &SessionOrchestrator {
        &self.orchestrator
    }

    /// Forward a plain chat message.
    pub async fn send(&mut self, message: &str) -> String {
        self.orchestrator.handle(message, None).await
    }

    /// Caption both submissions, then hand the captions to the session.
    ///
    /// The two captioning calls run concurrently and both must finish before
    /// anything is evaluated.
    pub async fn submit_images(
        &mut self,
        image1: Option<&DynamicImage>,
        image2: Option<&DynamicImage>,
    ) -> String {
        if self.orchestrator.current_challenge_topic().is_none() {
            info!("Submission received before any challenge; skipping captioning");
            return messages::NO_ACTIVE_CHALLENGE.to_string();
        }

        let (caption1, caption2) = tokio::join!(
            self.captioner.caption(image1),
            self.captioner.caption(image2)
        );

        let captions = match (caption1, caption2) {
            (Ok(caption1), Ok(caption2)) => ImageCaptions::new(caption1, caption2),
            (Err(Error::NoImageProvided), _) | (_, Err(Error::NoImageProvided)) => {
                return messages::MISSING_IMAGES.to_string();
            }
            (Err(e), _) => {
                error!("Failed to caption image 1: {}", e);
                return messages::caption_failure(1, &e.to_string());
            }
            (_, Err(e)) => {
                error!("Failed to caption image 2: {}", e);
                return messages::caption_failure(2, &e.to_string());
            }
        };

        for (number, caption) in [(1, &captions.caption1), (2, &captions.caption2)] {
            if caption.trim().is_empty() {
                warn!("Caption for image {} came back empty", number);
                return messages::caption_failure(number, messages::EMPTY_CAPTION);
            }
        }

        info!(
            "Captions ready: {:?} / {:?}",
            captions.caption1, captions.caption2
        );
        self.orchestrator
            .handle(messages::EVALUATE_REQUEST, Some(&captions))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::{App, AppServices};
    use crate::ai::{MockCaptionClient, MockTextClient};
    use crate::models::{AiProvider, Config};
    use crate::prompts::messages;
    use crate::Error;
    use image::{DynamicImage, RgbImage};
    use std::sync::Arc;

    const TOPIC: &str = "Build a hat from paper";

    fn build_test_app(text: MockTextClient, captioner: MockCaptionClient) -> App {
        App::with_services(AppServices {
            text: Arc::new(text),
            captioner: Arc::new(captioner),
        })
    }

    fn photo() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::new(4, 4))
    }

    fn config(caption_key: Option<&str>) -> Config {
        Config {
            text_provider: AiProvider::OpenAi,
            text_model: "gpt-4o-mini".to_string(),
            caption_provider: AiProvider::Gemini,
            caption_model: "gemini-1.5-flash-latest".to_string(),
            gemini_api_key: caption_key.map(str::to_string),
            openai_api_key: Some("o-key".to_string()),
            request_timeout: None,
        }
    }

    #[tokio::test]
    async fn test_submit_images_captions_both_and_evaluates() {
        let text = MockTextClient::new()
            .with_response(TOPIC)
            .with_response("תמונה 1 - ציון: 7/10");
        let captioner = MockCaptionClient::new()
            .with_caption("a paper hat")
            .with_caption("a cat");
        let captioner_probe = captioner.clone();
        let text_probe = text.clone();
        let mut app = build_test_app(text, captioner);

        app.send("אתגר חדש").await;
        let reply = app.submit_images(Some(&photo()), Some(&photo())).await;

        assert!(reply.starts_with(messages::RESULTS_BANNER));
        assert_eq!(captioner_probe.get_call_count(), 2);
        let prompt = text_probe.last_prompt().unwrap();
        assert!(prompt.contains("a paper hat"));
        assert!(prompt.contains("a cat"));
    }

    #[tokio::test]
    async fn test_submit_before_challenge_skips_captioning() {
        let captioner = MockCaptionClient::new();
        let probe = captioner.clone();
        let mut app = build_test_app(MockTextClient::new(), captioner);

        let reply = app.submit_images(Some(&photo()), Some(&photo())).await;
        assert_eq!(reply, messages::NO_ACTIVE_CHALLENGE);
        assert_eq!(probe.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_image_is_reported() {
        let mut app = build_test_app(
            MockTextClient::new().with_response(TOPIC),
            MockCaptionClient::new(),
        );
        app.send("new challenge").await;

        let reply = app.submit_images(Some(&photo()), None).await;
        assert_eq!(reply, messages::MISSING_IMAGES);
    }

    #[tokio::test]
    async fn test_caption_failure_names_the_image() {
        let text = MockTextClient::new().with_response(TOPIC);
        let text_probe = text.clone();
        let mut app = build_test_app(
            text,
            MockCaptionClient::new()
                .with_caption("a hat")
                .with_failure("inference failed"),
        );
        app.send("new challenge").await;

        let reply = app.submit_images(Some(&photo()), Some(&photo())).await;
        assert!(reply.starts_with("שגיאה ביצירת תיאור לתמונה 2"));
        assert!(reply.contains("inference failed"));
        assert_eq!(text_probe.get_call_count(), 1);
        assert_eq!(app.orchestrator().current_challenge_topic(), Some(TOPIC));
    }

    #[tokio::test]
    async fn test_blank_caption_is_reported_not_chatted() {
        let text = MockTextClient::new()
            .with_response(TOPIC)
            .with_response("chatty reply");
        let text_probe = text.clone();
        let mut app = build_test_app(
            text,
            MockCaptionClient::new().with_caption("").with_caption("a cat"),
        );
        app.send("new challenge").await;

        let reply = app.submit_images(Some(&photo()), Some(&photo())).await;
        assert_eq!(reply, messages::caption_failure(1, messages::EMPTY_CAPTION));
        assert_eq!(reply, "שגיאה ביצירת תיאור לתמונה 1: תיאור ריק");
        assert_eq!(text_probe.get_call_count(), 1);
    }

    #[tokio::test]
    async fn test_whitespace_second_caption_names_image_two() {
        let mut app = build_test_app(
            MockTextClient::new().with_response(TOPIC),
            MockCaptionClient::new().with_caption("a hat").with_caption(" \n"),
        );
        app.send("new challenge").await;

        let reply = app.submit_images(Some(&photo()), Some(&photo())).await;
        assert_eq!(reply, messages::caption_failure(2, messages::EMPTY_CAPTION));
    }

    #[test]
    fn test_from_config_refuses_unusable_captioner() {
        let err = App::from_config(&config(Some(""))).err().unwrap();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_from_config_builds_mixed_providers() {
        let app = App::from_config(&config(Some("g-key"))).unwrap();
        assert_eq!(app.orchestrator().current_challenge_topic(), None);
    }
}
