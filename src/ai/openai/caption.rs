use super::client::{first_choice_text, OpenAiHttpClient};
use super::types::{ChatCompletionRequest, ChatMessage, ChatMessageContent, MessagePart};
use crate::ai::{require_credentials, ImageCaptionService, CAPTION_MAX_TOKENS};
use crate::image::{encode_for_captioning, CAPTION_MIME_TYPE};
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use image::DynamicImage;

/// Vision captioner backed by OpenAI chat completions with an inline data URL.
pub struct OpenAiCaptionClient {
    backend: std::result::Result<OpenAiHttpClient, String>,
    model: String,
}

impl OpenAiCaptionClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        let backend = match require_credentials("OpenAI", &api_key, &model) {
            Ok(()) => Ok(OpenAiHttpClient::new_with_client(api_key, client)),
            Err(e) => {
                tracing::error!("OpenAI captioner is unusable: {}", e);
                Err(e.to_string())
            }
        };
        Self { backend, model }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.backend = self.backend.map(|http| http.with_base_url(base_url));
        self
    }
}

#[async_trait]
impl ImageCaptionService for OpenAiCaptionClient {
    async fn caption(&self, image: Option<&DynamicImage>) -> Result<String> {
        let image = image.ok_or(Error::NoImageProvided)?;
        let http = self
            .backend
            .as_ref()
            .map_err(|reason| Error::Configuration(reason.clone()))?;

        let jpeg = encode_for_captioning(image).await?;
        tracing::debug!("Captioning image ({} bytes) via OpenAI", jpeg.len());

        use base64::Engine as _;
        let data_url = format!(
            "data:{};base64,{}",
            CAPTION_MIME_TYPE,
            base64::engine::general_purpose::STANDARD.encode(&jpeg)
        );

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(ChatMessageContent::Parts(vec![
                MessagePart::text(prompts::CAPTION),
                MessagePart::image(data_url),
            ]))],
            max_completion_tokens: Some(CAPTION_MAX_TOKENS),
        };

        let response = http.chat_completion(&request).await?;
        let caption = first_choice_text(&response)?.trim().to_string();

        tracing::info!("Caption generated ({} chars)", caption.chars().count());
        Ok(caption)
    }

    fn is_usable(&self) -> bool {
        self.backend.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gray_image() -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(6, 6, Luma([90])))
    }

    #[tokio::test]
    async fn test_caption_sends_data_url() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_string_contains("data:image/jpeg;base64,"))
            .and(body_string_contains("\"max_completion_tokens\":50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": { "role": "assistant", "content": "an empty plate" },
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiCaptionClient::new("key".to_string(), "gpt-4o-mini".to_string())
            .with_base_url(server.uri());

        let caption = client.caption(Some(&gray_image())).await.unwrap();
        assert_eq!(caption, "an empty plate");
    }

    #[tokio::test]
    async fn test_unusable_client_reports_configuration_error() {
        let client = OpenAiCaptionClient::new(String::new(), "gpt-4o-mini".to_string());
        assert!(!client.is_usable());

        let err = client.caption(Some(&gray_image())).await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(matches!(
            client.caption(None).await,
            Err(Error::NoImageProvided)
        ));
    }
}
