use super::client::{extract_text, GeminiHttpClient};
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
};
use crate::ai::{require_credentials, ImageCaptionService, CAPTION_MAX_TOKENS};
use crate::image::{encode_for_captioning, CAPTION_MIME_TYPE};
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use image::DynamicImage;

/// Vision-model captioner.
///
/// Construction never fails outright: a bad key or model leaves the client in
/// an unusable state that every `caption` call reports as a configuration
/// error, without touching the network.
pub struct GeminiCaptionClient {
    backend: std::result::Result<GeminiHttpClient, String>,
}

impl GeminiCaptionClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        let backend = match require_credentials("Gemini", &api_key, &model) {
            Ok(()) => Ok(GeminiHttpClient::new_with_client(api_key, model, client)),
            Err(e) => {
                tracing::error!("Gemini captioner is unusable: {}", e);
                Err(e.to_string())
            }
        };
        Self { backend }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.backend = self.backend.map(|http| http.with_base_url(base_url));
        self
    }
}

#[async_trait]
impl ImageCaptionService for GeminiCaptionClient {
    async fn caption(&self, image: Option<&DynamicImage>) -> Result<String> {
        let image = image.ok_or(Error::NoImageProvided)?;
        let http = self
            .backend
            .as_ref()
            .map_err(|reason| Error::Configuration(reason.clone()))?;

        let jpeg = encode_for_captioning(image).await?;
        tracing::debug!(
            "Captioning {}x{} image ({} bytes) via Gemini",
            image.width(),
            image.height(),
            jpeg.len()
        );

        use base64::Engine as _;
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::InlineData {
                    inline_data: InlineData {
                        mime_type: CAPTION_MIME_TYPE.to_string(),
                        data: base64::engine::general_purpose::STANDARD.encode(&jpeg),
                    },
                },
                Part::Text {
                    text: prompts::CAPTION.to_string(),
                },
            ])],
            generation_config: Some(GenerationConfig {
                max_output_tokens: Some(CAPTION_MAX_TOKENS),
            }),
        };

        let response: GenerateContentResponse = http.generate_content(&request).await?;
        let caption = extract_text(&response)?.trim().to_string();

        tracing::info!("Caption generated ({} chars)", caption.chars().count());
        Ok(caption)
    }

    fn is_usable(&self) -> bool {
        self.backend.is_ok()
    }
}
