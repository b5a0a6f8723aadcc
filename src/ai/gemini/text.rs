use super::client::{extract_text, GeminiHttpClient};
use super::types::{Content, GenerateContentRequest, GenerateContentResponse, Part};
use crate::ai::{require_credentials, TextGenerationService};
use crate::Result;
use async_trait::async_trait;

pub struct GeminiTextClient {
    http: GeminiHttpClient,
}

impl GeminiTextClient {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        client: reqwest::Client,
    ) -> Result<Self> {
        require_credentials("Gemini", &api_key, &model)?;
        Ok(Self {
            http: GeminiHttpClient::new_with_client(api_key, model, client),
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl TextGenerationService for GeminiTextClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::debug!(
            "Generating text with Gemini model {} ({} chars of prompt)",
            self.http.model(),
            prompt.chars().count()
        );

        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::Text {
                text: prompt.to_string(),
            }])],
            generation_config: None,
        };

        let response: GenerateContentResponse = self.http.generate_content(&request).await?;
        let text = extract_text(&response)?;

        tracing::info!("Gemini generated text ({} chars)", text.chars().count());
        Ok(text)
    }
}
