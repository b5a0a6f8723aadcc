use super::client::{first_choice_text, OpenAiHttpClient};
use super::types::{ChatCompletionRequest, ChatMessage, ChatMessageContent};
use crate::ai::{require_credentials, TextGenerationService};
use crate::Result;
use async_trait::async_trait;

pub struct OpenAiTextClient {
    http: OpenAiHttpClient,
    model: String,
}

impl OpenAiTextClient {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        client: reqwest::Client,
    ) -> Result<Self> {
        require_credentials("OpenAI", &api_key, &model)?;
        Ok(Self {
            http: OpenAiHttpClient::new_with_client(api_key, client),
            model,
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }
}

#[async_trait]
impl TextGenerationService for OpenAiTextClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        tracing::debug!("Generating text with OpenAI model {}", self.model);

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(ChatMessageContent::Text(
                prompt.to_string(),
            ))],
            max_completion_tokens: None,
        };

        let response = self.http.chat_completion(&request).await?;
        let text = first_choice_text(&response)?;

        tracing::info!("OpenAI generated text ({} chars)", text.chars().count());
        Ok(text)
    }
}
