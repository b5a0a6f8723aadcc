//! AI backend contracts for text generation and image captioning
//!
//! Provides provider-neutral traits plus Gemini and OpenAI REST
//! implementations. Tools and the session orchestrator only ever see the
//! traits, so backends are swapped by construction.

pub mod gemini;
pub mod mock;
pub mod openai;

pub use gemini::{GeminiCaptionClient, GeminiTextClient};
pub use mock::{MockCaptionClient, MockTextClient};
pub use openai::{OpenAiCaptionClient, OpenAiTextClient};

use crate::{Error, Result};
use ::image::DynamicImage;
use async_trait::async_trait;

/// Upper bound on caption length requested from vision backends.
pub const CAPTION_MAX_TOKENS: u32 = 50;

/// Single prompt in, single completion out.
///
/// Implementations never retry; a failed call is reported once and the caller
/// decides what to do next.
#[async_trait]
pub trait TextGenerationService: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Decoded image in, short natural-language description out.
///
/// `None` is always reported as [`Error::NoImageProvided`], before any
/// configuration check.
#[async_trait]
pub trait ImageCaptionService: Send + Sync {
    async fn caption(&self, image: Option<&DynamicImage>) -> Result<String>;

    /// `false` when construction failed and every call will be refused.
    fn is_usable(&self) -> bool {
        true
    }
}

/// Rejects blank credentials or model ids at construction time.
pub(crate) fn require_credentials(provider: &str, api_key: &str, model: &str) -> Result<()> {
    if api_key.trim().is_empty() {
        return Err(Error::Configuration(format!("{} API key is empty", provider)));
    }
    if model.trim().is_empty() {
        return Err(Error::Configuration(format!("{} model id is empty", provider)));
    }
    Ok(())
}
