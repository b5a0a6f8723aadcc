use super::{ImageCaptionService, TextGenerationService};
use crate::{Error, Result};
use async_trait::async_trait;
use image::DynamicImage;
use std::sync::{Arc, Mutex};

/// Scripted reply for one mock backend call.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    TransportFailure(String),
    Empty,
}

impl MockReply {
    fn into_result(self) -> Result<String> {
        match self {
            MockReply::Text(text) => Ok(text),
            MockReply::TransportFailure(reason) => Err(Error::AiProvider(reason)),
            MockReply::Empty => Err(Error::EmptyResponse("mock empty response".to_string())),
        }
    }
}

/// Text backend that replays scripted replies in order, cycling when exhausted.
#[derive(Clone)]
pub struct MockTextClient {
    replies: Arc<Mutex<Vec<MockReply>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockTextClient {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.with_reply(MockReply::Text(response.into()))
    }

    pub fn with_failure(self, reason: impl Into<String>) -> Self {
        self.with_reply(MockReply::TransportFailure(reason.into()))
    }

    pub fn with_empty_response(self) -> Self {
        self.with_reply(MockReply::Empty)
    }

    pub fn with_reply(self, reply: MockReply) -> Self {
        self.replies.lock().unwrap().push(reply);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Every prompt received so far, oldest first.
    pub fn get_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

impl Default for MockTextClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerationService for MockTextClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let count = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };
        self.prompts.lock().unwrap().push(prompt.to_string());

        let reply = {
            let replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                None
            } else {
                Some(replies[(count - 1) % replies.len()].clone())
            }
        };

        match reply {
            Some(reply) => reply.into_result(),
            None => Ok(format!("Mock response #{}", count)),
        }
    }
}

/// Caption backend returning scripted captions per call.
#[derive(Clone)]
pub struct MockCaptionClient {
    captions: Arc<Mutex<Vec<MockReply>>>,
    call_count: Arc<Mutex<usize>>,
    usable: bool,
}

impl MockCaptionClient {
    pub fn new() -> Self {
        Self {
            captions: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            usable: true,
        }
    }

    pub fn with_caption(self, caption: impl Into<String>) -> Self {
        self.captions
            .lock()
            .unwrap()
            .push(MockReply::Text(caption.into()));
        self
    }

    pub fn with_failure(self, reason: impl Into<String>) -> Self {
        self.captions
            .lock()
            .unwrap()
            .push(MockReply::TransportFailure(reason.into()));
        self
    }

    /// Simulate a captioner whose model never loaded.
    pub fn unusable(mut self) -> Self {
        self.usable = false;
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockCaptionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageCaptionService for MockCaptionClient {
    async fn caption(&self, image: Option<&DynamicImage>) -> Result<String> {
        let image = image.ok_or(Error::NoImageProvided)?;
        if !self.usable {
            return Err(Error::Configuration(
                "mock captioner is unusable".to_string(),
            ));
        }

        let count = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };

        let reply = {
            let captions = self.captions.lock().unwrap();
            if captions.is_empty() {
                None
            } else {
                Some(captions[(count - 1) % captions.len()].clone())
            }
        };

        match reply {
            Some(reply) => reply.into_result(),
            None => Ok(format!("a {}x{} photo", image.width(), image.height())),
        }
    }

    fn is_usable(&self) -> bool {
        self.usable
    }
}
