//! Data models and structures
//!
//! Defines the evaluation payloads, the parsed judge verdict, and the
//! environment-driven configuration for backend providers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Captions for the two submitted images, produced before `handle` is called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCaptions {
    pub caption1: String,
    pub caption2: String,
}

impl ImageCaptions {
    pub fn new(caption1: impl Into<String>, caption2: impl Into<String>) -> Self {
        Self {
            caption1: caption1.into(),
            caption2: caption2.into(),
        }
    }

    /// Both captions carry text.
    pub fn is_complete(&self) -> bool {
        !self.caption1.trim().is_empty() && !self.caption2.trim().is_empty()
    }
}

/// Input for one judging call. Built fresh per evaluation and never retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub topic: String,
    pub caption1: String,
    pub caption2: String,
}

impl EvaluationRequest {
    pub fn new(topic: &str, captions: &ImageCaptions) -> Self {
        Self {
            topic: topic.to_string(),
            caption1: captions.caption1.clone(),
            caption2: captions.caption2.clone(),
        }
    }

    pub fn is_valid(&self) -> bool {
        [&self.topic, &self.caption1, &self.caption2]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    First,
    Second,
}

/// Structured reading of the judge's four-line answer.
///
/// Expected shape (Hebrew labels, as requested by the evaluation prompt):
///
/// ```text
/// תמונה 1 - ציון: 8/10
/// תמונה 2 - ציון: 6/10
/// התמונה הזוכה היא: תמונה 1
/// הסבר קצר לזכייה: ...
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub score1: u8,
    pub score2: u8,
    pub winner: Winner,
    pub rationale: String,
}

impl Verdict {
    /// Best-effort parse; `None` when any of the four lines is missing or malformed.
    pub fn parse(text: &str) -> Option<Self> {
        let mut score1 = None;
        let mut score2 = None;
        let mut winner = None;
        let mut rationale = None;

        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let Some((label, value)) = line.split_once(':') else {
                continue;
            };
            let (label, value) = (label.trim(), value.trim());

            if label.contains("ציון") || label.to_lowercase().contains("score") {
                let score = parse_score(value)?;
                if label.contains('1') {
                    score1 = Some(score);
                } else if label.contains('2') {
                    score2 = Some(score);
                }
            } else if label.contains("הזוכה") || label.to_lowercase().contains("winner") {
                winner = Some(parse_winner(value)?);
            } else if label.contains("הסבר") || label.to_lowercase().contains("rationale") {
                rationale = Some(value.to_string());
            }
        }

        Some(Self {
            score1: score1?,
            score2: score2?,
            winner: winner?,
            rationale: rationale.filter(|r| !r.is_empty())?,
        })
    }
}

/// Reads the image number that follows `תמונה` / `image`, so trailing
/// scores such as `(8/10)` are ignored.
fn parse_winner(value: &str) -> Option<Winner> {
    let lowered = value.to_lowercase();
    let tail = ["תמונה", "image"]
        .iter()
        .find_map(|marker| lowered.find(marker).map(|i| &lowered[i + marker.len()..]))
        .unwrap_or(&lowered);

    match tail.chars().find(char::is_ascii_digit) {
        Some('1') => Some(Winner::First),
        Some('2') => Some(Winner::Second),
        _ => None,
    }
}

fn parse_score(value: &str) -> Option<u8> {
    let numerator = value.split('/').next()?.trim();
    let score: u8 = numerator.parse().ok()?;
    (1..=10).contains(&score).then_some(score)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiProvider {
    Gemini,
    OpenAi,
}

impl AiProvider {
    pub fn default_model(self) -> &'static str {
        match self {
            AiProvider::Gemini => DEFAULT_GEMINI_MODEL,
            AiProvider::OpenAi => DEFAULT_OPENAI_MODEL,
        }
    }
}

impl FromStr for AiProvider {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(AiProvider::Gemini),
            "openai" => Ok(AiProvider::OpenAi),
            other => Err(crate::Error::Configuration(format!(
                "Unknown AI provider '{}'. Expected 'gemini' or 'openai'",
                other
            ))),
        }
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiProvider::Gemini => write!(f, "Gemini"),
            AiProvider::OpenAi => write!(f, "OpenAI"),
        }
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub text_provider: AiProvider,
    pub text_model: String,
    pub caption_provider: AiProvider,
    pub caption_model: String,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub request_timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup so tests do not touch the process env.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let text_provider = match non_empty("TEXT_PROVIDER") {
            Some(value) => value.parse()?,
            None => AiProvider::Gemini,
        };
        let caption_provider = match non_empty("CAPTION_PROVIDER") {
            Some(value) => value.parse()?,
            None => AiProvider::Gemini,
        };

        let text_model = non_empty("TEXT_MODEL")
            .unwrap_or_else(|| text_provider.default_model().to_string());
        let caption_model = non_empty("CAPTION_MODEL")
            .unwrap_or_else(|| caption_provider.default_model().to_string());

        let gemini_api_key = non_empty("GEMINI_API_KEY");
        let openai_api_key = non_empty("OPENAI_API_KEY");

        for provider in [text_provider, caption_provider] {
            match provider {
                AiProvider::Gemini if gemini_api_key.is_none() => {
                    return Err(crate::Error::Configuration(
                        "GEMINI_API_KEY not set".to_string(),
                    ))
                }
                AiProvider::OpenAi if openai_api_key.is_none() => {
                    return Err(crate::Error::Configuration(
                        "OPENAI_API_KEY not set".to_string(),
                    ))
                }
                _ => {}
            }
        }

        let request_timeout = match non_empty("REQUEST_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    crate::Error::Configuration(format!(
                        "REQUEST_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                        raw
                    ))
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            text_provider,
            text_model,
            caption_provider,
            caption_model,
            gemini_api_key,
            openai_api_key,
            request_timeout,
        })
    }

    pub fn api_key_for(&self, provider: AiProvider) -> Option<&str> {
        match provider {
            AiProvider::Gemini => self.gemini_api_key.as_deref(),
            AiProvider::OpenAi => self.openai_api_key.as_deref(),
        }
    }
}
