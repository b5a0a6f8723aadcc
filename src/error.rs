//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("Empty or blocked response: {0}")]
    EmptyResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("No image provided for captioning")]
    NoImageProvided,

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("Invariant violation: {0}")]
    Invariant(String),
}

/// Coarse classification used by callers that only care about the failure family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fatal at construction; the client can never serve a call.
    Configuration,
    /// The backend could not be reached or rejected the call.
    Transport,
    /// The backend ran but produced nothing usable.
    EmptyOrBlocked,
    /// Caller input violated a precondition.
    Validation,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_) | Error::EnvVar(_) => ErrorKind::Configuration,
            Error::EmptyResponse(_) => ErrorKind::EmptyOrBlocked,
            Error::NoImageProvided => ErrorKind::Validation,
            Error::Io(_)
            | Error::Serialization(_)
            | Error::Http(_)
            | Error::Image(_)
            | Error::AiProvider(_)
            | Error::Invariant(_) => ErrorKind::Transport,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
