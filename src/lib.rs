//! Photo challenge game host
//!
//! Asks a language model for a creative household challenge, captions two
//! photographed attempts with a vision model, and has the language model judge
//! which attempt wins.

pub mod ai;
pub mod app;
pub mod error;
pub mod image;
pub mod models;
pub mod prompts;
pub mod session;
pub mod tools;

pub use error::{Error, ErrorKind, Result};
