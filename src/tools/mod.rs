//! Game tools layered over the text-generation backend
//!
//! Each tool returns a tagged [`ToolResult`]; backend errors are absorbed here
//! and only turned into player-facing text by whoever renders the failure.

pub mod challenge;
pub mod evaluation;

pub use challenge::ChallengeTool;
pub use evaluation::EvaluationTool;

use crate::ErrorKind;
use thiserror::Error;

/// Terminal failure of a tool call. `Display` is the fixed player-facing text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolFailure {
    /// The backend failed or produced nothing usable.
    #[error("{apology}")]
    Backend {
        kind: ErrorKind,
        apology: &'static str,
    },

    /// Caller input violated a precondition; no backend call was made.
    #[error("{0}")]
    Validation(&'static str),
}

impl ToolFailure {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolFailure::Backend { kind, .. } => *kind,
            ToolFailure::Validation(_) => ErrorKind::Validation,
        }
    }
}

pub type ToolResult = std::result::Result<String, ToolFailure>;
