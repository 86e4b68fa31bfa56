//! Failure taxonomy of the question pipeline.
//!
//! Every variant is local: the orchestrator absorbs them and decides between
//! retry, downgrade and static fallback. Nothing here reaches HTTP clients.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
  #[error("response text was empty")]
  Empty,
  #[error("invalid JSON: {0}")]
  InvalidJson(String),
  #[error("no JSON array found")]
  NoArray,
  #[error("only {found} usable items found (need {required})")]
  TooFewItems { found: usize, required: usize },
  #[error("all parsing strategies exhausted")]
  Exhausted,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
  /// The model call itself failed (network, HTTP status, quota).
  #[error("transport failure: {0}")]
  Transport(String),
  #[error("model returned an empty response")]
  EmptyResponse,
  #[error("malformed response: {0}")]
  Malformed(#[from] ParseError),
  #[error("only {valid} valid questions (need {required})")]
  Validation { valid: usize, required: usize },
}

impl GenerationError {
  /// Failures that allow a one-time hard -> medium retry.
  pub fn triggers_downgrade(&self) -> bool {
    matches!(self, GenerationError::EmptyResponse | GenerationError::Malformed(_))
  }

  /// Short stable label for structured logs.
  pub fn kind(&self) -> &'static str {
    match self {
      GenerationError::Transport(_) => "transport",
      GenerationError::EmptyResponse => "empty_response",
      GenerationError::Malformed(_) => "malformed",
      GenerationError::Validation { .. } => "validation",
    }
  }
}

/// The request URL is dropped: it may carry credentials.
impl From<reqwest::Error> for GenerationError {
  fn from(err: reqwest::Error) -> Self {
    GenerationError::Transport(err.without_url().to_string())
  }
}
