//! The single external dependency of the pipeline: a text generation call.
//!
//! Backends (`gemini`, `openai`) implement `TextGenerator`; tests substitute
//! scripted implementations.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::ModelCatalog;
use crate::error::GenerationError;
use crate::model_router::probe_profile;
use crate::util::trunc_for_log;

/// Sampling parameters passed with every generation call.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SamplingConfig {
  pub temperature: f32,
  pub max_output_tokens: u32,
  /// Nucleus sampling width (`topP` / `top_p`).
  pub top_p: f32,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
  /// Returns the raw response text. Empty text is returned as-is; callers
  /// decide whether it counts as a failure.
  async fn generate(
    &self,
    model: &str,
    sampling: &SamplingConfig,
    prompt: &str,
  ) -> Result<String, GenerationError>;

  fn backend_name(&self) -> &str;
}

/// Connection self-test: a tiny prompt on the fast model.
/// True iff the backend answered with non-empty text.
pub async fn check_connection(backend: &dyn TextGenerator, catalog: &ModelCatalog) -> bool {
  let (model, sampling) = probe_profile(catalog);
  match backend.generate(&model, &sampling, PROBE_PROMPT).await {
    Ok(text) if !text.trim().is_empty() => {
      info!(target: "quizgen_backend", backend = backend.backend_name(), %model, reply = %trunc_for_log(text.trim(), 40), "AI connection ok");
      true
    }
    Ok(_) => {
      warn!(target: "quizgen_backend", backend = backend.backend_name(), %model, "AI connection returned empty text");
      false
    }
    Err(e) => {
      warn!(target: "quizgen_backend", backend = backend.backend_name(), %model, error = %e, "AI connection failed");
      false
    }
  }
}

const PROBE_PROMPT: &str = "Say 'API is working' in one word.";

/// Scripted stand-in for a real backend.
#[cfg(test)]
pub mod scripted {
  use std::collections::VecDeque;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;

  use super::*;

  /// Replays canned results in order; once the script runs out every call
  /// fails with a transport error.
  pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, GenerationError>>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, SamplingConfig, String)>>,
  }

  impl ScriptedGenerator {
    pub fn new(script: Vec<Result<String, GenerationError>>) -> Self {
      Self { script: Mutex::new(script.into()), calls: AtomicUsize::new(0), seen: Mutex::new(Vec::new()) }
    }

    pub fn replying(texts: &[&str]) -> Self {
      Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn failing() -> Self {
      Self::new(Vec::new())
    }

    pub fn calls(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }

    /// `(model, sampling, prompt)` per call.
    pub fn seen(&self) -> Vec<(String, SamplingConfig, String)> {
      self.seen.lock().unwrap().clone()
    }
  }

  #[async_trait]
  impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, model: &str, sampling: &SamplingConfig, prompt: &str) -> Result<String, GenerationError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self.seen.lock().unwrap().push((model.to_string(), *sampling, prompt.to_string()));
      self
        .script
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(GenerationError::Transport("script exhausted".into())))
    }

    fn backend_name(&self) -> &str {
      "scripted"
    }
  }
}
