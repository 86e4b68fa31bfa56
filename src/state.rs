//! Application state: generation backend, question orchestrator, feedback generator.
//!
//! This module owns:
//!   - backend selection (Gemini, then OpenAI-compatible, else none)
//!   - the model catalog for that backend (with TOML overrides)
//!   - the quiz orchestrator and its question cache
//!   - the feedback generator
//!
//! With no backend every quiz request is served from the static fallback table
//! and feedback uses the templated text.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::config::{load_quiz_config_from_env, ModelCatalog, QuizConfig};
use crate::feedback::FeedbackGenerator;
use crate::gemini::GeminiClient;
use crate::llm::{check_connection, TextGenerator};
use crate::openai::OpenAiClient;
use crate::orchestrator::QuizGenerator;
use crate::seeds::FallbackBank;

#[derive(Clone)]
pub struct AppState {
    pub quiz: QuizGenerator,
    pub feedback: FeedbackGenerator,
}

impl AppState {
    /// Build state from env: load config, pick backend, wire generators.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_quiz_config_from_env().unwrap_or_default();

        let (backend, catalog): (Option<Arc<dyn TextGenerator>>, ModelCatalog) =
            if let Some(g) = GeminiClient::from_env() {
                info!(target: "quizgen_backend", base_url = %g.base_url, "Gemini enabled.");
                (Some(Arc::new(g) as Arc<dyn TextGenerator>), ModelCatalog::gemini_defaults())
            } else if let Some(oa) = OpenAiClient::from_env() {
                info!(target: "quizgen_backend", base_url = %oa.base_url, "OpenAI enabled.");
                (Some(Arc::new(oa) as Arc<dyn TextGenerator>), ModelCatalog::openai_defaults())
            } else {
                warn!(target: "quizgen_backend", "No GEMINI_API_KEY or OPENAI_API_KEY. Serving static fallback sets.");
                (None, ModelCatalog::gemini_defaults())
            };

        Self::from_parts(backend, catalog, cfg)
    }

    /// Wire state around an explicit backend; TOML model overrides still apply.
    pub fn from_parts(
        backend: Option<Arc<dyn TextGenerator>>,
        catalog: ModelCatalog,
        cfg: QuizConfig,
    ) -> Self {
        let catalog = catalog.with_overrides(&cfg.models);
        let fallback = FallbackBank::with_configured(&cfg.fallback);
        info!(
            target: "quizgen_backend",
            fast = %catalog.fast, standard = %catalog.standard, strong = %catalog.strong,
            max_attempts = cfg.retry.max_attempts, fallback_topics = fallback.topics().len(),
            "Quiz pipeline configured"
        );

        let quiz = QuizGenerator::new(
            backend.clone(),
            catalog.clone(),
            cfg.prompts.clone(),
            cfg.retry.clone(),
            fallback,
        );
        let feedback = FeedbackGenerator::new(backend, catalog, cfg.prompts);
        Self { quiz, feedback }
    }

    pub fn backend_name(&self) -> &str {
        self.quiz.backend().map(|b| b.backend_name()).unwrap_or("none")
    }

    /// Connection self-test against the configured backend; false without one.
    pub async fn check_connection(&self) -> bool {
        match self.quiz.backend() {
            Some(b) => check_connection(b.as_ref(), self.quiz.catalog()).await,
            None => false,
        }
    }
}
