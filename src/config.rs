//! Loading quiz configuration (prompts, model ids, retry policy, extra fallback
//! sets) from TOML.
//!
//! See `QuizConfig` and `Prompts` for expected schema. Every section is optional.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct QuizConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub models: ModelOverrides,
  #[serde(default)]
  pub retry: RetrySettings,
  #[serde(default)]
  pub fallback: Vec<FallbackSetCfg>,
}

/// Prompt templates sent to the model.
///
/// Question placeholders: `{topic}`, `{difficulty_label}`, `{guidelines}`, `{count}`.
/// Feedback placeholders: `{topic}`, `{score}`, `{total}`, `{percentage}`, `{difficulty_label}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub question_template: String,
  pub feedback_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      question_template: r#"Generate exactly {count} multiple choice questions about "{topic}" at {difficulty_label} level.

DIFFICULTY GUIDELINES:
{guidelines}

CRITICAL REQUIREMENTS:
1. Return ONLY a valid JSON array with exactly {count} questions
2. Each question must have:
   - "question" (clear, specific question)
   - "options" (exactly 4 options as strings)
   - "correctAnswer" (number 0-3 for correct option index)
3. Questions should cover different aspects of {topic}
4. Make only one option clearly correct, others plausible but wrong
5. Do NOT include any explanations or additional text

STRICT JSON FORMAT:
[
  {
    "question": "Question text?",
    "options": ["Option A", "Option B", "Option C", "Option D"],
    "correctAnswer": 0
  }
]"#
        .into(),
      feedback_template: r#"Create personalized feedback for a quiz result.

Quiz Details:
- Topic: {topic}
- Difficulty: {difficulty_label}
- Score: {score} out of {total}
- Percentage: {percentage}%

IMPORTANT: Return ONLY the feedback text, no JSON or additional formatting.

Make it:
- Encouraging and motivational
- Brief (under 60 words)
- Appropriate for the score level and difficulty
- Include the score and topic
- Focus on improvement and learning"#
        .into(),
    }
  }
}

/// Optional model id overrides; unset entries keep the backend defaults.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct ModelOverrides {
  #[serde(default)]
  pub fast: Option<String>,
  #[serde(default)]
  pub standard: Option<String>,
  #[serde(default)]
  pub strong: Option<String>,
}

/// The three model slots the difficulty router chooses from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelCatalog {
  /// Cheap model for feedback and connection checks.
  pub fast: String,
  pub standard: String,
  /// Higher-capability model for hard questions.
  pub strong: String,
}

impl ModelCatalog {
  pub fn gemini_defaults() -> Self {
    Self {
      fast: "gemini-2.5-flash-lite".into(),
      standard: "gemini-2.5-flash".into(),
      strong: "gemini-2.5-pro".into(),
    }
  }

  pub fn openai_defaults() -> Self {
    Self { fast: "gpt-4o-mini".into(), standard: "gpt-4o-mini".into(), strong: "gpt-4o".into() }
  }

  pub fn with_overrides(mut self, o: &ModelOverrides) -> Self {
    if let Some(m) = o.fast.as_ref().filter(|m| !m.trim().is_empty()) {
      self.fast = m.trim().to_string();
    }
    if let Some(m) = o.standard.as_ref().filter(|m| !m.trim().is_empty()) {
      self.standard = m.trim().to_string();
    }
    if let Some(m) = o.strong.as_ref().filter(|m| !m.trim().is_empty()) {
      self.strong = m.trim().to_string();
    }
    self
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
  /// Attempts per difficulty level.
  pub max_attempts: u32,
  pub base_delay_ms: u64,
}

impl Default for RetrySettings {
  fn default() -> Self {
    Self { max_attempts: 2, base_delay_ms: 1000 }
  }
}

impl RetrySettings {
  pub fn base_delay(&self) -> Duration {
    Duration::from_millis(self.base_delay_ms)
  }
}

/// Static question set accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct FallbackSetCfg {
  pub topic: String,
  pub questions: Vec<FallbackQuestionCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FallbackQuestionCfg {
  pub question: String,
  pub options: Vec<String>,
  #[serde(rename = "correctAnswer", alias = "correct_answer")]
  pub correct_answer: u8,
}

/// Attempt to load `QuizConfig` from QUIZ_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_quiz_config_from_env() -> Option<QuizConfig> {
  let path = std::env::var("QUIZ_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<QuizConfig>(&s) {
      Ok(cfg) => {
        info!(target: "quizgen_backend", %path, fallback_sets = cfg.fallback.len(), "Loaded quiz config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "quizgen_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "quizgen_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
