//! Domain models: difficulty tiers, quiz questions, question sets and requests.

use serde::{Deserialize, Serialize};

/// Number of questions the prompt asks the model for.
pub const TARGET_QUESTION_COUNT: usize = 5;
/// Smallest set of valid questions accepted downstream.
pub const MIN_VALID_QUESTIONS: usize = 3;
pub const OPTION_COUNT: usize = 4;
/// Question text must be strictly longer than this (in chars).
pub const MIN_QUESTION_CHARS: usize = 10;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
  Easy,
  #[default]
  Medium,
  Hard,
  Mixed,
}

impl Difficulty {
  pub const ALL: [Difficulty; 4] =
    [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard, Difficulty::Mixed];

  /// Unknown or missing tiers resolve to `Medium` without error.
  pub fn parse_lossy(raw: &str) -> Difficulty {
    match raw.trim().to_ascii_lowercase().as_str() {
      "easy" => Difficulty::Easy,
      "medium" => Difficulty::Medium,
      "hard" => Difficulty::Hard,
      "mixed" => Difficulty::Mixed,
      _ => Difficulty::Medium,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
      Difficulty::Mixed => "mixed",
    }
  }

  /// Human label shown by the front end and interpolated into prompts.
  pub fn label(&self) -> &'static str {
    match self {
      Difficulty::Easy => "Beginner",
      Difficulty::Medium => "Intermediate",
      Difficulty::Hard => "Expert",
      Difficulty::Mixed => "Mixed",
    }
  }

  pub fn description(&self) -> &'static str {
    match self {
      Difficulty::Easy => "Basic concepts, straightforward questions",
      Difficulty::Medium => "Balanced mix of concepts",
      Difficulty::Hard => "Advanced and detailed questions",
      Difficulty::Mixed => "Random difficulty levels",
    }
  }
}

impl std::fmt::Display for Difficulty {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One validated multiple-choice item.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizQuestion {
  #[serde(rename = "question")]
  pub question_text: String,
  pub options: Vec<String>,
  #[serde(rename = "correctAnswer")]
  pub correct_option_index: u8,
  #[serde(rename = "difficulty")]
  pub difficulty_tag: Difficulty,
  #[serde(rename = "generatedByFallback")]
  pub generated_by_fallback: bool,
}

impl QuizQuestion {
  pub fn is_valid(&self) -> bool {
    self.question_text.trim().chars().count() > MIN_QUESTION_CHARS
      && self.options.len() == OPTION_COUNT
      && self.options.iter().all(|o| !o.trim().is_empty())
      && (self.correct_option_index as usize) < OPTION_COUNT
  }
}

/// What the UI collaborator receives for one `(topic, difficulty)` request.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSet {
  pub topic: String,
  pub requested_difficulty: Difficulty,
  /// Differs from `requested_difficulty` after a hard -> medium downgrade.
  pub effective_difficulty: Difficulty,
  pub generated_by_fallback: bool,
  pub questions: Vec<QuizQuestion>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
  pub topic: String,
  pub difficulty: Difficulty,
}

impl GenerationRequest {
  pub fn new(topic: &str, difficulty: &str) -> Self {
    Self { topic: topic.trim().to_string(), difficulty: Difficulty::parse_lossy(difficulty) }
  }

  /// Lowercased, trimmed topic joined with the tier.
  pub fn cache_key(&self) -> String {
    format!("{}::{}", self.topic.to_lowercase(), self.difficulty.as_str())
  }
}
