//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Serving quiz question sets (difficulty defaults to medium)
//!   - Producing post-quiz feedback
//!   - Clearing the question cache
//!   - The read-only topic and difficulty catalogs

use tracing::{info, instrument};

use crate::domain::{Difficulty, QuestionSet};
use crate::protocol::DifficultyOut;
use crate::state::AppState;

/// Topics offered by the front end. Free-text topics are accepted too.
pub const CURATED_TOPICS: [&str; 12] = [
  "Wellness & Health",
  "Tech Trends",
  "World History",
  "Sports",
  "Movies & Entertainment",
  "Science & Nature",
  "Art & Culture",
  "Business & Finance",
  "Psychology & Mind",
  "Geography & Travel",
  "Food & Cooking",
  "Music & Instruments",
];

pub fn difficulty_catalog() -> Vec<DifficultyOut> {
  Difficulty::ALL
    .iter()
    .map(|d| DifficultyOut { level: d.as_str(), label: d.label(), description: d.description() })
    .collect()
}

#[instrument(level = "info", skip(state), fields(%topic))]
pub async fn do_generate_quiz(state: &AppState, topic: &str, difficulty: Option<&str>) -> QuestionSet {
  let set = state.quiz.generate_quiz_questions(topic, difficulty.unwrap_or_default()).await;
  info!(
    target: "quiz",
    topic = %set.topic,
    requested = %set.requested_difficulty,
    effective = %set.effective_difficulty,
    fallback = set.generated_by_fallback,
    count = set.questions.len(),
    "Quiz served"
  );
  set
}

#[instrument(level = "info", skip(state), fields(%score, %total, %topic))]
pub async fn do_feedback(state: &AppState, score: u32, total: u32, topic: &str, difficulty: Option<&str>) -> String {
  state.feedback.generate_feedback(score, total, topic, difficulty.unwrap_or_default()).await
}

#[instrument(level = "info", skip(state))]
pub async fn do_clear_cache(state: &AppState) -> usize {
  state.quiz.clear_cache().await
}
