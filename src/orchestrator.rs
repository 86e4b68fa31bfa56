//! Question generation: cache lookup, bounded retries with linear backoff,
//! a one-time hard -> medium downgrade, and static fallback.
//!
//! `generate_quiz_questions` never fails. Every error kind in
//! `GenerationError` is absorbed here and ends in either a generated set or
//! a fallback set tagged `generated_by_fallback`.

use std::{sync::Arc, time::Duration};

use tracing::{debug, info, instrument, warn};

use crate::cache::QuestionCache;
use crate::config::{ModelCatalog, Prompts, RetrySettings};
use crate::domain::{Difficulty, GenerationRequest, QuestionSet, QuizQuestion, TARGET_QUESTION_COUNT};
use crate::error::GenerationError;
use crate::llm::TextGenerator;
use crate::model_router::{resolve, ModelProfile};
use crate::normalize::normalize_response;
use crate::parser::parse_candidates;
use crate::seeds::{FallbackBank, GENERIC_TOPIC};
use crate::util::{fill_template, trunc_for_log};
use crate::validate::validate_candidates;

/// Progress of a single request through the retry policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttemptState {
  Idle,
  /// `attempt` is 1-based and counts per difficulty level.
  Attempting { difficulty: Difficulty, attempt: u32 },
  /// Hard failed once with an empty or unparseable reply; next stop is medium.
  Downgraded,
  Succeeded,
  FallenBack,
}

/// Wait before the retry that follows failed attempt `attempt`.
/// Saturates instead of overflowing on huge configured base delays.
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
  base.saturating_mul(attempt)
}

/// Transition taken after attempt `attempt` at `difficulty` failed with `err`.
pub fn after_failure(
  requested: Difficulty,
  difficulty: Difficulty,
  attempt: u32,
  err: &GenerationError,
  already_downgraded: bool,
  max_attempts: u32,
) -> AttemptState {
  if requested == Difficulty::Hard
    && difficulty == Difficulty::Hard
    && attempt == 1
    && !already_downgraded
    && err.triggers_downgrade()
  {
    AttemptState::Downgraded
  } else if attempt >= max_attempts {
    AttemptState::FallenBack
  } else {
    AttemptState::Attempting { difficulty, attempt: attempt + 1 }
  }
}

#[derive(Clone)]
pub struct QuizGenerator {
  backend: Option<Arc<dyn TextGenerator>>,
  catalog: ModelCatalog,
  prompts: Prompts,
  retry: RetrySettings,
  cache: QuestionCache,
  fallback: Arc<FallbackBank>,
}

impl QuizGenerator {
  pub fn new(
    backend: Option<Arc<dyn TextGenerator>>,
    catalog: ModelCatalog,
    prompts: Prompts,
    retry: RetrySettings,
    fallback: FallbackBank,
  ) -> Self {
    Self { backend, catalog, prompts, retry, cache: QuestionCache::new(), fallback: Arc::new(fallback) }
  }

  pub fn backend(&self) -> Option<&Arc<dyn TextGenerator>> {
    self.backend.as_ref()
  }

  pub fn catalog(&self) -> &ModelCatalog {
    &self.catalog
  }

  pub fn cache(&self) -> &QuestionCache {
    &self.cache
  }

  /// Returns how many cached sets were dropped.
  pub async fn clear_cache(&self) -> usize {
    self.cache.clear().await
  }

  /// Always resolves to a usable set: cached, generated, or static fallback.
  #[instrument(level = "info", skip(self), fields(%topic, %difficulty))]
  pub async fn generate_quiz_questions(&self, topic: &str, difficulty: &str) -> QuestionSet {
    let req = GenerationRequest::new(topic, difficulty);

    if req.topic.is_empty() {
      warn!(target: "quiz", "Blank topic; serving generic fallback set");
      return self.fallback_set(&req, req.difficulty);
    }

    let key = req.cache_key();
    if let Some(hit) = self.cache.get(&key).await {
      debug!(target: "quiz", %key, fallback = hit.generated_by_fallback, "Cache hit");
      return hit;
    }

    let set = match &self.backend {
      Some(backend) => self.run_attempts(backend.as_ref(), &req).await,
      None => {
        warn!(target: "quiz", topic = %req.topic, "No generation backend configured; serving fallback set");
        self.fallback_set(&req, req.difficulty)
      }
    };
    self.cache.insert(key, set.clone()).await;
    set
  }

  async fn run_attempts(&self, backend: &dyn TextGenerator, req: &GenerationRequest) -> QuestionSet {
    let max_attempts = self.retry.max_attempts.max(1);
    let mut state = AttemptState::Idle;
    let mut current = req.difficulty;
    let mut downgraded = false;
    let mut produced: Option<Vec<QuizQuestion>> = None;

    loop {
      state = match state {
        AttemptState::Idle => AttemptState::Attempting { difficulty: current, attempt: 1 },
        AttemptState::Attempting { difficulty, attempt } => {
          current = difficulty;
          match self.attempt_once(backend, &req.topic, difficulty).await {
            Ok(questions) => {
              info!(target: "quiz", topic = %req.topic, %difficulty, attempt, count = questions.len(), "Generated question set");
              produced = Some(questions);
              AttemptState::Succeeded
            }
            Err(err) => {
              warn!(target: "quiz", topic = %req.topic, %difficulty, attempt, kind = err.kind(), error = %err, "Generation attempt failed");
              let next = after_failure(req.difficulty, difficulty, attempt, &err, downgraded, max_attempts);
              if let AttemptState::Attempting { .. } = next {
                let delay = backoff_delay(attempt, self.retry.base_delay());
                debug!(target: "quiz", delay_ms = delay.as_millis() as u64, "Backing off before retry");
                tokio::time::sleep(delay).await;
              }
              next
            }
          }
        }
        AttemptState::Downgraded => {
          warn!(target: "quiz", topic = %req.topic, "Downgrading hard request to medium");
          downgraded = true;
          AttemptState::Attempting { difficulty: Difficulty::Medium, attempt: 1 }
        }
        AttemptState::Succeeded | AttemptState::FallenBack => break,
      };
    }

    match produced {
      Some(questions) if state == AttemptState::Succeeded => QuestionSet {
        topic: req.topic.clone(),
        requested_difficulty: req.difficulty,
        effective_difficulty: current,
        generated_by_fallback: false,
        questions,
      },
      _ => {
        warn!(target: "quiz", topic = %req.topic, difficulty = %current, "Retries exhausted; serving fallback set");
        self.fallback_set(req, current)
      }
    }
  }

  /// One prompt -> call -> normalize -> parse -> validate pass.
  async fn attempt_once(
    &self,
    backend: &dyn TextGenerator,
    topic: &str,
    difficulty: Difficulty,
  ) -> Result<Vec<QuizQuestion>, GenerationError> {
    let profile = resolve(difficulty, &self.catalog);
    let prompt = self.build_question_prompt(topic, &profile);

    let raw = backend.generate(&profile.model_id, &profile.sampling, &prompt).await?;
    if raw.trim().is_empty() {
      return Err(GenerationError::EmptyResponse);
    }
    debug!(target: "quiz", preview = %trunc_for_log(&raw, 160), "Raw model response");

    let cleaned = normalize_response(&raw);
    let outcome = parse_candidates(&cleaned)?;
    debug!(target: "quiz", strategy = outcome.strategy, attempt = outcome.attempt, candidates = outcome.candidates.len(), "Parsed candidates");
    validate_candidates(&outcome.candidates, difficulty)
  }

  fn build_question_prompt(&self, topic: &str, profile: &ModelProfile) -> String {
    let count = TARGET_QUESTION_COUNT.to_string();
    fill_template(
      &self.prompts.question_template,
      &[
        ("count", count.as_str()),
        ("topic", topic),
        ("difficulty_label", profile.display_label),
        ("guidelines", profile.guidelines),
      ],
    )
  }

  fn fallback_set(&self, req: &GenerationRequest, difficulty: Difficulty) -> QuestionSet {
    let lookup = if req.topic.is_empty() { GENERIC_TOPIC } else { req.topic.as_str() };
    QuestionSet {
      topic: req.topic.clone(),
      requested_difficulty: req.difficulty,
      effective_difficulty: difficulty,
      generated_by_fallback: true,
      questions: self.fallback.questions_for(lookup, difficulty),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::MIN_VALID_QUESTIONS;
  use crate::llm::scripted::ScriptedGenerator;

  const TECH_TRENDS: &str = r#"[
    {"question": "What does GPU stand for in computing?", "options": ["Graphics Processing Unit", "General Purpose Unit", "Global Processing Utility", "Graphical Parallel Unit"], "correctAnswer": 0},
    {"question": "Which company makes the Vision Pro headset?", "options": ["Meta", "Apple", "Sony", "HTC"], "correctAnswer": 1},
    {"question": "What is the main idea behind edge computing?", "options": ["Bigger data centers", "Processing close to the data source", "Faster keyboards", "Cheaper monitors"], "correctAnswer": 1},
    {"question": "Which protocol underpins most cryptocurrencies?", "options": ["HTTP", "FTP", "Blockchain consensus", "SMTP"], "correctAnswer": 2},
    {"question": "What does LLM stand for in AI?", "options": ["Large Language Model", "Linear Logic Machine", "Low Latency Memory", "Layered Learning Method"], "correctAnswer": 0}
  ]"#;

  fn generator(backend: Option<Arc<ScriptedGenerator>>) -> QuizGenerator {
    QuizGenerator::new(
      backend.map(|b| b as Arc<dyn TextGenerator>),
      ModelCatalog::gemini_defaults(),
      Prompts::default(),
      RetrySettings { max_attempts: 2, base_delay_ms: 0 },
      FallbackBank::builtin(),
    )
  }

  #[test]
  fn backoff_grows_linearly() {
    let base = Duration::from_millis(1000);
    assert_eq!(backoff_delay(1, base), Duration::from_millis(1000));
    assert_eq!(backoff_delay(2, base), Duration::from_millis(2000));
  }

  #[test]
  fn backoff_saturates_on_huge_base_delay() {
    let base = RetrySettings { max_attempts: 2, base_delay_ms: u64::MAX }.base_delay();
    assert_eq!(backoff_delay(2, base), Duration::MAX);
  }

  #[test]
  fn downgrade_only_on_first_hard_parse_or_empty_failure() {
    let empty = GenerationError::EmptyResponse;
    let transport = GenerationError::Transport("429".into());
    assert_eq!(after_failure(Difficulty::Hard, Difficulty::Hard, 1, &empty, false, 2), AttemptState::Downgraded);
    assert_eq!(
      after_failure(Difficulty::Hard, Difficulty::Hard, 1, &transport, false, 2),
      AttemptState::Attempting { difficulty: Difficulty::Hard, attempt: 2 }
    );
    assert_eq!(
      after_failure(Difficulty::Hard, Difficulty::Medium, 1, &empty, true, 2),
      AttemptState::Attempting { difficulty: Difficulty::Medium, attempt: 2 }
    );
    assert_eq!(after_failure(Difficulty::Medium, Difficulty::Medium, 2, &empty, false, 2), AttemptState::FallenBack);
  }

  #[tokio::test]
  async fn tech_trends_stub_returns_items_unmodified() {
    let backend = Arc::new(ScriptedGenerator::replying(&[TECH_TRENDS]));
    let quiz = generator(Some(backend.clone()));
    let set = quiz.generate_quiz_questions("Tech Trends", "medium").await;

    assert!(!set.generated_by_fallback);
    assert_eq!(set.questions.len(), 5);
    assert_eq!(set.questions[1].question_text, "Which company makes the Vision Pro headset?");
    assert_eq!(set.questions[3].options[2], "Blockchain consensus");
    assert_eq!(set.questions[3].correct_option_index, 2);
    assert!(set.questions.iter().all(|q| q.difficulty_tag == Difficulty::Medium && !q.generated_by_fallback));

    let (model, _, prompt) = backend.seen().remove(0);
    assert_eq!(model, "gemini-2.5-flash");
    assert!(prompt.contains("\"Tech Trends\""));
    assert!(prompt.contains("Intermediate"));
  }

  #[tokio::test]
  async fn second_call_is_served_from_cache_with_normalized_key() {
    let backend = Arc::new(ScriptedGenerator::replying(&[TECH_TRENDS]));
    let quiz = generator(Some(backend.clone()));
    let first = quiz.generate_quiz_questions("Science", "easy").await;
    let second = quiz.generate_quiz_questions("  science ", "EASY").await;
    assert_eq!(backend.calls(), 1);
    assert_eq!(first.questions, second.questions);
    assert_eq!(first.generated_by_fallback, second.generated_by_fallback);
  }

  #[tokio::test]
  async fn hard_request_downgrades_to_medium_exactly_once() {
    let backend = Arc::new(ScriptedGenerator::replying(&["   ", TECH_TRENDS]));
    let quiz = generator(Some(backend.clone()));
    let set = quiz.generate_quiz_questions("Tech Trends", "hard").await;

    assert!(!set.generated_by_fallback);
    assert_eq!(set.requested_difficulty, Difficulty::Hard);
    assert_eq!(set.effective_difficulty, Difficulty::Medium);
    assert!(set.questions.iter().all(|q| q.difficulty_tag == Difficulty::Medium));
    let models: Vec<String> = backend.seen().into_iter().map(|(m, _, _)| m).collect();
    assert_eq!(models, vec!["gemini-2.5-pro".to_string(), "gemini-2.5-flash".to_string()]);
  }

  #[tokio::test]
  async fn persistent_garbage_on_hard_falls_back_after_bounded_calls() {
    let backend = Arc::new(ScriptedGenerator::replying(&["no json here", "", "still nothing"]));
    let quiz = generator(Some(backend.clone()));
    let set = quiz.generate_quiz_questions("Wellness", "hard").await;

    // one hard attempt, then two at medium
    assert_eq!(backend.calls(), 3);
    assert!(set.generated_by_fallback);
    assert_eq!(set.effective_difficulty, Difficulty::Medium);
    assert!(set.questions.len() >= MIN_VALID_QUESTIONS);
    assert!(set.questions.iter().all(|q| q.is_valid() && q.generated_by_fallback));
  }

  #[tokio::test]
  async fn always_failing_backend_still_resolves_and_caches_fallback() {
    let backend = Arc::new(ScriptedGenerator::failing());
    let quiz = generator(Some(backend.clone()));
    let set = quiz.generate_quiz_questions("Tech Trends", "hard").await;

    // transport failures never downgrade
    assert_eq!(backend.calls(), 2);
    assert!(set.generated_by_fallback);
    assert_eq!(set.effective_difficulty, Difficulty::Hard);
    assert_eq!(set.questions[3].question_text, "Which company developed ChatGPT?");

    let again = quiz.generate_quiz_questions("tech trends", "hard").await;
    assert_eq!(backend.calls(), 2);
    assert_eq!(again, set);
  }

  #[tokio::test]
  async fn too_few_valid_items_is_retried() {
    let two_valid = r#"[
      {"question": "What is the first valid question?", "options": ["a","b","c","d"], "correctAnswer": 0},
      {"question": "What is the second valid question?", "options": ["a","b","c","d"], "correctAnswer": 1},
      {"question": "short?", "options": ["a","b","c","d"], "correctAnswer": 1}
    ]"#;
    let backend = Arc::new(ScriptedGenerator::replying(&[two_valid, TECH_TRENDS]));
    let quiz = generator(Some(backend.clone()));
    let set = quiz.generate_quiz_questions("Movies", "easy").await;
    assert_eq!(backend.calls(), 2);
    assert!(!set.generated_by_fallback);
    assert_eq!(set.effective_difficulty, Difficulty::Easy);
  }

  #[tokio::test]
  async fn no_backend_and_blank_topic_skip_model_calls() {
    let quiz = generator(None);
    let set = quiz.generate_quiz_questions("Geography & Travel", "mixed").await;
    assert!(set.generated_by_fallback);
    assert_eq!(set.effective_difficulty, Difficulty::Mixed);
    assert_eq!(quiz.cache().len().await, 1);

    let backend = Arc::new(ScriptedGenerator::replying(&[TECH_TRENDS]));
    let quiz = generator(Some(backend.clone()));
    let blank = quiz.generate_quiz_questions("   ", "easy").await;
    assert_eq!(backend.calls(), 0);
    assert!(blank.generated_by_fallback);
    assert!(!blank.questions.is_empty());
  }

  #[tokio::test]
  async fn clear_cache_forces_regeneration() {
    let backend = Arc::new(ScriptedGenerator::replying(&[TECH_TRENDS, TECH_TRENDS]));
    let quiz = generator(Some(backend.clone()));
    quiz.generate_quiz_questions("Sports", "medium").await;
    assert_eq!(quiz.clear_cache().await, 1);
    quiz.generate_quiz_questions("Sports", "medium").await;
    assert_eq!(backend.calls(), 2);
  }
}
