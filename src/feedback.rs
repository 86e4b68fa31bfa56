//! Post-quiz feedback text: one model call, templated text otherwise.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::{ModelCatalog, Prompts};
use crate::domain::Difficulty;
use crate::llm::TextGenerator;
use crate::model_router::feedback_profile;
use crate::util::{fill_template, trunc_for_log};

/// Generated feedback shorter than this (trimmed, in chars) is discarded.
const MIN_FEEDBACK_CHARS: usize = 5;

/// Rounded percentage for the prompt; `total == 0` counts as 0%.
pub fn percentage(score: u32, total: u32) -> u32 {
  if total == 0 {
    return 0;
  }
  ((score as f64 / total as f64) * 100.0).round() as u32
}

/// Feedback bands: 0%, under 50%, under 80%, under 100%, perfect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScoreBand {
  Zero,
  Low,
  Fair,
  High,
  Perfect,
}

/// Exact integer comparison, so 199/200 is not perfect and 1/300 is not zero.
pub fn score_band(score: u32, total: u32) -> ScoreBand {
  let (score, total) = (u64::from(score), u64::from(total));
  if total == 0 || score == 0 {
    ScoreBand::Zero
  } else if score * 2 < total {
    ScoreBand::Low
  } else if score * 5 < total * 4 {
    ScoreBand::Fair
  } else if score < total {
    ScoreBand::High
  } else {
    ScoreBand::Perfect
  }
}

/// Deterministic text for a score band.
pub fn fallback_feedback(score: u32, total: u32, topic: &str, difficulty: Difficulty) -> String {
  let topic = match topic.trim() {
    "" => "this topic",
    t => t,
  };
  let level = difficulty.label();
  match score_band(score, total) {
    ScoreBand::Zero => format!(
      "You scored {score}/{total} on {topic} ({level}). Every expert was once a beginner! Use this as motivation to learn more and try again. You've got this! 💪"
    ),
    ScoreBand::Low => format!(
      "You scored {score}/{total} on {topic} ({level}). Good effort! You're building your foundation. Review the material and you'll see great improvement next time! 📚"
    ),
    ScoreBand::Fair => format!(
      "You scored {score}/{total} on {topic} ({level}). Well done! You have a solid understanding. With a bit more practice you'll master this topic! 🌟"
    ),
    ScoreBand::High => format!(
      "You scored {score}/{total} on {topic} ({level}). Excellent work! You're very knowledgeable here. Keep up the great learning journey! 🎉"
    ),
    ScoreBand::Perfect => format!(
      "Perfect score! {score}/{total} on {topic} ({level}). Outstanding! You've mastered this topic. Try a harder level for a new challenge! 🏆"
    ),
  }
}

#[derive(Clone)]
pub struct FeedbackGenerator {
  backend: Option<Arc<dyn TextGenerator>>,
  catalog: ModelCatalog,
  prompts: Prompts,
}

impl FeedbackGenerator {
  pub fn new(backend: Option<Arc<dyn TextGenerator>>, catalog: ModelCatalog, prompts: Prompts) -> Self {
    Self { backend, catalog, prompts }
  }

  /// Never fails. No retries and no caching.
  #[instrument(level = "info", skip(self), fields(%score, %total, %topic, %difficulty))]
  pub async fn generate_feedback(&self, score: u32, total: u32, topic: &str, difficulty: &str) -> String {
    let difficulty = Difficulty::parse_lossy(difficulty);
    let Some(backend) = &self.backend else {
      return fallback_feedback(score, total, topic, difficulty);
    };

    let (model, sampling) = feedback_profile(&self.catalog);
    let score_s = score.to_string();
    let total_s = total.to_string();
    let pct_s = percentage(score, total).to_string();
    let prompt = fill_template(
      &self.prompts.feedback_template,
      &[
        ("topic", topic.trim()),
        ("difficulty_label", difficulty.label()),
        ("score", score_s.as_str()),
        ("total", total_s.as_str()),
        ("percentage", pct_s.as_str()),
      ],
    );

    match backend.generate(&model, &sampling, &prompt).await {
      Ok(text) if text.trim().chars().count() >= MIN_FEEDBACK_CHARS => {
        let text = text.trim().to_string();
        info!(target: "feedback", %model, preview = %trunc_for_log(&text, 80), "Generated feedback");
        text
      }
      Ok(text) => {
        warn!(target: "feedback", %model, len = text.trim().len(), "Feedback too short; using template");
        fallback_feedback(score, total, topic, difficulty)
      }
      Err(e) => {
        warn!(target: "feedback", %model, error = %e, "Feedback generation failed; using template");
        fallback_feedback(score, total, topic, difficulty)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::llm::scripted::ScriptedGenerator;

  fn feedback(backend: Option<Arc<ScriptedGenerator>>) -> FeedbackGenerator {
    FeedbackGenerator::new(
      backend.map(|b| b as Arc<dyn TextGenerator>),
      ModelCatalog::gemini_defaults(),
      Prompts::default(),
    )
  }

  #[test]
  fn zero_score_message_is_short_and_encouraging() {
    let text = fallback_feedback(0, 5, "Art & Culture", Difficulty::Easy);
    assert!(text.contains("0/5"));
    assert!(text.contains("Art & Culture"));
    assert!(text.contains("Beginner"));
    assert!(text.chars().count() < 300);
    for word in ["fail", "bad", "poor", "terrible", "wrong"] {
      assert!(!text.to_lowercase().contains(word), "{word}");
    }
  }

  #[test]
  fn each_band_has_its_own_message() {
    let texts: Vec<String> = [(0, 5), (2, 5), (3, 5), (4, 5), (5, 5)]
      .iter()
      .map(|(s, t)| fallback_feedback(*s, *t, "Sports", Difficulty::Medium))
      .collect();
    for (i, a) in texts.iter().enumerate() {
      assert!(a.chars().count() < 300);
      for b in texts.iter().skip(i + 1) {
        assert_ne!(a, b);
      }
    }
    assert!(texts[4].starts_with("Perfect score! 5/5"));
  }

  #[test]
  fn zero_total_and_blank_topic() {
    assert_eq!(percentage(3, 0), 0);
    assert_eq!(percentage(2, 3), 67);
    assert!(fallback_feedback(0, 0, "  ", Difficulty::Hard).contains("this topic"));
  }

  #[test]
  fn bands_use_exact_ratio_not_rounded_percentage() {
    assert_eq!(score_band(199, 200), ScoreBand::High);
    assert!(!fallback_feedback(199, 200, "Sports", Difficulty::Easy).starts_with("Perfect score!"));
    assert_eq!(score_band(1, 300), ScoreBand::Low);
    assert!(!fallback_feedback(1, 300, "Sports", Difficulty::Easy).contains("Every expert was once a beginner"));
    assert_eq!(score_band(99, 200), ScoreBand::Low);
    assert!(fallback_feedback(99, 200, "Sports", Difficulty::Easy).contains("Good effort!"));
    assert_eq!(score_band(100, 200), ScoreBand::Fair);
    assert_eq!(score_band(4, 5), ScoreBand::High);
    assert_eq!(score_band(0, 0), ScoreBand::Zero);
    assert_eq!(score_band(u32::MAX, u32::MAX), ScoreBand::Perfect);
  }

  #[tokio::test]
  async fn uses_trimmed_model_text_on_fast_model() {
    let backend = Arc::new(ScriptedGenerator::replying(&["  Nice work on Music & Instruments, keep going!  \n"]));
    let gen = feedback(Some(backend.clone()));
    let text = gen.generate_feedback(4, 5, "Music & Instruments", "hard").await;
    assert_eq!(text, "Nice work on Music & Instruments, keep going!");

    let (model, sampling, prompt) = backend.seen().remove(0);
    assert_eq!(model, "gemini-2.5-flash-lite");
    assert_eq!(sampling.max_output_tokens, 200);
    assert!(prompt.contains("Score: 4 out of 5"));
    assert!(prompt.contains("Percentage: 80%"));
    assert!(prompt.contains("Expert"));
  }

  #[tokio::test]
  async fn short_reply_error_or_no_backend_use_template() {
    let short = feedback(Some(Arc::new(ScriptedGenerator::replying(&["ok"]))));
    assert!(short.generate_feedback(1, 5, "Sports", "easy").await.contains("1/5"));

    let failing = Arc::new(ScriptedGenerator::failing());
    let text = feedback(Some(failing.clone())).generate_feedback(0, 5, "Sports", "easy").await;
    assert!(text.contains("0/5"));
    assert_eq!(failing.calls(), 1);

    let none = feedback(None);
    assert!(none.generate_feedback(5, 5, "Sports", "mixed").await.starts_with("Perfect score!"));
  }
}
