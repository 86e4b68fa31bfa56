//! Difficulty tier -> model id, sampling parameters and prompt guideline text.

use serde::Serialize;

use crate::config::ModelCatalog;
use crate::domain::Difficulty;
use crate::llm::SamplingConfig;

const EASY_GUIDELINES: &str = "- Focus on basic and fundamental facts (factual recall)
- Use simple, direct wording with no trick questions
- Wrong options should be clearly distinguishable from the correct one";

const MEDIUM_GUIDELINES: &str = "- Moderately challenging questions that test understanding, not just recall
- Mix definitions, cause/effect and simple application questions
- Wrong options should be plausible";

const HARD_GUIDELINES: &str = "- Advanced and detailed questions for someone with expert knowledge
- Prefer analysis, comparison and multi-step reasoning over single facts
- Wrong options should be close distractors that require careful thought";

const MIXED_GUIDELINES: &str = "- Varied difficulty levels across the set
- Exactly 2 easy (basic recall), 2 medium (understanding) and 1 hard (advanced analysis) question
- Shuffle the order so difficulty does not simply increase";

/// Everything a single generation attempt needs for one tier.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelProfile {
  pub model_id: String,
  pub sampling: SamplingConfig,
  pub guidelines: &'static str,
  pub display_label: &'static str,
}

/// Deterministic and distinct per tier. `easy` runs coldest, `hard` gets the
/// strong model and the largest token budget.
pub fn resolve(difficulty: Difficulty, catalog: &ModelCatalog) -> ModelProfile {
  let (model_id, temperature, max_output_tokens, top_p, guidelines) = match difficulty {
    Difficulty::Easy => (&catalog.standard, 0.2, 1500, 0.8, EASY_GUIDELINES),
    Difficulty::Medium => (&catalog.standard, 0.4, 2000, 0.9, MEDIUM_GUIDELINES),
    Difficulty::Hard => (&catalog.strong, 0.6, 3000, 0.95, HARD_GUIDELINES),
    Difficulty::Mixed => (&catalog.standard, 0.5, 2500, 0.9, MIXED_GUIDELINES),
  };
  ModelProfile {
    model_id: model_id.clone(),
    sampling: SamplingConfig { temperature, max_output_tokens, top_p },
    guidelines,
    display_label: difficulty.label(),
  }
}

/// Feedback runs on the fast model with a small budget.
pub fn feedback_profile(catalog: &ModelCatalog) -> (String, SamplingConfig) {
  (catalog.fast.clone(), SamplingConfig { temperature: 0.3, max_output_tokens: 200, top_p: 0.9 })
}

/// Connection self-test parameters.
pub fn probe_profile(catalog: &ModelCatalog) -> (String, SamplingConfig) {
  (catalog.fast.clone(), SamplingConfig { temperature: 0.1, max_output_tokens: 100, top_p: 0.9 })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tiers_are_distinct() {
    let catalog = ModelCatalog::gemini_defaults();
    let profiles: Vec<_> = Difficulty::ALL.iter().map(|d| resolve(*d, &catalog)).collect();
    for (i, a) in profiles.iter().enumerate() {
      for b in profiles.iter().skip(i + 1) {
        assert_ne!(a, b);
      }
    }
  }

  #[test]
  fn easy_is_coldest_and_hard_uses_strong_model() {
    let catalog = ModelCatalog::gemini_defaults();
    let easy = resolve(Difficulty::Easy, &catalog);
    let hard = resolve(Difficulty::Hard, &catalog);
    for d in Difficulty::ALL {
      assert!(easy.sampling.temperature <= resolve(d, &catalog).sampling.temperature);
    }
    assert_eq!(hard.model_id, catalog.strong);
    assert!(hard.sampling.max_output_tokens > resolve(Difficulty::Medium, &catalog).sampling.max_output_tokens);
  }

  #[test]
  fn unknown_tier_routes_like_medium() {
    let catalog = ModelCatalog::openai_defaults();
    assert_eq!(
      resolve(Difficulty::parse_lossy("impossible"), &catalog),
      resolve(Difficulty::Medium, &catalog)
    );
  }

  #[test]
  fn mixed_requests_two_two_one_blend() {
    let mixed = resolve(Difficulty::Mixed, &ModelCatalog::gemini_defaults());
    assert!(mixed.guidelines.contains("2 easy"));
    assert!(mixed.guidelines.contains("1 hard"));
    assert_eq!(mixed.display_label, "Mixed");
  }
}
