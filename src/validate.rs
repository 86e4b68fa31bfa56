//! Structural acceptance of a parsed candidate set.
//!
//! Partial success is accepted: a set passes when at least
//! `MIN_VALID_QUESTIONS` candidates satisfy the question invariant, whatever
//! the total length. Only those candidates become typed questions.

use crate::domain::{Difficulty, QuizQuestion, MIN_VALID_QUESTIONS};
use crate::error::GenerationError;
use crate::parser::CandidateQuestion;

pub fn count_valid(candidates: &[CandidateQuestion]) -> usize {
  candidates.iter().filter(|c| c.is_well_formed()).count()
}

pub fn validate_candidates(
  candidates: &[CandidateQuestion],
  difficulty: Difficulty,
) -> Result<Vec<QuizQuestion>, GenerationError> {
  let valid = count_valid(candidates);
  if valid < MIN_VALID_QUESTIONS {
    return Err(GenerationError::Validation { valid, required: MIN_VALID_QUESTIONS });
  }
  Ok(candidates.iter().filter_map(|c| c.to_question(difficulty, false)).collect())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn candidate(q: &str, answer: i64) -> CandidateQuestion {
    CandidateQuestion {
      question: Some(q.into()),
      options: Some(vec!["A".into(), "B".into(), "C".into(), "D".into()]),
      correct_answer: Some(answer),
    }
  }

  #[test]
  fn accepts_partial_sets_of_three() {
    let set = vec![
      candidate("What is the first question here?", 0),
      candidate("What is the second question here?", 1),
      candidate("short", 1),
      candidate("What is the fourth question here?", 3),
    ];
    let questions = validate_candidates(&set, Difficulty::Hard).unwrap();
    assert_eq!(questions.len(), 3);
    assert!(questions.iter().all(|q| q.difficulty_tag == Difficulty::Hard && !q.generated_by_fallback));
  }

  #[test]
  fn rejects_sets_with_fewer_than_three_valid() {
    let mut missing_options = candidate("What has no options at all?", 0);
    missing_options.options = None;
    let set = vec![
      candidate("What is the first question here?", 0),
      candidate("What is an out of range answer?", 4),
      missing_options,
      candidate("What is the last question here?", 2),
    ];
    assert_eq!(
      validate_candidates(&set, Difficulty::Medium).unwrap_err(),
      GenerationError::Validation { valid: 2, required: 3 }
    );
  }

  #[test]
  fn blank_option_fails_invariant() {
    let mut c = candidate("Which option here is blank?", 0);
    c.options = Some(vec!["A".into(), " ".into(), "C".into(), "D".into()]);
    assert_eq!(count_valid(&[c]), 0);
  }
}
