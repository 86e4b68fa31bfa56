//! Static fallback question sets, used when generation is unavailable or
//! every attempt failed.

use std::collections::HashMap;

use tracing::warn;

use crate::config::FallbackSetCfg;
use crate::domain::{Difficulty, QuizQuestion, MIN_VALID_QUESTIONS};

/// Topic used when nothing in the table matches.
pub const GENERIC_TOPIC: &str = "general knowledge";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedQuestion {
  pub question: String,
  pub options: Vec<String>,
  pub correct: u8,
}

impl SeedQuestion {
  fn new(question: &str, options: [&str; 4], correct: u8) -> Self {
    Self { question: question.into(), options: options.iter().map(|o| o.to_string()).collect(), correct }
  }

  fn to_question(&self, difficulty: Difficulty) -> QuizQuestion {
    QuizQuestion {
      question_text: self.question.clone(),
      options: self.options.clone(),
      correct_option_index: self.correct,
      difficulty_tag: difficulty,
      generated_by_fallback: true,
    }
  }
}

/// Topic-keyed fallback table. Keys are lowercased and trimmed.
#[derive(Clone, Debug)]
pub struct FallbackBank {
  sets: HashMap<String, Vec<SeedQuestion>>,
}

impl FallbackBank {
  pub fn builtin() -> Self {
    Self { sets: seed_question_sets() }
  }

  /// Built-in sets plus configured ones; configured topics replace built-in ones.
  pub fn with_configured(cfg: &[FallbackSetCfg]) -> Self {
    let mut bank = Self::builtin();
    for set in cfg {
      let topic = set.topic.trim().to_lowercase();
      let questions: Vec<SeedQuestion> = set
        .questions
        .iter()
        .map(|q| SeedQuestion { question: q.question.clone(), options: q.options.clone(), correct: q.correct_answer })
        .filter(|q| {
          let ok = q.to_question(Difficulty::Medium).is_valid();
          if !ok {
            warn!(target: "quiz", %topic, question = %q.question, "Skipping invalid configured fallback question");
          }
          ok
        })
        .collect();
      if topic.is_empty() || questions.len() < MIN_VALID_QUESTIONS {
        warn!(target: "quiz", %topic, usable = questions.len(), "Skipping configured fallback set");
        continue;
      }
      bank.sets.insert(topic, questions);
    }
    bank
  }

  pub fn topics(&self) -> Vec<&str> {
    let mut topics: Vec<&str> = self.sets.keys().map(String::as_str).collect();
    topics.sort_unstable();
    topics
  }

  /// Exact topic match first, then a table topic contained in the request
  /// ("Wellness & Health" -> "wellness"), then the generic set.
  pub fn lookup(&self, topic: &str) -> &[SeedQuestion] {
    let key = topic.trim().to_lowercase();
    if let Some(set) = self.sets.get(&key) {
      return set;
    }
    let mut contained: Vec<(&String, &Vec<SeedQuestion>)> = self
      .sets
      .iter()
      .filter(|(k, _)| k.as_str() != GENERIC_TOPIC && !key.is_empty() && key.contains(k.as_str()))
      .collect();
    // Longest key wins so "world history" beats "history".
    contained.sort_by_key(|(k, _)| std::cmp::Reverse(k.len()));
    if let Some((_, set)) = contained.first() {
      return set;
    }
    self.sets.get(GENERIC_TOPIC).map(Vec::as_slice).unwrap_or(&[])
  }

  pub fn questions_for(&self, topic: &str, difficulty: Difficulty) -> Vec<QuizQuestion> {
    self.lookup(topic).iter().map(|q| q.to_question(difficulty)).collect()
  }
}

impl Default for FallbackBank {
  fn default() -> Self {
    Self::builtin()
  }
}

fn seed_question_sets() -> HashMap<String, Vec<SeedQuestion>> {
  let mut sets = HashMap::new();
  sets.insert(
    GENERIC_TOPIC.to_string(),
    vec![
      SeedQuestion::new("How many continents are there on Earth?", ["5", "6", "7", "8"], 2),
      SeedQuestion::new("What is the largest ocean on Earth?", ["Atlantic", "Indian", "Arctic", "Pacific"], 3),
      SeedQuestion::new("Which planet is known as the Red Planet?", ["Venus", "Mars", "Jupiter", "Saturn"], 1),
      SeedQuestion::new("How many days are there in a leap year?", ["364", "365", "366", "367"], 2),
      SeedQuestion::new("Which language has the most native speakers?", ["English", "Spanish", "Hindi", "Mandarin Chinese"], 3),
    ],
  );
  sets.insert(
    "wellness".to_string(),
    vec![
      SeedQuestion::new("What is the recommended daily water intake for adults?", ["1-2 liters", "2-3 liters", "3-4 liters", "4-5 liters"], 1),
      SeedQuestion::new("Which of these is NOT a stress management technique?", ["Meditation", "Deep breathing", "Procrastination", "Exercise"], 2),
      SeedQuestion::new("How many hours of sleep do adults typically need?", ["4-5 hours", "5-6 hours", "7-9 hours", "10-12 hours"], 2),
      SeedQuestion::new("Which vitamin is produced when skin is exposed to sunlight?", ["Vitamin A", "Vitamin B", "Vitamin C", "Vitamin D"], 3),
      SeedQuestion::new(
        "What is mindfulness?",
        ["Focusing on future goals", "Paying attention to present moment", "Remembering past experiences", "Multitasking efficiently"],
        1,
      ),
    ],
  );
  sets.insert(
    "tech trends".to_string(),
    vec![
      SeedQuestion::new(
        "What does AI stand for in technology?",
        ["Automated Intelligence", "Artificial Intelligence", "Advanced Interface", "Algorithmic Integration"],
        1,
      ),
      SeedQuestion::new("Which technology is primarily associated with Web3?", ["Cloud Computing", "Blockchain", "Virtual Reality", "5G Networks"], 1),
      SeedQuestion::new(
        "What is the main purpose of quantum computing?",
        ["Faster video rendering", "Solving complex problems traditional computers can't handle", "Better internet browsing", "Improved mobile gaming"],
        1,
      ),
      SeedQuestion::new("Which company developed ChatGPT?", ["Google", "Microsoft", "OpenAI", "Meta"], 2),
      SeedQuestion::new(
        "What does IoT stand for?",
        ["Internet of Things", "Integration of Technology", "International Online Transfer", "Interactive Operating Terminal"],
        0,
      ),
    ],
  );
  sets.insert(
    "science".to_string(),
    vec![
      SeedQuestion::new("What is the chemical symbol for gold?", ["Ag", "Au", "Gd", "Go"], 1),
      SeedQuestion::new("Which gas do plants absorb for photosynthesis?", ["Oxygen", "Nitrogen", "Carbon dioxide", "Helium"], 2),
      SeedQuestion::new("What is the speed of light in a vacuum (approx.)?", ["300 km/s", "3,000 km/s", "300,000 km/s", "3,000,000 km/s"], 2),
      SeedQuestion::new("Which organ pumps blood through the human body?", ["Lungs", "Liver", "Heart", "Kidneys"], 2),
      SeedQuestion::new("What is the powerhouse of the cell?", ["Nucleus", "Ribosome", "Mitochondria", "Golgi apparatus"], 2),
    ],
  );
  sets.insert(
    "history".to_string(),
    vec![
      SeedQuestion::new("In which year did World War II end?", ["1943", "1944", "1945", "1946"], 2),
      SeedQuestion::new("Who was the first President of the United States?", ["Thomas Jefferson", "George Washington", "John Adams", "Abraham Lincoln"], 1),
      SeedQuestion::new("Which ancient civilization built the pyramids of Giza?", ["Romans", "Greeks", "Egyptians", "Mayans"], 2),
      SeedQuestion::new("The Berlin Wall fell in which year?", ["1987", "1989", "1991", "1993"], 1),
      SeedQuestion::new("Which empire was ruled by Julius Caesar?", ["Ottoman", "Roman", "Persian", "Mongol"], 1),
    ],
  );
  sets
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::FallbackQuestionCfg;

  #[test]
  fn builtin_sets_satisfy_question_invariant() {
    let bank = FallbackBank::builtin();
    for topic in bank.topics() {
      let questions = bank.questions_for(topic, Difficulty::Easy);
      assert!(questions.len() >= MIN_VALID_QUESTIONS, "{topic}");
      for q in &questions {
        assert!(q.is_valid(), "{topic}: {}", q.question_text);
        assert!(q.generated_by_fallback);
      }
    }
  }

  #[test]
  fn lookup_matches_exact_contained_then_generic() {
    let bank = FallbackBank::builtin();
    assert_eq!(bank.lookup(" Tech Trends ")[3].question, "Which company developed ChatGPT?");
    assert_eq!(bank.lookup("Wellness & Health")[0].options[1], "2-3 liters");
    assert_eq!(bank.lookup("World History")[0].question, "In which year did World War II end?");
    assert_eq!(bank.lookup("Underwater Basket Weaving"), bank.lookup(GENERIC_TOPIC));
  }

  #[test]
  fn configured_sets_override_and_skip_invalid_entries() {
    let q = |text: &str, correct: u8| FallbackQuestionCfg {
      question: text.into(),
      options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
      correct_answer: correct,
    };
    let cfg = vec![
      FallbackSetCfg {
        topic: "Science".into(),
        questions: vec![q("Configured science question one?", 0), q("Configured science question two?", 1), q("Configured science question three?", 2)],
      },
      FallbackSetCfg { topic: "Sports".into(), questions: vec![q("Only one valid sports question?", 0), q("bad", 1), q("Out of range answer here?", 9)] },
    ];
    let bank = FallbackBank::with_configured(&cfg);
    assert_eq!(bank.lookup("science")[0].question, "Configured science question one?");
    assert_eq!(bank.lookup("Sports"), bank.lookup(GENERIC_TOPIC));
  }
}
