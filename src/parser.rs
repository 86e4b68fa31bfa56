//! Multi-strategy extraction of candidate questions from model text.
//!
//! Strategies run in order and the first one producing a non-empty candidate
//! list wins:
//!   1. direct JSON parse
//!   2. backtick stripping + array-of-objects search
//!   3. syntax repair (unquoted keys, single quotes, trailing commas)
//!   4. regex reconstruction of question/options/correctAnswer triples
//!   5. line-oriented salvage
//!
//! Each strategy is a pure `&str -> Result<Vec<CandidateQuestion>, ParseError>`;
//! no strategy sees another one's output.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::{
  Difficulty, QuizQuestion, MIN_QUESTION_CHARS, MIN_VALID_QUESTIONS, OPTION_COUNT,
};
use crate::error::ParseError;

/// Line salvage is the last resort and accepts smaller hauls.
const MIN_SALVAGED_ITEMS: usize = 2;

/// A parsed item not yet checked against the question invariant.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CandidateQuestion {
  pub question: Option<String>,
  pub options: Option<Vec<String>>,
  pub correct_answer: Option<i64>,
}

impl CandidateQuestion {
  pub fn is_well_formed(&self) -> bool {
    let question_ok = self
      .question
      .as_deref()
      .map_or(false, |q| q.trim().chars().count() > MIN_QUESTION_CHARS);
    let options_ok = self.options.as_ref().map_or(false, |opts| {
      opts.len() == OPTION_COUNT && opts.iter().all(|o| !o.trim().is_empty())
    });
    let answer_ok = self
      .correct_answer
      .map_or(false, |idx| idx >= 0 && (idx as usize) < OPTION_COUNT);
    question_ok && options_ok && answer_ok
  }

  /// Typed question for well-formed candidates; `None` otherwise.
  pub fn to_question(&self, difficulty: Difficulty, generated_by_fallback: bool) -> Option<QuizQuestion> {
    if !self.is_well_formed() {
      return None;
    }
    Some(QuizQuestion {
      question_text: self.question.as_deref()?.trim().to_string(),
      options: self.options.as_ref()?.iter().map(|o| o.trim().to_string()).collect(),
      correct_option_index: self.correct_answer? as u8,
      difficulty_tag: difficulty,
      generated_by_fallback,
    })
  }
}

pub type Strategy = fn(&str) -> Result<Vec<CandidateQuestion>, ParseError>;

pub const STRATEGIES: [(&str, Strategy); 5] = [
  ("direct", parse_direct),
  ("stripped", parse_stripped),
  ("repaired", parse_repaired),
  ("pattern", parse_by_pattern),
  ("line_salvage", parse_line_salvage),
];

#[derive(Debug)]
pub struct ParseOutcome {
  /// 1-based position of the winning strategy.
  pub attempt: usize,
  pub strategy: &'static str,
  pub candidates: Vec<CandidateQuestion>,
}

/// Run every strategy left to right, short-circuiting on the first non-empty result.
pub fn parse_candidates(text: &str) -> Result<ParseOutcome, ParseError> {
  if text.trim().is_empty() {
    return Err(ParseError::Empty);
  }
  for (idx, (name, strategy)) in STRATEGIES.iter().enumerate() {
    match strategy(text) {
      Ok(candidates) if !candidates.is_empty() => {
        debug!(target: "quiz", strategy = %name, attempt = idx + 1, count = candidates.len(), "Parsing strategy succeeded");
        return Ok(ParseOutcome { attempt: idx + 1, strategy: *name, candidates });
      }
      Ok(_) => debug!(target: "quiz", strategy = %name, "Parsing strategy produced no items"),
      Err(e) => debug!(target: "quiz", strategy = %name, error = %e, "Parsing strategy failed"),
    }
  }
  Err(ParseError::Exhausted)
}

// -------- Strategy 1-3: structured JSON --------

fn parse_direct(text: &str) -> Result<Vec<CandidateQuestion>, ParseError> {
  let value: Value =
    serde_json::from_str(text.trim()).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
  candidates_from_value(value)
}

static ARRAY_OF_OBJECTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[\s*\{.*\}\s*\]").unwrap());

fn strip_backticks(text: &str) -> String {
  text.chars().filter(|c| *c != '`').collect()
}

fn parse_stripped(text: &str) -> Result<Vec<CandidateQuestion>, ParseError> {
  let stripped = strip_backticks(text);
  let array = ARRAY_OF_OBJECTS.find(&stripped).ok_or(ParseError::NoArray)?;
  parse_direct(array.as_str())
}

fn parse_repaired(text: &str) -> Result<Vec<CandidateQuestion>, ParseError> {
  let stripped = strip_backticks(text);
  let scope = match (stripped.find('['), stripped.rfind(']')) {
    (Some(first), Some(last)) if first < last => &stripped[first..=last],
    _ => stripped.as_str(),
  };
  parse_direct(&repair_json_syntax(scope))
}

/// Accept a bare array, an object wrapping the array, or a single question object.
fn candidates_from_value(value: Value) -> Result<Vec<CandidateQuestion>, ParseError> {
  let items = match value {
    Value::Array(items) => items,
    Value::Object(mut object) => {
      let wrapped = ["questions", "quiz", "items", "data"]
        .iter()
        .find_map(|key| match object.remove(*key) {
          Some(Value::Array(items)) => Some(items),
          _ => None,
        });
      match wrapped {
        Some(items) => items,
        None if object.keys().any(|k| k.to_ascii_lowercase().contains("question")) => {
          vec![Value::Object(object)]
        }
        None => return Err(ParseError::NoArray),
      }
    }
    _ => return Err(ParseError::NoArray),
  };

  Ok(
    items
      .into_iter()
      .filter_map(|item| match item {
        Value::Object(object) => Some(candidate_from_object(&object)),
        _ => None,
      })
      .collect(),
  )
}

fn candidate_from_object(object: &Map<String, Value>) -> CandidateQuestion {
  let mut candidate = CandidateQuestion::default();
  let mut raw_answer: Option<&Value> = None;

  for (key, value) in object {
    let key = key.to_ascii_lowercase().replace(['_', '-', ' '], "");
    match key.as_str() {
      "question" | "questiontext" | "q" | "prompt" => {
        if candidate.question.is_none() {
          candidate.question = value.as_str().map(|s| s.trim().to_string());
        }
      }
      "options" | "choices" | "answers" => {
        if let Value::Array(opts) = value {
          candidate.options = Some(opts.iter().filter_map(value_to_text).collect());
        }
      }
      "correctanswer" | "correct" | "answer" | "correctoptionindex" | "correctindex" | "answerindex" => {
        if raw_answer.is_none() {
          raw_answer = Some(value);
        }
      }
      _ => {}
    }
  }

  candidate.correct_answer = raw_answer.and_then(|value| match value {
    Value::Number(n) => n.as_i64(),
    Value::String(s) => answer_index(s, candidate.options.as_deref()),
    _ => None,
  });
  candidate
}

fn value_to_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.trim().to_string()),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

/// Digit, option letter (`B`, `b)`, `C.`), or the exact text of one option.
fn answer_index(raw: &str, options: Option<&[String]>) -> Option<i64> {
  let s = raw.trim().trim_matches(|c: char| c == '"' || c == '\'' || c == ',').trim();
  let number = s.parse::<i64>().ok();
  if let Some(n) = number.filter(|n| (0..OPTION_COUNT as i64).contains(n)) {
    return Some(n);
  }
  let mut chars = s.chars();
  if let Some(first) = chars.next() {
    let rest = chars.as_str().trim();
    if first.is_ascii_alphabetic() && (rest.is_empty() || rest.starts_with(')') || rest.starts_with('.')) {
      let idx = first.to_ascii_uppercase() as i64 - 'A' as i64;
      if (0..OPTION_COUNT as i64).contains(&idx) {
        return Some(idx);
      }
    }
  }
  options
    .and_then(|opts| opts.iter().position(|o| o.trim().eq_ignore_ascii_case(s)))
    .map(|idx| idx as i64)
    .or(number)
}

/// Rewrite near-JSON into JSON: quote bare object keys, turn single-quoted
/// strings into double-quoted ones and drop commas before `}`/`]`.
/// Double-quoted strings are copied untouched.
pub fn repair_json_syntax(input: &str) -> String {
  let chars: Vec<char> = input.chars().collect();
  let len = chars.len();
  let mut out = String::with_capacity(input.len() + 32);
  let mut i = 0;

  while i < len {
    let c = chars[i];
    match c {
      '"' => {
        let end = string_end(&chars, i);
        out.extend(&chars[i..end]);
        i = end;
      }
      '\'' => {
        out.push('"');
        i += 1;
        while i < len {
          let ch = chars[i];
          if ch == '\\' && i + 1 < len {
            if chars[i + 1] == '\'' {
              out.push('\'');
            } else {
              out.push(ch);
              out.push(chars[i + 1]);
            }
            i += 2;
            continue;
          }
          if ch == '\'' && closes_single_quoted(&chars, i + 1) {
            i += 1;
            break;
          }
          if ch == '"' {
            out.push_str("\\\"");
          } else {
            out.push(ch);
          }
          i += 1;
        }
        out.push('"');
      }
      ',' if matches!(next_significant(&chars, i + 1), Some('}') | Some(']')) => {
        i += 1;
      }
      c if (c.is_alphabetic() || c == '_') && matches!(last_significant(&out), Some('{') | Some(',')) => {
        let start = i;
        while i < len && (chars[i].is_alphanumeric() || chars[i] == '_') {
          i += 1;
        }
        let ident: String = chars[start..i].iter().collect();
        if next_significant(&chars, i) == Some(':') {
          out.push('"');
          out.push_str(&ident);
          out.push('"');
        } else {
          out.push_str(&ident);
        }
      }
      _ => {
        out.push(c);
        i += 1;
      }
    }
  }
  out
}

/// Index just past the closing quote of the string starting at `start`.
fn string_end(chars: &[char], start: usize) -> usize {
  let mut i = start + 1;
  while i < chars.len() {
    match chars[i] {
      '\\' => i += 2,
      '"' => return i + 1,
      _ => i += 1,
    }
  }
  chars.len()
}

/// An apostrophe only closes a single-quoted string when JSON punctuation follows.
fn closes_single_quoted(chars: &[char], from: usize) -> bool {
  matches!(next_significant(chars, from), None | Some(',') | Some(']') | Some('}') | Some(':'))
}

fn next_significant(chars: &[char], from: usize) -> Option<char> {
  chars.iter().skip(from).copied().find(|c| !c.is_whitespace())
}

fn last_significant(out: &str) -> Option<char> {
  out.chars().rev().find(|c| !c.is_whitespace())
}

// -------- Strategy 4: regex reconstruction --------

static STRICT_TRIPLE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r#"(?s)"question"\s*:\s*(?P<q>"(?:[^"\\]|\\.)*")[^{}]*?"options"\s*:\s*\[(?P<opts>[^\]]*)\][^{}]*?"correctAnswer"\s*:\s*"?(?P<ans>\d+)"?"#,
  )
  .unwrap()
});

static LOOSE_TRIPLE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r#"(?is)['"]?question(?:_?text)?['"]?\s*[:=]\s*(?P<q>"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|[^,\n{}\[\]]+)[^{}]*?['"]?(?:options|choices)['"]?\s*[:=]\s*\[(?P<opts>[^\]]*)\][^{}]*?['"]?correct(?:_?answer|_?index|_?option)?['"]?\s*[:=]\s*['"]?(?P<ans>\d+|[a-d]\b)"#,
  )
  .unwrap()
});

static ANSWER_FIRST_TRIPLE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(
    r#"(?is)['"]?question(?:_?text)?['"]?\s*[:=]\s*(?P<q>"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|[^,\n{}\[\]]+)[^{}]*?['"]?correct(?:_?answer|_?index|_?option)?['"]?\s*[:=]\s*['"]?(?P<ans>\d+|[a-d]\b)[^{}]*?['"]?(?:options|choices)['"]?\s*[:=]\s*\[(?P<opts>[^\]]*)\]"#,
  )
  .unwrap()
});

static QUOTED_ITEM: Lazy<Regex> =
  Lazy::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)'"#).unwrap());

fn parse_by_pattern(text: &str) -> Result<Vec<CandidateQuestion>, ParseError> {
  let mut seen = HashSet::new();
  let mut items = Vec::new();

  for pattern in [&*STRICT_TRIPLE, &*LOOSE_TRIPLE, &*ANSWER_FIRST_TRIPLE] {
    for caps in pattern.captures_iter(text) {
      let candidate = candidate_from_captures(&caps);
      let Some(key) = candidate.question.as_ref().map(|q| q.trim().to_lowercase()) else {
        continue;
      };
      if candidate.is_well_formed() && seen.insert(key) {
        items.push(candidate);
      }
    }
  }

  if items.len() < MIN_VALID_QUESTIONS {
    return Err(ParseError::TooFewItems { found: items.len(), required: MIN_VALID_QUESTIONS });
  }
  Ok(items)
}

fn candidate_from_captures(caps: &Captures<'_>) -> CandidateQuestion {
  let question = caps.name("q").map(|m| unquote(m.as_str()));
  let options = caps.name("opts").map(|m| split_options(m.as_str()));
  let correct_answer = caps
    .name("ans")
    .and_then(|m| answer_index(m.as_str(), options.as_deref()));
  CandidateQuestion { question, options, correct_answer }
}

fn split_options(inner: &str) -> Vec<String> {
  let quoted: Vec<String> = QUOTED_ITEM
    .captures_iter(inner)
    .filter_map(|c| c.get(1).or_else(|| c.get(2)))
    .map(|m| unescape(m.as_str()))
    .collect();
  if !quoted.is_empty() {
    return quoted;
  }
  inner
    .split(',')
    .map(|s| s.trim().to_string())
    .filter(|s| !s.is_empty())
    .collect()
}

fn unquote(raw: &str) -> String {
  let s = raw.trim().trim_end_matches(',').trim();
  let inner = s
    .strip_prefix('"')
    .and_then(|r| r.strip_suffix('"'))
    .or_else(|| s.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')))
    .unwrap_or(s);
  unescape(inner).trim().to_string()
}

fn unescape(inner: &str) -> String {
  serde_json::from_str::<String>(&format!("\"{}\"", inner)).unwrap_or_else(|_| inner.replace("\\'", "'"))
}

// -------- Strategy 5: line salvage --------

static QUESTION_LINE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r#"(?i)^['"]?(?:question(?:_?text)?|q\d+)['"]?\s*[:=.)]\s*(?P<q>.+)$"#).unwrap()
});
static NUMBERED_QUESTION: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^\d+[.)]\s+(?P<q>.+\?)$").unwrap());
static OPTIONS_LINE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r#"(?i)^['"]?(?:options|choices)['"]?\s*[:=]\s*(?P<rest>.*)$"#).unwrap());
static ANSWER_LINE: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r#"(?i)^['"]?(?:correct(?:[ _]?answer|_?index|_?option)?|answer)['"]?\s*[:=]\s*(?P<a>.+)$"#).unwrap()
});
static OPTION_BULLET: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^(?:[-*•]|[A-Da-d][.)]|\d[.)])\s+").unwrap());

fn parse_line_salvage(text: &str) -> Result<Vec<CandidateQuestion>, ParseError> {
  let mut items: Vec<CandidateQuestion> = Vec::new();
  let mut current: Option<CandidateQuestion> = None;
  let mut collecting_options = false;

  for raw_line in text.lines() {
    let line = raw_line
      .trim()
      .trim_start_matches(['{', '['])
      .trim_end_matches([',', '}'])
      .trim();
    if line.is_empty() {
      continue;
    }

    if let Some(q) = question_from_line(line) {
      if let Some(done) = current.take() {
        items.push(done);
      }
      current = Some(CandidateQuestion { question: Some(q), ..Default::default() });
      collecting_options = false;
      continue;
    }

    let Some(cur) = current.as_mut() else { continue };

    if let Some(caps) = ANSWER_LINE.captures(line) {
      cur.correct_answer = answer_index(&caps["a"], cur.options.as_deref());
      collecting_options = false;
      continue;
    }

    if let Some(caps) = OPTIONS_LINE.captures(line) {
      let rest = &caps["rest"];
      let inline = if rest.contains('[') {
        split_options(rest.trim_start_matches('[').trim_end_matches(']'))
      } else {
        Vec::new()
      };
      collecting_options = !(rest.contains('[') && rest.contains(']')) && inline.len() < OPTION_COUNT;
      cur.options = Some(inline);
      continue;
    }

    if collecting_options {
      if line.starts_with(']') {
        collecting_options = false;
        continue;
      }
      let option = OPTION_BULLET.replace(line, "");
      let option = unquote(option.trim_end_matches(']'));
      if !option.is_empty() {
        let opts = cur.options.get_or_insert_with(Vec::new);
        opts.push(option);
        if opts.len() >= OPTION_COUNT || line.ends_with(']') {
          collecting_options = false;
        }
      }
    }
  }
  if let Some(done) = current.take() {
    items.push(done);
  }

  if items.len() < MIN_SALVAGED_ITEMS {
    return Err(ParseError::TooFewItems { found: items.len(), required: MIN_SALVAGED_ITEMS });
  }
  Ok(items)
}

fn question_from_line(line: &str) -> Option<String> {
  let raw = QUESTION_LINE
    .captures(line)
    .or_else(|| NUMBERED_QUESTION.captures(line))
    .map(|caps| caps["q"].to_string())?;
  let q = unquote(&raw);
  if q.is_empty() {
    None
  } else {
    Some(q)
  }
}
