//! First-pass cleanup of raw model text before any parsing strategy runs.

use once_cell::sync::Lazy;
use regex::Regex;

static FENCE_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)```[ \t]*json[ \t]*\r?\n?").unwrap());
static FENCE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n?```").unwrap());
static TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",(\s*[\]}])").unwrap());

/// Strip markdown fences, cut to the outermost `[ ... ]` when present and
/// drop trailing commas before closing brackets/braces.
pub fn normalize_response(raw: &str) -> String {
  let mut cleaned = raw.trim().to_string();

  cleaned = FENCE_OPEN.replace_all(&cleaned, "").into_owned();
  cleaned = FENCE_CLOSE.replace_all(&cleaned, "").into_owned();
  cleaned = cleaned.replace("```", "");

  if let (Some(first), Some(last)) = (cleaned.find('['), cleaned.rfind(']')) {
    if first < last {
      cleaned = cleaned[first..=last].to_string();
    }
  }

  cleaned = TRAILING_COMMA.replace_all(&cleaned, "$1").into_owned();
  cleaned.trim().to_string()
}
