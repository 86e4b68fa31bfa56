//! In-process memo of produced question sets, keyed by normalized topic + tier.
//!
//! No eviction and no TTL. Two concurrent misses on the same key may both
//! generate; the last write wins and both results are valid.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::domain::QuestionSet;

#[derive(Clone, Default)]
pub struct QuestionCache {
  entries: Arc<RwLock<HashMap<String, QuestionSet>>>,
}

impl QuestionCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn get(&self, key: &str) -> Option<QuestionSet> {
    self.entries.read().await.get(key).cloned()
  }

  pub async fn insert(&self, key: String, set: QuestionSet) {
    debug!(target: "quiz", %key, fallback = set.generated_by_fallback, "Caching question set");
    self.entries.write().await.insert(key, set);
  }

  pub async fn len(&self) -> usize {
    self.entries.read().await.len()
  }

  /// Administrative/test use. Returns how many entries were dropped.
  pub async fn clear(&self) -> usize {
    let mut entries = self.entries.write().await;
    let n = entries.len();
    entries.clear();
    info!(target: "quiz", cleared = n, "Question cache cleared");
    n
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Difficulty;

  fn set(topic: &str) -> QuestionSet {
    QuestionSet {
      topic: topic.into(),
      requested_difficulty: Difficulty::Easy,
      effective_difficulty: Difficulty::Easy,
      generated_by_fallback: false,
      questions: vec![],
    }
  }

  #[tokio::test]
  async fn clones_share_entries_and_clear_empties() {
    let cache = QuestionCache::new();
    let shared = cache.clone();
    cache.insert("sports::easy".into(), set("Sports")).await;
    assert_eq!(shared.get("sports::easy").await.map(|s| s.topic), Some("Sports".to_string()));
    assert_eq!(shared.len().await, 1);
    assert_eq!(shared.clear().await, 1);
    assert!(cache.get("sports::easy").await.is_none());
  }
}
