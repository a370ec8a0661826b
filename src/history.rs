//! Bounded recency list of submitted topics (most recent first, no duplicates).

use std::collections::VecDeque;

pub const HISTORY_CAP: usize = 5;

#[derive(Clone, Debug, Default)]
pub struct History {
  topics: VecDeque<String>,
}

impl History {
  /// Record a topic as the most recent. An existing equal entry moves to the
  /// front; anything past the cap falls off the back.
  pub fn record(&mut self, topic: &str) {
    if let Some(pos) = self.topics.iter().position(|t| t == topic) {
      self.topics.remove(pos);
    }
    self.topics.push_front(topic.to_string());
    self.topics.truncate(HISTORY_CAP);
  }

  pub fn to_vec(&self) -> Vec<String> {
    self.topics.iter().cloned().collect()
  }

  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.topics.len()
  }
}
