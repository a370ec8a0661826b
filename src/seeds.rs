//! Built-in content: the fixed suggested topics shown on the home screen.

use serde::Serialize;

pub const SUGGESTED_TOPICS: [&str; 4] = ["Hotel Check-in", "Business Meeting", "Asking Directions", "Job Interview"];

const SUGGESTION_LEVEL: &str = "Intermediate";

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Suggestion {
  pub topic: &'static str,
  pub icon: &'static str,
  pub level: &'static str,
}

/// Pick an icon for a topic by keyword.
pub fn icon_for_topic(topic: &str) -> &'static str {
  if topic.contains("Hotel") {
    "🏨"
  } else if topic.contains("Business") {
    "💼"
  } else if topic.contains("Directions") {
    "🗺️"
  } else {
    "🤝"
  }
}

pub fn suggestions() -> Vec<Suggestion> {
  SUGGESTED_TOPICS
    .iter()
    .map(|&topic| Suggestion { topic, icon: icon_for_topic(topic), level: SUGGESTION_LEVEL })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_suggestion_gets_its_own_icon() {
    let icons: Vec<_> = suggestions().iter().map(|s| s.icon).collect();
    assert_eq!(icons, vec!["🏨", "💼", "🗺️", "🤝"]);
  }

  #[test]
  fn icon_match_is_substring_based() {
    assert_eq!(icon_for_topic("Boutique Hotel Complaint"), "🏨");
    assert_eq!(icon_for_topic("Ordering Coffee"), "🤝");
    assert_eq!(icon_for_topic("hotel"), "🤝");
  }
}
