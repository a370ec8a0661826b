//! Domain models: generated scenarios (dialogues, vocabulary, quiz), role-play
//! chat messages, difficulty labels and the enumerated view state.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which screen the presentation layer should render.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
  #[default]
  Home,
  Loading,
  Scenario,
  RolePlay,
  /// Reserved; no transition leads here yet.
  #[allow(dead_code)]
  Settings,
}

/// CEFR-banded difficulty the lesson is written for.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Beginner,
  #[default]
  Intermediate,
  Advanced,
}

impl Difficulty {
  pub fn label(self) -> &'static str {
    match self {
      Difficulty::Beginner => "Beginner (A1-A2)",
      Difficulty::Intermediate => "Intermediate (B1-B2)",
      Difficulty::Advanced => "Advanced (C1-C2)",
    }
  }

  /// Parse a label such as "Intermediate (B1-B2)" or just "advanced".
  pub fn from_label(label: &str) -> Option<Self> {
    let head = label.trim().split_whitespace().next()?.to_ascii_lowercase();
    match head.as_str() {
      "beginner" => Some(Difficulty::Beginner),
      "intermediate" => Some(Difficulty::Intermediate),
      "advanced" => Some(Difficulty::Advanced),
      _ => None,
    }
  }
}

/// One spoken line of the scenario dialogue.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DialogueLine {
  pub speaker: String,
  pub text: String,
  #[serde(default)] pub translation: String,
  /// Playback-speed hint for text-to-speech (1.0 = normal).
  #[serde(default, rename = "audioSpeed", skip_serializing_if = "Option::is_none")]
  pub audio_speed: Option<f32>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Vocabulary {
  pub word: String,
  #[serde(default)] pub ipa: String,
  #[serde(default)] pub meaning: String,
  #[serde(default, rename = "partOfSpeech")] pub part_of_speech: String,
  #[serde(default)] pub example: String,
  #[serde(default)] pub example_translation: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QuizItem {
  pub question: String,
  pub answer: String,
  #[serde(default)] pub context: String,
}

/// A complete generated lesson. Never mutated after generation; a new
/// generation replaces it wholesale.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScenarioData {
  #[serde(default)] pub id: String,
  #[serde(default)] pub topic_cn: String,
  #[serde(default)] pub topic_en: String,
  #[serde(default)] pub difficulty: String,
  #[serde(default)] pub dialogues: Vec<DialogueLine>,
  #[serde(default)] pub vocabulary: Vec<Vocabulary>,
  #[serde(default)] pub quiz: Vec<QuizItem>,
}

impl ScenarioData {
  pub fn difficulty_level(&self) -> Option<Difficulty> {
    Difficulty::from_label(&self.difficulty)
  }

  /// Distinct speakers in order of first appearance.
  pub fn speakers(&self) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::new();
    for line in &self.dialogues {
      if !out.contains(&line.speaker.as_str()) {
        out.push(&line.speaker);
      }
    }
    out
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
  User,
  Model,
}

impl ChatRole {
  /// Role name on the generative-model wire.
  pub fn as_wire(self) -> &'static str {
    match self {
      ChatRole::User => "user",
      ChatRole::Model => "model",
    }
  }
}

/// One turn of the role-play exchange.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
  pub id: String,
  pub role: ChatRole,
  pub text: String,
  #[serde(default, rename = "isError", skip_serializing_if = "std::ops::Not::not")]
  pub is_error: bool,
}

impl ChatMessage {
  pub fn user(text: impl Into<String>) -> Self {
    Self { id: Uuid::new_v4().to_string(), role: ChatRole::User, text: text.into(), is_error: false }
  }

  pub fn model(text: impl Into<String>) -> Self {
    Self { id: Uuid::new_v4().to_string(), role: ChatRole::Model, text: text.into(), is_error: false }
  }

  pub fn model_error(text: impl Into<String>) -> Self {
    Self { is_error: true, ..Self::model(text) }
  }
}

/// Light/dark presentation theme, held only for the running session.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
  #[default]
  Light,
  Dark,
}

impl Theme {
  pub fn from_preference(prefers_dark: bool) -> Self {
    if prefers_dark { Theme::Dark } else { Theme::Light }
  }

  pub fn toggled(self) -> Self {
    match self {
      Theme::Light => Theme::Dark,
      Theme::Dark => Theme::Light,
    }
  }
}
