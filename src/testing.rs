//! Test fixtures: a sample lesson and scripted fakes for the model seams.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ChatMessage, DialogueLine, QuizItem, ScenarioData, Vocabulary};
use crate::error::GenerationError;
use crate::service::{RolePlayPartner, ScenarioGenerator};

pub fn sample_scenario(topic: &str) -> ScenarioData {
  ScenarioData {
    id: format!("id-{topic}"),
    topic_cn: "酒店入住".into(),
    topic_en: topic.into(),
    difficulty: "Intermediate (B1-B2)".into(),
    dialogues: vec![
      DialogueLine { speaker: "Clerk".into(), text: "Good evening!".into(), translation: "晚上好！".into(), audio_speed: Some(1.0) },
      DialogueLine { speaker: "Guest".into(), text: "I have a reservation.".into(), translation: "我有预订。".into(), audio_speed: None },
    ],
    vocabulary: vec![Vocabulary {
      word: "reservation".into(), ipa: "/ˌrɛzərˈveɪʃən/".into(), meaning: "预订".into(),
      part_of_speech: "noun".into(), example: "I made a reservation.".into(), example_translation: "我预订了。".into(),
    }],
    quiz: vec![
      QuizItem { question: "Q1".into(), answer: "A1".into(), context: "C1".into() },
      QuizItem { question: "Q2".into(), answer: "A2".into(), context: "C2".into() },
    ],
  }
}

pub enum Scripted {
  Lesson(ScenarioData),
  /// Generation: no lesson. Role-play: echo the last user message.
  Echo,
  Empty,
  Fail,
  Hang,
}

/// Generator/partner fake that replays scripted outcomes and counts calls.
pub struct FakeModel {
  pub key: bool,
  pub calls: AtomicUsize,
  script: Mutex<VecDeque<Scripted>>,
}

impl FakeModel {
  pub fn new(key: bool, script: Vec<Scripted>) -> Self {
    Self { key, calls: AtomicUsize::new(0), script: Mutex::new(script.into()) }
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  fn next(&self) -> Scripted {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.script.lock().unwrap().pop_front().unwrap_or(Scripted::Echo)
  }
}

#[async_trait]
impl ScenarioGenerator for FakeModel {
  fn has_api_key(&self) -> bool { self.key }

  async fn generate(&self, _topic: &str) -> Result<Option<ScenarioData>, GenerationError> {
    match self.next() {
      Scripted::Lesson(s) => Ok(Some(s)),
      Scripted::Echo | Scripted::Empty => Ok(None),
      Scripted::Fail => Err(GenerationError::Http { status: 503, message: "unavailable".into() }),
      Scripted::Hang => {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(None)
      }
    }
  }
}

#[async_trait]
impl RolePlayPartner for FakeModel {
  async fn reply(&self, _scenario: &ScenarioData, transcript: &[ChatMessage]) -> Result<String, GenerationError> {
    match self.next() {
      Scripted::Fail => Err(GenerationError::Http { status: 500, message: "boom".into() }),
      Scripted::Empty => Ok(String::new()),
      _ => Ok(format!("echo: {}", transcript.last().map(|m| m.text.as_str()).unwrap_or(""))),
    }
  }
}
