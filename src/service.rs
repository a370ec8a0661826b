//! Seams to the generative-model backend. The Gemini client implements both;
//! tests substitute deterministic fakes.

use async_trait::async_trait;

use crate::domain::{ChatMessage, ScenarioData};
use crate::error::GenerationError;

#[async_trait]
pub trait ScenarioGenerator: Send + Sync {
  /// Whether a credential is configured. Must be checked before `generate`.
  fn has_api_key(&self) -> bool;

  /// Synthesize a lesson for `topic`. `Ok(None)` means the model declined or
  /// returned nothing usable.
  async fn generate(&self, topic: &str) -> Result<Option<ScenarioData>, GenerationError>;
}

#[async_trait]
pub trait RolePlayPartner: Send + Sync {
  /// Produce the next model turn given the lesson and the transcript so far
  /// (the last message is the user's).
  async fn reply(&self, scenario: &ScenarioData, transcript: &[ChatMessage]) -> Result<String, GenerationError>;
}
