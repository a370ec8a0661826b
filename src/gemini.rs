//! Minimal Gemini client for our use-cases.
//!
//! We only call `models/{model}:generateContent` and request either plain text
//! (role-play turns) or a JSON document (lesson generation).
//! Calls are instrumented and log model names, latencies, and token usage (not contents).
//!
//! NOTE: We never log the API key; response previews are truncated.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::{Prompts, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::domain::{ChatMessage, Difficulty, ScenarioData};
use crate::error::GenerationError;
use crate::service::{RolePlayPartner, ScenarioGenerator};
use crate::util::{fill_template, strip_code_fence, trunc_for_log};

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct Gemini {
  pub client: reqwest::Client,
  api_key: Option<String>,
  pub base_url: String,
  pub model: String,
  pub chat_model: String,
  pub prompts: Prompts,
  pub difficulty: Difficulty,
}

impl Gemini {
  /// Build the client from GEMINI_* env variables. A missing key is not an
  /// error: `has_api_key()` reports it and no request is ever sent.
  pub fn from_env(prompts: Prompts, difficulty: Difficulty, timeout: Duration) -> Result<Self, GenerationError> {
    let api_key = std::env::var("GEMINI_API_KEY").or_else(|_| std::env::var("API_KEY")).ok();
    let base_url = std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
    let chat_model = std::env::var("GEMINI_CHAT_MODEL").unwrap_or_else(|_| model.clone());
    Self::new(api_key, base_url, model, chat_model, prompts, difficulty, timeout)
  }

  pub fn new(
    api_key: Option<String>,
    base_url: impl Into<String>,
    model: impl Into<String>,
    chat_model: impl Into<String>,
    prompts: Prompts,
    difficulty: Difficulty,
    timeout: Duration,
  ) -> Result<Self, GenerationError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      api_key: api_key.filter(|k| !k.trim().is_empty()),
      base_url: base_url.into().trim_end_matches('/').to_string(),
      model: model.into(),
      chat_model: chat_model.into(),
      prompts,
      difficulty,
    })
  }

  /// One generateContent round trip. Returns the concatenated text of the
  /// first candidate, or None when the model produced nothing.
  #[instrument(level = "info", skip(self, system, contents), fields(model = %model, turns = contents.len()))]
  async fn generate_content(
    &self,
    model: &str,
    system: &str,
    contents: Vec<Content>,
    temperature: f32,
    json: bool,
  ) -> Result<Option<String>, GenerationError> {
    let api_key = self.api_key.as_deref().ok_or(GenerationError::MissingCredential)?;
    let url = format!("{}/models/{}:generateContent", self.base_url, model);
    let req = GenerateContentRequest {
      system_instruction: Content { role: None, parts: vec![Part { text: system.to_string() }] },
      contents,
      generation_config: GenerationConfig {
        temperature,
        response_mime_type: json.then(|| "application/json".to_string()),
      },
    };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "lingoflow-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(API_KEY_HEADER, api_key)
      .json(&req).send().await?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let message = extract_gemini_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
      error!(elapsed = ?start.elapsed(), %status, %message, "Gemini HTTP error");
      return Err(GenerationError::Http { status: status.as_u16(), message });
    }

    let body: GenerateContentResponse = res.json().await?;
    if let Some(usage) = &body.usage_metadata {
      info!(elapsed = ?start.elapsed(), prompt_tokens = ?usage.prompt_token_count, candidates_tokens = ?usage.candidates_token_count, total_tokens = ?usage.total_token_count, "Gemini usage");
    }
    if let Some(reason) = body.prompt_feedback.as_ref().and_then(|f| f.block_reason.as_deref()) {
      warn!(%reason, "Prompt blocked by the model");
      return Ok(None);
    }
    Ok(first_candidate_text(&body))
  }
}

#[async_trait]
impl ScenarioGenerator for Gemini {
  fn has_api_key(&self) -> bool {
    self.api_key.is_some()
  }

  #[instrument(level = "info", skip(self), fields(%topic, model = %self.model))]
  async fn generate(&self, topic: &str) -> Result<Option<ScenarioData>, GenerationError> {
    let difficulty = self.difficulty.label();
    let system = fill_template(&self.prompts.scenario_system, &[("difficulty", difficulty)]);
    let user = fill_template(&self.prompts.scenario_user_template, &[("topic", topic), ("difficulty", difficulty)]);

    let Some(text) = self.generate_content(&self.model, &system, vec![Content::user(user)], 0.7, true).await? else {
      return Ok(None);
    };
    let parsed = parse_scenario(&text).map_err(|e| {
      error!(error = %e, preview = %trunc_for_log(&text, 120), "Model output is not a valid scenario");
      e
    })?;

    if let Some(s) = &parsed {
      info!(id = %s.id, topic_en = %s.topic_en, dialogues = s.dialogues.len(), vocabulary = s.vocabulary.len(), quiz = s.quiz.len(), "Scenario successfully generated");
    }
    Ok(parsed)
  }
}

#[async_trait]
impl RolePlayPartner for Gemini {
  #[instrument(level = "info", skip(self, scenario, transcript), fields(id = %scenario.id, turns = transcript.len(), model = %self.chat_model))]
  async fn reply(&self, scenario: &ScenarioData, transcript: &[ChatMessage]) -> Result<String, GenerationError> {
    let system = roleplay_system(&self.prompts, scenario);
    let contents = transcript
      .iter()
      .filter(|m| !m.is_error)
      .map(|m| Content { role: Some(m.role.as_wire().into()), parts: vec![Part { text: m.text.clone() }] })
      .collect();
    let text = self.generate_content(&self.chat_model, &system, contents, 0.8, false).await?;
    Ok(text.unwrap_or_default().trim().to_string())
  }
}

fn roleplay_system(prompts: &Prompts, s: &ScenarioData) -> String {
  let speakers = s.speakers().join(", ");
  let vocabulary = s.vocabulary.iter().map(|v| v.word.as_str()).collect::<Vec<_>>().join(", ");
  fill_template(
    &prompts.roleplay_system_template,
    &[
      ("topic_en", &s.topic_en),
      ("topic_cn", &s.topic_cn),
      ("difficulty", &s.difficulty),
      ("speakers", &speakers),
      ("vocabulary", &vocabulary),
    ],
  )
}

/// Parse model text into a scenario. A JSON `null` or blank text is a soft
/// failure (None); anything else that does not parse is a hard error.
fn parse_scenario(text: &str) -> Result<Option<ScenarioData>, GenerationError> {
  let body = strip_code_fence(text);
  if body.is_empty() {
    return Ok(None);
  }
  let parsed: Option<ScenarioData> = serde_json::from_str(body)?;
  Ok(parsed.map(|mut s| {
    if s.id.trim().is_empty() {
      s.id = Uuid::new_v4().to_string();
    }
    s
  }))
}

fn first_candidate_text(body: &GenerateContentResponse) -> Option<String> {
  let content = body.candidates.first()?.content.as_ref()?;
  let text: String = content.parts.iter().filter_map(|p| p.text.as_deref()).collect();
  if text.trim().is_empty() { None } else { Some(text) }
}

// --- Wire DTOs ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
  system_instruction: Content,
  contents: Vec<Content>,
  generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
  #[serde(skip_serializing_if = "Option::is_none")]
  role: Option<String>,
  parts: Vec<Part>,
}

impl Content {
  fn user(text: String) -> Self {
    Content { role: Some("user".into()), parts: vec![Part { text }] }
  }
}

#[derive(Serialize)]
struct Part { text: String }

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_mime_type: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
  #[serde(default)] candidates: Vec<Candidate>,
  #[serde(default)] prompt_feedback: Option<PromptFeedback>,
  #[serde(default)] usage_metadata: Option<UsageMetadata>,
}
#[derive(Deserialize)]
struct Candidate { #[serde(default)] content: Option<CandidateContent> }
#[derive(Deserialize)]
struct CandidateContent { #[serde(default)] parts: Vec<CandidatePart> }
#[derive(Deserialize)]
struct CandidatePart { #[serde(default)] text: Option<String> }
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback { #[serde(default)] block_reason: Option<String> }
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
  #[serde(default)] prompt_token_count: Option<u32>,
  #[serde(default)] candidates_token_count: Option<u32>,
  #[serde(default)] total_token_count: Option<u32>,
}

/// Try to extract a clean error message from a Gemini error body.
fn extract_gemini_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
