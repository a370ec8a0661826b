//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! The UI renders `ViewOut` as-is; every mutating call answers with one.

use serde::{Deserialize, Serialize};

use crate::controller::ViewController;
use crate::domain::{ChatMessage, ScenarioData, Theme, ViewState};
use crate::error::{Notice, SessionError};
use crate::seeds::{suggestions, Suggestion};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
  Ping,
  View,
  Submit { topic: String },
  Back,
  RolePlay,
  ExitRolePlay,
  Chat { text: String },
  ToggleTheme,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
  Pong,
  View { view: ViewOut },
  Error { message: String },
}

/// Role-play part of the snapshot.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePlayOut {
  pub messages: Vec<ChatMessage>,
  pub awaiting_reply: bool,
}

/// Full render snapshot of the session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewOut {
  pub view: ViewState,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub loading_text: Option<String>,
  pub scenario: Option<ScenarioData>,
  pub history: Vec<String>,
  pub suggestions: Vec<Suggestion>,
  pub theme: Theme,
  pub notice: Option<Notice>,
  pub role_play: Option<RolePlayOut>,
}

/// Snapshot the controller for the presentation layer.
pub fn to_out(c: &ViewController) -> ViewOut {
  ViewOut {
    view: c.view(),
    loading_text: c.loading_text().map(str::to_string),
    scenario: c.scenario().cloned(),
    history: c.history(),
    suggestions: suggestions(),
    theme: c.config().theme,
    notice: c.notice().cloned(),
    role_play: c.roleplay().map(|rp| RolePlayOut { messages: rp.messages.clone(), awaiting_reply: rp.awaiting_reply }),
  }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct SubmitIn {
  pub topic: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatIn {
  pub text: String,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
  pub has_api_key: bool,
}

#[derive(Serialize)]
pub struct SuggestionsOut {
  pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
  NotAllowed,
  Busy,
}

/// Body of a rejected (409) request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
  pub code: ErrorCode,
  pub message: String,
}

impl ApiError {
  /// Transition refusals become API errors; recoverable outcomes
  /// (credential, empty result, service error) travel as a notice instead.
  pub fn from_session(e: &SessionError) -> Option<Self> {
    let code = match e {
      SessionError::NotAllowed { .. } => ErrorCode::NotAllowed,
      SessionError::Busy => ErrorCode::Busy,
      _ => return None,
    };
    Some(Self { code, message: e.to_string() })
  }
}
