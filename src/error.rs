//! Error types: upstream generation failures and session (controller) outcomes.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::domain::ViewState;

/// Hard failure of an upstream call (transport, service, parsing, timeout).
/// Soft failures (the model declined) are `Ok(None)`, not errors.
#[derive(Debug, Error)]
pub enum GenerationError {
  #[error("no API credential configured")]
  MissingCredential,
  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),
  #[error("service returned HTTP {status}: {message}")]
  Http { status: u16, message: String },
  #[error("malformed model output: {0}")]
  Malformed(#[from] serde_json::Error),
  #[error("upstream call timed out after {0:?}")]
  Timeout(Duration),
}

/// User-visible notification kinds. All are recovered by returning home.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
  MissingCredential,
  EmptyResult,
  ServiceError,
}

impl NoticeKind {
  pub fn message(self) -> &'static str {
    match self {
      NoticeKind::MissingCredential => "Please set GEMINI_API_KEY in the server environment.",
      NoticeKind::EmptyResult => "Could not generate scenario. Please try again.",
      NoticeKind::ServiceError => "AI service error. Check the server logs.",
    }
  }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Notice {
  pub kind: NoticeKind,
  pub message: String,
}

impl From<NoticeKind> for Notice {
  fn from(kind: NoticeKind) -> Self {
    Notice { kind, message: kind.message().to_string() }
  }
}

/// Intent names, used for transition errors and logging.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
  Submit,
  Back,
  RolePlay,
  ExitRolePlay,
  Chat,
}

/// Outcome errors of a controller operation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionError {
  #[error("{}", NoticeKind::MissingCredential.message())]
  MissingCredential,
  #[error("{}", NoticeKind::EmptyResult.message())]
  EmptyResult,
  #[error("{}", NoticeKind::ServiceError.message())]
  ServiceError(String),
  #[error("{action:?} is not allowed while in {from:?}")]
  NotAllowed { action: Action, from: ViewState },
  #[error("a request is already in flight")]
  Busy,
}
