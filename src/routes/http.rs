//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; mutating handlers answer with the full view snapshot.

use std::sync::Arc;
use axum::{extract::State, http::StatusCode, response::{IntoResponse, Response}, Json};
use tracing::{info, instrument};

use crate::error::SessionError;
use crate::logic::*;
use crate::protocol::*;
use crate::seeds::suggestions;
use crate::state::AppState;

/// Map a controller result to 200 + snapshot, or 409 + ApiError.
fn respond(result: Result<ViewOut, SessionError>) -> Response {
  match result {
    Ok(view) => Json(view).into_response(),
    Err(e) => match ApiError::from_session(&e) {
      Some(api) => (StatusCode::CONFLICT, Json(api)).into_response(),
      None => (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "message": e.to_string() }))).into_response(),
    },
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, has_api_key: state.generator.has_api_key() })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_view(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(snapshot(&state).await)
}

#[instrument(level = "info")]
pub async fn http_get_suggestions() -> impl IntoResponse {
  Json(SuggestionsOut { suggestions: suggestions() })
}

#[instrument(level = "info", skip(state, body), fields(topic_len = body.topic.len()))]
pub async fn http_post_scenario(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SubmitIn>,
) -> Response {
  let result = do_submit(&state, &body.topic).await;
  if let Ok(view) = &result {
    info!(target: "scenario", view = ?view.view, notice = ?view.notice.as_ref().map(|n| n.kind), "HTTP submit finished");
  }
  respond(result)
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_back(State(state): State<Arc<AppState>>) -> Response {
  respond(do_back(&state).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_roleplay(State(state): State<Arc<AppState>>) -> Response {
  respond(do_start_roleplay(&state).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_roleplay_exit(State(state): State<Arc<AppState>>) -> Response {
  respond(do_exit_roleplay(&state).await)
}

#[instrument(level = "info", skip(state, body), fields(text_len = body.text.len()))]
pub async fn http_post_roleplay_message(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ChatIn>,
) -> Response {
  respond(do_chat(&state, &body.text).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_theme_toggle(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(do_toggle_theme(&state).await)
}
