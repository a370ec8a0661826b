//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! Each network-bound intent runs as: lock + begin, unlock, await the model
//! (bounded by the configured timeout), lock + finish. The await + finish half
//! runs in its own task, so a caller that goes away (HTTP disconnect, closed
//! socket) cannot leave the session in `Loading`. Pure transitions
//! (back, role-play enter/exit, theme) happen under a single lock.

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::{debug, error, instrument};

use crate::controller::{ChatTicket, GenerationTicket};
use crate::error::{GenerationError, SessionError};
use crate::protocol::{to_out, ViewOut};
use crate::state::AppState;

/// Await an upstream call, turning an elapsed timeout into a hard failure.
async fn bounded<T>(
  state: &AppState,
  fut: impl Future<Output = Result<T, GenerationError>>,
) -> Result<T, GenerationError> {
  let limit = state.settings.generation_timeout;
  tokio::time::timeout(limit, fut).await.unwrap_or(Err(GenerationError::Timeout(limit)))
}

pub async fn snapshot(state: &AppState) -> ViewOut {
  to_out(&*state.session.lock().await)
}

/// Begin a submission; returns the ticket and the `Loading` snapshot, or
/// `None` when nothing was started (blank topic).
#[instrument(level = "info", skip(state), fields(topic_len = topic.len()))]
pub async fn begin_submit(state: &AppState, topic: &str) -> Result<Option<(GenerationTicket, ViewOut)>, SessionError> {
  let has_key = state.generator.has_api_key();
  let mut session = state.session.lock().await;
  Ok(session.begin_generation(topic, has_key)?.map(|t| (t, to_out(&session))))
}

/// Await generation for a started ticket and apply the outcome.
#[instrument(level = "info", skip(state, ticket), fields(topic = %ticket.topic, seq = ticket.seq))]
pub async fn complete_submit(state: &AppState, ticket: GenerationTicket) -> ViewOut {
  let outcome = bounded(state, state.generator.generate(&ticket.topic)).await;
  let mut session = state.session.lock().await;
  // Failures are already recorded as a notice on the session.
  if let Err(e) = session.finish_generation(ticket, outcome) {
    debug!(target: "scenario", error = %e, "Submission ended without a scenario");
  }
  to_out(&session)
}

/// Run `complete_submit` detached from the caller.
pub fn spawn_complete_submit(state: &AppState, ticket: GenerationTicket) -> JoinHandle<ViewOut> {
  let state = state.clone();
  tokio::spawn(async move { complete_submit(&state, ticket).await })
}

/// Wait for a detached completion; a failed task falls back to the current snapshot.
pub async fn join_view(state: &AppState, handle: JoinHandle<ViewOut>) -> ViewOut {
  match handle.await {
    Ok(view) => view,
    Err(e) => {
      error!(target: "lingoflow", error = %e, "Completion task failed");
      snapshot(state).await
    }
  }
}

/// Full submit: begin, await, finish. Returns the final snapshot.
pub async fn do_submit(state: &AppState, topic: &str) -> Result<ViewOut, SessionError> {
  match begin_submit(state, topic).await {
    Ok(Some((ticket, _loading))) => Ok(join_view(state, spawn_complete_submit(state, ticket)).await),
    Ok(None) => Ok(snapshot(state).await),
    Err(SessionError::MissingCredential) => Ok(snapshot(state).await),
    Err(e) => Err(e),
  }
}

#[instrument(level = "info", skip(state, text), fields(text_len = text.len()))]
pub async fn do_chat(state: &AppState, text: &str) -> Result<ViewOut, SessionError> {
  let has_key = state.generator.has_api_key();
  let ticket = {
    let mut session = state.session.lock().await;
    match session.begin_chat(text, has_key) {
      Ok(Some(t)) => t,
      Ok(None) | Err(SessionError::MissingCredential) => return Ok(to_out(&session)),
      Err(e) => return Err(e),
    }
  };

  let task_state = state.clone();
  let handle = tokio::spawn(async move { complete_chat(&task_state, ticket).await });
  Ok(join_view(state, handle).await)
}

async fn complete_chat(state: &AppState, ticket: ChatTicket) -> ViewOut {
  let outcome = bounded(state, state.partner.reply(&ticket.scenario, &ticket.transcript)).await;
  let mut session = state.session.lock().await;
  session.finish_chat(ticket, outcome);
  to_out(&session)
}

pub async fn do_back(state: &AppState) -> Result<ViewOut, SessionError> {
  let mut session = state.session.lock().await;
  session.back()?;
  Ok(to_out(&session))
}

pub async fn do_start_roleplay(state: &AppState) -> Result<ViewOut, SessionError> {
  let mut session = state.session.lock().await;
  session.start_roleplay()?;
  Ok(to_out(&session))
}

pub async fn do_exit_roleplay(state: &AppState) -> Result<ViewOut, SessionError> {
  let mut session = state.session.lock().await;
  session.exit_roleplay()?;
  Ok(to_out(&session))
}

pub async fn do_toggle_theme(state: &AppState) -> ViewOut {
  let mut session = state.session.lock().await;
  let theme = session.toggle_theme();
  debug!(target: "lingoflow", ?theme, "Theme toggled");
  to_out(&session)
}
