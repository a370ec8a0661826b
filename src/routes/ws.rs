//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a view snapshot (or an error); a
//! submit replies twice: the `Loading` snapshot first, then the outcome.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::error::SessionError;
use crate::logic::*;
use crate::protocol::{ClientWsMessage, ServerWsMessage, ViewOut};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "lingoflow", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

async fn send(socket: &mut WebSocket, msg: &ServerWsMessage) -> Result<(), axum::Error> {
  let out = serde_json::to_string(msg).unwrap_or_else(|e| {
    serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
  });
  socket.send(Message::Text(out)).await
}

fn view_or_error(result: Result<ViewOut, SessionError>) -> ServerWsMessage {
  match result {
    Ok(view) => ServerWsMessage::View { view },
    Err(e) => ServerWsMessage::Error { message: e.to_string() },
  }
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "lingoflow", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let incoming = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(m) => m,
          Err(e) => {
            let reply = ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) };
            if send(&mut socket, &reply).await.is_err() { break; }
            continue;
          }
        };
        debug!(target: "lingoflow", "WS received: {:?}", &incoming);

        let reply = handle_client_ws(incoming, &state, &mut socket).await;

        if let Err(e) = send(&mut socket, &reply).await {
          error!(target: "lingoflow", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "lingoflow", "WebSocket disconnected");
}

/// Dispatch one client message and return the final reply. A submit also
/// pushes the `Loading` snapshot on `socket` before generation completes.
#[instrument(level = "info", skip(state, socket))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState, socket: &mut WebSocket) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,
    ClientWsMessage::View => ServerWsMessage::View { view: snapshot(state).await },
    ClientWsMessage::Submit { topic } => match begin_submit(state, &topic).await {
      Ok(Some((ticket, loading))) => {
        // Completion runs detached, so the session leaves Loading even if the client went away.
        let handle = spawn_complete_submit(state, ticket);
        if let Err(e) = send(socket, &ServerWsMessage::View { view: loading }).await {
          error!(target: "lingoflow", error = %e, "WS send error");
        }
        ServerWsMessage::View { view: join_view(state, handle).await }
      }
      Ok(None) | Err(SessionError::MissingCredential) => ServerWsMessage::View { view: snapshot(state).await },
      Err(e) => ServerWsMessage::Error { message: e.to_string() },
    },
    ClientWsMessage::Back => view_or_error(do_back(state).await),
    ClientWsMessage::RolePlay => view_or_error(do_start_roleplay(state).await),
    ClientWsMessage::ExitRolePlay => view_or_error(do_exit_roleplay(state).await),
    ClientWsMessage::Chat { text } => view_or_error(do_chat(state, &text).await),
    ClientWsMessage::ToggleTheme => ServerWsMessage::View { view: do_toggle_theme(state).await },
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn client_messages_use_snake_case_tags() {
    let m: ClientWsMessage = serde_json::from_str(r#"{"type":"submit","topic":"Hotel Check-in"}"#).unwrap();
    assert!(matches!(m, ClientWsMessage::Submit { topic } if topic == "Hotel Check-in"));
    let m: ClientWsMessage = serde_json::from_str(r#"{"type":"exit_role_play"}"#).unwrap();
    assert!(matches!(m, ClientWsMessage::ExitRolePlay));
    assert!(serde_json::from_str::<ClientWsMessage>(r#"{"type":"settings"}"#).is_err());
  }

  #[test]
  fn errors_serialize_with_type_tag() {
    let err = view_or_error(Err(SessionError::Busy));
    let v = serde_json::to_value(&err).unwrap();
    assert_eq!(v["type"], "error");
    assert_eq!(v["message"], "a request is already in flight");
  }
}
