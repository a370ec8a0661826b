//! View-state controller: the single session's screen, lesson, recency list,
//! role-play transcript and theme.
//!
//! Every network-bound operation is split in two synchronous halves:
//!   - `begin_*` validates the intent, commits the transition (e.g. to
//!     `Loading`) and hands out a ticket;
//!   - `finish_*` takes the ticket plus the upstream outcome and applies it.
//! The caller awaits the upstream call between the halves without holding the
//! session lock, so observers see `Loading` while generation runs.

use tracing::{error, info, warn};

use crate::domain::{ChatMessage, ScenarioData, Theme, ViewState};
use crate::error::{Action, GenerationError, Notice, NoticeKind, SessionError};
use crate::history::History;

const CHAT_ERROR_TEXT: &str = "Connection error. Please try again.";

/// Proof that a generation was started; required to complete it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationTicket {
  pub seq: u64,
  pub topic: String,
}

/// Everything the role-play partner needs for one turn.
#[derive(Clone, Debug)]
pub struct ChatTicket {
  pub session: u64,
  pub scenario: ScenarioData,
  pub transcript: Vec<ChatMessage>,
}

#[derive(Clone, Debug, Default)]
pub struct RolePlaySession {
  pub id: u64,
  pub messages: Vec<ChatMessage>,
  pub awaiting_reply: bool,
}

/// Presentation settings passed to the UI, not ambient global state.
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionConfig {
  pub theme: Theme,
}

#[derive(Debug, Default)]
pub struct ViewController {
  view: ViewState,
  scenario: Option<ScenarioData>,
  history: History,
  pending: Option<GenerationTicket>,
  loading_text: Option<String>,
  notice: Option<Notice>,
  roleplay: Option<RolePlaySession>,
  config: SessionConfig,
  seq: u64,
}

impl ViewController {
  pub fn new(config: SessionConfig) -> Self {
    Self { config, ..Self::default() }
  }

  pub fn view(&self) -> ViewState { self.view }
  pub fn scenario(&self) -> Option<&ScenarioData> { self.scenario.as_ref() }
  pub fn history(&self) -> Vec<String> { self.history.to_vec() }
  pub fn loading_text(&self) -> Option<&str> { self.loading_text.as_deref() }
  pub fn notice(&self) -> Option<&Notice> { self.notice.as_ref() }
  pub fn roleplay(&self) -> Option<&RolePlaySession> { self.roleplay.as_ref() }
  pub fn config(&self) -> SessionConfig { self.config }

  fn next_seq(&mut self) -> u64 {
    self.seq += 1;
    self.seq
  }

  fn not_allowed(&self, action: Action) -> SessionError {
    warn!(target: "lingoflow", ?action, from = ?self.view, "Rejected transition");
    SessionError::NotAllowed { action, from: self.view }
  }

  /// Start generating a lesson for `raw_topic`.
  ///
  /// Returns `Ok(None)` for a blank topic (no-op), a ticket when the state
  /// moved to `Loading`, or an error when the submission is refused.
  pub fn begin_generation(
    &mut self,
    raw_topic: &str,
    has_credential: bool,
  ) -> Result<Option<GenerationTicket>, SessionError> {
    let topic = raw_topic.trim();
    if topic.is_empty() {
      return Ok(None);
    }
    if self.view != ViewState::Home {
      return Err(self.not_allowed(Action::Submit));
    }
    if !has_credential {
      self.notice = Some(NoticeKind::MissingCredential.into());
      warn!(target: "scenario", %topic, "Submission refused: no API credential");
      return Err(SessionError::MissingCredential);
    }

    let ticket = GenerationTicket { seq: self.next_seq(), topic: topic.to_string() };
    self.view = ViewState::Loading;
    self.loading_text = Some(format!("Building \"{}\" lesson...", topic));
    self.notice = None;
    self.pending = Some(ticket.clone());
    info!(target: "scenario", %topic, seq = ticket.seq, "Generation started");
    Ok(Some(ticket))
  }

  /// Apply the upstream outcome of a generation started by `begin_generation`.
  pub fn finish_generation(
    &mut self,
    ticket: GenerationTicket,
    outcome: Result<Option<ScenarioData>, GenerationError>,
  ) -> Result<(), SessionError> {
    if self.view != ViewState::Loading || self.pending.as_ref() != Some(&ticket) {
      warn!(target: "scenario", seq = ticket.seq, view = ?self.view, "Dropping stale generation result");
      return Ok(());
    }
    self.pending = None;
    self.loading_text = None;

    match outcome {
      Ok(Some(data)) => {
        info!(target: "scenario", topic = %ticket.topic, id = %data.id, level = ?data.difficulty_level(),
              dialogues = data.dialogues.len(), vocabulary = data.vocabulary.len(), quiz = data.quiz.len(),
              "Scenario ready");
        self.scenario = Some(data);
        self.history.record(&ticket.topic);
        self.view = ViewState::Scenario;
        Ok(())
      }
      Ok(None) => {
        warn!(target: "scenario", topic = %ticket.topic, "Model returned no usable scenario");
        self.view = ViewState::Home;
        self.notice = Some(NoticeKind::EmptyResult.into());
        Err(SessionError::EmptyResult)
      }
      Err(e) => {
        error!(target: "scenario", topic = %ticket.topic, error = %e, "Scenario generation failed");
        self.view = ViewState::Home;
        self.notice = Some(NoticeKind::ServiceError.into());
        Err(SessionError::ServiceError(e.to_string()))
      }
    }
  }

  /// Scenario -> Home; the lesson is discarded.
  pub fn back(&mut self) -> Result<(), SessionError> {
    if self.view != ViewState::Scenario {
      return Err(self.not_allowed(Action::Back));
    }
    self.scenario = None;
    self.view = ViewState::Home;
    Ok(())
  }

  /// Scenario -> RolePlay with a fresh, empty transcript.
  pub fn start_roleplay(&mut self) -> Result<(), SessionError> {
    if self.view != ViewState::Scenario || self.scenario.is_none() {
      return Err(self.not_allowed(Action::RolePlay));
    }
    let id = self.next_seq();
    self.roleplay = Some(RolePlaySession { id, ..RolePlaySession::default() });
    self.view = ViewState::RolePlay;
    info!(target: "roleplay", session = id, "Role-play opened");
    Ok(())
  }

  /// RolePlay -> Scenario; the transcript is discarded.
  pub fn exit_roleplay(&mut self) -> Result<(), SessionError> {
    if self.view != ViewState::RolePlay {
      return Err(self.not_allowed(Action::ExitRolePlay));
    }
    if let Some(rp) = self.roleplay.take() {
      info!(target: "roleplay", session = rp.id, turns = rp.messages.len(), "Role-play closed");
    }
    self.view = ViewState::Scenario;
    Ok(())
  }

  /// Append the user's message and hand out what the partner needs to reply.
  /// Blank text is a no-op.
  pub fn begin_chat(&mut self, raw_text: &str, has_credential: bool) -> Result<Option<ChatTicket>, SessionError> {
    let text = raw_text.trim();
    if text.is_empty() {
      return Ok(None);
    }
    if self.view != ViewState::RolePlay {
      return Err(self.not_allowed(Action::Chat));
    }
    let (Some(scenario), Some(rp)) = (self.scenario.as_ref(), self.roleplay.as_mut()) else {
      return Err(SessionError::NotAllowed { action: Action::Chat, from: self.view });
    };
    if rp.awaiting_reply {
      return Err(SessionError::Busy);
    }
    if !has_credential {
      self.notice = Some(NoticeKind::MissingCredential.into());
      return Err(SessionError::MissingCredential);
    }

    rp.messages.push(ChatMessage::user(text));
    rp.awaiting_reply = true;
    Ok(Some(ChatTicket { session: rp.id, scenario: scenario.clone(), transcript: rp.messages.clone() }))
  }

  /// Append the partner's reply, or a flagged error message on failure.
  pub fn finish_chat(&mut self, ticket: ChatTicket, outcome: Result<String, GenerationError>) {
    let Some(rp) = self.roleplay.as_mut().filter(|rp| rp.id == ticket.session) else {
      warn!(target: "roleplay", session = ticket.session, "Dropping reply for a closed role-play");
      return;
    };
    rp.awaiting_reply = false;
    match outcome {
      Ok(reply) if !reply.trim().is_empty() => rp.messages.push(ChatMessage::model(reply.trim())),
      Ok(_) => {
        warn!(target: "roleplay", session = rp.id, "Model returned a blank reply");
        rp.messages.push(ChatMessage::model_error(CHAT_ERROR_TEXT));
      }
      Err(e) => {
        error!(target: "roleplay", session = rp.id, error = %e, "Role-play reply failed");
        rp.messages.push(ChatMessage::model_error(CHAT_ERROR_TEXT));
      }
    }
  }

  pub fn toggle_theme(&mut self) -> Theme {
    self.config.theme = self.config.theme.toggled();
    self.config.theme
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::ChatRole;
  use crate::testing::sample_scenario as sample;

  fn submit_ok(c: &mut ViewController, topic: &str) {
    let t = c.begin_generation(topic, true).unwrap().unwrap();
    c.finish_generation(t, Ok(Some(sample(topic)))).unwrap();
    c.back().unwrap();
  }

  fn in_scenario() -> ViewController {
    let mut c = ViewController::default();
    let t = c.begin_generation("Hotel Check-in", true).unwrap().unwrap();
    c.finish_generation(t, Ok(Some(sample("Hotel Check-in")))).unwrap();
    c
  }

  #[test]
  fn starts_home() {
    let c = ViewController::default();
    assert_eq!(c.view(), ViewState::Home);
    assert!(c.scenario().is_none() && c.history().is_empty());
  }

  #[test]
  fn success_goes_through_loading_to_scenario() {
    let mut c = ViewController::default();
    let t = c.begin_generation("  Hotel Check-in ", true).unwrap().unwrap();
    assert_eq!(c.view(), ViewState::Loading);
    assert_eq!(t.topic, "Hotel Check-in");
    assert_eq!(c.loading_text(), Some("Building \"Hotel Check-in\" lesson..."));

    let data = sample("Hotel Check-in");
    c.finish_generation(t, Ok(Some(data.clone()))).unwrap();
    assert_eq!(c.view(), ViewState::Scenario);
    assert_eq!(c.scenario(), Some(&data));
    assert_eq!(c.history(), vec!["Hotel Check-in"]);
    assert!(c.loading_text().is_none());
  }

  #[test]
  fn blank_topic_is_noop() {
    let mut c = ViewController::default();
    for raw in ["", "   ", "\t\n"] {
      assert_eq!(c.begin_generation(raw, true), Ok(None));
      assert_eq!(c.view(), ViewState::Home);
    }
  }

  #[test]
  fn missing_credential_stays_home_with_notice() {
    let mut c = ViewController::default();
    assert_eq!(c.begin_generation("Job Interview", false), Err(SessionError::MissingCredential));
    assert_eq!(c.view(), ViewState::Home);
    assert_eq!(c.notice().map(|n| n.kind), Some(NoticeKind::MissingCredential));
  }

  #[test]
  fn empty_result_returns_home_without_history() {
    let mut c = ViewController::default();
    let t = c.begin_generation("Asking Directions", true).unwrap().unwrap();
    assert_eq!(c.finish_generation(t, Ok(None)), Err(SessionError::EmptyResult));
    assert_eq!(c.view(), ViewState::Home);
    assert!(c.history().is_empty());
    assert!(c.scenario().is_none());
    assert_eq!(c.notice().map(|n| n.kind), Some(NoticeKind::EmptyResult));
  }

  #[test]
  fn service_error_returns_home() {
    let mut c = ViewController::default();
    let t = c.begin_generation("Business Meeting", true).unwrap().unwrap();
    let err = GenerationError::Http { status: 500, message: "boom".into() };
    assert!(matches!(c.finish_generation(t, Err(err)), Err(SessionError::ServiceError(_))));
    assert_eq!(c.view(), ViewState::Home);
    assert!(c.history().is_empty());
    assert_eq!(c.notice().map(|n| n.kind), Some(NoticeKind::ServiceError));
  }

  #[test]
  fn successful_submit_clears_previous_notice() {
    let mut c = ViewController::default();
    let _ = c.begin_generation("x", false);
    assert!(c.notice().is_some());
    c.begin_generation("x", true).unwrap();
    assert!(c.notice().is_none());
  }

  #[test]
  fn second_submit_while_loading_is_rejected() {
    let mut c = ViewController::default();
    let first = c.begin_generation("A", true).unwrap().unwrap();
    assert_eq!(
      c.begin_generation("B", true),
      Err(SessionError::NotAllowed { action: Action::Submit, from: ViewState::Loading })
    );
    assert_eq!(c.view(), ViewState::Loading);
    c.finish_generation(first, Ok(Some(sample("A")))).unwrap();
    assert_eq!(c.history(), vec!["A"]);
  }

  #[test]
  fn stale_ticket_is_ignored() {
    let mut c = ViewController::default();
    let t = c.begin_generation("A", true).unwrap().unwrap();
    let forged = GenerationTicket { seq: t.seq + 100, topic: "A".into() };
    c.finish_generation(forged, Ok(Some(sample("A")))).unwrap();
    assert_eq!(c.view(), ViewState::Loading);
    c.finish_generation(t, Ok(Some(sample("A")))).unwrap();
    assert_eq!(c.view(), ViewState::Scenario);
  }

  #[test]
  fn history_follows_successful_submissions() {
    let mut c = ViewController::default();
    for t in ["A", "B", "C", "D", "E", "F"] {
      submit_ok(&mut c, t);
    }
    assert_eq!(c.history(), vec!["F", "E", "D", "C", "B"]);

    let mut c = ViewController::default();
    for t in ["A", "B", "A"] {
      submit_ok(&mut c, t);
    }
    assert_eq!(c.history(), vec!["A", "B"]);
  }

  #[test]
  fn back_discards_scenario() {
    let mut c = in_scenario();
    c.back().unwrap();
    assert_eq!(c.view(), ViewState::Home);
    assert!(c.scenario().is_none());
  }

  #[test]
  fn roleplay_enter_and_exit() {
    let mut c = in_scenario();
    c.start_roleplay().unwrap();
    assert_eq!(c.view(), ViewState::RolePlay);
    assert!(c.roleplay().unwrap().messages.is_empty());
    c.exit_roleplay().unwrap();
    assert_eq!(c.view(), ViewState::Scenario);
    assert!(c.roleplay().is_none());
    assert!(c.scenario().is_some());
  }

  #[test]
  fn transitions_outside_table_are_rejected() {
    let mut c = ViewController::default();
    assert!(matches!(c.back(), Err(SessionError::NotAllowed { action: Action::Back, .. })));
    assert!(matches!(c.start_roleplay(), Err(SessionError::NotAllowed { .. })));
    assert!(matches!(c.exit_roleplay(), Err(SessionError::NotAllowed { .. })));
    assert!(matches!(c.begin_chat("hi", true), Err(SessionError::NotAllowed { .. })));
    assert_eq!(c.view(), ViewState::Home);

    let mut c = in_scenario();
    assert!(matches!(c.begin_generation("other", true), Err(SessionError::NotAllowed { .. })));
    assert_eq!(c.view(), ViewState::Scenario);
  }

  #[test]
  fn chat_turn_appends_user_then_model() {
    let mut c = in_scenario();
    c.start_roleplay().unwrap();
    let t = c.begin_chat(" Hello, I'd like to check in. ", true).unwrap().unwrap();
    assert_eq!(t.transcript.len(), 1);
    assert_eq!(t.transcript[0].text, "Hello, I'd like to check in.");
    assert_eq!(c.begin_chat("again", true).unwrap_err(), SessionError::Busy);

    c.finish_chat(t, Ok("Welcome! May I see your passport?".into()));
    let msgs = &c.roleplay().unwrap().messages;
    assert_eq!(msgs.len(), 2);
    assert_eq!(msgs[0].role, ChatRole::User);
    assert_eq!(msgs[1].role, ChatRole::Model);
    assert!(!msgs[1].is_error);
  }

  #[test]
  fn chat_failure_is_flagged() {
    let mut c = in_scenario();
    c.start_roleplay().unwrap();
    let t = c.begin_chat("hi", true).unwrap().unwrap();
    c.finish_chat(t, Err(GenerationError::Timeout(std::time::Duration::from_secs(1))));
    let last = c.roleplay().unwrap().messages.last().unwrap().clone();
    assert!(last.is_error);
    assert_eq!(last.role, ChatRole::Model);
    assert!(!c.roleplay().unwrap().awaiting_reply);
  }

  #[test]
  fn blank_reply_is_flagged_as_error() {
    let mut c = in_scenario();
    c.start_roleplay().unwrap();
    for blank in ["", "  \n "] {
      let t = c.begin_chat("hi", true).unwrap().unwrap();
      c.finish_chat(t, Ok(blank.to_string()));
      let last = c.roleplay().unwrap().messages.last().unwrap().clone();
      assert_eq!(last.role, ChatRole::Model);
      assert!(last.is_error);
      assert_eq!(last.text, CHAT_ERROR_TEXT);
    }
    assert!(!c.roleplay().unwrap().awaiting_reply);
  }

  #[test]
  fn reply_after_exit_is_dropped() {
    let mut c = in_scenario();
    c.start_roleplay().unwrap();
    let t = c.begin_chat("hi", true).unwrap().unwrap();
    c.exit_roleplay().unwrap();
    c.start_roleplay().unwrap();
    c.finish_chat(t, Ok("late".into()));
    assert!(c.roleplay().unwrap().messages.is_empty());
  }

  #[test]
  fn chat_without_credential_sends_nothing() {
    let mut c = in_scenario();
    c.start_roleplay().unwrap();
    assert_eq!(c.begin_chat("hi", false).unwrap_err(), SessionError::MissingCredential);
    assert!(c.roleplay().unwrap().messages.is_empty());
  }

  #[test]
  fn theme_toggles_from_initial_preference() {
    let mut c = ViewController::new(SessionConfig { theme: Theme::from_preference(true) });
    assert_eq!(c.config().theme, Theme::Dark);
    assert_eq!(c.toggle_theme(), Theme::Light);
    assert_eq!(c.toggle_theme(), Theme::Dark);
  }
}
