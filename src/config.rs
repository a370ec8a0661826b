//! Runtime settings (environment) and model prompts (defaults or TOML overrides).
//!
//! See `Settings`, `PromptsConfig` and `Prompts` for the expected schema.

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::Difficulty;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Process-level settings read once at startup.
#[derive(Clone, Debug)]
pub struct Settings {
  pub addr: SocketAddr,
  pub static_dir: PathBuf,
  pub generation_timeout: Duration,
  pub prefers_dark: bool,
}

impl Settings {
  pub fn from_env() -> Self {
    let port = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()).unwrap_or(3000);
    let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "./static".into());
    Self {
      addr: SocketAddr::from(([0, 0, 0, 0], port)),
      static_dir: PathBuf::from(static_dir),
      generation_timeout: timeout_from(std::env::var("GENERATION_TIMEOUT_SECS").ok().as_deref()),
      prefers_dark: flag_from(std::env::var("LINGOFLOW_PREFERS_DARK").ok().as_deref()),
    }
  }
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
      static_dir: PathBuf::from("./static"),
      generation_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
      prefers_dark: false,
    }
  }
}

fn timeout_from(raw: Option<&str>) -> Duration {
  let secs = raw
    .and_then(|s| s.trim().parse::<u64>().ok())
    .filter(|s| *s > 0)
    .unwrap_or(DEFAULT_TIMEOUT_SECS);
  Duration::from_secs(secs)
}

fn flag_from(raw: Option<&str>) -> bool {
  matches!(raw.map(|s| s.trim().to_ascii_lowercase()).as_deref(), Some("1" | "true" | "yes" | "dark"))
}

/// Top-level TOML document accepted by PROMPTS_CONFIG_PATH.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct PromptsConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub difficulty: Difficulty,
}

/// Prompts used by the Gemini client. Any field may be overridden in TOML;
/// missing fields keep their default.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  // Lesson generation
  pub scenario_system: String,
  pub scenario_user_template: String,
  // Role-play
  pub roleplay_system_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      scenario_system: "You are an English teacher for Chinese-speaking learners. You write short, natural, \
        practical conversation lessons. Respond ONLY with strict JSON.".into(),
      scenario_user_template: "Create a conversation lesson about '{topic}' at level '{difficulty}'.\n\
        Return a JSON object with fields:\n\
        topic_cn (string, the topic in Simplified Chinese), topic_en (string), difficulty (string, use '{difficulty}'),\n\
        dialogues (array of 6-10 objects: speaker, text, translation (Simplified Chinese), audioSpeed (number, 0.8-1.0)),\n\
        vocabulary (array of 5-8 objects: word, ipa, meaning (Chinese), partOfSpeech, example, example_translation),\n\
        quiz (array of 3 objects: question, answer, context).\n\
        If the topic is unsuitable, return null.".into(),
      roleplay_system_template: "You are role-playing a conversation about '{topic_en}' ({topic_cn}) \
        with an English learner at level '{difficulty}'. The characters are: {speakers}. \
        Play the character the learner is not playing, stay in character, and reply in 1-3 short English sentences. \
        Encourage the learner to use these words: {vocabulary}. If the learner makes a serious mistake, \
        add one short correction in Chinese in parentheses.".into(),
    }
  }
}

/// Attempt to load `PromptsConfig` from PROMPTS_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_prompts_from_env() -> Option<PromptsConfig> {
  let path = std::env::var("PROMPTS_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_prompts(&s) {
      Ok(cfg) => {
        info!(target: "lingoflow", %path, "Loaded prompts config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "lingoflow", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "lingoflow", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

fn parse_prompts(s: &str) -> Result<PromptsConfig, toml::de::Error> {
  toml::from_str::<PromptsConfig>(s)
}
