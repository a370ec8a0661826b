//! Application state: the single session controller, model seams and settings.
//!
//! This module owns:
//!   - the view-state controller (behind a tokio mutex, never held across awaits)
//!   - the scenario generator and role-play partner (Gemini in production)
//!   - the process settings (timeouts, static dir, theme preference)

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::config::{load_prompts_from_env, Settings};
use crate::controller::{SessionConfig, ViewController};
use crate::domain::Theme;
use crate::error::GenerationError;
use crate::gemini::Gemini;
use crate::service::{RolePlayPartner, ScenarioGenerator};

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<ViewController>>,
    pub generator: Arc<dyn ScenarioGenerator>,
    pub partner: Arc<dyn RolePlayPartner>,
    pub settings: Settings,
}

impl AppState {
    /// Build state from env: load prompts, init the Gemini client, open the session.
    #[instrument(level = "info", skip_all)]
    pub fn from_env(settings: Settings) -> Result<Self, GenerationError> {
        let cfg = load_prompts_from_env().unwrap_or_default();
        let gemini = Arc::new(Gemini::from_env(cfg.prompts, cfg.difficulty, settings.generation_timeout)?);

        if gemini.has_api_key() {
            info!(target: "lingoflow", base_url = %gemini.base_url, model = %gemini.model, chat_model = %gemini.chat_model, difficulty = ?gemini.difficulty, "Gemini enabled.");
        } else {
            warn!(target: "lingoflow", "GEMINI_API_KEY not set; lesson generation will be refused.");
        }

        Ok(Self::new(gemini.clone(), gemini, settings))
    }

    pub fn new(generator: Arc<dyn ScenarioGenerator>, partner: Arc<dyn RolePlayPartner>, settings: Settings) -> Self {
        let config = SessionConfig { theme: Theme::from_preference(settings.prefers_dark) };
        Self {
            session: Arc::new(Mutex::new(ViewController::new(config))),
            generator,
            partner,
            settings,
        }
    }
}
