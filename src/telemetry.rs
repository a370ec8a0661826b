//! Tracing setup for the LingoFlow service.
//!
//! - LOG_LEVEL is an `EnvFilter` directive string, e.g.
//!   "info,scenario=debug,roleplay=debug,lingoflow=debug,tower_http=info".
//! - LOG_FORMAT picks `pretty` (default) or `json` output.
//!
//! Log targets: `lingoflow` (process, transport), `scenario` (lesson
//! generation), `roleplay` (chat turns). Model calls record latency and token
//! usage only, never prompt or lesson text.

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "info,scenario=debug,roleplay=debug,lingoflow=debug,tower_http=info,axum=info";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // The two formats produce different subscriber types, so init in each arm.
    match LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref()) {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
