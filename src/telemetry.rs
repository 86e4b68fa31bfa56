//! Tracing setup for the quiz service.
//!
//! - `LOG_LEVEL` is an `EnvFilter` directive string; without it the question
//!   pipeline (`quiz`), feedback (`feedback`) and process (`quizgen_backend`)
//!   targets log at debug and everything else at info.
//! - `LOG_FORMAT=json` emits one JSON object per event; any other value uses
//!   the human-readable formatter.
//!
//! Targets, files and line numbers are always included. Per-request HTTP spans
//! come from the router's `TraceLayer`.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str =
    "info,quiz=debug,feedback=debug,quizgen_backend=debug,tower_http=info,axum=info";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()) {
            Some(s) if s == "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let format = LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // The two builders have different types, so each arm initializes its own.
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_json_selects_structured_output() {
        assert_eq!(LogFormat::parse(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some(" JSON ")), LogFormat::Json);
        assert_eq!(LogFormat::parse(Some("pretty")), LogFormat::Pretty);
        assert_eq!(LogFormat::parse(None), LogFormat::Pretty);
    }

    #[test]
    fn default_filter_parses_and_covers_pipeline_targets() {
        let _ = EnvFilter::try_new(DEFAULT_FILTER).unwrap();
        for target in ["quiz=debug", "feedback=debug", "quizgen_backend=debug"] {
            assert!(DEFAULT_FILTER.contains(target));
        }
    }
}
