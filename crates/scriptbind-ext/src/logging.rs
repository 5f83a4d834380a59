//! Logging setup for embeddings.
//!
//! The scriptbind crates only emit `tracing` events; nothing is printed until
//! a subscriber is installed. `init()` installs a console subscriber
//! configured from the environment:
//!
//! - `SCRIPTBIND_LOG_LEVEL`: trace, debug, info, warn, error
//! - `SCRIPTBIND_LOG_JSON`: emit JSON lines when `1` or `true`
//! - `SCRIPTBIND_LOG_SPANS`: log span enter/close events when `1` or `true`
//!
//! `RUST_LOG` takes precedence over `SCRIPTBIND_LOG_LEVEL` when set.

use std::io;

use once_cell::sync::OnceCell;
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Whether our subscriber became the global default on the first `init`.
static LOGGER_INSTALLED: OnceCell<bool> = OnceCell::new();

const TARGETS: [&str; 3] = ["scriptbind_core", "scriptbind_runtime", "scriptbind_ext"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Level for the scriptbind targets.
    pub level: Level,
    pub json_format: bool,
    pub show_spans: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            show_spans: false,
        }
    }
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(level) = lookup("SCRIPTBIND_LOG_LEVEL").as_deref().and_then(parse_level) {
            config.level = level;
        }
        if let Some(val) = lookup("SCRIPTBIND_LOG_JSON") {
            config.json_format = parse_flag(&val);
        }
        if let Some(val) = lookup("SCRIPTBIND_LOG_SPANS") {
            config.show_spans = parse_flag(&val);
        }
        config
    }

    /// Errors only.
    pub fn quiet() -> Self {
        Self { level: Level::ERROR, ..Self::default() }
    }

    /// Every registration and dispatch, with span events.
    pub fn verbose() -> Self {
        Self {
            level: Level::TRACE,
            json_format: false,
            show_spans: true,
        }
    }

    fn directives(&self) -> String {
        let level = self.level.as_str().to_lowercase();
        TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn parse_flag(val: &str) -> bool {
    val == "1" || val.to_lowercase() == "true"
}

fn parse_level(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

/// Install the console subscriber configured from the environment.
pub fn init() {
    init_with_config(LogConfig::from_env());
}

/// Install the console subscriber. Only the first call has an effect.
pub fn init_with_config(config: LogConfig) {
    LOGGER_INSTALLED.get_or_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.directives()));

        let span_events = if config.show_spans {
            FmtSpan::ENTER | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let registry = tracing_subscriber::registry().with(env_filter);
        // The host may already have installed its own subscriber; keep it.
        let installed = if config.json_format {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(io::stderr)
                        .with_span_events(span_events)
                        .with_target(true),
                )
                .try_init()
        } else {
            registry
                .with(
                    fmt::layer()
                        .with_writer(io::stderr)
                        .with_span_events(span_events)
                        .with_target(true)
                        .with_line_number(cfg!(debug_assertions)),
                )
                .try_init()
        }
        .is_ok();

        if installed {
            tracing::debug!(level = %config.level, json = config.json_format, "logging initialized");
        }
        installed
    });
}

/// True once `init` has installed the scriptbind subscriber. Stays false when
/// another global subscriber was already in place.
pub fn is_initialized() -> bool {
    LOGGER_INSTALLED.get().copied().unwrap_or(false)
}
