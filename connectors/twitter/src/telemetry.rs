//! Structured logging setup and secret redaction for logged payloads.

use serde_json::{Map, Value};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

use crate::error::{TwitterError, TwitterResult};

/// Keys redacted from logged parameters (case-insensitive substring match).
pub const DEFAULT_REDACT_FIELDS: &[&str] = &["password", "secret", "token", "authorization"];

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level filter (e.g., "info", "debug", "twitter_lite=trace").
    /// `RUST_LOG` takes precedence when set.
    pub log_level: String,

    /// Enable JSON log output.
    pub json_logs: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl LogConfig {
    /// Set the log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable or disable JSON logs.
    #[must_use]
    pub const fn with_json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }
}

/// Install the global `tracing` subscriber.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> TwitterResult<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let result = if config.json_logs {
        let json_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE);
        subscriber.with(json_layer).try_init()
    } else {
        let pretty_layer = fmt::layer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE);
        subscriber.with(pretty_layer).try_init()
    };

    result.map_err(|e| TwitterError::Config(format!("logging init failed: {e}")))
}

/// Redact sensitive fields from a JSON value.
#[must_use]
pub fn redact_sensitive(value: &Value, fields: &[&str]) -> Value {
    match value {
        Value::Object(map) => {
            let mut result = Map::new();
            for (key, val) in map {
                let lower = key.to_lowercase();
                if fields.iter().any(|f| lower.contains(&f.to_lowercase())) {
                    result.insert(key.clone(), Value::String("[REDACTED]".to_string()));
                } else {
                    result.insert(key.clone(), redact_sensitive(val, fields));
                }
            }
            Value::Object(result)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_sensitive(v, fields)).collect()),
        other => other.clone(),
    }
}
