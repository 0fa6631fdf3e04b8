#![forbid(unsafe_code)]

//! Bus diagnostics configuration (env-overridable).
//!
//! # Environment Variables
//! - `SCOPEBUS_LEAK_WARN` (usize, `0` disables the warning)
//! - `SCOPEBUS_TRACE_DISPATCH` (bool)
//!
//! Invalid values keep the default and are reported through
//! [`BusConfigParse::errors`].

use std::env;
use std::fmt;

const ENV_LEAK_WARN: &str = "SCOPEBUS_LEAK_WARN";
const ENV_TRACE_DISPATCH: &str = "SCOPEBUS_TRACE_DISPATCH";

/// Default handler count per event above which a leak warning is logged.
pub const DEFAULT_LEAK_WARN_THRESHOLD: usize = 64;

/// Diagnostics settings for a [`Bus`](crate::Bus).
///
/// Nothing here changes dispatch semantics; it only controls logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusConfig {
    /// Warn once per event when its handler count exceeds this value.
    /// Handlers piling up on one event usually mean an owner that is
    /// never disposed. `0` disables the check.
    pub leak_warn_threshold: usize,
    /// Emit a `trace` event for every dispatch.
    pub trace_dispatch: bool,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            leak_warn_threshold: DEFAULT_LEAK_WARN_THRESHOLD,
            trace_dispatch: false,
        }
    }
}

impl BusConfig {
    /// Set the leak warning threshold (`0` disables it).
    #[must_use]
    pub const fn with_leak_warn_threshold(mut self, threshold: usize) -> Self {
        self.leak_warn_threshold = threshold;
        self
    }

    /// Enable or disable per-dispatch tracing.
    #[must_use]
    pub const fn with_trace_dispatch(mut self, enabled: bool) -> Self {
        self.trace_dispatch = enabled;
        self
    }

    /// Parse config from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> BusConfigParse {
        from_env_with(|key| env::var(key).ok())
    }
}

/// Configuration parse diagnostics.
#[derive(Debug, Clone)]
pub struct BusConfigParse {
    pub config: BusConfig,
    pub errors: Vec<ConfigError>,
}

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

fn from_env_with<F>(mut get: F) -> BusConfigParse
where
    F: FnMut(&str) -> Option<String>,
{
    let mut config = BusConfig::default();
    let mut errors = Vec::new();

    if let Some(value) = get(ENV_LEAK_WARN) {
        match parse_usize(&value) {
            Some(parsed) => config.leak_warn_threshold = parsed,
            None => errors.push(ConfigError::new(
                "leak_warn_threshold",
                value,
                "expected non-negative integer",
            )),
        }
    }

    if let Some(value) = get(ENV_TRACE_DISPATCH) {
        match parse_bool(&value) {
            Some(parsed) => config.trace_dispatch = parsed,
            None => errors.push(ConfigError::new(
                "trace_dispatch",
                value,
                "expected bool (1/0/true/false)",
            )),
        }
    }

    BusConfigParse { config, errors }
}

#[inline]
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[inline]
fn parse_usize(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok()
}
