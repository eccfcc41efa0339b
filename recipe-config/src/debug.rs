//! Tracing settings from the `[debug]` section

use serde::{Deserialize, Serialize};

const TRACE_TARGETS: &[&str] = &["recipe", "recipe_config", "recipe_runner", "recipe_tui"];

/// Level used for the trace log when `RUST_LOG` is unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl TraceLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }
}

impl std::fmt::Display for TraceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Unknown levels fall back to the default instead of rejecting the file.
impl<'de> Deserialize<'de> for TraceLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw).unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Write traces to `<config-root>/logs/recipe.log`.
    pub enable_tracing: bool,
    pub trace_level: TraceLevel,
}

impl DebugConfig {
    /// Filter directive for `tracing_subscriber::EnvFilter`, or `None` when
    /// tracing is disabled.
    pub fn filter_directive(&self) -> Option<String> {
        self.enable_tracing.then(|| {
            TRACE_TARGETS
                .iter()
                .map(|target| format!("{target}={}", self.trace_level))
                .collect::<Vec<_>>()
                .join(",")
        })
    }
}
