use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use super::types::LogLevel;
use tracing::warn;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<PathBuf>,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: None,
            json: false,
        }
    }
}

impl LoggingConfig {
    /// `LOG_LEVEL` and `PULSE_LOG_JSON`. An unknown level falls back to info.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("LOG_LEVEL") {
            self.level = LogLevel::parse(&level).unwrap_or_else(|| {
                warn!("Unknown LOG_LEVEL '{}', using info", level);
                LogLevel::default()
            });
        }

        if lookup("PULSE_LOG_JSON").is_some() {
            self.json = true;
        }
    }
}
