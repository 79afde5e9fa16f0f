use crate::config::default_log_filter;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Logging configuration.
///
/// `RUST_LOG` overrides `filter` when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directives.
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Directory for daily-rolling log files (None = stderr only).
    #[serde(default)]
    pub directory: Option<PathBuf>,

    /// Write the log file as JSON lines.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            directory: None,
            json: false,
        }
    }
}
