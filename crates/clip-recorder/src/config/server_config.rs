use crate::config::default_port;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Embedded web server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port for the embedded web server.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of static UI files served at `/` (None = API only).
    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    /// Open the UI in the default browser on startup.
    #[serde(default)]
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            static_dir: None,
            open_browser: false,
        }
    }
}
