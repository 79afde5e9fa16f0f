use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Clip storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the stored clip (None = platform data directory).
    #[serde(default)]
    pub directory: Option<PathBuf>,
}
