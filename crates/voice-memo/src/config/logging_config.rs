use serde::{Deserialize, Serialize};

/// Log output configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write JSON log lines to `voice-memo.log` in the data directory.
    #[serde(default)]
    pub file_logging: bool,
}
