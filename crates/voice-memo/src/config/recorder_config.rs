use crate::config::{
    default_bit_rate, default_capture_timeout_secs, default_folder_id, default_format,
    default_sample_rate,
};

use std::time::Duration;

use serde::{Deserialize, Serialize};
use voice_memo_core::{AudioFormat, DurationSource};

/// Recording parameters and controller tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Folder new recordings are filed under.
    #[serde(default = "default_folder_id")]
    pub folder_id: String,

    /// Encoding of new recordings.
    #[serde(default = "default_format")]
    pub format: AudioFormat,

    /// Requested sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Requested bit rate in bits per second.
    #[serde(default = "default_bit_rate")]
    pub bit_rate: u32,

    /// Bound on each capture call in seconds. Zero waits indefinitely.
    #[serde(default = "default_capture_timeout_secs")]
    pub capture_timeout_secs: u64,

    /// Which producer drives the elapsed duration.
    #[serde(default)]
    pub duration_source: DurationSource,
}

impl RecorderConfig {
    /// The capture timeout, `None` when disabled.
    pub fn capture_timeout(&self) -> Option<Duration> {
        (self.capture_timeout_secs > 0).then(|| Duration::from_secs(self.capture_timeout_secs))
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            folder_id: default_folder_id(),
            format: default_format(),
            sample_rate: default_sample_rate(),
            bit_rate: default_bit_rate(),
            capture_timeout_secs: default_capture_timeout_secs(),
            duration_source: DurationSource::default(),
        }
    }
}
