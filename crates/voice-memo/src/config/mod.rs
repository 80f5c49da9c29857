#[allow(clippy::module_inception)]
mod config;
mod logging_config;
mod recorder_config;
mod storage_config;

pub(crate) use {
    config::Config, logging_config::LoggingConfig, recorder_config::RecorderConfig,
    storage_config::StorageConfig,
};

use voice_memo_core::AudioFormat;

pub(crate) const DEFAULT_FOLDER_ID: &str = "inbox";
pub(crate) const DEFAULT_FORMAT: AudioFormat = AudioFormat::Wav;
pub(crate) const DEFAULT_SAMPLE_RATE: u32 = 44_100;
pub(crate) const DEFAULT_BIT_RATE: u32 = 128_000;
pub(crate) const DEFAULT_CAPTURE_TIMEOUT_SECS: u64 = 10;

pub(crate) fn default_folder_id() -> String {
    DEFAULT_FOLDER_ID.to_string()
}

pub(crate) fn default_format() -> AudioFormat {
    DEFAULT_FORMAT
}

pub(crate) fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

pub(crate) fn default_bit_rate() -> u32 {
    DEFAULT_BIT_RATE
}

pub(crate) fn default_capture_timeout_secs() -> u64 {
    DEFAULT_CAPTURE_TIMEOUT_SECS
}
