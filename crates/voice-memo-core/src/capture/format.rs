use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Container/codec of the recording artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// AAC in an MPEG-4 container.
    M4a,
    /// Raw ADTS AAC.
    Aac,
    /// PCM WAV.
    Wav,
    /// FLAC.
    Flac,
    /// Opus in Ogg.
    Opus,
}

impl AudioFormat {
    /// File extension including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::M4a => ".m4a",
            AudioFormat::Aac => ".aac",
            AudioFormat::Wav => ".wav",
            AudioFormat::Flac => ".flac",
            AudioFormat::Opus => ".opus",
        }
    }

    /// Lowercase name as used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::M4a => "m4a",
            AudioFormat::Aac => "aac",
            AudioFormat::Wav => "wav",
            AudioFormat::Flac => "flac",
            AudioFormat::Opus => "opus",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown format name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown audio format: {0}")]
pub struct UnknownFormat(pub String);

impl FromStr for AudioFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "m4a" => Ok(AudioFormat::M4a),
            "aac" => Ok(AudioFormat::Aac),
            "wav" => Ok(AudioFormat::Wav),
            "flac" => Ok(AudioFormat::Flac),
            "opus" => Ok(AudioFormat::Opus),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}
