use std::fmt;

use serde::{Deserialize, Serialize};

/// How serious a failure is.
///
/// Ordered from least to most severe so `max()` picks the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational, not logged.
    Info,
    /// Degraded but recoverable.
    Warning,
    /// The requested operation failed.
    Error,
    /// The application may be in an unusable state.
    Critical,
}

impl Severity {
    /// Stable lowercase name for logs and serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of failure kinds surfaced to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Capture service refused or failed a recording operation.
    AudioRecording,
    /// Playback of a finished recording failed.
    AudioPlayback,
    /// Reading, writing or deleting a file failed.
    FileSystem,
    /// The data-access layer failed.
    Database,
    /// Microphone or storage authorization is missing.
    Permission,
    /// A command or input was rejected before any external call.
    Validation,
    /// A remote call failed.
    Network,
    /// A cache read or write failed.
    Cache,
    /// Anything that could not be attributed to a known origin.
    Unexpected,
}

impl FailureKind {
    /// Every kind, in declaration order.
    pub const ALL: [FailureKind; 9] = [
        FailureKind::AudioRecording,
        FailureKind::AudioPlayback,
        FailureKind::FileSystem,
        FailureKind::Database,
        FailureKind::Permission,
        FailureKind::Validation,
        FailureKind::Network,
        FailureKind::Cache,
        FailureKind::Unexpected,
    ];

    /// Severity assigned to failures of this kind unless overridden at construction.
    pub fn default_severity(&self) -> Severity {
        match self {
            FailureKind::AudioRecording
            | FailureKind::AudioPlayback
            | FailureKind::FileSystem => Severity::Error,
            FailureKind::Database | FailureKind::Unexpected => Severity::Critical,
            FailureKind::Permission | FailureKind::Validation | FailureKind::Network => {
                Severity::Warning
            }
            FailureKind::Cache => Severity::Info,
        }
    }

    /// Whether a caller may re-issue the failed operation as-is.
    ///
    /// Storage kinds are only retryable when the individual failure is marked
    /// transient, see [`FailureRecord::transient`](super::FailureRecord::transient).
    pub fn default_retryable(&self) -> bool {
        matches!(self, FailureKind::Network | FailureKind::Cache)
    }

    /// Whether a failure of this kind may be marked transient.
    pub fn supports_transient(&self) -> bool {
        matches!(
            self,
            FailureKind::FileSystem
                | FailureKind::Database
                | FailureKind::Cache
                | FailureKind::Network
        )
    }

    /// Message suitable for showing to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            FailureKind::AudioRecording => "Recording failed. Please try again.",
            FailureKind::AudioPlayback => "Playback failed. Please try again.",
            FailureKind::FileSystem => "The recording file could not be accessed.",
            FailureKind::Database => "Your recordings could not be saved.",
            FailureKind::Permission => "Microphone access is required to record.",
            FailureKind::Validation => "That action is not available right now.",
            FailureKind::Network => "Network unavailable. Check your connection.",
            FailureKind::Cache => "Temporary data could not be loaded.",
            FailureKind::Unexpected => "Something went wrong.",
        }
    }

    /// Stable snake_case name for logs and serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::AudioRecording => "audio_recording",
            FailureKind::AudioPlayback => "audio_playback",
            FailureKind::FileSystem => "file_system",
            FailureKind::Database => "database",
            FailureKind::Permission => "permission",
            FailureKind::Validation => "validation",
            FailureKind::Network => "network",
            FailureKind::Cache => "cache",
            FailureKind::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
