use crate::{
    failure::{FailureKind, FailureRecord},
    permission::{PermissionKind, PermissionStatus},
};

use std::{fmt, time::Duration};

/// Capture-service call that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureOperation {
    /// `has_microphone` / `has_microphone_permission` probes.
    Probe,
    /// `start_recording`.
    Start,
    /// `pause_recording`.
    Pause,
    /// `resume_recording`.
    Resume,
    /// `stop_recording`.
    Stop,
    /// `cancel_recording`.
    Cancel,
}

impl CaptureOperation {
    /// Stable snake_case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureOperation::Probe => "probe",
            CaptureOperation::Start => "start",
            CaptureOperation::Pause => "pause",
            CaptureOperation::Resume => "resume",
            CaptureOperation::Stop => "stop",
            CaptureOperation::Cancel => "cancel",
        }
    }
}

impl fmt::Display for CaptureOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The collaborator that raised an error.
///
/// Classification depends only on this, never on the error's message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureOrigin {
    /// The audio capture service.
    CaptureService(CaptureOperation),
    /// The permission oracle.
    PermissionOracle(PermissionKind),
    /// The controller's own command validation.
    Controller,
    /// The file system.
    FileSystem,
    /// The data-access layer.
    Database,
    /// Playback of an existing recording.
    Playback,
    /// A remote service.
    Network,
    /// A local cache.
    Cache,
}

impl FailureOrigin {
    /// Kind assigned to every failure from this origin.
    pub fn kind(&self) -> FailureKind {
        match self {
            FailureOrigin::CaptureService(_) => FailureKind::AudioRecording,
            FailureOrigin::PermissionOracle(_) => FailureKind::Permission,
            FailureOrigin::Controller => FailureKind::Validation,
            FailureOrigin::FileSystem => FailureKind::FileSystem,
            FailureOrigin::Database => FailureKind::Database,
            FailureOrigin::Playback => FailureKind::AudioPlayback,
            FailureOrigin::Network => FailureKind::Network,
            FailureOrigin::Cache => FailureKind::Cache,
        }
    }

    /// Classify a raw error raised by this origin.
    pub fn classify(&self, error: &dyn std::error::Error) -> FailureRecord {
        let record = FailureRecord::new(self.kind(), error.to_string());
        match self {
            FailureOrigin::CaptureService(op) => record.code("capture_error").context("operation", op),
            FailureOrigin::PermissionOracle(kind) => record.code("oracle_error").context("permission", kind),
            _ => record,
        }
    }
}

impl FailureRecord {
    /// The capture service reported failure without raising an error.
    pub fn capture_refused(op: CaptureOperation) -> Self {
        FailureRecord::new(
            FailureKind::AudioRecording,
            format!("Capture service failed to {op} the recording"),
        )
        .code(format!("{op}_failed"))
        .context("operation", op)
    }

    /// `stop_recording` returned no artifact; the file is presumed lost.
    pub fn missing_artifact() -> Self {
        FailureRecord::new(
            FailureKind::AudioRecording,
            "Capture service returned no recording; the file was not saved",
        )
        .code("no_artifact")
        .context("operation", CaptureOperation::Stop)
    }

    /// A capture-service call did not complete within the configured bound.
    pub fn capture_timeout(op: CaptureOperation, limit: Duration) -> Self {
        FailureRecord::new(
            FailureKind::AudioRecording,
            format!("Capture service did not {op} within {}ms", limit.as_millis()),
        )
        .code("capture_timeout")
        .context("operation", op)
        .context("timeout_ms", limit.as_millis())
    }

    /// No input device is present.
    pub fn no_microphone() -> Self {
        FailureRecord::new(FailureKind::AudioRecording, "No microphone available")
            .code("no_microphone")
            .context("operation", CaptureOperation::Probe)
    }

    /// A command was issued in a state that does not accept it.
    pub fn invalid_state(command: &str, state: &str) -> Self {
        FailureRecord::new(
            FailureKind::Validation,
            format!("Cannot {command} while {state}"),
        )
        .code("invalid_state")
        .context("command", command)
        .context("state", state)
    }

    /// Authorization for `kind` is missing with the given `status`.
    ///
    /// A permanent denial carries `action = open_settings` because
    /// prompting again has no effect.
    pub fn permission_denied(kind: PermissionKind, status: PermissionStatus) -> Self {
        let record = FailureRecord::new(
            FailureKind::Permission,
            format!("{} permission {}", kind.label(), status.describe()),
        )
        .code(status.as_str())
        .context("permission", kind)
        .context("status", status);

        if status == PermissionStatus::PermanentlyDenied {
            record.context("action", "open_settings")
        } else {
            record.context("action", "request")
        }
    }
}
