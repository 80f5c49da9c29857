use crate::{
    failure::Failure,
    recorder::{Recording, RecordingSession},
};

use std::{path::PathBuf, time::Duration};

use chrono::{DateTime, Local};
use serde::Serialize;

/// Lifecycle state of the controller.
///
/// Each variant carries only the data valid in that state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RecorderState {
    /// No session.
    Idle,
    /// Querying authorization before a start or on request.
    PermissionChecking,
    /// Prompting for authorization.
    PermissionRequesting,
    /// Waiting for the capture service to begin.
    Starting {
        /// Folder of the pending session.
        folder_id: String,
        /// Artifact location of the pending session.
        file_path: PathBuf,
    },
    /// Capturing; feeds are subscribed.
    Running {
        /// The active session.
        session: RecordingSession,
    },
    /// Capture suspended; feeds are unsubscribed.
    Paused {
        /// The active session, amplitude reset to zero.
        session: RecordingSession,
        /// When the pause took effect.
        paused_at: DateTime<Local>,
    },
    /// Waiting for the capture service to finalize the artifact.
    Stopping {
        /// The session being finalized.
        session: RecordingSession,
    },
    /// The artifact was saved.
    Completed {
        /// The finalized recording.
        recording: Recording,
    },
    /// The session was discarded and its artifact deleted.
    Cancelled,
    /// Stop or cancel failed; the artifact state is unknown.
    Error {
        /// What went wrong.
        failure: Failure,
    },
}

impl RecorderState {
    /// Stable snake_case name.
    pub fn name(&self) -> &'static str {
        match self {
            RecorderState::Idle => "idle",
            RecorderState::PermissionChecking => "permission_checking",
            RecorderState::PermissionRequesting => "permission_requesting",
            RecorderState::Starting { .. } => "starting",
            RecorderState::Running { .. } => "running",
            RecorderState::Paused { .. } => "paused",
            RecorderState::Stopping { .. } => "stopping",
            RecorderState::Completed { .. } => "completed",
            RecorderState::Cancelled => "cancelled",
            RecorderState::Error { .. } => "error",
        }
    }

    /// The session, in states that carry one.
    pub fn session(&self) -> Option<&RecordingSession> {
        match self {
            RecorderState::Running { session }
            | RecorderState::Paused { session, .. }
            | RecorderState::Stopping { session } => Some(session),
            _ => None,
        }
    }

    /// Elapsed time of the current or just-completed recording, zero otherwise.
    pub fn duration(&self) -> Duration {
        match self {
            RecorderState::Completed { recording } => recording.duration,
            other => other
                .session()
                .map(RecordingSession::duration)
                .unwrap_or(Duration::ZERO),
        }
    }

    /// Live level while running, zero otherwise.
    pub fn amplitude(&self) -> f64 {
        match self {
            RecorderState::Running { session } => session.amplitude(),
            _ => 0.0,
        }
    }

    /// Whether the controller currently holds the capture lease.
    pub fn holds_lease(&self) -> bool {
        matches!(
            self,
            RecorderState::Starting { .. }
                | RecorderState::Running { .. }
                | RecorderState::Paused { .. }
                | RecorderState::Stopping { .. }
        )
    }

    /// States from which a new session may start.
    pub fn accepts_start(&self) -> bool {
        matches!(
            self,
            RecorderState::Idle
                | RecorderState::Completed { .. }
                | RecorderState::Cancelled
                | RecorderState::Error { .. }
        )
    }

    /// The failure carried by the `Error` state.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            RecorderState::Error { failure } => Some(failure),
            _ => None,
        }
    }

    /// The finalized recording carried by the `Completed` state.
    pub fn recording(&self) -> Option<&Recording> {
        match self {
            RecorderState::Completed { recording } => Some(recording),
            _ => None,
        }
    }
}
