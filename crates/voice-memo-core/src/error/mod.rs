use crate::failure::Failure;

use std::panic::Location;

use error_location::ErrorLocation;
use thiserror::Error;

/// Errors raised by capture-service implementations.
///
/// The controller never matches on the message of these errors; it classifies
/// them by the operation that raised them.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// No audio input device is available.
    #[error("No microphone found {location}")]
    NoMicrophoneFound {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The requested encoding is not supported by this capture service.
    #[error("Unsupported format: {format} {location}")]
    UnsupportedFormat {
        /// Name of the rejected format.
        format: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio device operation failed.
    #[error("Audio device error: {reason} {location}")]
    DeviceError {
        /// Description of the device error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Writing or removing the recording artifact failed.
    #[error("Artifact error: {reason} {location}")]
    ArtifactError {
        /// Description of the artifact error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The operation is not valid for the capture session's current state.
    #[error("No active capture session {location}")]
    NoActiveSession {
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Errors returned by [`ControllerHandle`](crate::ControllerHandle) commands.
#[derive(Error, Debug)]
pub enum ControllerError {
    /// The command was rejected or failed. The same failure was emitted to
    /// the event sink.
    #[error("Recording command failed: {failure}")]
    Failed {
        /// The classified failure.
        failure: Failure,
    },

    /// The controller task has exited (disposed or all handles dropped).
    #[error("Recording controller is closed {location}")]
    Closed {
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl ControllerError {
    #[track_caller]
    pub(crate) fn closed() -> Self {
        ControllerError::Closed {
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// The failure behind a rejected command.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            ControllerError::Failed { failure } => Some(failure),
            ControllerError::Closed { .. } => None,
        }
    }
}

impl From<Failure> for ControllerError {
    fn from(failure: Failure) -> Self {
        ControllerError::Failed { failure }
    }
}

/// Result type alias using [`CaptureError`].
pub type CaptureResult<T> = std::result::Result<T, CaptureError>;

/// Result type alias using [`ControllerError`].
pub type ControllerResult<T> = std::result::Result<T, ControllerError>;
