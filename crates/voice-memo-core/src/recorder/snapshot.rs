use crate::{
    failure::Failure,
    permission::PermissionState,
    recorder::{RecorderState, RecordingSession},
};

use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Serialize;

/// Immutable point-in-time view of the controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifecycleSnapshot {
    sequence: u64,
    state: RecorderState,
    emitted_at: DateTime<Local>,
}

impl LifecycleSnapshot {
    pub(crate) fn new(sequence: u64, state: RecorderState) -> Self {
        Self {
            sequence,
            state,
            emitted_at: Local::now(),
        }
    }

    /// Emission order within one controller, starting at 1. The initial
    /// idle view reports 0.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The state at emission time.
    pub fn state(&self) -> &RecorderState {
        &self.state
    }

    /// When the snapshot was taken.
    pub fn emitted_at(&self) -> DateTime<Local> {
        self.emitted_at
    }

    /// Stable state name.
    pub fn state_name(&self) -> &'static str {
        self.state.name()
    }

    /// Session fields, when the state carries a session.
    pub fn session(&self) -> Option<&RecordingSession> {
        self.state.session()
    }

    /// See [`RecorderState::duration`].
    pub fn duration(&self) -> Duration {
        self.state.duration()
    }

    /// See [`RecorderState::amplitude`].
    pub fn amplitude(&self) -> f64 {
        self.state.amplitude()
    }
}

/// Everything the controller publishes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ControllerEvent {
    /// A state transition or an accepted feed tick.
    Lifecycle(LifecycleSnapshot),
    /// A classified failure.
    Error(Failure),
    /// Result of a permission check or request.
    Permission(PermissionState),
}
