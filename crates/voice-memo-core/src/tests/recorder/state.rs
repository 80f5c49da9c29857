use super::request;
use crate::{Failure, FailureKind, FailureRecord, RecorderState, RecordingSession};

use std::{path::PathBuf, time::Duration};

use chrono::Local;

fn session() -> RecordingSession {
    let mut session = RecordingSession::begin(
        request().name("Memo"),
        PathBuf::from("/tmp/recordings/inbox/recording_1.m4a"),
        Local::now(),
    );
    session.advance_duration(Duration::from_secs(12));
    session.set_amplitude(0.4);
    session
}

/// WHAT: Duration and amplitude accessors are total across states
/// WHY: Observers read them without matching on the state first
#[test]
fn given_each_state_when_reading_accessors_then_totals_returned() {
    // Given
    let running = RecorderState::Running { session: session() };
    let paused = RecorderState::Paused {
        session: session(),
        paused_at: Local::now(),
    };
    let idle = RecorderState::Idle;

    // When / Then
    assert_eq!(running.duration(), Duration::from_secs(12));
    assert_eq!(running.amplitude(), 0.4);
    assert_eq!(paused.duration(), Duration::from_secs(12));
    assert_eq!(paused.amplitude(), 0.0);
    assert_eq!(idle.duration(), Duration::ZERO);
    assert_eq!(idle.amplitude(), 0.0);
    assert!(idle.session().is_none());
}

/// WHAT: Only lease-free states accept a new start
/// WHY: Starting from a leased state would open the microphone twice
#[test]
fn given_each_state_when_checking_start_then_only_terminal_or_idle_accept() {
    // Given
    let failure = Failure::from(FailureRecord::new(FailureKind::AudioRecording, "lost"));
    let accepting = [
        RecorderState::Idle,
        RecorderState::Cancelled,
        RecorderState::Error { failure },
    ];
    let leased = [
        RecorderState::Starting {
            folder_id: "inbox".to_string(),
            file_path: PathBuf::from("/tmp/a.m4a"),
        },
        RecorderState::Running { session: session() },
        RecorderState::Stopping { session: session() },
    ];

    // When / Then
    for state in accepting {
        assert!(state.accepts_start(), "{}", state.name());
        assert!(!state.holds_lease(), "{}", state.name());
    }
    for state in leased {
        assert!(!state.accepts_start(), "{}", state.name());
        assert!(state.holds_lease(), "{}", state.name());
    }
    assert!(!RecorderState::PermissionChecking.accepts_start());
}

/// WHAT: The session rejects backwards duration and non-finite levels
/// WHY: Session values are only ever moved forward by valid samples
#[test]
fn given_session_when_applying_invalid_samples_then_rejected() {
    // Given
    let mut session = session();

    // When / Then
    assert!(!session.advance_duration(Duration::from_secs(3)));
    assert_eq!(session.duration(), Duration::from_secs(12));
    assert!(!session.set_amplitude(f64::INFINITY));
    assert_eq!(session.amplitude(), 0.4);
    assert_eq!(session.name(), Some("Memo"));
}
