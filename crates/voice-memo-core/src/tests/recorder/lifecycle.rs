use super::{error_events, failure_of, request, state_names};
use crate::{
    AudioFormat, ControllerConfig, ControllerEvent, FailureKind, PermissionKind,
    PermissionStatus, RecorderState, StartRequest, naming,
    tests::fakes::{Behavior, FakeOracle, Harness},
};

use std::{path::PathBuf, time::Duration};

/// WHAT: A granted start walks through checking and starting into running
/// WHY: Observers rely on the transient states to show progress
#[tokio::test]
async fn given_granted_permission_when_starting_then_running_with_fresh_session() {
    // Given: Controller with granted permission and a recordings root
    let config = ControllerConfig {
        recordings_root: PathBuf::from("/data/memos"),
        ..ControllerConfig::default()
    };
    let mut harness = Harness::spawn_with(FakeOracle::granted(), config);

    // When: Starting a recording
    let snapshot = harness
        .handle
        .start(request().sample_rate(48_000).bit_rate(96_000))
        .await
        .unwrap();

    // Then: Running with zero duration and the configured parameters
    let session = snapshot.session().unwrap();
    assert_eq!(snapshot.state_name(), "running");
    assert_eq!(session.duration(), Duration::ZERO);
    assert_eq!(session.amplitude(), 0.0);
    assert_eq!(session.folder_id(), "inbox");
    assert_eq!(session.sample_rate(), 48_000);
    assert!(session.file_path().starts_with("/data/memos/recordings/inbox"));
    assert_eq!(
        session.file_path().extension().and_then(|ext| ext.to_str()),
        Some("m4a")
    );

    // And: The capture service was asked with the same parameters
    let params = harness.capture.last_params().unwrap();
    assert_eq!(params.file_path, session.file_path());
    assert_eq!(params.bit_rate, 96_000);

    // And: Observers saw every transition in order
    let events = harness.drain();
    assert_eq!(
        state_names(&events),
        vec!["permission_checking", "starting", "running"]
    );
}

/// WHAT: Denied permission fails the start without touching the capture service
/// WHY: The microphone must never be opened without authorization
#[tokio::test]
async fn given_denied_permission_when_starting_then_permission_failure_and_idle() {
    // Given: Microphone denied
    let mut harness = Harness::spawn_with(
        FakeOracle::with(PermissionStatus::Denied),
        ControllerConfig::default(),
    );

    // When: Starting
    let failure = failure_of(harness.handle.start(request()).await);

    // Then: Permission failure, no capture calls, back to idle
    assert_eq!(failure.kind(), FailureKind::Permission);
    assert!(harness.capture.calls().is_empty());
    let snapshot = harness.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state(), &RecorderState::Idle);

    // And: Exactly one error event
    let events = harness.drain();
    assert_eq!(error_events(&events).len(), 1);
    assert_eq!(state_names(&events), vec!["permission_checking", "idle"]);
}

/// WHAT: A permanent denial tells the caller to open settings
/// WHY: The platform will not prompt again
#[tokio::test]
async fn given_permanently_denied_when_starting_then_open_settings_action() {
    // Given: Microphone permanently denied
    let harness = Harness::spawn_with(
        FakeOracle::with(PermissionStatus::PermanentlyDenied),
        ControllerConfig::default(),
    );

    // When: Starting
    let failure = failure_of(harness.handle.start(request()).await);

    // Then: The record carries the settings action
    let record = &failure.records()[0];
    assert_eq!(record.error_code(), Some("permanently_denied"));
    assert_eq!(record.context_value("action"), Some("open_settings"));
}

/// WHAT: Limited and provisional grants are enough to record
/// WHY: Those platforms still deliver microphone input
#[tokio::test]
async fn given_provisional_permission_when_starting_then_running() {
    // Given: Provisional microphone permission
    let harness = Harness::spawn_with(
        FakeOracle::with(PermissionStatus::Provisional),
        ControllerConfig::default(),
    );

    // When / Then: Start succeeds
    let snapshot = harness.handle.start(request()).await.unwrap();
    assert_eq!(snapshot.state_name(), "running");
}

/// WHAT: Missing input hardware fails with an audio recording failure
/// WHY: Permission alone does not mean there is a microphone
#[tokio::test]
async fn given_no_microphone_when_starting_then_no_microphone_failure() {
    // Given: No input device
    let harness = Harness::spawn();
    harness.capture.set_microphone(false);

    // When
    let failure = failure_of(harness.handle.start(request()).await);

    // Then
    assert_eq!(failure.kind(), FailureKind::AudioRecording);
    assert!(failure.has_code("no_microphone"));
    assert!(!harness.capture.called("start"));
}

/// WHAT: A capture service without its own grant fails the start as permission
/// WHY: The oracle and the capture backend may disagree after a revoke
#[tokio::test]
async fn given_capture_service_denies_when_starting_then_permission_failure() {
    // Given: Oracle grants but the capture service does not
    let harness = Harness::spawn();
    harness.capture.set_permission(false);

    // When
    let failure = failure_of(harness.handle.start(request()).await);

    // Then
    assert_eq!(failure.kind(), FailureKind::Permission);
    assert!(!harness.capture.called("start"));
}

/// WHAT: A refused start returns to idle
/// WHY: Nothing is recording, so a retry must be possible
#[tokio::test]
async fn given_capture_refuses_start_when_starting_then_idle() {
    // Given: Capture service that refuses to start
    let harness = Harness::spawn();
    harness.capture.set("start", Behavior::Refuse);

    // When
    let failure = failure_of(harness.handle.start(request()).await);

    // Then
    assert!(failure.has_code("start_failed"));
    let snapshot = harness.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state_name(), "idle");
}

/// WHAT: Folder ids that would escape the recordings tree are rejected
/// WHY: The folder id becomes a path component
#[tokio::test]
async fn given_path_like_folder_when_starting_then_validation_failure_without_transition() {
    // Given
    let mut harness = Harness::spawn();

    // When
    let failure = failure_of(
        harness
            .handle
            .start(StartRequest::new("../etc", AudioFormat::Wav))
            .await,
    );

    // Then: Rejected before any state change
    assert_eq!(failure.kind(), FailureKind::Validation);
    assert!(failure.has_code("invalid_folder"));
    assert!(state_names(&harness.drain()).is_empty());
}

/// WHAT: Start while running is rejected and the session is untouched
/// WHY: Only one microphone lease may exist
#[tokio::test]
async fn given_running_when_starting_again_then_invalid_state_and_same_session() {
    // Given: A running session
    let mut harness = Harness::spawn();
    let running = harness.handle.start(request()).await.unwrap();
    harness.drain();

    // When: Starting again
    let failure = failure_of(harness.handle.start(request()).await);

    // Then: Validation failure, one start call, same session
    assert!(failure.has_code("invalid_state"));
    assert_eq!(harness.capture.count("start"), 1);
    let snapshot = harness.handle.snapshot().await.unwrap();
    assert_eq!(
        snapshot.session().map(|s| s.id()),
        running.session().map(|s| s.id())
    );
    assert_eq!(error_events(&harness.drain()).len(), 1);
}

/// WHAT: Start while paused is rejected and the paused session is untouched
/// WHY: A paused recording still holds the microphone lease
#[tokio::test]
async fn given_paused_when_starting_again_then_invalid_state_and_same_session() {
    // Given: A paused session
    let mut harness = Harness::spawn();
    harness.handle.start(request()).await.unwrap();
    let paused = harness.handle.pause().await.unwrap();
    harness.drain();

    // When: Starting again
    let failure = failure_of(harness.handle.start(request()).await);

    // Then: Validation failure, still paused with the same session
    assert!(failure.has_code("invalid_state"));
    assert_eq!(harness.capture.count("start"), 1);
    let snapshot = harness.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state_name(), "paused");
    assert_eq!(
        snapshot.session().map(|s| s.id()),
        paused.session().map(|s| s.id())
    );
    let events = harness.drain();
    assert!(state_names(&events).is_empty());
    assert_eq!(error_events(&events).len(), 1);
}

/// WHAT: Commands outside their valid states are rejected
/// WHY: Invalid commands must not reach the capture service
#[tokio::test]
async fn given_idle_when_pausing_resuming_stopping_or_cancelling_then_invalid_state() {
    // Given
    let harness = Harness::spawn();

    // When / Then
    assert!(failure_of(harness.handle.pause().await).has_code("invalid_state"));
    assert!(failure_of(harness.handle.resume().await).has_code("invalid_state"));
    assert!(failure_of(harness.handle.stop(None).await).has_code("invalid_state"));
    assert!(failure_of(harness.handle.cancel().await).has_code("invalid_state"));
    assert!(harness.capture.calls().is_empty());
}

/// WHAT: Pause zeroes amplitude and resume keeps the accumulated duration
/// WHY: Paused time is not recorded and no level is live while paused
#[tokio::test]
async fn given_running_with_duration_when_pausing_and_resuming_then_duration_preserved() {
    // Given: Running with 4s recorded and a live level
    let mut harness = Harness::spawn();
    harness.handle.start(request()).await.unwrap();
    harness.capture.duration_tx.send(Duration::from_secs(4)).unwrap();
    harness.capture.amplitude_tx.send(0.6).unwrap();
    harness
        .wait_for_snapshot(|s| s.duration() == Duration::from_secs(4) && s.amplitude() == 0.6)
        .await;

    // When: Pausing
    let paused = harness.handle.pause().await.unwrap();

    // Then: Amplitude cleared, duration kept
    assert_eq!(paused.state_name(), "paused");
    assert_eq!(paused.amplitude(), 0.0);
    assert_eq!(paused.session().unwrap().amplitude(), 0.0);
    assert_eq!(paused.duration(), Duration::from_secs(4));

    // When: Resuming
    let resumed = harness.handle.resume().await.unwrap();

    // Then: Running again from the same duration
    assert_eq!(resumed.state_name(), "running");
    assert_eq!(resumed.duration(), Duration::from_secs(4));
}

/// WHAT: A refused pause leaves the recording running with live feeds
/// WHY: The capture service is still recording
#[tokio::test]
async fn given_capture_refuses_pause_when_pausing_then_still_running_with_feeds() {
    // Given
    let mut harness = Harness::spawn();
    harness.handle.start(request()).await.unwrap();
    harness.capture.set("pause", Behavior::Refuse);

    // When
    let failure = failure_of(harness.handle.pause().await);

    // Then: Still running and still receiving amplitude
    assert!(failure.has_code("pause_failed"));
    harness.capture.amplitude_tx.send(0.7).unwrap();
    let snapshot = harness.wait_for_snapshot(|s| s.amplitude() == 0.7).await;
    assert_eq!(snapshot.state_name(), "running");
}

/// WHAT: A failed resume stays paused
/// WHY: The capture service did not resume, so no audio is being recorded
#[tokio::test]
async fn given_capture_fails_resume_when_resuming_then_still_paused() {
    // Given
    let harness = Harness::spawn();
    harness.handle.start(request()).await.unwrap();
    harness.handle.pause().await.unwrap();
    harness.capture.set("resume", Behavior::Fail);

    // When
    let failure = failure_of(harness.handle.resume().await);

    // Then
    assert_eq!(failure.kind(), FailureKind::AudioRecording);
    assert!(failure.has_code("capture_error"));
    let snapshot = harness.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state_name(), "paused");
}

/// WHAT: Stop with a name completes the recording under that name
/// WHY: The recording record is what the library persists
#[tokio::test]
async fn given_running_when_stopping_with_name_then_completed_recording() {
    // Given: Running with 5s recorded
    let mut harness = Harness::spawn();
    let running = harness.handle.start(request()).await.unwrap();
    harness.capture.duration_tx.send(Duration::from_secs(5)).unwrap();
    harness
        .wait_for_snapshot(|s| s.duration() == Duration::from_secs(5))
        .await;

    // When
    let completed = harness
        .handle
        .stop(Some("Standup".to_string()))
        .await
        .unwrap();

    // Then: Completed with session metadata and artifact details
    let recording = completed.state().recording().unwrap();
    let session = running.session().unwrap();
    assert_eq!(recording.name, "Standup");
    assert_eq!(recording.id, session.id());
    assert_eq!(recording.file_path, session.file_path());
    assert_eq!(recording.duration, Duration::from_secs(5));
    assert_eq!(recording.size_bytes, Some(4096));
    assert!(!completed.state().holds_lease());

    // And: Stopping was observed before completion
    let names = state_names(&harness.drain());
    assert!(names.ends_with(&["stopping", "completed"]));
}

/// WHAT: Blank stop names fall back to the start name, then the default
/// WHY: Every recording needs a readable name
#[tokio::test]
async fn given_blank_stop_name_when_stopping_then_start_name_or_default_used() {
    // Given: A session started with a name
    let harness = Harness::spawn();
    harness
        .handle
        .start(request().name("Interview"))
        .await
        .unwrap();

    // When: Stopping with a blank name
    let completed = harness
        .handle
        .stop(Some("   ".to_string()))
        .await
        .unwrap();

    // Then: The start name is used
    assert_eq!(completed.state().recording().unwrap().name, "Interview");

    // Given: A session without any name
    harness.handle.start(request()).await.unwrap();

    // When: Stopping without a name
    let completed = harness.handle.stop(None).await.unwrap();

    // Then: Default timestamped name
    let recording = completed.state().recording().unwrap();
    assert_eq!(recording.name, naming::default_name(recording.created_at));
    assert!(recording.name.starts_with("Recording "));
}

/// WHAT: Completed recordings carry the rates the capture service actually used
/// WHY: A device recording at 48 kHz must not be reported as the requested 44.1 kHz
#[tokio::test]
async fn given_artifact_reports_device_rates_when_stopping_then_recording_uses_them() {
    // Given: A 44.1 kHz request, and a service that recorded at 48 kHz
    let harness = Harness::spawn();
    harness
        .handle
        .start(StartRequest::new("inbox", AudioFormat::Wav).sample_rate(44_100))
        .await
        .unwrap();
    harness
        .capture
        .set_artifact_rates(Some(48_000), Some(1_536_000));

    // When
    let completed = harness.handle.stop(None).await.unwrap();

    // Then
    let recording = completed.state().recording().unwrap();
    assert_eq!(recording.sample_rate, 48_000);
    assert_eq!(recording.bit_rate, 1_536_000);
}

/// WHAT: Requested rates are kept when the artifact does not report any
/// WHY: Encoders without rate feedback still produce a complete entity
#[tokio::test]
async fn given_artifact_without_rates_when_stopping_then_requested_rates_kept() {
    // Given
    let harness = Harness::spawn();
    harness
        .handle
        .start(request().sample_rate(22_050).bit_rate(64_000))
        .await
        .unwrap();

    // When
    let completed = harness.handle.stop(None).await.unwrap();

    // Then
    let recording = completed.state().recording().unwrap();
    assert_eq!(recording.sample_rate, 22_050);
    assert_eq!(recording.bit_rate, 64_000);
}

/// WHAT: Stop without an artifact lands in the error state
/// WHY: The user must know the recording was lost
#[tokio::test]
async fn given_capture_returns_no_artifact_when_stopping_then_error_state() {
    // Given
    let mut harness = Harness::spawn();
    harness.handle.start(request()).await.unwrap();
    harness.capture.set("stop", Behavior::Refuse);
    harness.drain();

    // When
    let failure = failure_of(harness.handle.stop(None).await);

    // Then: Error state carrying the same failure, emitted once
    assert!(failure.has_code("no_artifact"));
    let snapshot = harness.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state().failure(), Some(&failure));
    let events = harness.drain();
    assert_eq!(error_events(&events).len(), 1);
    assert_eq!(state_names(&events), vec!["stopping", "error"]);
}

/// WHAT: Stop raising an error lands in the error state, and a new start is accepted
/// WHY: A failed save must be reported, and must not block the next recording
#[tokio::test]
async fn given_capture_errors_on_stop_when_stopping_then_error_state_and_restartable() {
    // Given: Running, with a stop that raises
    let mut harness = Harness::spawn();
    harness.handle.start(request()).await.unwrap();
    harness.capture.set("stop", Behavior::Fail);
    harness.drain();

    // When
    let failure = failure_of(harness.handle.stop(None).await);

    // Then: Classified as a recording failure and carried by the error state
    assert_eq!(failure.kind(), FailureKind::AudioRecording);
    assert!(failure.has_code("capture_error"));
    let snapshot = harness.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state().failure(), Some(&failure));
    let events = harness.drain();
    assert_eq!(state_names(&events), vec!["stopping", "error"]);
    assert_eq!(error_events(&events).len(), 1);

    // When: Starting again
    let restarted = harness.handle.start(request()).await.unwrap();

    // Then: A new session is running
    assert_eq!(restarted.state_name(), "running");
    assert_eq!(harness.capture.count("start"), 2);
}

/// WHAT: Cancel from paused deletes the recording and ends in cancelled
/// WHY: Discarding must work whether or not audio is flowing
#[tokio::test]
async fn given_paused_when_cancelling_then_cancelled() {
    // Given
    let harness = Harness::spawn();
    harness.handle.start(request()).await.unwrap();
    harness.handle.pause().await.unwrap();

    // When
    let snapshot = harness.handle.cancel().await.unwrap();

    // Then
    assert_eq!(snapshot.state(), &RecorderState::Cancelled);
    assert!(harness.capture.called("cancel"));
    assert!(!harness.capture.called("stop"));
}

/// WHAT: A refused cancel lands in the error state
/// WHY: The artifact may still be on disk
#[tokio::test]
async fn given_capture_refuses_cancel_when_cancelling_then_error_state() {
    // Given
    let harness = Harness::spawn();
    harness.handle.start(request()).await.unwrap();
    harness.capture.set("cancel", Behavior::Refuse);

    // When
    let failure = failure_of(harness.handle.cancel().await);

    // Then
    assert!(failure.has_code("cancel_failed"));
    let snapshot = harness.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state_name(), "error");
}

/// WHAT: Terminal states accept a new start with a new session
/// WHY: The controller is reused for the next recording
#[tokio::test]
async fn given_error_state_when_starting_then_new_session_running() {
    // Given: A failed stop
    let harness = Harness::spawn();
    let first = harness.handle.start(request()).await.unwrap();
    harness.capture.set("stop", Behavior::Fail);
    let _ = harness.handle.stop(None).await;

    // When
    harness.capture.set("stop", Behavior::Succeed);
    let second = harness.handle.start(request()).await.unwrap();

    // Then
    assert_eq!(second.state_name(), "running");
    assert_ne!(
        first.session().map(|s| s.id()),
        second.session().map(|s| s.id())
    );
}

/// WHAT: Permission is re-checked on every start
/// WHY: Permission can be revoked between recordings
#[tokio::test]
async fn given_permission_revoked_after_recording_when_starting_then_permission_failure() {
    // Given: One completed recording
    let harness = Harness::spawn();
    harness.handle.start(request()).await.unwrap();
    harness.handle.stop(None).await.unwrap();

    // When: Permission revoked and starting again
    harness
        .oracle
        .set_status(PermissionKind::Microphone, PermissionStatus::Denied);
    let failure = failure_of(harness.handle.start(request()).await);

    // Then
    assert_eq!(failure.kind(), FailureKind::Permission);
    assert_eq!(harness.capture.count("start"), 1);
}

/// WHAT: Snapshot sequence numbers strictly increase
/// WHY: Observers order snapshots by sequence
#[tokio::test]
async fn given_full_lifecycle_when_observing_then_sequences_increase() {
    // Given
    let mut harness = Harness::spawn();

    // When
    harness.handle.start(request()).await.unwrap();
    harness.handle.pause().await.unwrap();
    harness.handle.resume().await.unwrap();
    harness.handle.stop(None).await.unwrap();

    // Then
    let sequences: Vec<u64> = harness
        .drain()
        .into_iter()
        .filter_map(|event| match event {
            ControllerEvent::Lifecycle(snapshot) => Some(snapshot.sequence()),
            _ => None,
        })
        .collect();
    assert!(sequences.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(sequences.len(), 7);
}
