use super::request;
use crate::{
    BroadcastSink, CaptureService, ControllerConfig, DurationSource, PermissionOracle,
    RecorderState, RecordingController,
    recorder::FeedTick,
    tests::fakes::{FakeCapture, FakeOracle, Harness},
};

use std::{sync::Arc, time::Duration};

fn controller(config: ControllerConfig) -> (RecordingController, crate::ControllerHandle) {
    RecordingController::new(
        FakeCapture::new() as Arc<dyn CaptureService>,
        FakeOracle::granted() as Arc<dyn PermissionOracle>,
        Arc::new(BroadcastSink::new(16)),
        config,
    )
}

/// WHAT: The latest amplitude sample wins
/// WHY: The level meter shows the current input, not a peak
#[tokio::test]
async fn given_amplitude_samples_when_running_then_last_sample_reported() {
    // Given: A running session
    let mut harness = Harness::spawn();
    harness.handle.start(request()).await.unwrap();

    // When: Three samples arrive
    for level in [0.2, 0.5, 0.1] {
        harness.capture.amplitude_tx.send(level).unwrap();
    }

    // Then: Snapshots follow the samples and settle on the last
    harness.wait_for_snapshot(|s| s.amplitude() == 0.2).await;
    harness.wait_for_snapshot(|s| s.amplitude() == 0.5).await;
    harness.wait_for_snapshot(|s| s.amplitude() == 0.1).await;
    let snapshot = harness.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.amplitude(), 0.1);
}

/// WHAT: Out-of-range levels are clamped and non-finite levels ignored
/// WHY: A misbehaving meter must not corrupt the session
#[tokio::test]
async fn given_out_of_range_amplitude_when_running_then_clamped() {
    // Given
    let mut harness = Harness::spawn();
    harness.handle.start(request()).await.unwrap();

    // When: An over-range sample, then NaN, then a marker value
    harness.capture.amplitude_tx.send(1.7).unwrap();
    harness.capture.amplitude_tx.send(f64::NAN).unwrap();
    harness.capture.amplitude_tx.send(-0.3).unwrap();

    // Then: Clamped to the unit range, NaN produced no snapshot
    harness.wait_for_snapshot(|s| s.amplitude() == 1.0).await;
    let next = harness.wait_for_snapshot(|_| true).await;
    assert_eq!(next.amplitude(), 0.0);
}

/// WHAT: Duration reported to observers never decreases
/// WHY: A late or reordered sample must not rewind the timer
#[tokio::test]
async fn given_out_of_order_durations_when_running_then_duration_monotonic() {
    // Given
    let mut harness = Harness::spawn();
    harness.handle.start(request()).await.unwrap();

    // When: Samples arrive out of order
    for secs in [1, 3, 2, 4] {
        harness
            .capture
            .duration_tx
            .send(Duration::from_secs(secs))
            .unwrap();
    }

    // Then: Observed durations only move forward
    let mut observed = Vec::new();
    loop {
        let snapshot = harness.wait_for_snapshot(|_| true).await;
        observed.push(snapshot.duration());
        if snapshot.duration() == Duration::from_secs(4) {
            break;
        }
    }
    assert!(observed.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(!observed.contains(&Duration::from_secs(2)));
}

/// WHAT: Ticks from a previous subscription are discarded
/// WHY: A queued value from before pause must not overwrite the new period
#[tokio::test]
async fn given_stale_generation_tick_when_handling_then_ignored() {
    // Given: A controller driven directly, running
    let (mut controller, _handle) = controller(ControllerConfig::default());
    assert!(controller.start(request()).await.is_ok());
    let generation = controller.generation();

    // When: A tick from an older generation arrives
    controller.handle_tick(FeedTick::Amplitude {
        generation: generation - 1,
        level: 0.9,
    });

    // Then: Nothing changed
    assert_eq!(controller.current().amplitude(), 0.0);

    // When: A current tick arrives
    let sequence = controller.current().sequence();
    controller.handle_tick(FeedTick::Amplitude {
        generation,
        level: 0.8,
    });

    // Then: Applied as a new snapshot
    assert_eq!(controller.current().amplitude(), 0.8);
    assert_eq!(controller.current().sequence(), sequence + 1);
}

/// WHAT: Ticks that were queued before a pause are ignored after it
/// WHY: Paused sessions have no live feeds
#[tokio::test]
async fn given_paused_when_old_tick_arrives_then_state_unchanged() {
    // Given: Running, then paused
    let (mut controller, _handle) = controller(ControllerConfig::default());
    assert!(controller.start(request()).await.is_ok());
    let running_generation = controller.generation();
    assert!(controller.pause().await.is_ok());
    let before = controller.current().clone();

    // When: The queued tick is delivered late
    controller.handle_tick(FeedTick::Duration {
        generation: running_generation,
        elapsed: Duration::from_secs(30),
    });

    // Then
    assert_eq!(controller.current(), &before);
    assert_eq!(controller.current().state_name(), "paused");
}

/// WHAT: Feed values after cancel have no effect
/// WHY: Cancelled is terminal for the session
#[tokio::test]
async fn given_cancelled_when_feeds_emit_then_state_stays_cancelled() {
    // Given
    let harness = Harness::spawn();
    harness.handle.start(request()).await.unwrap();
    harness.handle.cancel().await.unwrap();

    // When: The capture service keeps emitting
    let _ = harness.capture.amplitude_tx.send(0.9);
    let _ = harness.capture.duration_tx.send(Duration::from_secs(9));
    tokio::task::yield_now().await;

    // Then
    let snapshot = harness.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state(), &RecorderState::Cancelled);
    assert_eq!(snapshot.amplitude(), 0.0);
}

/// WHAT: Feed-driven duration is ignored in poll mode
/// WHY: Exactly one duration source is authoritative
#[tokio::test]
async fn given_poll_mode_when_duration_feed_emits_then_tick_rejected() {
    // Given: A poll-driven controller, running
    let (mut controller, _handle) = controller(ControllerConfig {
        duration_source: DurationSource::Poll,
        ..ControllerConfig::default()
    });
    assert!(controller.start(request()).await.is_ok());
    let generation = controller.generation();

    // When: A duration feed tick arrives
    controller.handle_tick(FeedTick::Duration {
        generation,
        elapsed: Duration::from_secs(30),
    });

    // Then
    assert_eq!(controller.current().duration(), Duration::ZERO);
}

/// WHAT: Poll mode measures running time and excludes paused time
/// WHY: Capture services without a duration feed still need a timer
#[tokio::test(start_paused = true)]
async fn given_poll_mode_when_time_passes_then_duration_tracks_running_time() {
    // Given: A poll-driven controller
    let config = ControllerConfig {
        duration_source: DurationSource::Poll,
        poll_interval: Duration::from_secs(1),
        ..ControllerConfig::default()
    };
    let harness = Harness::spawn_with(FakeOracle::granted(), config);
    harness.handle.start(request()).await.unwrap();

    // When: 3.5s of running time pass
    tokio::time::sleep(Duration::from_millis(3_500)).await;
    let running = harness.handle.snapshot().await.unwrap();

    // Then: Duration reflects whole poll ticks
    assert!(running.duration() >= Duration::from_secs(2));
    assert!(running.duration() <= Duration::from_millis(3_500));

    // When: Paused for a minute
    let paused = harness.handle.pause().await.unwrap();
    tokio::time::sleep(Duration::from_secs(60)).await;
    let resumed = harness.handle.resume().await.unwrap();

    // Then: Paused time is not counted
    assert!(paused.duration() >= running.duration());
    assert!(paused.duration() <= Duration::from_secs(4));
    assert_eq!(resumed.duration(), paused.duration());

    // When: Another 2.5s of running time
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    let later = harness.handle.snapshot().await.unwrap();

    // Then
    assert!(later.duration() >= paused.duration() + Duration::from_secs(2));
    assert!(later.duration() < Duration::from_secs(10));
}
