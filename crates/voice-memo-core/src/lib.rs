//! Voice Memo Core Library
//!
//! Recording lifecycle controller for a voice-memo application. The
//! controller owns the microphone lease through an abstract
//! [`CaptureService`], checks authorization through a [`PermissionOracle`],
//! and publishes immutable [`LifecycleSnapshot`]s to an [`EventSink`].
//!
//! # Example
//!
//! ```no_run
//! use voice_memo_core::{
//!     AudioFormat, BroadcastSink, CaptureService, ControllerConfig, ControllerResult,
//!     PermissionOracle, RecordingController, StartRequest,
//! };
//!
//! use std::sync::Arc;
//!
//! async fn record(
//!     capture: Arc<dyn CaptureService>,
//!     oracle: Arc<dyn PermissionOracle>,
//! ) -> ControllerResult<()> {
//!     let sink = Arc::new(BroadcastSink::new(64));
//!     let (handle, _task) =
//!         RecordingController::spawn(capture, oracle, sink, ControllerConfig::default());
//!
//!     handle.start(StartRequest::new("inbox", AudioFormat::M4a)).await?;
//!     let done = handle.stop(Some("Standup notes".to_string())).await?;
//!
//!     println!("Saved: {:?}", done.state().recording());
//!     handle.dispose();
//!     Ok(())
//! }
//! ```

mod capture;
mod error;
mod failure;
mod permission;
mod recorder;

pub use {
    capture::{AudioFormat, CaptureParams, CaptureService, RecordingArtifact, UnknownFormat},
    error::{CaptureError, CaptureResult, ControllerError, ControllerResult},
    failure::{
        CaptureOperation, CombinedFailure, Failure, FailureKind, FailureOrigin, FailureRecord,
        Severity,
    },
    permission::{PermissionKind, PermissionOracle, PermissionState, PermissionStatus},
    recorder::{
        BroadcastSink, ControllerConfig, ControllerEvent, ControllerHandle,
        DEFAULT_CAPTURE_TIMEOUT, DEFAULT_POLL_INTERVAL, DurationSource, EventSink,
        LifecycleSnapshot, RecorderState, Recording, RecordingController, RecordingSession,
        StartRequest, naming,
    },
};
