//! Audio capture service contract.
//!
//! The capture service owns the microphone handle and the encoder. The
//! controller only talks to it through [`CaptureService`].

mod format;

pub use format::{AudioFormat, UnknownFormat};

use crate::CaptureResult;

use std::{path::PathBuf, time::Duration};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;

/// Parameters fixed when a capture session starts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureParams {
    /// Where the artifact is written.
    pub file_path: PathBuf,
    /// Encoding of the artifact.
    pub format: AudioFormat,
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Requested bit rate in bits per second.
    pub bit_rate: u32,
}

/// Descriptor of a finalized recording file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordingArtifact {
    /// Location of the finalized file.
    pub file_path: PathBuf,
    /// Audio length as measured by the capture service.
    pub duration: Duration,
    /// File size, when known.
    pub size_bytes: Option<u64>,
    /// Sample rate actually recorded, when it differs from or refines the request.
    pub sample_rate: Option<u32>,
    /// Bit rate actually recorded, when known.
    pub bit_rate: Option<u32>,
}

/// Hardware capture session provider.
///
/// Boolean results report a refused operation; `Err` reports a fault while
/// attempting it. Both are treated as failures by the controller.
#[async_trait]
pub trait CaptureService: Send + Sync {
    /// Whether the service itself is allowed to open the microphone.
    async fn has_microphone_permission(&self) -> bool;

    /// Whether an input device exists.
    async fn has_microphone(&self) -> bool;

    /// Begin capturing into `params.file_path`.
    async fn start_recording(&self, params: &CaptureParams) -> CaptureResult<bool>;

    /// Suspend capture, keeping the artifact open.
    async fn pause_recording(&self) -> CaptureResult<bool>;

    /// Continue a paused capture.
    async fn resume_recording(&self) -> CaptureResult<bool>;

    /// Finalize the artifact. `None` means nothing was saved.
    async fn stop_recording(&self) -> CaptureResult<Option<RecordingArtifact>>;

    /// Abort capture and delete any partial artifact.
    async fn cancel_recording(&self) -> CaptureResult<bool>;

    /// Live instantaneous level in `[0.0, 1.0]`.
    fn amplitude_feed(&self) -> broadcast::Receiver<f64>;

    /// Live elapsed recording time.
    fn duration_feed(&self) -> broadcast::Receiver<Duration>;
}
