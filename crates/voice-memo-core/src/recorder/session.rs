use crate::capture::{AudioFormat, CaptureParams, RecordingArtifact};

use std::{path::{Path, PathBuf}, time::Duration};

use chrono::{DateTime, Local};
use serde::Serialize;
use uuid::Uuid;

/// Parameters of a Start command.
#[derive(Debug, Clone, PartialEq)]
pub struct StartRequest {
    /// Logical folder the recording belongs to.
    pub folder_id: String,
    /// Encoding of the artifact.
    pub format: AudioFormat,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit rate in bits per second.
    pub bit_rate: u32,
    /// Name to use if Stop does not supply one.
    pub name: Option<String>,
}

impl StartRequest {
    /// Request with 44.1 kHz / 128 kbps defaults.
    pub fn new(folder_id: impl Into<String>, format: AudioFormat) -> Self {
        Self {
            folder_id: folder_id.into(),
            format,
            sample_rate: 44_100,
            bit_rate: 128_000,
            name: None,
        }
    }

    /// Override the sample rate.
    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Override the bit rate.
    pub fn bit_rate(mut self, bit_rate: u32) -> Self {
        self.bit_rate = bit_rate;
        self
    }

    /// Set the fallback name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// The active recording, owned by the controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordingSession {
    id: Uuid,
    file_path: PathBuf,
    folder_id: String,
    format: AudioFormat,
    sample_rate: u32,
    bit_rate: u32,
    name: Option<String>,
    duration: Duration,
    amplitude: f64,
    start_time: DateTime<Local>,
}

impl RecordingSession {
    pub(crate) fn begin(request: StartRequest, file_path: PathBuf, start_time: DateTime<Local>) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_path,
            folder_id: request.folder_id,
            format: request.format,
            sample_rate: request.sample_rate,
            bit_rate: request.bit_rate,
            name: request.name,
            duration: Duration::ZERO,
            amplitude: 0.0,
            start_time,
        }
    }

    /// Session id for log correlation.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Artifact location.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Logical folder.
    pub fn folder_id(&self) -> &str {
        &self.folder_id
    }

    /// Encoding.
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Bit rate in bits per second.
    pub fn bit_rate(&self) -> u32 {
        self.bit_rate
    }

    /// Name given at start, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Last known elapsed time.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Last known level in `[0.0, 1.0]`.
    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    /// Wall-clock start.
    pub fn start_time(&self) -> DateTime<Local> {
        self.start_time
    }

    pub(crate) fn capture_params(&self) -> CaptureParams {
        CaptureParams {
            file_path: self.file_path.clone(),
            format: self.format,
            sample_rate: self.sample_rate,
            bit_rate: self.bit_rate,
        }
    }

    /// Store a level, clamped into range. Non-finite levels are rejected.
    pub(crate) fn set_amplitude(&mut self, level: f64) -> bool {
        if !level.is_finite() {
            return false;
        }
        self.amplitude = level.clamp(0.0, 1.0);
        true
    }

    pub(crate) fn reset_amplitude(&mut self) {
        self.amplitude = 0.0;
    }

    /// Move duration forward. Values behind the current duration are rejected.
    pub(crate) fn advance_duration(&mut self, elapsed: Duration) -> bool {
        if elapsed < self.duration {
            return false;
        }
        self.duration = elapsed;
        true
    }
}

/// A finalized recording, as carried by the `Completed` state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recording {
    /// Same id as the session that produced it.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Logical folder.
    pub folder_id: String,
    /// Location of the finalized file.
    pub file_path: PathBuf,
    /// Encoding.
    pub format: AudioFormat,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit rate in bits per second.
    pub bit_rate: u32,
    /// Audio length.
    pub duration: Duration,
    /// File size, when the capture service reported it.
    pub size_bytes: Option<u64>,
    /// When the session started.
    pub created_at: DateTime<Local>,
}

impl Recording {
    pub(crate) fn finalize(session: RecordingSession, artifact: RecordingArtifact, name: String) -> Self {
        let duration = if artifact.duration.is_zero() {
            session.duration
        } else {
            artifact.duration
        };

        Self {
            id: session.id,
            name,
            folder_id: session.folder_id,
            file_path: artifact.file_path,
            format: session.format,
            sample_rate: artifact.sample_rate.unwrap_or(session.sample_rate),
            bit_rate: artifact.bit_rate.unwrap_or(session.bit_rate),
            duration,
            size_bytes: artifact.size_bytes,
            created_at: session.start_time,
        }
    }
}
