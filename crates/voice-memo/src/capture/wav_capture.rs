//! Microphone capture into a 16-bit PCM WAV file.

use crate::capture::LevelMeter;

use std::{
    fs::{self, File},
    io::BufWriter,
    panic::Location,
    path::PathBuf,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use cpal::{
    Device, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use hound::{WavSpec, WavWriter};
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn};
use voice_memo_core::{
    AudioFormat, CaptureError, CaptureParams, CaptureResult, CaptureService, RecordingArtifact,
};

const FEED_CAPACITY: usize = 64;

type WavFileWriter = WavWriter<BufWriter<File>>;

/// Bits per second of 16-bit PCM at this rate and channel count.
pub(crate) fn pcm16_bit_rate(sample_rate: u32, channels: u16) -> u32 {
    sample_rate
        .saturating_mul(u32::from(channels))
        .saturating_mul(16)
}

#[track_caller]
fn no_active_session() -> CaptureError {
    CaptureError::NoActiveSession {
        location: ErrorLocation::from(Location::caller()),
    }
}

/// Convert a float sample to 16-bit PCM, clamping out-of-range input.
pub(crate) fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16
}

/// State shared between the audio callback and the service.
struct CaptureShared {
    writer: Mutex<Option<WavFileWriter>>,
    meter: Mutex<LevelMeter>,
    /// Set while paused; the callback drops samples.
    paused: AtomicBool,
    /// Set before the stream is dropped so no late callback writes.
    shutdown: AtomicBool,
    frames: AtomicU64,
    sample_rate: u32,
    channels: u16,
    amplitude_tx: broadcast::Sender<f64>,
    duration_tx: broadcast::Sender<Duration>,
}

impl CaptureShared {
    fn write(&self, data: &[f32]) {
        if self.shutdown.load(Ordering::Acquire) || self.paused.load(Ordering::Acquire) {
            return;
        }

        {
            let mut writer = self.writer.lock().unwrap_or_else(|e| {
                error!("WAV writer lock poisoned, recovering: {}", e);
                e.into_inner()
            });
            let Some(writer) = writer.as_mut() else {
                return;
            };
            for &sample in data {
                if let Err(e) = writer.write_sample(to_pcm16(sample)) {
                    error!(error = %e, "Failed to write audio sample");
                    return;
                }
            }
        }

        let frames = (data.len() / usize::from(self.channels.max(1))) as u64;
        self.frames.fetch_add(frames, Ordering::AcqRel);

        let level = self
            .meter
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(data);
        if let Some(level) = level {
            // No subscribers while the controller is between feeds.
            let _ = self.amplitude_tx.send(level);
            let _ = self.duration_tx.send(self.elapsed());
        }
    }

    /// Audio written so far, derived from frames so paused time is excluded.
    fn elapsed(&self) -> Duration {
        let frames = self.frames.load(Ordering::Acquire);
        Duration::from_secs_f64(frames as f64 / f64::from(self.sample_rate.max(1)))
    }

    fn finish(&self) -> Result<(), hound::Error> {
        let writer = self
            .writer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        match writer {
            Some(writer) => writer.finalize(),
            None => Ok(()),
        }
    }
}

struct ActiveCapture {
    stream: Stream,
    shared: Arc<CaptureShared>,
    file_path: PathBuf,
}

/// [`CaptureService`] backed by the default cpal input device.
///
/// Only WAV is encodable; other formats are refused at start.
pub struct WavCaptureService {
    active: Mutex<Option<ActiveCapture>>,
    amplitude_tx: broadcast::Sender<f64>,
    duration_tx: broadcast::Sender<Duration>,
}

impl WavCaptureService {
    /// Create an idle service. No device is opened until a recording starts.
    pub fn new() -> Self {
        let (amplitude_tx, _) = broadcast::channel(FEED_CAPACITY);
        let (duration_tx, _) = broadcast::channel(FEED_CAPACITY);

        Self {
            active: Mutex::new(None),
            amplitude_tx,
            duration_tx,
        }
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveCapture>> {
        self.active.lock().unwrap_or_else(|e| {
            error!("Capture state lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }

    #[track_caller]
    fn input_device() -> CaptureResult<Device> {
        cpal::default_host()
            .default_input_device()
            .ok_or(CaptureError::NoMicrophoneFound {
                location: ErrorLocation::from(Location::caller()),
            })
    }

    #[track_caller]
    fn open(&self, params: &CaptureParams) -> CaptureResult<ActiveCapture> {
        let device = Self::input_device()?;

        let config: StreamConfig = device
            .default_input_config()
            .map_err(|e| CaptureError::DeviceError {
                reason: format!("Failed to get config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?
            .into();

        if config.sample_rate != params.sample_rate {
            debug!(
                requested = params.sample_rate,
                device = config.sample_rate,
                "Recording at the device sample rate"
            );
        }

        if let Some(parent) = params.file_path.parent() {
            fs::create_dir_all(parent).map_err(|e| CaptureError::ArtifactError {
                reason: format!("Failed to create {}: {}", parent.display(), e),
                location: ErrorLocation::from(Location::caller()),
            })?;
        }

        let spec = WavSpec {
            channels: config.channels,
            sample_rate: config.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let writer =
            WavWriter::create(&params.file_path, spec).map_err(|e| CaptureError::ArtifactError {
                reason: format!("Failed to create WAV writer: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let shared = Arc::new(CaptureShared {
            writer: Mutex::new(Some(writer)),
            meter: Mutex::new(LevelMeter::new(config.sample_rate, config.channels)),
            paused: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            frames: AtomicU64::new(0),
            sample_rate: config.sample_rate,
            channels: config.channels,
            amplitude_tx: self.amplitude_tx.clone(),
            duration_tx: self.duration_tx.clone(),
        });

        let callback_shared = Arc::clone(&shared);
        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| callback_shared.write(data),
                |err| {
                    error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| CaptureError::DeviceError {
                reason: format!("Failed to build stream: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        stream.play().map_err(|e| CaptureError::DeviceError {
            reason: format!("Failed to start stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(
            device_id = ?device.id(),
            sample_rate = config.sample_rate,
            channels = config.channels,
            "Audio capture started"
        );

        Ok(ActiveCapture {
            stream,
            shared,
            file_path: params.file_path.clone(),
        })
    }

    /// Stop the stream and close the file.
    async fn close(active: ActiveCapture) -> (Arc<CaptureShared>, PathBuf, Result<(), hound::Error>) {
        let ActiveCapture {
            stream,
            shared,
            file_path,
        } = active;

        shared.shutdown.store(true, Ordering::Release);
        drop(stream);
        // Let a final in-flight callback observe the shutdown flag.
        tokio::time::sleep(Duration::from_millis(5)).await;

        let finished = shared.finish();
        (shared, file_path, finished)
    }
}

impl Default for WavCaptureService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureService for WavCaptureService {
    async fn has_microphone_permission(&self) -> bool {
        // Desktop hosts grant input access without a prompt.
        true
    }

    async fn has_microphone(&self) -> bool {
        Self::input_device().is_ok()
    }

    #[instrument(skip(self, params), fields(file_path = ?params.file_path))]
    async fn start_recording(&self, params: &CaptureParams) -> CaptureResult<bool> {
        if params.format != AudioFormat::Wav {
            warn!(format = %params.format, "Only WAV recordings are supported");
            return Ok(false);
        }
        if self.lock_active().is_some() {
            warn!("A capture session is already active");
            return Ok(false);
        }

        match self.open(params) {
            Ok(active) => {
                *self.lock_active() = Some(active);
                Ok(true)
            }
            Err(e) => {
                // A partially created file is not a recording.
                let _ = fs::remove_file(&params.file_path);
                Err(e)
            }
        }
    }

    #[instrument(skip(self))]
    async fn pause_recording(&self) -> CaptureResult<bool> {
        let active = self.lock_active();
        let Some(active) = active.as_ref() else {
            return Err(no_active_session());
        };

        active.shared.paused.store(true, Ordering::Release);
        if let Err(e) = active.stream.pause() {
            debug!(error = %e, "Backend cannot pause the stream; dropping samples instead");
        }
        info!("Audio capture paused");
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn resume_recording(&self) -> CaptureResult<bool> {
        let active = self.lock_active();
        let Some(active) = active.as_ref() else {
            return Err(no_active_session());
        };

        active.stream.play().map_err(|e| CaptureError::DeviceError {
            reason: format!("Failed to resume stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;
        active.shared.paused.store(false, Ordering::Release);
        info!("Audio capture resumed");
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn stop_recording(&self) -> CaptureResult<Option<RecordingArtifact>> {
        let Some(active) = self.lock_active().take() else {
            return Ok(None);
        };

        let (shared, file_path, finished) = Self::close(active).await;
        finished.map_err(|e| CaptureError::ArtifactError {
            reason: format!("Failed to finalize WAV file: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let duration = shared.elapsed();
        let size_bytes = fs::metadata(&file_path).ok().map(|meta| meta.len());
        info!(
            file_path = ?file_path,
            duration_ms = duration.as_millis(),
            size_bytes,
            sample_rate = shared.sample_rate,
            "Audio capture stopped"
        );

        // Recorded at the device rate, which may differ from the request.
        Ok(Some(RecordingArtifact {
            file_path,
            duration,
            size_bytes,
            sample_rate: Some(shared.sample_rate),
            bit_rate: Some(pcm16_bit_rate(shared.sample_rate, shared.channels)),
        }))
    }

    #[instrument(skip(self))]
    async fn cancel_recording(&self) -> CaptureResult<bool> {
        let Some(active) = self.lock_active().take() else {
            return Ok(false);
        };

        let (_, file_path, finished) = Self::close(active).await;
        if let Err(e) = finished {
            debug!(error = %e, "Discarded recording did not finalize cleanly");
        }

        fs::remove_file(&file_path).map_err(|e| CaptureError::ArtifactError {
            reason: format!("Failed to delete {}: {}", file_path.display(), e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!(file_path = ?file_path, "Audio capture cancelled");
        Ok(true)
    }

    fn amplitude_feed(&self) -> broadcast::Receiver<f64> {
        self.amplitude_tx.subscribe()
    }

    fn duration_feed(&self) -> broadcast::Receiver<Duration> {
        self.duration_tx.subscribe()
    }
}
