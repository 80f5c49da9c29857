mod level_meter;
mod wav_capture;

pub(crate) use level_meter::LevelMeter;

#[cfg(test)]
pub(crate) use wav_capture::{pcm16_bit_rate, to_pcm16};

pub use wav_capture::WavCaptureService;
