use std::time::Duration;

/// Peak level over fixed windows of interleaved samples.
pub(crate) struct LevelMeter {
    window: usize,
    seen: usize,
    peak: f32,
}

impl LevelMeter {
    /// Length of audio summarized by one level.
    pub(crate) const WINDOW: Duration = Duration::from_millis(100);

    pub(crate) fn new(sample_rate: u32, channels: u16) -> Self {
        let per_second = u128::from(sample_rate) * u128::from(channels);
        let window = per_second * Self::WINDOW.as_millis() / 1000;

        Self {
            window: usize::try_from(window).unwrap_or(usize::MAX).max(1),
            seen: 0,
            peak: 0.0,
        }
    }

    /// Feed samples. Returns the peak of the last window completed by them.
    pub(crate) fn push(&mut self, samples: &[f32]) -> Option<f64> {
        let mut completed = None;

        for sample in samples {
            let level = sample.abs();
            if level.is_finite() && level > self.peak {
                self.peak = level;
            }

            self.seen += 1;
            if self.seen == self.window {
                completed = Some(f64::from(self.peak.min(1.0)));
                self.seen = 0;
                self.peak = 0.0;
            }
        }

        completed
    }
}
