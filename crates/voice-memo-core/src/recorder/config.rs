use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

/// Default bound on a single capture-service call.
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(10);
/// Interval of the duration poll when [`DurationSource::Poll`] is selected.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub(crate) const COMMAND_QUEUE_CAPACITY: usize = 32;
pub(crate) const TICK_QUEUE_CAPACITY: usize = 64;

/// Which producer drives a session's elapsed duration.
///
/// Exactly one is authoritative for a controller instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationSource {
    /// The capture service's pushed duration feed.
    #[default]
    Feed,
    /// A wall-clock timer measuring running time, ignoring the duration feed.
    Poll,
}

/// Controller tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerConfig {
    /// Base directory under which `recordings/<folder>/` is created.
    pub recordings_root: PathBuf,
    /// Bound on each capture-service call. `None` waits indefinitely.
    pub capture_timeout: Option<Duration>,
    /// Authoritative duration producer.
    pub duration_source: DurationSource,
    /// Poll period used with [`DurationSource::Poll`].
    pub poll_interval: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            recordings_root: PathBuf::new(),
            capture_timeout: Some(DEFAULT_CAPTURE_TIMEOUT),
            duration_source: DurationSource::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
