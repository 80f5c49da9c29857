use crate::{AppError, AppResult};

use std::{fs::OpenOptions, path::Path, sync::Mutex};

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub(crate) const DEFAULT_FILTER: &str = "voice_memo=debug,voice_memo_core=debug";
pub(crate) const VERBOSE_FILTER: &str = "voice_memo=trace,voice_memo_core=trace";
pub(crate) const LOG_FILE_NAME: &str = "voice-memo.log";

/// Filter from `--verbose`, then `RUST_LOG`, then the default.
pub(crate) fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new(VERBOSE_FILTER);
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber: human-readable lines on stderr, plus JSON
/// lines appended to `log_dir/voice-memo.log` when a directory is given.
///
/// The stderr layer is installed even when the log file cannot be opened;
/// the open error is returned afterwards.
#[track_caller]
pub(crate) fn init(verbose: bool, log_dir: Option<&Path>) -> AppResult<()> {
    let stderr = fmt::layer().with_writer(std::io::stderr);

    let opened = log_dir
        .map(|dir| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(LOG_FILE_NAME))
        })
        .transpose();

    let (file, open_error) = match opened {
        Ok(file) => (file, None),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(stderr)
        .with(file.map(|file| fmt::layer().json().with_writer(Mutex::new(file))))
        .init();

    match open_error {
        Some(e) => Err(AppError::from(e)),
        None => Ok(()),
    }
}
