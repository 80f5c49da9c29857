use crate::{
    capture::AudioFormat,
    failure::{FailureKind, FailureRecord},
};

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

const RECORDINGS_DIR: &str = "recordings";

/// `<root>/recordings/<folder_id>/recording_<unix_millis><ext>`.
pub fn recording_path(
    root: &Path,
    folder_id: &str,
    format: AudioFormat,
    at: DateTime<Local>,
) -> PathBuf {
    root.join(RECORDINGS_DIR).join(folder_id).join(format!(
        "recording_{}{}",
        at.timestamp_millis(),
        format.extension()
    ))
}

/// `"Recording YYYY-MM-DD HH-MM"`.
pub fn default_name(at: DateTime<Local>) -> String {
    format!("Recording {}", at.format("%Y-%m-%d %H-%M"))
}

/// First non-blank of the stop name and the start name, else the default.
pub fn resolve_name(
    final_name: Option<&str>,
    start_name: Option<&str>,
    started_at: DateTime<Local>,
) -> String {
    [final_name, start_name]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_name(started_at))
}

/// Folder ids become a single path component.
pub(crate) fn validate_folder_id(folder_id: &str) -> Result<(), FailureRecord> {
    let invalid = folder_id.trim().is_empty()
        || folder_id == "."
        || folder_id == ".."
        || folder_id.contains(['/', '\\']);

    if invalid {
        return Err(FailureRecord::new(
            FailureKind::Validation,
            format!("Invalid folder id: {folder_id:?}"),
        )
        .code("invalid_folder")
        .context("folder_id", folder_id));
    }

    Ok(())
}
