//! Text rendering of controller output for the terminal.

use std::time::Duration;

use voice_memo_core::{Failure, LifecycleSnapshot, PermissionState, RecorderState};

const LEVEL_BAR_WIDTH: usize = 20;

pub(crate) const HELP: &str = "\
Commands:
  start [name]   start recording
  pause          pause recording
  resume         resume recording
  stop [name]    save recording
  cancel         discard recording
  check          show permission state
  request        ask for missing permissions
  status         show current state
  help           show this list
  quit           save any active recording and exit";

/// `m:ss`, or `h:mm:ss` past an hour.
pub(crate) fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Fixed-width meter for a level in `[0, 1]`.
pub(crate) fn level_bar(level: f64) -> String {
    let filled = (level.clamp(0.0, 1.0) * LEVEL_BAR_WIDTH as f64).round() as usize;
    format!(
        "[{}{}]",
        "#".repeat(filled),
        ".".repeat(LEVEL_BAR_WIDTH - filled)
    )
}

pub(crate) fn describe_snapshot(snapshot: &LifecycleSnapshot) -> String {
    match snapshot.state() {
        RecorderState::Idle => "Idle".to_string(),
        RecorderState::PermissionChecking => "Checking microphone permission...".to_string(),
        RecorderState::PermissionRequesting => "Requesting permissions...".to_string(),
        RecorderState::Starting { file_path, .. } => {
            format!("Starting recording to {}", file_path.display())
        }
        RecorderState::Running { session } => format!(
            "Recording {} {}",
            format_duration(session.duration()),
            level_bar(session.amplitude())
        ),
        RecorderState::Paused { session, .. } => {
            format!("Paused at {}", format_duration(session.duration()))
        }
        RecorderState::Stopping { .. } => "Saving recording...".to_string(),
        RecorderState::Completed { recording } => format!(
            "Saved \"{}\" ({}) to {}",
            recording.name,
            format_duration(recording.duration),
            recording.file_path.display()
        ),
        RecorderState::Cancelled => "Recording discarded".to_string(),
        RecorderState::Error { failure } => {
            format!("Recording failed: {}", describe_failure(failure))
        }
    }
}

/// One line per failed record, with a settings hint where it applies.
pub(crate) fn describe_failure(failure: &Failure) -> String {
    failure
        .records()
        .iter()
        .map(|record| {
            let mut line = format!("{} ({})", record.user_message(), record.message());
            if record.context_value("action") == Some("open_settings") {
                line.push_str(" Enable access in system settings.");
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn describe_permission(permission: &PermissionState) -> String {
    let microphone = if permission.has_microphone_permission {
        "granted".to_string()
    } else {
        permission.microphone.describe().to_string()
    };
    let hardware = if permission.has_microphone_hardware {
        "present"
    } else {
        "not found"
    };

    format!("Microphone permission: {microphone}; input device: {hardware}")
}
