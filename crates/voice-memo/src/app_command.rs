use crate::AppError;

use std::{panic::Location, str::FromStr};

use error_location::ErrorLocation;

/// Commands read from stdin, one per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Start a new recording, optionally naming it up front.
    Start {
        /// Name used if stop does not supply one.
        name: Option<String>,
    },
    /// Pause the running recording.
    Pause,
    /// Resume the paused recording.
    Resume,
    /// Save the recording, optionally naming it.
    Stop {
        /// Final name of the recording.
        name: Option<String>,
    },
    /// Discard the recording.
    Cancel,
    /// Report permission state without prompting.
    Check,
    /// Ask for missing permissions.
    Request,
    /// Print the current state.
    Status,
    /// Print the command list.
    Help,
    /// Save any active recording and exit.
    Quit,
}

impl FromStr for AppCommand {
    type Err = AppError;

    #[track_caller]
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(word, rest)| (word, rest.trim()))
            .unwrap_or((line, ""));
        let name = (!rest.is_empty()).then(|| rest.to_string());

        let command = match word.to_ascii_lowercase().as_str() {
            "start" | "record" => AppCommand::Start { name },
            "stop" | "save" => AppCommand::Stop { name },
            "pause" if name.is_none() => AppCommand::Pause,
            "resume" if name.is_none() => AppCommand::Resume,
            "cancel" | "discard" if name.is_none() => AppCommand::Cancel,
            "check" if name.is_none() => AppCommand::Check,
            "request" if name.is_none() => AppCommand::Request,
            "status" if name.is_none() => AppCommand::Status,
            "help" | "?" if name.is_none() => AppCommand::Help,
            "quit" | "exit" if name.is_none() => AppCommand::Quit,
            _ => {
                return Err(AppError::InvalidCommand {
                    input: line.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        Ok(command)
    }
}
