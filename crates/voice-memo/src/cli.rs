use clap::{Parser, Subcommand};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "voice-memo")]
#[command(about = "Record voice memos from the terminal", long_about = None)]
pub struct Cli {
    /// Log at trace level, ignoring RUST_LOG.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// What to do; recording when omitted.
    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CliCommand {
    /// Record interactively, reading commands from stdin (default)
    #[default]
    Run,
    /// Print the config file location and contents
    Config,
}
