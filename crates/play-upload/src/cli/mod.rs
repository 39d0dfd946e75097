//! CLI definition and command handling

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use commands::{ActionCommand, FileCommand, UploadCommand};

/// play-upload - upload an AAB to Google Play as an internal draft release
#[derive(Debug, Parser)]
#[command(name = "play-upload")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands, one per way of passing the upload parameters
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload using command-line flags
    Upload(UploadCommand),

    /// Upload using INPUT_* environment variables (CI actions)
    Action(ActionCommand),

    /// Upload using positional arguments and a service account key file
    File(FileCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Upload(ref cmd) => cmd.execute(&self),
            Commands::Action(ref cmd) => cmd.execute(&self),
            Commands::File(ref cmd) => cmd.execute(&self),
        }
    }

    /// Whether progress lines should be printed
    pub fn shows_progress(&self) -> bool {
        !self.quiet && self.format == OutputFormat::Text
    }
}
