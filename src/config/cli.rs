use crate::domain::model::SendMode;
use crate::utils::error::Result;
use crate::utils::validation::{validate_file_extensions, validate_path, Validate, WORKBOOK_EXTENSIONS};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "dispute-mailer")]
#[command(about = "Send dispute result emails from the 'Emails' sheet of a workbook")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, global = true, default_value = "mailer.toml")]
    pub config: PathBuf,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Check that a file opens as a workbook and list its sheets
    Inspect { file: PathBuf },

    /// Load and validate the 'Emails' sheet, then print the first rows
    Load {
        file: PathBuf,

        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Preview or send one email per row
    Send {
        file: PathBuf,

        /// Write previews instead of sending (overrides the configured mode)
        #[arg(long, conflicts_with = "send")]
        preview: bool,

        /// Send immediately (overrides the configured mode)
        #[arg(long)]
        send: bool,

        /// Print the final summary as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Command {
    pub fn file(&self) -> &PathBuf {
        match self {
            Command::Inspect { file } | Command::Load { file, .. } | Command::Send { file, .. } => {
                file
            }
        }
    }

    /// Mode forced by `--preview`/`--send`, if any.
    pub fn mode_override(&self) -> Option<SendMode> {
        match self {
            Command::Send { preview: true, .. } => Some(SendMode::Preview),
            Command::Send { send: true, .. } => Some(SendMode::Send),
            _ => None,
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        let file = self.command.file().to_string_lossy().into_owned();
        validate_path("file", &file)?;
        validate_file_extensions("file", &[file], WORKBOOK_EXTENSIONS)
    }
}
