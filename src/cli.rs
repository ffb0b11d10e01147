use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Terminal client for a Trello-style board service.
/// Config, session and log files live in the user config directory
/// unless --config-dir is given.
#[derive(Parser)]
#[command(name = "bl", version, about = "Boards, cards and a Gantt timeline in the terminal")]
pub struct Cli {
    /// Directory for config.json, session.json and the log file.
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Base URL of the board service (overrides config and BOARDLINE_API_URL).
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}
