//! # BL - Boardline
//!
//! A terminal client for a Trello-style board service: boards hold lists,
//! lists hold cards, and every card with dates shows up on a Gantt timeline
//! spanning all boards.
//!
//! ## Key Features
//!
//! - **Gantt Timeline**: week (14 days) or month (30 days) pages centred on an
//!   anchor date, with one bar per card across all boards
//! - **Board Management**: create and delete boards, lists and cards, invite members
//! - **Due Dates and Progress**: natural-language due dates, completion toggle,
//!   and quarter-step progress in the timeline view
//! - **Multiple Interfaces**: scriptable CLI plus an interactive TUI
//!
//! ## Quick Start
//!
//! ```bash
//! # Create an account and log in
//! bl register --email me@example.com
//! bl login --email me@example.com
//!
//! # Set up a board
//! bl board add "Website relaunch"
//! bl list add 1 "Todo"
//! bl card add 1 "Write copy"
//! bl card due 1 "next friday"
//!
//! # Look at the timeline
//! bl timeline --mode month
//! bl ui
//! ```
//!
//! Config (`config.json`), the session token (`session.json`) and the log
//! (`boardline.log`) live in `~/.config/boardline/` unless `--config-dir` is given.

use clap::Parser;

pub mod api;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod dates;
pub mod error;
pub mod fields;
pub mod logging;
pub mod session;
pub mod task;
pub mod timeline;
pub mod view_model;
pub mod tui {
    pub mod colors;
    pub mod enums;
    pub mod gantt;
    pub mod input;
    pub mod run;
    pub mod utils;
}

use cli::Cli;
use cmd::*;
use config::{config_dir, Config, API_URL_ENV};
use error::AppError;
use session::Session;

fn main() {
    let cli = Cli::parse();

    let dir = config_dir(cli.config_dir.as_deref());
    let config = Config::load(&dir).with_overrides(std::env::var(API_URL_ENV).ok(), cli.api_url.clone());
    logging::init(&dir, config.debug_logging);
    log::debug!("using {} against {}", dir.display(), config.api_url);

    let ctx = Context::new(dir, config);

    let result = match cli.command {
        Commands::Ui => cmd_ui(&ctx),
        Commands::Register { email, password } => cmd_register(&ctx, email, password),
        Commands::Login { email, password } => cmd_login(&ctx, email, password),
        Commands::Logout => cmd_logout(&ctx),
        Commands::Whoami => cmd_whoami(&ctx),
        Commands::Boards => cmd_boards(&ctx),
        Commands::Board { action } => cmd_board(&ctx, action),
        Commands::List { action } => cmd_list(&ctx, action),
        Commands::Card { action } => cmd_card(&ctx, action),
        Commands::Timeline { mode, date, day_width } => cmd_timeline(&ctx, mode, date, day_width),
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    };

    if let Err(e) = result {
        report(&ctx, &e);
        std::process::exit(1);
    }
}

/// Print a failed command's error. An authentication failure also drops the
/// stored session so the next command starts from a clean login.
fn report(ctx: &Context, e: &AppError) {
    log::error!("{}", e);
    match Session::clear_if_rejected(&ctx.dir, e) {
        Ok(true) => eprintln!("Error: {e}. Log in again with `bl login --email <email>`."),
        Ok(false) => eprintln!("Error: {e}"),
        Err(clear_err) => {
            log::warn!("could not clear session: {}", clear_err);
            eprintln!("Error: {e}. Log in again with `bl login --email <email>`.");
        }
    }
}
