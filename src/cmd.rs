//! Command implementations for the CLI interface.
//!
//! Each subcommand resolves the session and API client from a [`Context`],
//! performs its calls through the board view model, and prints a short
//! result. Errors are returned to `main`, which reports them.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::api::client::ApiClient;
use crate::api::BoardApi;
use crate::config::{Config, CONFIG_FILE, MAX_DAY_WIDTH};
use crate::dates::{format_due_relative, parse_due_input};
use crate::error::{AppError, AppResult};
use crate::fields::ViewMode;
use crate::session::Session;
use crate::task::Board;
use crate::timeline::{describe_range, generate_range, position};
use crate::tui::run::run_tui;
use crate::tui::utils::truncate;
use crate::view_model::BoardViewModel;

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive Gantt timeline.
    Ui,

    /// Create an account.
    Register {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted.
        #[arg(long)]
        password: Option<String>,
    },

    /// Log in and store the session token.
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted.
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored session.
    Logout,

    /// Show the logged-in user.
    Whoami,

    /// List all boards with their lists and cards.
    Boards,

    /// Board operations.
    Board {
        #[command(subcommand)]
        action: BoardAction,
    },

    /// List operations.
    List {
        #[command(subcommand)]
        action: ListAction,
    },

    /// Card operations.
    Card {
        #[command(subcommand)]
        action: CardAction,
    },

    /// Print the Gantt timeline as text.
    Timeline {
        /// Week (14 days) or month (30 days); defaults to the configured mode.
        #[arg(long, value_enum)]
        mode: Option<ViewMode>,
        /// Anchor date: YYYY-MM-DD, "today", "next friday", "in 2w", ...
        #[arg(long)]
        date: Option<String>,
        /// Characters per day.
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_DAY_WIDTH as i64))]
        day_width: Option<u32>,
    },

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum BoardAction {
    /// Create a board.
    Add {
        title: String,
        #[arg(long)]
        desc: Option<String>,
    },
    /// Show one board and its lists.
    Show { id: i64 },
    /// Delete a board.
    Rm { id: i64 },
    /// Invite a member by email.
    Invite { id: i64, email: String },
}

#[derive(Subcommand)]
pub enum ListAction {
    /// Add a list to a board.
    Add { board_id: i64, title: String },
    /// Rename a list.
    Rename { list_id: i64, title: String },
    /// Delete a list and its cards.
    Rm { list_id: i64 },
}

#[derive(Subcommand)]
pub enum CardAction {
    /// Add a card to a list.
    Add { list_id: i64, title: String },
    /// Delete a card.
    Rm { card_id: i64 },
    /// Toggle a card's completion.
    Done { card_id: i64 },
    /// Set or clear a card's due date.
    Due {
        card_id: i64,
        /// YYYY-MM-DD, "today", "tomorrow", "in 3d", "next monday", ...
        date: Option<String>,
        /// Remove the due date.
        #[arg(long, conflicts_with = "date")]
        clear: bool,
    },
}

/// Resolved directories and configuration shared by all commands.
pub struct Context {
    pub dir: PathBuf,
    pub config: Config,
}

impl Context {
    pub fn new(dir: PathBuf, config: Config) -> Self {
        Self { dir, config }
    }

    fn anonymous_client(&self) -> AppResult<ApiClient> {
        ApiClient::new(self.config.api_url.clone(), None)
    }

    /// Client carrying the stored session.
    pub fn client(&self) -> AppResult<ApiClient> {
        let session = Session::require(&self.dir)?;
        ApiClient::new(self.config.api_url.clone(), Some(session))
    }

    /// View model with boards already loaded.
    pub fn loaded_view_model(&self) -> AppResult<BoardViewModel<ApiClient>> {
        let mut vm = BoardViewModel::new(self.client()?);
        vm.load_boards()?;
        Ok(vm)
    }
}

fn read_password(given: Option<String>) -> AppResult<String> {
    if let Some(p) = given {
        return Ok(p);
    }
    print!("Password: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(AppError::InvalidInput("password cannot be empty".into()));
    }
    Ok(password)
}

pub fn cmd_ui(ctx: &Context) -> AppResult<()> {
    let vm = BoardViewModel::new(ctx.client()?);
    run_tui(vm, &ctx.config)
}

pub fn cmd_register(ctx: &Context, email: String, password: Option<String>) -> AppResult<()> {
    let password = read_password(password)?;
    let user = ctx.anonymous_client()?.register(&email, &password)?;
    println!("Registered {} (user #{}). Run `bl login --email {}` next.", user.email, user.id, user.email);
    Ok(())
}

pub fn cmd_login(ctx: &Context, email: String, password: Option<String>) -> AppResult<()> {
    let password = read_password(password)?;
    let session = ctx.anonymous_client()?.login(&email, &password)?;
    session.save(&ctx.dir)?;
    // Remember which server this session belongs to.
    if !ctx.dir.join(CONFIG_FILE).exists() {
        ctx.config.save(&ctx.dir)?;
    }
    println!("Logged in as {}.", email);
    Ok(())
}

pub fn cmd_logout(ctx: &Context) -> AppResult<()> {
    Session::clear(&ctx.dir)?;
    println!("Logged out.");
    Ok(())
}

pub fn cmd_whoami(ctx: &Context) -> AppResult<()> {
    let user = ctx.client()?.me()?;
    println!("{} (user #{})", user.email, user.id);
    Ok(())
}

fn print_board(board: &Board, today: NaiveDate) {
    println!("[{}] {}  ({}/{} done)", board.id, board.name, board.completed_count(), board.tasks.len());
    if let Some(desc) = board.description.as_deref().filter(|d| !d.is_empty()) {
        println!("      {}", desc);
    }
    for list in &board.lists {
        println!("  [{}] {}", list.id, list.title);
        for task in board.tasks.iter().filter(|t| t.list_id == list.id) {
            let mark = if task.completed { "x" } else { " " };
            println!(
                "    [{}] #{:<5} {:<40} {}",
                mark,
                task.id,
                truncate(&task.title, 40),
                format_due_relative(task.end_date, today)
            );
        }
    }
}

pub fn cmd_boards(ctx: &Context) -> AppResult<()> {
    let vm = ctx.loaded_view_model()?;
    if vm.boards().is_empty() {
        println!("No boards yet. Create one with `bl board add <title>`.");
        return Ok(());
    }
    let today = Local::now().date_naive();
    for board in vm.boards() {
        print_board(board, today);
    }
    Ok(())
}

pub fn cmd_board(ctx: &Context, action: BoardAction) -> AppResult<()> {
    match action {
        BoardAction::Add { title, desc } => {
            let mut vm = BoardViewModel::new(ctx.client()?);
            let id = vm.create_board(&title, desc.as_deref())?;
            println!("Created board {}.", id);
        }
        BoardAction::Show { id } => {
            let client = ctx.client()?;
            let dto = client.fetch_board(id)?;
            let lists = client.fetch_lists(id)?;
            println!("[{}] {}", dto.id, dto.title);
            if let Some(desc) = dto.description.as_deref().filter(|d| !d.is_empty()) {
                println!("      {}", desc);
            }
            for list in lists {
                println!("  [{}] {} ({} cards)", list.id, list.title, list.cards.len());
            }
        }
        BoardAction::Rm { id } => {
            ctx.loaded_view_model()?.delete_board(id)?;
            println!("Deleted board {}.", id);
        }
        BoardAction::Invite { id, email } => {
            ctx.loaded_view_model()?.invite_member(id, &email)?;
            println!("Invited {} to board {}.", email, id);
        }
    }
    Ok(())
}

pub fn cmd_list(ctx: &Context, action: ListAction) -> AppResult<()> {
    let mut vm = ctx.loaded_view_model()?;
    match action {
        ListAction::Add { board_id, title } => {
            let id = vm.add_list(board_id, &title)?;
            println!("Added list {} to board {}.", id, board_id);
        }
        ListAction::Rename { list_id, title } => {
            vm.rename_list(list_id, &title)?;
            println!("Renamed list {}.", list_id);
        }
        ListAction::Rm { list_id } => {
            vm.delete_list(list_id)?;
            println!("Deleted list {}.", list_id);
        }
    }
    Ok(())
}

pub fn cmd_card(ctx: &Context, action: CardAction) -> AppResult<()> {
    let mut vm = ctx.loaded_view_model()?;
    match action {
        CardAction::Add { list_id, title } => {
            let id = vm.add_card(list_id, &title)?;
            println!("Added card {}.", id);
        }
        CardAction::Rm { card_id } => {
            vm.delete_card(card_id)?;
            println!("Deleted card {}.", card_id);
        }
        CardAction::Done { card_id } => {
            let done = vm.toggle_card_complete(card_id)?;
            println!("Card {} marked {}.", card_id, if done { "done" } else { "open" });
        }
        CardAction::Due { card_id, date, clear } => {
            let today = Local::now().date_naive();
            let due = match (date, clear) {
                (_, true) => None,
                (Some(raw), false) => Some(
                    parse_due_input(&raw, today)
                        .ok_or_else(|| AppError::InvalidInput(format!("cannot parse date '{}'", raw)))?,
                ),
                (None, false) => {
                    return Err(AppError::InvalidInput("give a date or --clear".into()));
                }
            };
            vm.update_task_due_date(card_id, due)?;
            match due {
                Some(d) => println!("Card {} due {} ({}).", card_id, d, format_due_relative(Some(d), today)),
                None => println!("Cleared due date of card {}.", card_id),
            }
        }
    }
    Ok(())
}

/// Render boards as text Gantt rows over `range`.
pub fn timeline_lines(boards: &[Board], range: &[NaiveDate], day_width: u32, today: NaiveDate) -> Vec<String> {
    const NAME_WIDTH: usize = 24;
    let dw = day_width.clamp(1, MAX_DAY_WIDTH) as usize;
    let track_len = range.len() * dw;
    let mut lines = Vec::new();

    let mut header = format!("{:<NAME_WIDTH$} ", "");
    for day in range {
        let label = if *day == today { "*".to_string() } else { day.format("%d").to_string() };
        header.push_str(&format!("{:<dw$}", truncate(&label, dw)));
    }
    lines.push(header.trim_end().to_string());

    for board in boards {
        let summary = format!("{} ({})", board.name, board.tasks.len());
        lines.push(format!("{:<NAME_WIDTH$} {}", truncate(&summary, NAME_WIDTH), "-".repeat(track_len)));
        for task in &board.tasks {
            let mut track = vec!['.'; track_len];
            if let Some(bar) = position(task, range, dw as u32) {
                let fill = if task.completed { '#' } else { '=' };
                let start = bar.left as usize;
                let end = (start + bar.width as usize).min(track_len);
                for c in &mut track[start..end] {
                    *c = fill;
                }
            }
            let name = format!("  {}", task.title);
            lines.push(format!(
                "{:<NAME_WIDTH$} {}",
                truncate(&name, NAME_WIDTH),
                track.into_iter().collect::<String>()
            ));
        }
    }
    lines
}

pub fn cmd_timeline(
    ctx: &Context,
    mode: Option<ViewMode>,
    date: Option<String>,
    day_width: Option<u32>,
) -> AppResult<()> {
    let today = Local::now().date_naive();
    let anchor = match date {
        Some(raw) => parse_due_input(&raw, today)
            .ok_or_else(|| AppError::InvalidInput(format!("cannot parse date '{}'", raw)))?,
        None => today,
    };
    let mode = mode.unwrap_or(ctx.config.view_mode);
    // The config file is not range-checked by clap.
    let day_width = day_width.unwrap_or(ctx.config.day_width).clamp(1, MAX_DAY_WIDTH);

    let vm = ctx.loaded_view_model()?;
    let range = generate_range(anchor, mode);
    println!("{} view, {}", mode.label(), describe_range(&range));
    for line in timeline_lines(vm.boards(), &range, day_width, today) {
        println!("{}", line);
    }
    Ok(())
}

pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{BoardList, Task};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn board() -> Board {
        let task = |id, title: &str, start, end, completed| Task {
            id,
            list_id: 1,
            title: String::from(title),
            start_date: start,
            end_date: end,
            progress: 0,
            assignee: String::new(),
            completed,
            start_from_due: false,
        };
        Board {
            id: 1,
            name: "Launch".into(),
            description: None,
            color: "#4f8cc9".into(),
            collapsed: false,
            lists: vec![BoardList { id: 1, title: "Todo".into() }],
            tasks: vec![
                task(1, "Draft", Some(d(2)), Some(d(3)), false),
                task(2, "Publish", Some(d(4)), Some(d(4)), true),
                task(3, "Someday", None, None, false),
            ],
        }
    }

    #[test]
    fn test_timeline_lines_draw_bars() {
        let range: Vec<NaiveDate> = d(1).iter_days().take(5).collect();
        let lines = timeline_lines(&[board()], &range, 2, d(3));
        assert_eq!(lines.len(), 5);
        assert!(lines[0].ends_with("0102* 0405"));
        assert!(lines[1].starts_with("Launch (3)"));
        assert!(lines[2].ends_with("..====...."));
        assert!(lines[3].ends_with("......##.."));
        assert!(lines[4].ends_with(".........."));
    }

    #[test]
    fn test_timeline_lines_cap_day_width() {
        let range: Vec<NaiveDate> = d(1).iter_days().take(30).collect();
        let lines = timeline_lines(&[board()], &range, 300_000_000, d(3));
        let track = lines[2].chars().count() - 25;
        assert_eq!(track, 30 * MAX_DAY_WIDTH as usize);
    }

    #[test]
    fn test_day_width_flag_is_bounded() {
        use clap::Parser;
        use crate::cli::Cli;

        assert!(Cli::try_parse_from(["bl", "timeline", "--day-width", "300000000"]).is_err());
        assert!(Cli::try_parse_from(["bl", "timeline", "--day-width", "0"]).is_err());
        assert!(Cli::try_parse_from(["bl", "timeline", "--day-width", "6"]).is_ok());
    }
}
