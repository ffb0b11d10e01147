//! Timeline TUI entry point and terminal setup.

use std::io;

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};

use crate::api::BoardApi;
use crate::config::Config;
use crate::error::AppResult;
use crate::tui::gantt::GanttApp;
use crate::view_model::BoardViewModel;

/// Load the boards, then run the timeline until the user quits.
///
/// An authentication failure, on the first load or later, ends the UI and
/// is returned so the caller can drop the session.
pub fn run_tui<A: BoardApi>(vm: BoardViewModel<A>, config: &Config) -> AppResult<()> {
    let mut app = GanttApp::new(vm, config.view_mode);
    app.reload()?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result?;
    match app.take_auth_failure() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
