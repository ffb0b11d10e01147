//! Gantt timeline screen.
//!
//! Boards are listed top to bottom, each followed by its tasks unless the
//! board is collapsed. To the right of every task a bar spans the days it
//! covers within the visible range; the range pages by week or month.
//! All changes go through the board view model, so the server confirms a
//! change before the screen shows it.

use std::io;
use std::time::Duration as PollInterval;

use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::api::BoardApi;
use crate::dates::{format_due_relative, parse_due_input};
use crate::error::{AppError, AppResult};
use crate::fields::{PageDirection, ProgressStep, ViewMode};
use crate::task::{Board, Task};
use crate::timeline::{advance, describe_range, generate_range, position};
use crate::tui::colors::{hex_color, ACCENT, DONE_GREEN, TODAY_BG, TRACK_BG};
use crate::tui::enums::{AppState, PromptKind, Row};
use crate::tui::input::InputField;
use crate::tui::utils::{centered_rect, truncate};
use crate::view_model::BoardViewModel;

const HELP_TEXT: &str = "←/→ page | w week/month | t today | ↑/↓ select | Enter/Space collapse | c complete | 0-4 progress | [/] due ±1d | e due | x clear due | a card | A list | D delete | r reload | q quit";

/// Timeline screen state.
pub struct GanttApp<A: BoardApi> {
    vm: BoardViewModel<A>,
    state: AppState,
    mode: ViewMode,
    anchor: NaiveDate,
    today: NaiveDate,
    rows: Vec<Row>,
    selected: usize,
    scroll: usize,
    input: InputField,
    pending_delete: Option<i64>,
    status_message: String,
    auth_failure: Option<AppError>,
    should_quit: bool,
}

impl<A: BoardApi> GanttApp<A> {
    pub fn new(vm: BoardViewModel<A>, mode: ViewMode) -> Self {
        Self::new_at(vm, mode, Local::now().date_naive())
    }

    /// Create the screen anchored on `today`.
    pub fn new_at(vm: BoardViewModel<A>, mode: ViewMode, today: NaiveDate) -> Self {
        let mut app = GanttApp {
            vm,
            state: AppState::Timeline,
            mode,
            anchor: today,
            today,
            rows: Vec::new(),
            selected: 0,
            scroll: 0,
            input: InputField::new(),
            pending_delete: None,
            status_message: String::new(),
            auth_failure: None,
            should_quit: false,
        };
        app.rebuild_rows();
        app
    }

    pub fn view_model(&self) -> &BoardViewModel<A> {
        &self.vm
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// The authentication error that ended the session, if any.
    pub fn take_auth_failure(&mut self) -> Option<AppError> {
        self.auth_failure.take()
    }

    fn range(&self) -> Vec<NaiveDate> {
        generate_range(self.anchor, self.mode)
    }

    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    /// Recompute the visible rows, keeping the selection on the same row
    /// when it still exists.
    fn rebuild_rows(&mut self) {
        let previous = self.rows.get(self.selected).copied();
        self.rows.clear();
        for board in self.vm.boards() {
            self.rows.push(Row::Board { board_id: board.id });
            if !board.collapsed {
                self.rows.extend(board.tasks.iter().map(|t| Row::Task { board_id: board.id, task_id: t.id }));
            }
        }

        if let Some(prev) = previous {
            if let Some(i) = self.rows.iter().position(|r| *r == prev) {
                self.selected = i;
                return;
            }
            if let Some(i) = self.rows.iter().position(|r| *r == Row::Board { board_id: prev.board_id() }) {
                self.selected = i;
                return;
            }
        }
        self.selected = self.selected.min(self.rows.len().saturating_sub(1));
    }

    fn selected_row(&self) -> Option<Row> {
        self.rows.get(self.selected).copied()
    }

    fn selected_task(&self) -> Option<&Task> {
        self.selected_row()?.task_id().and_then(|id| self.vm.task(id))
    }

    fn selected_board(&self) -> Option<&Board> {
        self.selected_row().and_then(|r| self.vm.board(r.board_id()))
    }

    /// Show the outcome of a view model call. An authentication failure
    /// ends the screen; anything else is reported in the status bar.
    fn report(&mut self, result: AppResult<String>) {
        match result {
            Ok(msg) => self.set_status_message(msg),
            Err(e) if e.is_auth() => {
                self.set_status_message(format!("Session expired: {}", e));
                self.auth_failure = Some(e);
                self.should_quit = true;
            }
            Err(e) => self.set_status_message(format!("Error: {}", e)),
        }
        self.rebuild_rows();
    }

    /// Fetch all boards again. Only authentication failures are returned;
    /// other failures keep the current state and show in the status bar.
    pub fn reload(&mut self) -> AppResult<()> {
        let result = self.vm.load_boards().map(|n| format!("Loaded {} boards", n));
        self.report(result);
        match self.auth_failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn page(&mut self, direction: PageDirection) {
        self.anchor = advance(self.anchor, self.mode, direction);
        let range = self.range();
        self.set_status_message(describe_range(&range));
    }

    fn toggle_mode(&mut self) {
        self.mode = self.mode.toggle();
        self.set_status_message(format!("{} view", self.mode.label()));
    }

    fn jump_today(&mut self) {
        self.anchor = self.today;
        self.set_status_message("Back to today".to_string());
    }

    fn move_selection(&mut self, down: bool) {
        if self.rows.is_empty() {
            return;
        }
        if down {
            self.selected = (self.selected + 1).min(self.rows.len() - 1);
        } else {
            self.selected = self.selected.saturating_sub(1);
        }
    }

    fn toggle_collapse(&mut self) {
        let Some(row) = self.selected_row() else { return };
        let board_id = row.board_id();
        let result = self
            .vm
            .toggle_board_collapse(board_id)
            .map(|c| if c { "Board collapsed".to_string() } else { "Board expanded".to_string() });
        // Land on the header so the selection does not vanish with the tasks.
        if let Some(i) = self.rows.iter().position(|r| *r == Row::Board { board_id }) {
            self.selected = i;
        }
        self.report(result);
    }

    fn toggle_complete(&mut self) {
        let Some(task_id) = self.selected_row().and_then(|r| r.task_id()) else {
            self.set_status_message("Select a task first".to_string());
            return;
        };
        let result = self
            .vm
            .toggle_card_complete(task_id)
            .map(|done| if done { "Task completed".to_string() } else { "Task reopened".to_string() });
        self.report(result);
    }

    fn set_progress(&mut self, step: ProgressStep) {
        let Some(task_id) = self.selected_row().and_then(|r| r.task_id()) else { return };
        let result = self
            .vm
            .update_task_progress(task_id, step)
            .map(|_| format!("Progress {}%", step.percent()));
        self.report(result);
    }

    fn set_due(&mut self, task_id: i64, due: Option<NaiveDate>) {
        let today = self.today;
        let result = self.vm.update_task_due_date(task_id, due).map(|_| match due {
            Some(d) => format!("Due {} ({})", d, format_due_relative(Some(d), today)),
            None => "Due date cleared".to_string(),
        });
        self.report(result);
    }

    fn shift_due(&mut self, days: i64) {
        let Some(task) = self.selected_task() else { return };
        let (id, base) = (task.id, task.end_date.unwrap_or(self.today));
        match base.checked_add_signed(Duration::days(days)) {
            Some(due) => self.set_due(id, Some(due)),
            None => self.set_status_message("Due date out of range".to_string()),
        }
    }

    fn clear_due(&mut self) {
        if let Some(id) = self.selected_task().map(|t| t.id) {
            self.set_due(id, None);
        }
    }

    fn start_prompt(&mut self, kind: PromptKind, initial: &str) {
        self.input = InputField::with_value(initial);
        self.state = AppState::Prompt(kind);
    }

    fn prompt_due(&mut self) {
        let Some(task) = self.selected_task() else { return };
        let initial = task.end_date.map(|d| d.to_string()).unwrap_or_default();
        let kind = PromptKind::DueDate { task_id: task.id };
        self.start_prompt(kind, &initial);
    }

    fn prompt_add_card(&mut self) {
        let list_id = match self.selected_task() {
            Some(task) => Some(task.list_id),
            None => self.selected_board().and_then(|b| b.lists.first()).map(|l| l.id),
        };
        match list_id {
            Some(list_id) => self.start_prompt(PromptKind::AddCard { list_id }, ""),
            None => self.set_status_message("This board has no lists yet, add one with A".to_string()),
        }
    }

    fn prompt_add_list(&mut self) {
        if let Some(board_id) = self.selected_row().map(|r| r.board_id()) {
            self.start_prompt(PromptKind::AddList { board_id }, "");
        }
    }

    fn submit_prompt(&mut self, kind: PromptKind) {
        let text = self.input.take();
        self.state = AppState::Timeline;
        match kind {
            PromptKind::AddCard { list_id } => {
                let result = self.vm.add_card(list_id, &text).map(|id| format!("Added card #{}", id));
                self.report(result);
            }
            PromptKind::AddList { board_id } => {
                let result = self.vm.add_list(board_id, &text).map(|id| format!("Added list #{}", id));
                self.report(result);
            }
            PromptKind::DueDate { task_id } => {
                if text.trim().is_empty() {
                    self.set_due(task_id, None);
                } else if let Some(due) = parse_due_input(&text, self.today) {
                    self.set_due(task_id, Some(due));
                } else {
                    self.set_status_message(format!("Cannot parse date '{}'", text));
                }
            }
        }
    }

    fn ask_delete(&mut self) {
        if let Some(id) = self.selected_task().map(|t| t.id) {
            self.pending_delete = Some(id);
            self.state = AppState::Confirm;
        }
    }

    fn confirm_delete(&mut self) {
        self.state = AppState::Timeline;
        if let Some(id) = self.pending_delete.take() {
            let result = self.vm.delete_card(id).map(|_| format!("Deleted card #{}", id));
            self.report(result);
        }
    }

    /// Apply one key press. Returns true when the screen should close.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return true;
        }

        match self.state {
            AppState::Prompt(kind) => match key.code {
                KeyCode::Esc => {
                    self.input.take();
                    self.state = AppState::Timeline;
                    self.set_status_message("Cancelled".to_string());
                }
                KeyCode::Enter => self.submit_prompt(kind),
                KeyCode::Backspace => self.input.handle_backspace(),
                KeyCode::Delete => self.input.handle_delete(),
                KeyCode::Left => self.input.move_cursor_left(),
                KeyCode::Right => self.input.move_cursor_right(),
                KeyCode::Char(c) => self.input.handle_char(c),
                _ => {}
            },
            AppState::Confirm => match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => self.confirm_delete(),
                _ => {
                    self.pending_delete = None;
                    self.state = AppState::Timeline;
                    self.set_status_message("Delete cancelled".to_string());
                }
            },
            AppState::Help | AppState::TaskDetail => self.state = AppState::Timeline,
            AppState::Timeline => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                KeyCode::Up | KeyCode::Char('k') => self.move_selection(false),
                KeyCode::Down | KeyCode::Char('j') => self.move_selection(true),
                KeyCode::Left => self.page(PageDirection::Back),
                KeyCode::Right => self.page(PageDirection::Forward),
                KeyCode::Char('w') => self.toggle_mode(),
                KeyCode::Char('t') => self.jump_today(),
                KeyCode::Char(' ') => self.toggle_collapse(),
                KeyCode::Enter => match self.selected_row() {
                    Some(Row::Task { .. }) => self.state = AppState::TaskDetail,
                    Some(Row::Board { .. }) => self.toggle_collapse(),
                    None => {}
                },
                KeyCode::Char('c') => self.toggle_complete(),
                KeyCode::Char(c @ '0'..='4') => {
                    let step = ProgressStep::ALL[c as usize - '0' as usize];
                    self.set_progress(step);
                }
                KeyCode::Char('[') => self.shift_due(-1),
                KeyCode::Char(']') => self.shift_due(1),
                KeyCode::Char('x') => self.clear_due(),
                KeyCode::Char('e') => self.prompt_due(),
                KeyCode::Char('a') => self.prompt_add_card(),
                KeyCode::Char('A') => self.prompt_add_list(),
                KeyCode::Char('D') => self.ask_delete(),
                KeyCode::Char('r') => {
                    // Auth failures are picked up through take_auth_failure.
                    if let Err(e) = self.reload() {
                        self.auth_failure = Some(e);
                        self.should_quit = true;
                    }
                }
                KeyCode::Char('h') | KeyCode::Char('?') => self.state = AppState::Help,
                _ => {}
            },
        }
        self.should_quit
    }

    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(PollInterval::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(self.handle_key(key));
                }
            }
        }
        Ok(false)
    }

    /// Render the whole screen.
    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Timeline
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_timeline(f, chunks[1]);
        self.render_status_bar(f, chunks[2]);

        match self.state {
            AppState::Prompt(kind) => self.render_prompt(f, kind),
            AppState::Confirm => self.render_confirm(f),
            AppState::TaskDetail => self.render_task_detail(f),
            AppState::Help => self.render_help(f),
            AppState::Timeline => {}
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let range = self.range();
        let header = Paragraph::new(Line::from(vec![
            Span::styled("BOARDLINE TIMELINE", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!("{} view  {}", self.mode.label(), describe_range(&range)),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ]))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_timeline(&mut self, f: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL);
        let inner = block.inner(area);
        f.render_widget(block, area);
        if inner.height < 2 || inner.width < 10 {
            return;
        }

        let range = self.range();
        let name_width = (inner.width as usize / 3).min(32);
        let track_width = inner.width as usize - name_width - 1;
        let day_width = (track_width / range.len()).max(1);

        let mut lines = vec![self.axis_line(&range, name_width, day_width)];

        // Keep the selected row on screen.
        let visible = inner.height as usize - 1;
        if self.selected < self.scroll {
            self.scroll = self.selected;
        } else if self.selected >= self.scroll + visible {
            self.scroll = self.selected + 1 - visible;
        }

        if self.rows.is_empty() {
            lines.push(Line::from(Span::styled(
                "No boards. Create one with `bl board add <title>`, then press r.",
                Style::default().fg(Color::DarkGray),
            )));
        }

        for (i, row) in self.rows.iter().enumerate().skip(self.scroll).take(visible) {
            let selected = i == self.selected;
            let line = match *row {
                Row::Board { board_id } => self
                    .vm
                    .board(board_id)
                    .map(|b| self.board_line(b, &range, name_width, day_width, selected)),
                Row::Task { board_id, task_id } => self.vm.board(board_id).and_then(|b| {
                    b.task(task_id)
                        .map(|t| self.task_line(b, t, &range, name_width, day_width, selected))
                }),
            };
            if let Some(line) = line {
                lines.push(line);
            }
        }

        f.render_widget(Paragraph::new(lines), inner);
    }

    fn name_style(selected: bool) -> Style {
        if selected {
            Style::default().fg(Color::Black).bg(ACCENT).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        }
    }

    fn axis_line(&self, range: &[NaiveDate], name_width: usize, day_width: usize) -> Line<'static> {
        let mut spans = vec![Span::styled(
            format!("{:<name_width$} ", "Board / Task"),
            Style::default().add_modifier(Modifier::BOLD),
        )];
        for day in range {
            let label = if day_width >= 3 {
                day.format("%d").to_string()
            } else if day.weekday() == Weekday::Mon {
                "|".to_string()
            } else {
                String::new()
            };
            let mut style = Style::default().fg(Color::Gray);
            if *day == self.today {
                style = style.bg(TODAY_BG).add_modifier(Modifier::BOLD);
            }
            spans.push(Span::styled(format!("{:<day_width$}", truncate(&label, day_width)), style));
        }
        Line::from(spans)
    }

    fn board_line(
        &self,
        board: &Board,
        range: &[NaiveDate],
        name_width: usize,
        day_width: usize,
        selected: bool,
    ) -> Line<'static> {
        let marker = if board.collapsed { "▸" } else { "▾" };
        let name = format!("{} {} ({}/{})", marker, board.name, board.completed_count(), board.tasks.len());
        let color = hex_color(&board.color);
        Line::from(vec![
            Span::styled(
                format!("{:<name_width$} ", truncate(&name, name_width)),
                Self::name_style(selected).fg(if selected { Color::Black } else { color }),
            ),
            Span::styled("─".repeat(range.len() * day_width), Style::default().fg(color)),
        ])
    }

    fn task_line(
        &self,
        board: &Board,
        task: &Task,
        range: &[NaiveDate],
        name_width: usize,
        day_width: usize,
        selected: bool,
    ) -> Line<'static> {
        let check = if task.completed { "✓" } else { "·" };
        let name = format!("  {} {} {}%", check, task.title, task.progress);
        let mut spans = vec![Span::styled(
            format!("{:<name_width$} ", truncate(&name, name_width)),
            Self::name_style(selected),
        )];

        let bar = position(task, range, day_width as u32);
        let bar_color = if task.completed { DONE_GREEN } else { hex_color(&board.color) };
        let filled_cells = bar.map_or(0, |b| b.width as usize * task.progress as usize / 100);

        for (i, day) in range.iter().enumerate() {
            let bg = if *day == self.today { TODAY_BG } else { TRACK_BG };
            for cell in 0..day_width {
                let x = i * day_width + cell;
                let span = match bar {
                    Some(b) if x >= b.left as usize && x < b.left.saturating_add(b.width) as usize => {
                        let glyph = if x - (b.left as usize) < filled_cells { "█" } else { "▒" };
                        Span::styled(glyph, Style::default().fg(bar_color).bg(bg))
                    }
                    _ => Span::styled(" ", Style::default().bg(bg)),
                };
                spans.push(span);
            }
        }
        Line::from(spans)
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let text = if self.status_message.is_empty() {
            format!(
                "Boards: {} | Tasks: {} | ←/→ page | w mode | c complete | a add | h help | q quit",
                self.vm.boards().len(),
                self.vm.task_count()
            )
        } else {
            self.status_message.clone()
        };
        let status = Paragraph::new(text)
            .style(Style::default().bg(ACCENT).fg(Color::Black))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    fn render_prompt(&self, f: &mut Frame, kind: PromptKind) {
        let area = centered_rect(60, 20, f.area());
        f.render_widget(Clear, area);
        let (before, after): (String, String) = {
            let chars: Vec<char> = self.input.value.chars().collect();
            let cut = self.input.cursor.min(chars.len());
            (chars[..cut].iter().collect(), chars[cut..].iter().collect())
        };
        let text = vec![
            Line::from(""),
            Line::from(vec![
                Span::raw(before),
                Span::styled("▏", Style::default().fg(ACCENT)),
                Span::raw(after),
            ]),
            Line::from(""),
            Line::from(Span::styled("Enter to save, Esc to cancel", Style::default().fg(Color::DarkGray))),
        ];
        let popup = Paragraph::new(text).block(
            Block::default()
                .borders(Borders::ALL)
                .title(kind.title())
                .border_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        );
        f.render_widget(popup, area);
    }

    fn render_confirm(&self, f: &mut Frame) {
        let area = centered_rect(50, 20, f.area());
        f.render_widget(Clear, area);
        let title = self
            .pending_delete
            .and_then(|id| self.vm.task(id))
            .map(|t| t.title.clone())
            .unwrap_or_default();
        let text = vec![
            Line::from(""),
            Line::from(format!("Delete card \"{}\"?", title)),
            Line::from(""),
            Line::from("y: delete   any other key: cancel"),
        ];
        let popup = Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Confirm").border_style(Style::default().fg(Color::Red)));
        f.render_widget(popup, area);
    }

    fn render_task_detail(&self, f: &mut Frame) {
        let Some(task) = self.selected_task() else { return };
        let area = centered_rect(70, 60, f.area());
        f.render_widget(Clear, area);

        let board = self.vm.board_of_task(task.id);
        let list_title = board
            .and_then(|b| b.lists.iter().find(|l| l.id == task.list_id))
            .map_or("-".to_string(), |l| l.title.clone());
        let date = |d: Option<NaiveDate>| d.map_or("-".to_string(), |d| d.to_string());

        let lines = vec![
            Line::from(Span::styled(
                format!("Card #{}: {}", task.id, task.title),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!("Board:     {}", board.map_or("-", |b| b.name.as_str()))),
            Line::from(format!("List:      {}", list_title)),
            Line::from(format!("Start:     {}", date(task.start_date))),
            Line::from(format!("Due:       {} ({})", date(task.end_date), format_due_relative(task.end_date, self.today))),
            Line::from(format!("Progress:  {}%", task.progress)),
            Line::from(format!("Completed: {}", if task.completed { "yes" } else { "no" })),
            Line::from(format!("Assignee:  {}", if task.assignee.is_empty() { "-" } else { task.assignee.as_str() })),
        ];
        let popup = Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Card Details (any key to close)")
                    .title_alignment(Alignment::Center)
                    .border_style(Style::default().fg(ACCENT)),
            )
            .style(Style::default().bg(Color::Black));
        f.render_widget(popup, area);
    }

    fn render_help(&self, f: &mut Frame) {
        let area = centered_rect(60, 50, f.area());
        f.render_widget(Clear, area);
        let lines: Vec<Line> = HELP_TEXT.split(" | ").map(|s| Line::from(s.to_string())).collect();
        let popup = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Keys (any key to close)"))
            .style(Style::default().bg(Color::Black));
        f.render_widget(popup, area);
    }

    /// Main event loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}
