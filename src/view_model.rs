//! Local board/task state and the mutations that keep it in step with the server.
//!
//! Every mutation that the server knows about is confirmed first and applied
//! locally only once the call succeeds, so a failed call leaves the state
//! exactly as it was. Collapse flags and task progress are view-only and never
//! leave the process.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::api::models::{BoardDto, CardDto, CardUpdate, ListDto};
use crate::api::BoardApi;
use crate::error::{AppError, AppResult};
use crate::fields::ProgressStep;
use crate::task::{board_color, Board, BoardList, Task};

/// Convert a server card into a timeline task.
pub fn task_from_card(card: CardDto, list_id: i64) -> Task {
    Task {
        id: card.id,
        list_id: card.list_id.unwrap_or(list_id),
        title: card.title,
        start_date: card.start_date.or(card.due_date),
        end_date: card.due_date,
        progress: if card.completed { 100 } else { 0 },
        assignee: card.assignee.unwrap_or_default(),
        completed: card.completed,
        start_from_due: card.start_date.is_none() && card.due_date.is_some(),
    }
}

/// Flatten a server board (lists of cards) into a board with one task sequence.
pub fn board_from_dto(dto: BoardDto) -> Board {
    let mut lists = Vec::with_capacity(dto.lists.len());
    let mut tasks = Vec::new();
    for list in dto.lists {
        lists.push(BoardList { id: list.id, title: list.title });
        tasks.extend(list.cards.into_iter().map(|c| task_from_card(c, list.id)));
    }
    Board {
        id: dto.id,
        name: dto.title,
        description: dto.description,
        color: board_color(dto.id).to_string(),
        collapsed: false,
        lists,
        tasks,
    }
}

fn require_title(title: &str) -> AppResult<&str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("title cannot be empty".into()));
    }
    Ok(title)
}

/// Boards for the active screen plus the API they are synchronised with.
pub struct BoardViewModel<A: BoardApi> {
    api: A,
    boards: Vec<Board>,
}

impl<A: BoardApi> BoardViewModel<A> {
    pub fn new(api: A) -> Self {
        Self { api, boards: Vec::new() }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn boards(&self) -> &[Board] {
        &self.boards
    }

    pub fn board(&self, board_id: i64) -> Option<&Board> {
        self.boards.iter().find(|b| b.id == board_id)
    }

    pub fn task(&self, task_id: i64) -> Option<&Task> {
        self.boards.iter().find_map(|b| b.task(task_id))
    }

    /// The board that owns `task_id`.
    pub fn board_of_task(&self, task_id: i64) -> Option<&Board> {
        self.boards.iter().find(|b| b.task(task_id).is_some())
    }

    pub fn task_count(&self) -> usize {
        self.boards.iter().map(|b| b.tasks.len()).sum()
    }

    fn board_index(&self, board_id: i64) -> AppResult<usize> {
        self.boards
            .iter()
            .position(|b| b.id == board_id)
            .ok_or_else(|| AppError::not_found("board", board_id))
    }

    fn board_index_for_list(&self, list_id: i64) -> AppResult<usize> {
        self.boards
            .iter()
            .position(|b| b.has_list(list_id))
            .ok_or_else(|| AppError::not_found("list", list_id))
    }

    fn board_index_for_task(&self, task_id: i64) -> AppResult<usize> {
        self.boards
            .iter()
            .position(|b| b.task(task_id).is_some())
            .ok_or_else(|| AppError::not_found("card", task_id))
    }

    fn task_mut(&mut self, task_id: i64) -> AppResult<&mut Task> {
        self.boards
            .iter_mut()
            .find_map(|b| b.task_mut(task_id))
            .ok_or_else(|| AppError::not_found("card", task_id))
    }

    /// Replace local state with the server's boards.
    ///
    /// Collapse flags and local progress survive for boards and tasks that
    /// are still present. On failure the previous state is kept.
    pub fn load_boards(&mut self) -> AppResult<usize> {
        let dtos = self.api.fetch_boards()?;

        let collapsed: HashMap<i64, bool> = self.boards.iter().map(|b| (b.id, b.collapsed)).collect();
        let progress: HashMap<i64, u8> = self
            .boards
            .iter()
            .flat_map(|b| b.tasks.iter())
            .map(|t| (t.id, t.progress))
            .collect();

        let mut boards: Vec<Board> = dtos
            .into_iter()
            .map(board_from_dto)
            .collect();
        for board in boards.iter_mut() {
            board.collapsed = collapsed.get(&board.id).copied().unwrap_or(false);
            for task in board.tasks.iter_mut().filter(|t| !t.completed) {
                if let Some(&p) = progress.get(&task.id) {
                    task.progress = if p == 100 { 0 } else { p };
                }
            }
        }

        self.boards = boards;
        log::info!("loaded {} boards with {} tasks", self.boards.len(), self.task_count());
        Ok(self.boards.len())
    }

    /// Flip a board's collapsed flag and return the new value.
    pub fn toggle_board_collapse(&mut self, board_id: i64) -> AppResult<bool> {
        let idx = self.board_index(board_id)?;
        let board = &mut self.boards[idx];
        board.collapsed = !board.collapsed;
        Ok(board.collapsed)
    }

    /// Set a task's progress; 100 marks it completed, anything else clears it.
    /// Progress is not stored server-side, so this never issues a request.
    pub fn update_task_progress(&mut self, task_id: i64, step: ProgressStep) -> AppResult<()> {
        let task = self.task_mut(task_id)?;
        task.progress = step.percent();
        task.completed = step == ProgressStep::Done;
        log::debug!("task {} progress set to {}", task_id, task.progress);
        Ok(())
    }

    /// Set or clear a task's due date on the server, then adopt the server's value.
    pub fn update_task_due_date(&mut self, task_id: i64, due: Option<NaiveDate>) -> AppResult<()> {
        self.board_index_for_task(task_id)?;
        let card = self.api.update_card(task_id, &CardUpdate::due_date(due))?;
        self.task_mut(task_id)?.set_end_date(card.due_date);
        log::info!("card {} due date now {:?}", task_id, card.due_date);
        Ok(())
    }

    /// Create a card at the end of `list_id` and return its id.
    pub fn add_card(&mut self, list_id: i64, title: &str) -> AppResult<i64> {
        let title = require_title(title)?;
        let idx = self.board_index_for_list(list_id)?;
        let card = self.api.create_card(list_id, title)?;
        let task = task_from_card(card, list_id);
        let id = task.id;
        self.boards[idx].tasks.push(task);
        log::info!("added card {} to list {}", id, list_id);
        Ok(id)
    }

    pub fn delete_card(&mut self, card_id: i64) -> AppResult<()> {
        let idx = self.board_index_for_task(card_id)?;
        self.api.delete_card(card_id)?;
        self.boards[idx].tasks.retain(|t| t.id != card_id);
        log::info!("deleted card {}", card_id);
        Ok(())
    }

    /// Toggle completion on the server and return the confirmed state.
    pub fn toggle_card_complete(&mut self, card_id: i64) -> AppResult<bool> {
        let current = self
            .task(card_id)
            .map(|t| t.completed)
            .ok_or_else(|| AppError::not_found("card", card_id))?;
        let card = self.api.update_card(card_id, &CardUpdate::completed(!current))?;
        let task = self.task_mut(card_id)?;
        task.completed = card.completed;
        if task.completed {
            task.progress = 100;
        } else if task.progress == 100 {
            task.progress = 0;
        }
        Ok(task.completed)
    }

    /// Create a list on `board_id` and return its id.
    pub fn add_list(&mut self, board_id: i64, title: &str) -> AppResult<i64> {
        let title = require_title(title)?;
        let idx = self.board_index(board_id)?;
        let list: ListDto = self.api.create_list(board_id, title)?;
        let list_id = list.id;
        let board = &mut self.boards[idx];
        board.lists.push(BoardList { id: list.id, title: list.title });
        board.tasks.extend(list.cards.into_iter().map(|c| task_from_card(c, list_id)));
        log::info!("added list {} to board {}", list_id, board_id);
        Ok(list_id)
    }

    pub fn rename_list(&mut self, list_id: i64, title: &str) -> AppResult<()> {
        let title = require_title(title)?;
        let idx = self.board_index_for_list(list_id)?;
        let list = self.api.update_list(list_id, title)?;
        if let Some(l) = self.boards[idx].lists.iter_mut().find(|l| l.id == list_id) {
            l.title = list.title;
        }
        Ok(())
    }

    /// Delete a list; its cards go with it.
    pub fn delete_list(&mut self, list_id: i64) -> AppResult<()> {
        let idx = self.board_index_for_list(list_id)?;
        self.api.delete_list(list_id)?;
        let board = &mut self.boards[idx];
        board.lists.retain(|l| l.id != list_id);
        board.tasks.retain(|t| t.list_id != list_id);
        log::info!("deleted list {}", list_id);
        Ok(())
    }

    pub fn create_board(&mut self, title: &str, description: Option<&str>) -> AppResult<i64> {
        let title = require_title(title)?;
        let dto = self.api.create_board(title, description)?;
        let board = board_from_dto(dto);
        let id = board.id;
        self.boards.push(board);
        log::info!("created board {}", id);
        Ok(id)
    }

    pub fn delete_board(&mut self, board_id: i64) -> AppResult<()> {
        let idx = self.board_index(board_id)?;
        self.api.delete_board(board_id)?;
        self.boards.remove(idx);
        log::info!("deleted board {}", board_id);
        Ok(())
    }

    pub fn invite_member(&self, board_id: i64, email: &str) -> AppResult<()> {
        let email = email.trim();
        if !email.contains('@') {
            return Err(AppError::InvalidInput(format!("'{}' is not an email address", email)));
        }
        self.board_index(board_id)?;
        self.api.invite_member(board_id, email)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory stand-in for the board service.

    use std::cell::{Cell, RefCell};

    use super::*;

    #[derive(Default)]
    pub struct FakeApi {
        pub boards: RefCell<Vec<BoardDto>>,
        pub calls: RefCell<Vec<String>>,
        pub fail: Cell<bool>,
        /// Answer every call as if the token had expired.
        pub unauthorized: Cell<bool>,
        next_id: Cell<i64>,
    }

    pub fn card(id: i64, title: &str, due: Option<NaiveDate>) -> CardDto {
        CardDto {
            id,
            title: title.into(),
            description: None,
            completed: false,
            list_id: None,
            start_date: None,
            due_date: due,
            assignee: None,
        }
    }

    pub fn list(id: i64, cards: Vec<CardDto>) -> ListDto {
        ListDto { id, title: format!("List {}", id), board_id: None, cards }
    }

    pub fn board(id: i64, lists: Vec<ListDto>) -> BoardDto {
        BoardDto { id, title: format!("Board {}", id), description: None, owner_id: None, lists }
    }

    impl FakeApi {
        pub fn with_boards(boards: Vec<BoardDto>) -> Self {
            let api = FakeApi::default();
            *api.boards.borrow_mut() = boards;
            api.next_id.set(1000);
            api
        }

        fn record(&self, call: String) -> AppResult<()> {
            self.calls.borrow_mut().push(call);
            if self.unauthorized.get() {
                return Err(AppError::Unauthorized("token expired".into()));
            }
            if self.fail.get() {
                return Err(AppError::Api { status: 500, message: "unavailable".into() });
            }
            Ok(())
        }

        fn next(&self) -> i64 {
            let id = self.next_id.get();
            self.next_id.set(id + 1);
            id
        }

        fn with_card<T>(&self, card_id: i64, f: impl FnOnce(&mut CardDto) -> T) -> AppResult<T> {
            let mut boards = self.boards.borrow_mut();
            boards
                .iter_mut()
                .flat_map(|b| b.lists.iter_mut())
                .flat_map(|l| l.cards.iter_mut())
                .find(|c| c.id == card_id)
                .map(f)
                .ok_or(AppError::Api { status: 404, message: "Card not found".into() })
        }
    }

    impl BoardApi for FakeApi {
        fn fetch_boards(&self) -> AppResult<Vec<BoardDto>> {
            self.record("fetch_boards".into())?;
            Ok(self.boards.borrow().clone())
        }

        fn fetch_board(&self, board_id: i64) -> AppResult<BoardDto> {
            self.record(format!("fetch_board {}", board_id))?;
            self.boards
                .borrow()
                .iter()
                .find(|b| b.id == board_id)
                .cloned()
                .ok_or(AppError::Api { status: 404, message: "Board not found".into() })
        }

        fn fetch_lists(&self, board_id: i64) -> AppResult<Vec<ListDto>> {
            Ok(self.fetch_board(board_id)?.lists)
        }

        fn create_board(&self, title: &str, description: Option<&str>) -> AppResult<BoardDto> {
            self.record(format!("create_board {}", title))?;
            let mut dto = board(self.next(), Vec::new());
            dto.title = title.into();
            dto.description = description.map(str::to_string);
            self.boards.borrow_mut().push(dto.clone());
            Ok(dto)
        }

        fn delete_board(&self, board_id: i64) -> AppResult<()> {
            self.record(format!("delete_board {}", board_id))?;
            self.boards.borrow_mut().retain(|b| b.id != board_id);
            Ok(())
        }

        fn create_list(&self, board_id: i64, title: &str) -> AppResult<ListDto> {
            self.record(format!("create_list {} {}", board_id, title))?;
            let mut dto = list(self.next(), Vec::new());
            dto.title = title.into();
            dto.board_id = Some(board_id);
            if let Some(b) = self.boards.borrow_mut().iter_mut().find(|b| b.id == board_id) {
                b.lists.push(dto.clone());
            }
            Ok(dto)
        }

        fn update_list(&self, list_id: i64, title: &str) -> AppResult<ListDto> {
            self.record(format!("update_list {} {}", list_id, title))?;
            let mut boards = self.boards.borrow_mut();
            let l = boards
                .iter_mut()
                .flat_map(|b| b.lists.iter_mut())
                .find(|l| l.id == list_id)
                .ok_or(AppError::Api { status: 404, message: "List not found".into() })?;
            l.title = title.into();
            Ok(l.clone())
        }

        fn delete_list(&self, list_id: i64) -> AppResult<()> {
            self.record(format!("delete_list {}", list_id))?;
            for b in self.boards.borrow_mut().iter_mut() {
                b.lists.retain(|l| l.id != list_id);
            }
            Ok(())
        }

        fn create_card(&self, list_id: i64, title: &str) -> AppResult<CardDto> {
            self.record(format!("create_card {} {}", list_id, title))?;
            let mut dto = card(self.next(), title, None);
            dto.list_id = Some(list_id);
            if let Some(l) = self
                .boards
                .borrow_mut()
                .iter_mut()
                .flat_map(|b| b.lists.iter_mut())
                .find(|l| l.id == list_id)
            {
                l.cards.push(dto.clone());
            }
            Ok(dto)
        }

        fn update_card(&self, card_id: i64, update: &CardUpdate) -> AppResult<CardDto> {
            self.record(format!("update_card {}", card_id))?;
            self.with_card(card_id, |c| {
                if let Some(title) = &update.title {
                    c.title = title.clone();
                }
                if let Some(completed) = update.completed {
                    c.completed = completed;
                }
                if let Some(due) = update.due_date {
                    c.due_date = due;
                }
                c.clone()
            })
        }

        fn delete_card(&self, card_id: i64) -> AppResult<()> {
            self.record(format!("delete_card {}", card_id))?;
            for l in self.boards.borrow_mut().iter_mut().flat_map(|b| b.lists.iter_mut()) {
                l.cards.retain(|c| c.id != card_id);
            }
            Ok(())
        }

        fn invite_member(&self, board_id: i64, email: &str) -> AppResult<()> {
            self.record(format!("invite_member {} {}", board_id, email))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::{board, card, list, FakeApi};
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    /// Two boards: board 1 with 3 cards over two lists, board 2 with 2 cards.
    fn loaded() -> BoardViewModel<FakeApi> {
        let api = FakeApi::with_boards(vec![
            board(1, vec![
                list(10, vec![card(100, "Spec", Some(d(10))), card(101, "Build", None)]),
                list(11, vec![card(102, "Ship", Some(d(20)))]),
            ]),
            board(2, vec![list(20, vec![card(200, "Plan", None), card(201, "Review", Some(d(3)))])]),
        ]);
        let mut vm = BoardViewModel::new(api);
        vm.load_boards().unwrap();
        vm.api().calls.borrow_mut().clear();
        vm
    }

    #[test]
    fn test_load_groups_tasks_by_board() {
        let vm = loaded();
        assert_eq!(vm.boards().len(), 2);
        assert_eq!(vm.task_count(), 5);
        assert_eq!(vm.board(1).unwrap().tasks.len(), 3);
        assert_eq!(vm.board(2).unwrap().tasks.len(), 2);
        assert_eq!(vm.board_of_task(201).unwrap().id, 2);
        let ids: Vec<i64> = vm.board(1).unwrap().tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![100, 101, 102]);
        assert_ne!(vm.board(1).unwrap().color, vm.board(2).unwrap().color);
    }

    #[test]
    fn test_delete_card_leaves_other_board_alone() {
        let mut vm = loaded();
        vm.delete_card(101).unwrap();
        assert_eq!(vm.board(1).unwrap().tasks.len(), 2);
        assert_eq!(vm.board(2).unwrap().tasks.len(), 2);
        assert_eq!(vm.task_count(), 4);
    }

    #[test]
    fn test_board_colours_survive_deleting_a_board() {
        let mut vm = loaded();
        let colour = vm.board(2).unwrap().color.clone();
        vm.delete_board(1).unwrap();
        vm.load_boards().unwrap();
        assert_eq!(vm.board(2).unwrap().color, colour);
    }

    #[test]
    fn test_expired_token_surfaces_as_auth_error() {
        let mut vm = loaded();
        let before = vm.boards().to_vec();
        vm.api().unauthorized.set(true);
        assert!(vm.toggle_card_complete(100).unwrap_err().is_auth());
        assert!(vm.load_boards().unwrap_err().is_auth());
        assert_eq!(vm.boards(), &before[..]);
    }

    #[test]
    fn test_start_date_falls_back_to_due() {
        let vm = loaded();
        let t = vm.task(100).unwrap();
        assert_eq!(t.start_date, Some(d(10)));
        assert_eq!(t.end_date, Some(d(10)));
        assert!(t.start_from_due);
        let t = vm.task(101).unwrap();
        assert_eq!((t.start_date, t.end_date), (None, None));
    }

    #[test]
    fn test_progress_drives_completion() {
        let mut vm = loaded();
        vm.update_task_progress(100, ProgressStep::Done).unwrap();
        assert!(vm.task(100).unwrap().completed);
        vm.update_task_progress(100, ProgressStep::Half).unwrap();
        let t = vm.task(100).unwrap();
        assert!(!t.completed);
        assert_eq!(t.progress, 50);
        assert!(vm.api().calls.borrow().is_empty());
    }

    #[test]
    fn test_due_date_confirmed_then_applied() {
        let mut vm = loaded();
        vm.update_task_due_date(100, Some(d(14))).unwrap();
        let t = vm.task(100).unwrap();
        assert_eq!(t.end_date, Some(d(14)));
        assert_eq!(t.start_date, Some(d(14)));

        vm.update_task_due_date(100, None).unwrap();
        assert_eq!(vm.task(100).unwrap().end_date, None);
    }

    #[test]
    fn test_due_date_failure_leaves_state() {
        let mut vm = loaded();
        let before = vm.boards().to_vec();
        vm.api().fail.set(true);
        assert!(vm.update_task_due_date(100, Some(d(1))).is_err());
        assert_eq!(vm.boards(), &before[..]);
    }

    #[test]
    fn test_mutation_failures_leave_state() {
        let mut vm = loaded();
        let before = vm.boards().to_vec();
        vm.api().fail.set(true);
        assert!(vm.add_card(10, "New").is_err());
        assert!(vm.delete_card(100).is_err());
        assert!(vm.toggle_card_complete(100).is_err());
        assert!(vm.add_list(1, "Later").is_err());
        assert!(vm.delete_list(10).is_err());
        assert!(vm.load_boards().is_err());
        assert_eq!(vm.boards(), &before[..]);
    }

    #[test]
    fn test_unknown_ids_skip_the_server() {
        let mut vm = loaded();
        assert!(matches!(vm.delete_card(999), Err(AppError::NotFound { .. })));
        assert!(matches!(vm.add_card(999, "x"), Err(AppError::NotFound { .. })));
        assert!(matches!(vm.update_task_due_date(999, None), Err(AppError::NotFound { .. })));
        assert!(matches!(vm.toggle_board_collapse(999), Err(AppError::NotFound { .. })));
        assert!(vm.api().calls.borrow().is_empty());
    }

    #[test]
    fn test_add_card_appends_to_owning_board() {
        let mut vm = loaded();
        let id = vm.add_card(20, "  Retro  ").unwrap();
        let b = vm.board(2).unwrap();
        assert_eq!(b.tasks.last().unwrap().id, id);
        assert_eq!(b.tasks.last().unwrap().title, "Retro");
        assert_eq!(b.tasks.last().unwrap().list_id, 20);
        assert!(matches!(vm.add_card(20, "   "), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_toggle_complete_sets_progress() {
        let mut vm = loaded();
        assert!(vm.toggle_card_complete(200).unwrap());
        assert_eq!(vm.task(200).unwrap().progress, 100);
        assert!(!vm.toggle_card_complete(200).unwrap());
        assert_eq!(vm.task(200).unwrap().progress, 0);
    }

    #[test]
    fn test_list_lifecycle() {
        let mut vm = loaded();
        let list_id = vm.add_list(2, "Done").unwrap();
        assert!(vm.board(2).unwrap().has_list(list_id));
        vm.rename_list(list_id, "Shipped").unwrap();
        let title = &vm.board(2).unwrap().lists.last().unwrap().title;
        assert_eq!(title, "Shipped");

        vm.delete_list(10).unwrap();
        let b = vm.board(1).unwrap();
        assert!(!b.has_list(10));
        assert_eq!(b.tasks.len(), 1);
        assert_eq!(b.tasks[0].id, 102);
    }

    #[test]
    fn test_board_lifecycle_and_invite() {
        let mut vm = loaded();
        let id = vm.create_board("Roadmap", Some("Q3")).unwrap();
        assert_eq!(vm.board(id).unwrap().description.as_deref(), Some("Q3"));
        vm.invite_member(id, "pat@example.com").unwrap();
        assert!(matches!(vm.invite_member(id, "nobody"), Err(AppError::InvalidInput(_))));
        vm.delete_board(id).unwrap();
        assert!(vm.board(id).is_none());
        assert_eq!(vm.boards().len(), 2);
    }

    #[test]
    fn test_reload_keeps_view_state() {
        let mut vm = loaded();
        assert!(vm.toggle_board_collapse(2).unwrap());
        vm.update_task_progress(101, ProgressStep::Quarter).unwrap();
        vm.load_boards().unwrap();
        assert!(vm.board(2).unwrap().collapsed);
        assert!(!vm.board(1).unwrap().collapsed);
        assert_eq!(vm.task(101).unwrap().progress, 25);
    }
}
