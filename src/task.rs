//! Board and task data structures held by the view model.
//!
//! The server nests cards inside lists inside boards. For the timeline every
//! board carries a flat, ordered sequence of tasks instead, plus the list
//! headers needed to route list-level operations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A card as shown on the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub list_id: i64,
    pub title: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Percentage, always one of 0/25/50/75/100 when set from the UI.
    pub progress: u8,
    #[serde(default)]
    pub assignee: String,
    pub completed: bool,
    /// The start date was copied from the end date because the server had none.
    #[serde(default)]
    pub start_from_due: bool,
}

impl Task {
    /// Replace the end date, keeping a derived start date in step with it.
    pub fn set_end_date(&mut self, end: Option<NaiveDate>) {
        if self.start_from_due || self.start_date.is_none() {
            self.start_date = end;
            self.start_from_due = end.is_some();
        }
        self.end_date = end;
    }
}

/// A list header. Cards themselves live in [`Board::tasks`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardList {
    pub id: i64,
    pub title: String,
}

/// Top-level organisational unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Hex colour, e.g. `#4f8cc9`.
    pub color: String,
    /// View-only; never sent to the server.
    #[serde(default)]
    pub collapsed: bool,
    pub lists: Vec<BoardList>,
    pub tasks: Vec<Task>,
}

impl Board {
    pub fn task(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: i64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn has_list(&self, list_id: i64) -> bool {
        self.lists.iter().any(|l| l.id == list_id)
    }

    /// Count of completed tasks, for the board summary row.
    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }
}

/// Palette used to colour boards; the server stores no colour.
pub const BOARD_PALETTE: [&str; 6] = [
    "#4f8cc9", "#5aac44", "#d29034", "#b04632", "#89609e", "#cd5a91",
];

/// Colour for board `board_id`. Keyed on the id so a board keeps its colour
/// when others are created or deleted.
pub fn board_color(board_id: i64) -> &'static str {
    BOARD_PALETTE[board_id.rem_euclid(BOARD_PALETTE.len() as i64) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(start: Option<NaiveDate>, end: Option<NaiveDate>, derived: bool) -> Task {
        Task {
            id: 1,
            list_id: 1,
            title: "t".into(),
            start_date: start,
            end_date: end,
            progress: 0,
            assignee: String::new(),
            completed: false,
            start_from_due: derived,
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    #[test]
    fn test_set_end_date_moves_derived_start() {
        let mut t = task(Some(d(10)), Some(d(10)), true);
        t.set_end_date(Some(d(12)));
        assert_eq!(t.start_date, Some(d(12)));
        assert_eq!(t.end_date, Some(d(12)));
    }

    #[test]
    fn test_set_end_date_keeps_explicit_start() {
        let mut t = task(Some(d(3)), Some(d(10)), false);
        t.set_end_date(None);
        assert_eq!(t.start_date, Some(d(3)));
        assert_eq!(t.end_date, None);
    }

    #[test]
    fn test_board_color_wraps() {
        assert_eq!(board_color(1), board_color(1 + BOARD_PALETTE.len() as i64));
        assert_ne!(board_color(1), board_color(2));
        assert_eq!(board_color(-1), BOARD_PALETTE[BOARD_PALETTE.len() - 1]);
    }
}
