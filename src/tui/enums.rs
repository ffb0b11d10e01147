//! Enumerations for TUI state management.

/// Which overlay, if any, is on top of the timeline.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum AppState {
    Timeline,
    Prompt(PromptKind),
    Confirm,
    TaskDetail,
    Help,
}

/// What a text prompt is collecting.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum PromptKind {
    AddCard { list_id: i64 },
    AddList { board_id: i64 },
    DueDate { task_id: i64 },
}

impl PromptKind {
    pub fn title(&self) -> &'static str {
        match self {
            PromptKind::AddCard { .. } => "New card title",
            PromptKind::AddList { .. } => "New list title",
            PromptKind::DueDate { .. } => "Due date (YYYY-MM-DD, today, in 3d, friday; empty clears)",
        }
    }
}

/// One line of the timeline: a board header or one of its tasks.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Row {
    Board { board_id: i64 },
    Task { board_id: i64, task_id: i64 },
}

impl Row {
    pub fn board_id(&self) -> i64 {
        match *self {
            Row::Board { board_id } | Row::Task { board_id, .. } => board_id,
        }
    }

    pub fn task_id(&self) -> Option<i64> {
        match *self {
            Row::Task { task_id, .. } => Some(task_id),
            Row::Board { .. } => None,
        }
    }
}
