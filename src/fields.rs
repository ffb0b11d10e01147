//! Enumerations and small value types shared by the CLI, the TUI and the timeline.
//!
//! This module defines the timeline view granularity and the fixed progress
//! steps a task can be set to.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Granularity of the Gantt timeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ViewMode {
    #[default]
    Week,
    Month,
}

impl ViewMode {
    /// Number of days shown in one page of the timeline.
    pub fn range_len(self) -> usize {
        match self {
            ViewMode::Week => 14,
            ViewMode::Month => 30,
        }
    }

    /// Number of days one navigation step moves the anchor.
    pub fn page_days(self) -> i64 {
        match self {
            ViewMode::Week => 7,
            ViewMode::Month => 30,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            ViewMode::Week => ViewMode::Month,
            ViewMode::Month => ViewMode::Week,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Week => "Week",
            ViewMode::Month => "Month",
        }
    }
}

/// Navigation direction for paging the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDirection {
    Back,
    Forward,
}

impl PageDirection {
    pub fn sign(self) -> i64 {
        match self {
            PageDirection::Back => -1,
            PageDirection::Forward => 1,
        }
    }
}

/// The progress values a task can be set to from the UI.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq)]
pub enum ProgressStep {
    #[value(name = "0")]
    Zero,
    #[value(name = "25")]
    Quarter,
    #[value(name = "50")]
    Half,
    #[value(name = "75")]
    ThreeQuarters,
    #[value(name = "100")]
    Done,
}

impl ProgressStep {
    pub const ALL: [ProgressStep; 5] = [
        ProgressStep::Zero,
        ProgressStep::Quarter,
        ProgressStep::Half,
        ProgressStep::ThreeQuarters,
        ProgressStep::Done,
    ];

    pub fn percent(self) -> u8 {
        match self {
            ProgressStep::Zero => 0,
            ProgressStep::Quarter => 25,
            ProgressStep::Half => 50,
            ProgressStep::ThreeQuarters => 75,
            ProgressStep::Done => 100,
        }
    }
}
