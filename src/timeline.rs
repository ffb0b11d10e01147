//! Date range generation and bar layout for the Gantt timeline.
//!
//! A page of the timeline is a run of consecutive calendar days centred on an
//! anchor date. Each task is drawn as a bar spanning the days it covers within
//! that page; days are measured in abstract `day_width` units so the same
//! layout drives both the terminal renderer and the plain-text printer.

use chrono::{Duration, NaiveDate};

use crate::fields::{PageDirection, ViewMode};
use crate::task::Task;

/// Horizontal placement of a task bar within the visible range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarPosition {
    pub left: u32,
    pub width: u32,
}

/// Produce the days shown for `reference` in `mode`.
///
/// The range holds `mode.range_len()` consecutive days with
/// `floor(len / 2)` of them before the reference. At the very ends of the
/// calendar the range is cut short instead.
pub fn generate_range(reference: NaiveDate, mode: ViewMode) -> Vec<NaiveDate> {
    let len = mode.range_len();
    let start = reference
        .checked_sub_signed(Duration::days((len / 2) as i64))
        .unwrap_or(NaiveDate::MIN);
    start.iter_days().take(len).collect()
}

/// Move the anchor one page in `direction`. The anchor stays put when the
/// page would leave the calendar.
pub fn advance(reference: NaiveDate, mode: ViewMode, direction: PageDirection) -> NaiveDate {
    reference
        .checked_add_signed(Duration::days(mode.page_days() * direction.sign()))
        .unwrap_or(reference)
}

fn day_index(range: &[NaiveDate], day: Option<NaiveDate>) -> Option<usize> {
    let day = day?;
    range.iter().position(|d| *d == day)
}

/// Compute where `task`'s bar sits in `range`, or `None` when it is not drawn.
///
/// A start date missing from the range is treated as lying before it, and a
/// missing end date as lying after it. A task with neither date in the range
/// is not drawn, and neither is one whose end falls before its start.
pub fn position(task: &Task, range: &[NaiveDate], day_width: u32) -> Option<BarPosition> {
    if range.is_empty() {
        return None;
    }
    let last = range.len() - 1;
    let start_index = day_index(range, task.start_date);
    let end_index = day_index(range, task.end_date);

    if start_index.is_none() && end_index.is_none() {
        return None;
    }

    let actual_start = start_index.unwrap_or(0);
    let actual_end = end_index.map_or(last, |e| e.min(last));
    if actual_end < actual_start {
        log::debug!(
            "task {} has an inverted interval ({:?} > {:?}), not drawn",
            task.id,
            task.start_date,
            task.end_date
        );
        return None;
    }

    // Offsets saturate rather than wrap for very wide days.
    Some(BarPosition {
        left: (actual_start as u32).saturating_mul(day_width),
        width: ((actual_end - actual_start + 1) as u32).saturating_mul(day_width),
    })
}

/// Human-readable span of a range, e.g. `2024-05-01 .. 2024-05-14`.
pub fn describe_range(range: &[NaiveDate]) -> String {
    match (range.first(), range.last()) {
        (Some(first), Some(last)) => format!("{} .. {}", first, last),
        _ => "-".into(),
    }
}
