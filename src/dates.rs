//! Date parsing and formatting helpers for due dates.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Deserializer};

/// Parse human-readable due date input relative to `today`.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "monday" .. "sunday" (this week's occurrence) and "next monday" etc.
/// - "end of week" / "eow", "end of month" / "eom"
/// - "in 3d", "in 2w", "in 1m" (a month counts as 30 days)
/// - "YYYY-MM-DD"
pub fn parse_due_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        "end of week" | "eow" => {
            let weekday = today.weekday().num_days_from_monday() as i64;
            return Some(today + Duration::days(6 - weekday));
        }
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            return NaiveDate::from_ymd_opt(year, month, 1).map(|d| d - Duration::days(1));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        if let Some(unit) = rest.chars().last() {
            let num = &rest[..rest.len() - unit.len_utf8()];
            if let Ok(n) = num.trim().parse::<i64>() {
                // Offsets past the calendar's range are rejected, not wrapped.
                let offset = match unit {
                    'd' => Some(Duration::try_days(n)),
                    'w' => Some(Duration::try_weeks(n)),
                    'm' => Some(n.checked_mul(30).and_then(Duration::try_days)),
                    _ => None,
                };
                if let Some(offset) = offset {
                    return offset.and_then(|o| today.checked_add_signed(o));
                }
            }
        }
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let (is_next, name) = match s.strip_prefix("next ") {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix("this ").unwrap_or(&s)),
    };
    if let Some(&(_, target)) = weekdays.iter().find(|(day, _)| *day == name) {
        let current = today.weekday().num_days_from_monday() as i64;
        let ahead = (target + 7 - current) % 7;
        let ahead = if is_next { ahead + 7 } else { ahead };
        return Some(today + Duration::days(ahead));
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<NaiveDate>, today: NaiveDate) -> String {
    match due {
        None => "-".into(),
        Some(d) => {
            let days = (d - today).num_days();
            match days {
                0 => "today".into(),
                1 => "tomorrow".into(),
                n if n > 1 => format!("in {}d", n),
                n => format!("{}d late", -n),
            }
        }
    }
}

/// Read a calendar day from a server field that may hold either a date or a
/// full ISO datetime. Unparseable values are dropped rather than failing the
/// whole payload.
pub fn deserialize_day<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_server_day))
}

fn parse_server_day(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10)?;
    match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(d) => Some(d),
        Err(e) => {
            log::warn!("ignoring unparseable date {:?}: {}", raw, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // 2024-05-15 is a Wednesday.
    const TODAY: (i32, u32, u32) = (2024, 5, 15);

    fn today() -> NaiveDate {
        d(TODAY.0, TODAY.1, TODAY.2)
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(parse_due_input("Today", today()), Some(today()));
        assert_eq!(parse_due_input("tomorrow", today()), Some(d(2024, 5, 16)));
        assert_eq!(parse_due_input("eow", today()), Some(d(2024, 5, 19)));
        assert_eq!(parse_due_input("end of month", today()), Some(d(2024, 5, 31)));
    }

    #[test]
    fn test_parse_relative_offsets() {
        assert_eq!(parse_due_input("in 3d", today()), Some(d(2024, 5, 18)));
        assert_eq!(parse_due_input("in 2w", today()), Some(d(2024, 5, 29)));
        assert_eq!(parse_due_input("in 1m", today()), Some(d(2024, 6, 14)));
        assert_eq!(parse_due_input("in xd", today()), None);
    }

    #[test]
    fn test_parse_offsets_beyond_calendar() {
        assert_eq!(parse_due_input("in 999999999d", today()), None);
        assert_eq!(parse_due_input("in 999999999w", today()), None);
        assert_eq!(parse_due_input("in 9223372036854775807m", today()), None);
        assert_eq!(parse_due_input("in -9223372036854775807d", today()), None);
    }

    #[test]
    fn test_parse_weekdays() {
        assert_eq!(parse_due_input("friday", today()), Some(d(2024, 5, 17)));
        assert_eq!(parse_due_input("wed", today()), Some(today()));
        assert_eq!(parse_due_input("next mon", today()), Some(d(2024, 5, 27)));
    }

    #[test]
    fn test_parse_iso_and_garbage() {
        assert_eq!(parse_due_input("2024-12-01", today()), Some(d(2024, 12, 1)));
        assert_eq!(parse_due_input("soon", today()), None);
    }

    #[test]
    fn test_format_due_relative() {
        assert_eq!(format_due_relative(None, today()), "-");
        assert_eq!(format_due_relative(Some(today()), today()), "today");
        assert_eq!(format_due_relative(Some(d(2024, 5, 20)), today()), "in 5d");
        assert_eq!(format_due_relative(Some(d(2024, 5, 13)), today()), "2d late");
    }

    #[test]
    fn test_parse_server_day() {
        assert_eq!(parse_server_day("2024-05-01"), Some(d(2024, 5, 1)));
        assert_eq!(parse_server_day("2024-05-01T12:30:00Z"), Some(d(2024, 5, 1)));
        assert_eq!(parse_server_day("bad"), None);
    }
}
