//! Color constants for the terminal user interface.

use ratatui::style::Color;

/// Background of empty timeline cells.
pub const TRACK_BG: Color = Color::Rgb(40, 40, 40);
/// Column of today's date.
pub const TODAY_BG: Color = Color::Rgb(70, 60, 20);
/// Bars of completed tasks.
pub const DONE_GREEN: Color = Color::Rgb(0, 110, 0);
/// Status bar and selection accent.
pub const ACCENT: Color = Color::Rgb(79, 140, 201);

/// Turn a `#rrggbb` board colour into a terminal colour.
pub fn hex_color(hex: &str) -> Color {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return ACCENT;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => ACCENT,
    }
}
