use ratatui::style::Color;

pub mod palette {
    use super::*;

    // Text colors
    pub const PRIMARY_TEXT: Color = Color::White;
    pub const DIMMED_TEXT: Color = Color::DarkGray;
    pub const SUBDUED_TEXT: Color = Color::Rgb(100, 100, 100);

    // Semantic colors
    pub const DESTRUCTIVE: Color = Color::Red;
    pub const WARNING: Color = Color::Yellow;
    pub const SUCCESS: Color = Color::Green;
    pub const INFO: Color = Color::Cyan;

    pub const HIGHLIGHT_BG: Color = Color::Rgb(40, 44, 52);
    pub const STATUS_BG: Color = Color::Rgb(30, 30, 30);

    pub const AUTHORS: [Color; 6] = [
        Color::Rgb(142, 240, 204),
        Color::Magenta,
        Color::Blue,
        Color::Rgb(255, 200, 0),
        Color::Cyan,
        Color::Rgb(255, 140, 120),
    ];
}

/// Stable color for an author name.
pub fn author_color(author: &str) -> Color {
    let hash = author
        .bytes()
        .fold(0usize, |acc, byte| acc.wrapping_mul(31).wrapping_add(byte as usize));
    palette::AUTHORS[hash % palette::AUTHORS.len()]
}
