use ratatui::style::{Color, Modifier, Style};

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::White)
    .add_modifier(Modifier::BOLD);
pub const DIM_STYLE: Style = Style::new().fg(Color::DarkGray);
pub const BORDER_STYLE: Style = Style::new().fg(Color::Gray);
pub const STATUS_STYLE: Style = Style::new().fg(Color::White).bg(Color::DarkGray);
pub const SELECTED_STYLE: Style = Style::new().fg(Color::Black).bg(Color::Cyan);
pub const ERROR_STYLE: Style = Style::new().fg(Color::White).bg(Color::Red);

pub const POPUP_BORDER: Style = Style::new().fg(Color::Green);
pub const POPUP_TITLE: Style = Style::new()
    .fg(Color::Green)
    .add_modifier(Modifier::BOLD);
pub const KEY_STYLE: Style = Style::new()
    .fg(Color::Cyan)
    .add_modifier(Modifier::BOLD);

/// Countdown colour: red inside the last hour, yellow inside a day.
pub fn countdown_style(secs_left: i64) -> Style {
    if secs_left <= 3600 {
        Style::new().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else if secs_left <= 86_400 {
        Style::new().fg(Color::Yellow)
    } else {
        DIM_STYLE
    }
}
