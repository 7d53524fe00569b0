use std::path::Path;

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::theme;

/// Toast in the top-right corner.
pub fn render_notification(frame: &mut Frame, area: Rect, title: &str, message: &str) {
    let popup_w = area.width.min(40).max(20);
    let popup_h = 4u16.min(area.height);
    let x = area.x + area.width.saturating_sub(popup_w + 1);
    let popup_area = Rect::new(x, area.y + 1u16.min(area.height), popup_w, popup_h);

    frame.render_widget(Clear, popup_area);
    let block = Block::default()
        .title(format!(" {} ", title))
        .title_style(theme::POPUP_TITLE)
        .borders(Borders::ALL)
        .border_style(theme::POPUP_BORDER);

    let para = Paragraph::new(message.to_string())
        .style(Style::default().add_modifier(Modifier::BOLD))
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(para, popup_area);
}

/// Placeholder frame for the configured picture, bottom-right like the
/// desktop popup it stands in for.
pub fn render_image(frame: &mut Frame, area: Rect, path: &Path) {
    let popup_w = area.width.min(30).max(16);
    let popup_h = area.height.min(7).max(3);
    let x = area.x + area.width.saturating_sub(popup_w + 1);
    let y = area.y + area.height.saturating_sub(popup_h + 1);
    let popup_area = Rect::new(x, y, popup_w, popup_h);

    frame.render_widget(Clear, popup_area);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::POPUP_BORDER);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("\u{23f0} Time's up!", theme::POPUP_TITLE)),
        Line::from(Span::styled(name, theme::DIM_STYLE)),
    ];
    let para = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(para, popup_area);
}

pub fn render_help(frame: &mut Frame, area: Rect) {
    let popup_w = area.width.min(48).max(30);
    let popup_h = area.height.min(18).max(10);
    let x = area.x + (area.width.saturating_sub(popup_w)) / 2;
    let y = area.y + (area.height.saturating_sub(popup_h)) / 2;
    let popup_area = Rect::new(x, y, popup_w, popup_h);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(" Keybindings ")
        .title_style(theme::POPUP_TITLE)
        .borders(Borders::ALL)
        .border_style(theme::POPUP_BORDER);

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let section_style = Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let key = |k: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", k), theme::KEY_STYLE),
            Span::raw(desc),
        ])
    };

    let lines = vec![
        Line::from(Span::styled("Reminders", section_style)),
        key("n", "New reminder"),
        key("e / Enter", "Edit selected"),
        key("d", "Delete selected"),
        key("j/k", "Move selection"),
        Line::from(""),
        Line::from(Span::styled("Views", section_style)),
        key("1 / 2", "Pending / History"),
        key("Tab", "Switch view"),
        Line::from(""),
        Line::from(Span::styled("Alerts", section_style)),
        key("s", "Toggle alarm sound"),
        key("i", "Toggle image popup"),
        key("r", "Check thresholds now"),
        Line::from(""),
        key("q / Esc", "Quit / close popup"),
    ];

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}
