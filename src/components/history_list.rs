use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::components::reminder_list::truncate;
use crate::reminders::{HistoryEntry, RemovalReason};
use crate::theme;

pub struct HistoryList;

impl HistoryList {
    /// Newest entries first; `scroll` skips that many rows.
    pub fn render(frame: &mut Frame, area: Rect, history: &[HistoryEntry], scroll: usize) {
        let block = Block::default()
            .title(format!(" History ({}) ", history.len()))
            .title_style(theme::HEADER_STYLE)
            .borders(Borders::ALL)
            .border_style(theme::BORDER_STYLE);

        if history.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            frame.render_widget(Paragraph::new("Nothing here yet").style(theme::DIM_STYLE), inner);
            return;
        }

        let inner_w = area.width.saturating_sub(2) as usize;
        let items: Vec<ListItem> = history
            .iter()
            .rev()
            .skip(scroll)
            .map(|entry| {
                let reason = match entry.reason {
                    RemovalReason::Expired => " done ",
                    RemovalReason::Deleted => " deleted ",
                };
                let when = format!(" {}", entry.target_time.format("%Y-%m-%d %H:%M"));
                let title_w = inner_w.saturating_sub(when.len() + reason.len() + 1).max(4);
                ListItem::new(Line::from(vec![
                    Span::raw(format!(" {:<width$}", truncate(&entry.title, title_w), width = title_w)),
                    Span::styled(when, theme::DIM_STYLE),
                    Span::styled(reason, theme::DIM_STYLE),
                ]))
            })
            .collect();

        frame.render_widget(List::new(items).block(block), area);
    }
}
