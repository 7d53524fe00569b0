use chrono::{DateTime, Local};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::reminders::{Reminder, Threshold};
use crate::reminders::reminder::ThresholdState;
use crate::theme;

pub struct ReminderList;

impl ReminderList {
    pub fn render(
        frame: &mut Frame,
        area: Rect,
        reminders: &[Reminder],
        selected_index: usize,
        now: DateTime<Local>,
    ) {
        let w = area.width as usize;

        let title = if w >= 25 {
            format!(" Reminders ({}) ", reminders.len())
        } else {
            " Reminders ".to_string()
        };

        let block = Block::default()
            .title(title)
            .title_style(theme::HEADER_STYLE)
            .borders(Borders::ALL)
            .border_style(theme::BORDER_STYLE);

        if reminders.is_empty() {
            let inner = block.inner(area);
            frame.render_widget(block, area);
            let msg = Paragraph::new("No reminders. Press 'n' to add one.").style(theme::DIM_STYLE);
            frame.render_widget(msg, inner);
            return;
        }

        let inner_w = area.width.saturating_sub(2) as usize;

        let items: Vec<ListItem> = reminders
            .iter()
            .enumerate()
            .map(|(i, reminder)| {
                let is_selected = i == selected_index;
                let when = format!(" {} ", reminder.target_time.format("%Y-%m-%d %H:%M:%S"));
                let countdown = format!("{:>8} ", reminder.remaining_display(now));
                let marks = threshold_marks(reminder);

                let fixed = when.len() + countdown.len() + marks.len() + 1;
                let title_w = inner_w.saturating_sub(fixed).max(4);

                let title_style = if is_selected {
                    theme::SELECTED_STYLE
                } else {
                    Style::default()
                };

                let secs_left = (reminder.target_time - now).num_seconds();
                let mut spans = vec![
                    Span::styled(format!(" {:<width$}", truncate(&reminder.title, title_w), width = title_w), title_style),
                    Span::styled(when, theme::DIM_STYLE),
                    Span::styled(countdown, theme::countdown_style(secs_left)),
                ];
                if inner_w >= fixed + 4 {
                    spans.push(Span::styled(marks, theme::DIM_STYLE));
                }

                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items).block(block);
        frame.render_widget(list, area);
    }
}

/// Per-threshold marker: `*` fired, `-` skipped, `.` pending.
fn threshold_marks(reminder: &Reminder) -> String {
    Threshold::ALL
        .iter()
        .map(|t| match reminder.threshold_state(*t) {
            ThresholdState::Fired => '*',
            ThresholdState::Skipped => '-',
            ThresholdState::Pending => '.',
        })
        .collect()
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else if max > 3 {
        let head: String = s.chars().take(max - 3).collect();
        format!("{}...", head)
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("Ujian akhir", 20), "Ujian akhir");
        assert_eq!(truncate("Pengingat ujian", 8), "Pengi...");
        assert_eq!(truncate("é€漢字", 2), "é€");
    }
}
