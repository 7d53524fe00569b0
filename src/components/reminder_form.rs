use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Timelike};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::reminders::{Reminder, ReminderId};
use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormField {
    Title,
    Date,
    Time,
}

impl FormField {
    pub fn next(&self) -> Self {
        match self {
            FormField::Title => FormField::Date,
            FormField::Date => FormField::Time,
            FormField::Time => FormField::Title,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            FormField::Title => FormField::Time,
            FormField::Date => FormField::Title,
            FormField::Time => FormField::Date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormMode {
    New,
    Edit(ReminderId),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("date must be YYYY-MM-DD")]
    BadDate,
    #[error("time must be HH:MM or HH:MM:SS")]
    BadTime,
    #[error("that local time does not exist")]
    NoSuchLocalTime,
}

#[derive(Debug, Clone)]
pub struct ReminderFormState {
    pub mode: FormMode,
    pub title: String,
    pub date: String,
    pub time: String,
    pub active_field: FormField,
}

impl ReminderFormState {
    /// Blank form defaulting to the next whole hour.
    pub fn new(now: DateTime<Local>) -> Self {
        let next_hour = (now + Duration::hours(1))
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .unwrap_or(now);
        Self {
            mode: FormMode::New,
            title: String::new(),
            date: next_hour.format("%Y-%m-%d").to_string(),
            time: next_hour.format("%H:%M").to_string(),
            active_field: FormField::Title,
        }
    }

    pub fn edit(reminder: &Reminder) -> Self {
        Self {
            mode: FormMode::Edit(reminder.id),
            title: reminder.title.clone(),
            date: reminder.target_time.format("%Y-%m-%d").to_string(),
            time: reminder.target_time.format("%H:%M:%S").to_string(),
            active_field: FormField::Title,
        }
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()
    }

    pub fn parsed_time(&self) -> Option<NaiveTime> {
        let time = self.time.trim();
        NaiveTime::parse_from_str(time, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M"))
            .ok()
    }

    pub fn target_time(&self) -> Result<DateTime<Local>, FormError> {
        let date = self.parsed_date().ok_or(FormError::BadDate)?;
        let time = self.parsed_time().ok_or(FormError::BadTime)?;
        Local
            .from_local_datetime(&date.and_time(time))
            .earliest()
            .ok_or(FormError::NoSuchLocalTime)
    }

    pub fn input_char(&mut self, c: char) {
        match self.active_field {
            FormField::Title => self.title.push(c),
            FormField::Date => self.date.push(c),
            FormField::Time => self.time.push(c),
        }
    }

    pub fn backspace(&mut self) {
        match self.active_field {
            FormField::Title => { self.title.pop(); }
            FormField::Date => { self.date.pop(); }
            FormField::Time => { self.time.pop(); }
        }
    }
}

pub struct ReminderForm;

impl ReminderForm {
    pub fn render(frame: &mut Frame, area: Rect, state: &ReminderFormState) {
        let form_w = area.width.min(50).max(30);
        let form_h = area.height.min(9).max(7);
        let x = area.x + (area.width.saturating_sub(form_w)) / 2;
        let y = area.y + (area.height.saturating_sub(form_h)) / 2;
        let form_area = Rect::new(x, y, form_w, form_h);

        frame.render_widget(Clear, form_area);

        let heading = match state.mode {
            FormMode::New => " New Reminder ",
            FormMode::Edit(_) => " Edit Reminder ",
        };
        let block = Block::default()
            .title(heading)
            .title_style(theme::POPUP_TITLE)
            .borders(Borders::ALL)
            .border_style(theme::POPUP_BORDER);

        let inner = block.inner(form_area);
        frame.render_widget(block, form_area);

        let rows = Layout::vertical([
            Constraint::Length(1), // title
            Constraint::Length(1), // date
            Constraint::Length(1), // time
            Constraint::Length(1), // spacer
            Constraint::Length(1), // help
            Constraint::Min(0),
        ])
        .split(inner);

        render_field(frame, rows[0], "Title:", &state.title, state.active_field == FormField::Title);
        render_field(frame, rows[1], "Date:", &state.date, state.active_field == FormField::Date);
        render_field(frame, rows[2], "Time:", &state.time, state.active_field == FormField::Time);

        let help = Line::from(vec![
            Span::styled("Tab", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Next ", theme::DIM_STYLE),
            Span::styled("Enter", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Save ", theme::DIM_STYLE),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(":Cancel", theme::DIM_STYLE),
        ]);
        frame.render_widget(Paragraph::new(help), rows[4]);
    }
}

fn render_field(frame: &mut Frame, area: Rect, label: &str, value: &str, active: bool) {
    let cursor = if active { "_" } else { "" };
    let style = if active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let line = Line::from(vec![
        Span::styled(format!("{:<7}", label), theme::DIM_STYLE),
        Span::styled(format!("{}{}", value, cursor), style),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
