use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Local;
use tokio::sync::mpsc::{error::TryRecvError, UnboundedReceiver};
use tracing::{debug, warn};

use crate::components::reminder_form::{FormMode, ReminderFormState};
use crate::reminders::Reminder;
use crate::scheduler::{SchedulerError, SchedulerHandle, Snapshot, UiEvent};

/// How long notification and image popups stay up.
pub const POPUP_DURATION: Duration = Duration::from_secs(10);

const MAX_TOASTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewMode {
    Pending,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Form,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub until: Instant,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

pub struct App {
    pub running: bool,
    pub view_mode: ViewMode,
    pub snapshot: Snapshot,
    pub selected: usize,
    pub history_scroll: usize,
    pub form_state: Option<ReminderFormState>,
    pub show_help: bool,
    pub status_message: Option<StatusMessage>,
    pub toasts: VecDeque<Toast>,
    pub image: Option<(PathBuf, Instant)>,
    /// Set when a bell was requested; cleared by the render loop.
    pub bell_pending: bool,
    handle: SchedulerHandle,
    events: UnboundedReceiver<UiEvent>,
}

impl App {
    pub fn new(handle: SchedulerHandle, events: UnboundedReceiver<UiEvent>) -> Self {
        Self {
            running: true,
            view_mode: ViewMode::Pending,
            snapshot: Snapshot::default(),
            selected: 0,
            history_scroll: 0,
            form_state: None,
            show_help: false,
            status_message: None,
            toasts: VecDeque::new(),
            image: None,
            bell_pending: false,
            handle,
            events,
        }
    }

    pub fn input_mode(&self) -> InputMode {
        if self.form_state.is_some() {
            InputMode::Form
        } else {
            InputMode::Normal
        }
    }

    /// Apply everything the scheduler sent since the last frame.
    pub fn drain_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.apply_event(event, Instant::now()),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if self.running {
                        warn!("scheduler event channel closed");
                        self.set_error("Scheduler stopped");
                        self.running = false;
                    }
                    break;
                }
            }
        }
    }

    pub fn apply_event(&mut self, event: UiEvent, at: Instant) {
        match event {
            UiEvent::Changed(snapshot) => {
                self.snapshot = snapshot;
                self.clamp_selection();
            }
            UiEvent::Notification { title, message } => {
                if self.toasts.len() == MAX_TOASTS {
                    self.toasts.pop_front();
                }
                self.toasts.push_back(Toast {
                    title,
                    message,
                    until: at + POPUP_DURATION,
                });
            }
            UiEvent::Image { path } => self.image = Some((path, at + POPUP_DURATION)),
            UiEvent::Bell => self.bell_pending = true,
        }
    }

    pub fn expire_popups(&mut self, now: Instant) {
        self.toasts.retain(|t| t.until > now);
        if matches!(self.image, Some((_, until)) if until <= now) {
            self.image = None;
        }
    }

    pub fn dismiss_popups(&mut self) -> bool {
        let had_any = !self.toasts.is_empty() || self.image.is_some();
        self.toasts.clear();
        self.image = None;
        had_any
    }

    pub fn reminders(&self) -> &[Reminder] {
        &self.snapshot.reminders
    }

    pub fn selected_reminder(&self) -> Option<&Reminder> {
        self.snapshot.reminders.get(self.selected)
    }

    pub fn select_next(&mut self) {
        match self.view_mode {
            ViewMode::Pending => {
                if self.selected + 1 < self.snapshot.reminders.len() {
                    self.selected += 1;
                }
            }
            ViewMode::History => {
                if self.history_scroll + 1 < self.snapshot.history.len() {
                    self.history_scroll += 1;
                }
            }
        }
    }

    pub fn select_prev(&mut self) {
        match self.view_mode {
            ViewMode::Pending => self.selected = self.selected.saturating_sub(1),
            ViewMode::History => self.history_scroll = self.history_scroll.saturating_sub(1),
        }
    }

    pub fn toggle_view(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Pending => ViewMode::History,
            ViewMode::History => ViewMode::Pending,
        };
    }

    fn clamp_selection(&mut self) {
        let len = self.snapshot.reminders.len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
        let hist = self.snapshot.history.len();
        if self.history_scroll >= hist {
            self.history_scroll = hist.saturating_sub(1);
        }
    }

    pub fn open_new_form(&mut self) {
        self.form_state = Some(ReminderFormState::new(Local::now()));
    }

    pub fn open_edit_form(&mut self) {
        match self.selected_reminder() {
            Some(reminder) => self.form_state = Some(ReminderFormState::edit(reminder)),
            None => self.set_info("Nothing selected"),
        }
    }

    pub fn close_form(&mut self) {
        self.form_state = None;
    }

    pub fn form_tab(&mut self) {
        if let Some(ref mut form) = self.form_state {
            form.active_field = form.active_field.next();
        }
    }

    pub fn form_backtab(&mut self) {
        if let Some(ref mut form) = self.form_state {
            form.active_field = form.active_field.prev();
        }
    }

    pub fn form_input_char(&mut self, c: char) {
        if let Some(ref mut form) = self.form_state {
            form.input_char(c);
        }
    }

    pub fn form_backspace(&mut self) {
        if let Some(ref mut form) = self.form_state {
            form.backspace();
        }
    }

    /// Validate and send the form. The form stays open on any error.
    pub fn submit_form(&mut self) {
        let Some(form) = self.form_state.as_ref() else {
            return;
        };

        let target = match form.target_time() {
            Ok(t) => t,
            Err(e) => {
                self.set_error(e.to_string());
                return;
            }
        };

        let result = match form.mode {
            FormMode::New => self
                .handle
                .add(&form.title, target)
                .map(|_| "Reminder added"),
            FormMode::Edit(id) => self
                .handle
                .edit(id, &form.title, target)
                .map(|_| "Reminder updated"),
        };

        match result {
            Ok(msg) => {
                self.form_state = None;
                self.set_info(msg);
                self.refresh();
            }
            Err(e) => self.report(e),
        }
    }

    pub fn delete_selected(&mut self) {
        let Some(id) = self.selected_reminder().map(|r| r.id) else {
            self.set_info("Nothing selected");
            return;
        };
        match self.handle.remove(id) {
            Ok(removed) => {
                self.set_info(format!("Deleted \"{}\"", removed.title));
                self.refresh();
            }
            Err(e) => self.report(e),
        }
    }

    pub fn toggle_sound(&mut self) {
        let mut settings = self.snapshot.settings.clone();
        settings.sound_enabled = !settings.sound_enabled;
        let msg = if settings.sound_enabled { "Sound on" } else { "Sound off" };
        self.push_settings(settings, msg);
    }

    pub fn toggle_image(&mut self) {
        let mut settings = self.snapshot.settings.clone();
        settings.image_enabled = !settings.image_enabled;
        let msg = if settings.image_enabled { "Image popup on" } else { "Image popup off" };
        self.push_settings(settings, msg);
    }

    fn push_settings(&mut self, settings: crate::state::Settings, msg: &str) {
        match self.handle.update_settings(settings) {
            Ok(()) => {
                self.set_info(msg);
                self.refresh();
            }
            Err(e) => self.report(e),
        }
    }

    /// Evaluate thresholds now rather than on the next tick.
    pub fn check_now(&mut self) {
        match self.handle.tick_now() {
            Ok(outcome) if outcome.is_empty() => self.set_info("Nothing due"),
            Ok(outcome) => {
                self.set_info(format!(
                    "{} fired, {} expired",
                    outcome.firings.len(),
                    outcome.expired.len()
                ));
                self.refresh();
            }
            Err(e) => self.report(e),
        }
    }

    /// Pull a fresh snapshot instead of waiting for the next event.
    pub fn refresh(&mut self) {
        match self.handle.snapshot() {
            Ok(snapshot) => {
                self.snapshot = snapshot;
                self.clamp_selection();
            }
            Err(e) => self.report(e),
        }
    }

    fn report(&mut self, error: SchedulerError) {
        debug!(error = %error, "request rejected");
        self.set_error(error.to_string());
    }

    fn set_info(&mut self, text: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    fn set_error(&mut self, text: impl Into<String>) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            is_error: true,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration as ChronoDuration, Local};
    use tokio::sync::mpsc;

    use super::*;
    use crate::reminders::engine::testing::Recorder;
    use crate::reminders::{Clock, ReminderStore, SystemClock};
    use crate::scheduler::{EngineFactory, Scheduler};
    use crate::state::Settings;

    fn app() -> App {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let recorder = Recorder::default();
        let factory: EngineFactory = Box::new(move |_: &Settings| recorder.engine());
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Scheduler::new(
            ReminderStore::new(clock.clone()),
            Settings::default(),
            factory,
            clock,
            tx,
        );
        let (handle, _join) = scheduler.spawn(std::time::Duration::from_secs(3600)).unwrap();
        App::new(handle, rx)
    }

    fn fill_form(app: &mut App, title: &str, target: chrono::DateTime<Local>) {
        app.open_new_form();
        let form = app.form_state.as_mut().unwrap();
        form.title = title.to_string();
        form.date = target.format("%Y-%m-%d").to_string();
        form.time = target.format("%H:%M:%S").to_string();
    }

    #[test]
    fn submit_adds_and_closes_form() {
        let mut app = app();
        fill_form(&mut app, "Exam", Local::now() + ChronoDuration::days(2));
        app.submit_form();

        assert!(app.form_state.is_none());
        assert_eq!(app.reminders().len(), 1);
        assert!(!app.status_message.as_ref().unwrap().is_error);
    }

    #[test]
    fn empty_title_keeps_form_open_with_error() {
        let mut app = app();
        fill_form(&mut app, "", Local::now() + ChronoDuration::days(2));
        app.submit_form();

        assert_eq!(app.input_mode(), InputMode::Form);
        let status = app.status_message.as_ref().unwrap();
        assert!(status.is_error);
        assert!(status.text.contains("title"));
        assert!(app.reminders().is_empty());
    }

    #[test]
    fn past_time_reports_distinct_reason() {
        let mut app = app();
        fill_form(&mut app, "Past", Local::now() - ChronoDuration::hours(1));
        app.submit_form();

        let status = app.status_message.as_ref().unwrap();
        assert!(status.is_error);
        assert!(status.text.contains("not in the future"));
    }

    #[test]
    fn delete_moves_selection_into_history() {
        let mut app = app();
        fill_form(&mut app, "Dentist", Local::now() + ChronoDuration::days(1));
        app.submit_form();
        app.delete_selected();

        assert!(app.reminders().is_empty());
        assert_eq!(app.snapshot.history.len(), 1);
    }

    #[test]
    fn popups_expire_after_duration() {
        let mut app = app();
        let t0 = Instant::now();
        app.apply_event(
            UiEvent::Notification {
                title: "Reminder".to_string(),
                message: "Exam".to_string(),
            },
            t0,
        );
        app.apply_event(UiEvent::Image { path: PathBuf::from("chara.png") }, t0);

        app.expire_popups(t0 + Duration::from_secs(5));
        assert_eq!(app.toasts.len(), 1);
        assert!(app.image.is_some());

        app.expire_popups(t0 + POPUP_DURATION);
        assert!(app.toasts.is_empty());
        assert!(app.image.is_none());
    }

    #[test]
    fn toasts_are_capped() {
        let mut app = app();
        let t0 = Instant::now();
        for i in 0..5 {
            app.apply_event(
                UiEvent::Notification {
                    title: "Reminder".to_string(),
                    message: format!("r{i}"),
                },
                t0,
            );
        }
        assert_eq!(app.toasts.len(), MAX_TOASTS);
        assert_eq!(app.toasts.front().unwrap().message, "r2");
    }

    #[test]
    fn toggles_round_trip_through_scheduler() {
        let mut app = app();
        app.refresh();
        assert!(app.snapshot.settings.sound_enabled);
        app.toggle_sound();
        assert!(!app.snapshot.settings.sound_enabled);
        app.toggle_image();
        assert!(!app.snapshot.settings.image_enabled);
    }
}
