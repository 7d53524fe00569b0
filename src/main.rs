mod app;
mod components;
mod config;
mod logging;
mod notify;
mod reminders;
mod scheduler;
mod state;
mod theme;
mod tui;

use std::sync::Arc;
use std::time::{Duration, Instant};

use app::{App, InputMode, ViewMode};
use chrono::Local;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Rect};
use tokio::sync::mpsc;
use tracing::{info, warn};

use config::Config;
use notify::{CommandSoundPlayer, PopupImage, UiNotifier};
use reminders::{Clock, Engine, ReminderStore, SystemClock};
use scheduler::{EngineFactory, Scheduler};
use state::Settings;

fn main() -> Result<()> {
    color_eyre::install()?;

    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    let _log_guard = logging::init(config.log_dir().as_deref(), &config.log_filter);
    if let Some(e) = config_error {
        warn!(error = %e, "using default configuration");
    }

    let state_path = config.state_path();
    let persisted = match state_path.as_deref() {
        Some(path) => state::load(path)?,
        None => state::PersistedState::default(),
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut store = ReminderStore::new(clock.clone());
    let restored = store.import_state(persisted.store);
    info!(restored, path = ?state_path, "state loaded");

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let factory_tx = events_tx.clone();
    let player = config.sound_player.clone();
    let factory: EngineFactory = Box::new(move |settings: &Settings| {
        Engine::new(
            Box::new(UiNotifier::new(factory_tx.clone())),
            Box::new(CommandSoundPlayer::new(
                player.clone(),
                settings,
                factory_tx.clone(),
            )),
            Box::new(PopupImage::new(factory_tx.clone(), settings.image_path.clone())),
        )
        .with_toggles(settings.toggles())
    });

    let scheduler = Scheduler::new(store, persisted.settings, factory, clock, events_tx)
        .with_state_path(state_path);
    let (handle, join) = scheduler.spawn(config.tick_interval)?;

    let mut app = App::new(handle.clone(), events_rx);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app);
    tui::restore()?;

    if let Err(e) = handle.shutdown() {
        warn!(error = %e, "scheduler already stopped");
    }
    drop(app);
    drop(handle);
    if join.join().is_err() {
        warn!("scheduler thread panicked");
    }
    result
}

fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    while app.running {
        app.drain_events();
        app.expire_popups(Instant::now());
        if app.bell_pending {
            app.bell_pending = false;
            tui::bell()?;
        }

        terminal.draw(|frame| {
            let area = frame.area();
            let now = Local::now();

            let layout = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(area);
            let content_area = layout[0];

            match app.view_mode {
                ViewMode::Pending => components::ReminderList::render(
                    frame,
                    content_area,
                    app.reminders(),
                    app.selected,
                    now,
                ),
                ViewMode::History => components::HistoryList::render(
                    frame,
                    content_area,
                    &app.snapshot.history,
                    app.history_scroll,
                ),
            }

            if let Some((ref path, _)) = app.image {
                components::popup::render_image(frame, content_area, path);
            }

            for (i, toast) in app.toasts.iter().enumerate() {
                let offset = (i as u16) * 4;
                let toast_area = Rect {
                    y: content_area.y + offset,
                    height: content_area.height.saturating_sub(offset),
                    ..content_area
                };
                components::popup::render_notification(frame, toast_area, &toast.title, &toast.message);
            }

            if let Some(ref form) = app.form_state {
                components::ReminderForm::render(frame, area, form);
            }

            if app.show_help {
                components::popup::render_help(frame, area);
            }

            render_status_bar(frame, layout[1], app);
        })?;

        if let Some(key) = tui::next_key_event(Duration::from_millis(100))? {
            if app.show_help {
                if key.code == KeyCode::Esc || key.code == KeyCode::Char('?') {
                    app.show_help = false;
                }
                continue;
            }

            match app.input_mode() {
                InputMode::Form => handle_form_input(app, key.code),
                InputMode::Normal => {
                    app.status_message = None;
                    handle_normal_input(app, key.code, key.modifiers);
                }
            }
        }
    }

    Ok(())
}

fn handle_normal_input(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match (code, modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Char('q'), _) => {
            app.running = false;
        }
        (KeyCode::Esc, _) => {
            if !app.dismiss_popups() {
                app.running = false;
            }
        }
        (KeyCode::Char('1'), _) => app.view_mode = ViewMode::Pending,
        (KeyCode::Char('2'), _) => app.view_mode = ViewMode::History,
        (KeyCode::Tab, _) => app.toggle_view(),
        (KeyCode::Char('n'), _) => app.open_new_form(),
        (KeyCode::Char('e'), _) | (KeyCode::Enter, _) => {
            if app.view_mode == ViewMode::Pending {
                app.open_edit_form();
            }
        }
        (KeyCode::Char('d'), _) | (KeyCode::Delete, _) => {
            if app.view_mode == ViewMode::Pending {
                app.delete_selected();
            }
        }
        (KeyCode::Char('s'), _) => app.toggle_sound(),
        (KeyCode::Char('i'), _) => app.toggle_image(),
        (KeyCode::Char('r'), _) => app.check_now(),
        (KeyCode::Up, _) | (KeyCode::Char('k'), _) => app.select_prev(),
        (KeyCode::Down, _) | (KeyCode::Char('j'), _) => app.select_next(),
        (KeyCode::Char('?'), _) => app.show_help = true,
        _ => {}
    }
}

fn handle_form_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Esc => app.close_form(),
        KeyCode::Enter => app.submit_form(),
        KeyCode::Tab | KeyCode::Down => app.form_tab(),
        KeyCode::BackTab | KeyCode::Up => app.form_backtab(),
        KeyCode::Backspace => app.form_backspace(),
        KeyCode::Char(c) => app.form_input_char(c),
        _ => {}
    }
}

fn render_status_bar(frame: &mut ratatui::Frame, area: Rect, app: &App) {
    use ratatui::text::{Line, Span};
    use ratatui::widgets::Paragraph;

    let w = area.width as usize;

    let mode_str = match app.view_mode {
        ViewMode::Pending => "[1]Pending",
        ViewMode::History => "[2]History",
    };
    let settings = &app.snapshot.settings;
    let flags = format!(
        " snd:{} img:{}",
        if settings.sound_enabled { "on" } else { "off" },
        if settings.image_enabled { "on" } else { "off" },
    );

    let (right_text, right_style) = match app.status_message {
        Some(ref msg) => (
            format!(" {} ", msg.text),
            if msg.is_error { theme::ERROR_STYLE } else { theme::STATUS_STYLE },
        ),
        None => {
            let hints = match app.input_mode() {
                InputMode::Form => " Tab:Field Enter:Save Esc:Cancel",
                InputMode::Normal if w >= 80 => " n:New e:Edit d:Del s:Sound i:Image ?:Help q:Quit",
                InputMode::Normal if w >= 50 => " n:New e:Edit d:Del q:Quit",
                InputMode::Normal => " ?:Help q:Quit",
            };
            (hints.to_string(), theme::STATUS_STYLE)
        }
    };

    let left = format!(" {}{} ", mode_str, flags);
    let padding_len = w.saturating_sub(left.len() + right_text.chars().count());

    let line = Line::from(vec![
        Span::styled(left, theme::STATUS_STYLE),
        Span::styled(" ".repeat(padding_len), theme::STATUS_STYLE),
        Span::styled(right_text, right_style),
    ]);
    frame.render_widget(Paragraph::new(line).style(theme::STATUS_STYLE), area);
}
