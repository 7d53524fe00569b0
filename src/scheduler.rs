//! Background owner of the reminder store.
//!
//! The store and engine live on a dedicated thread running a current-thread
//! tokio runtime. The UI never touches them directly: it sends commands
//! through a [`SchedulerHandle`] and receives [`UiEvent`]s back. Ticks and
//! commands are serialized by the single task, so no lock guards the store.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::reminders::{
    Clock, Engine, HistoryEntry, Reminder, ReminderId, ReminderStore, StoreError, TickOutcome,
};
use crate::state::{self, PersistedState, Settings};

const COMMAND_BUFFER: usize = 32;

/// Builds an engine for the current settings.
pub type EngineFactory = Box<dyn Fn(&Settings) -> Engine + Send>;

/// Messages pushed from the scheduler to the UI.
#[derive(Debug, Clone)]
pub enum UiEvent {
    Notification { title: String, message: String },
    Image { path: PathBuf },
    Bell,
    Changed(Snapshot),
}

/// Read-only copy of the store for display.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub reminders: Vec<Reminder>,
    pub history: Vec<HistoryEntry>,
    pub settings: Settings,
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("scheduler is not running")]
    Stopped,
}

enum Command {
    Add {
        title: String,
        target: DateTime<Local>,
        reply: oneshot::Sender<Result<ReminderId, StoreError>>,
    },
    Edit {
        id: ReminderId,
        title: String,
        target: DateTime<Local>,
        reply: oneshot::Sender<Result<(), StoreError>>,
    },
    Remove {
        id: ReminderId,
        reply: oneshot::Sender<Result<Reminder, StoreError>>,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
    UpdateSettings {
        settings: Settings,
    },
    Tick {
        reply: oneshot::Sender<TickOutcome>,
    },
    Shutdown {
        reply: oneshot::Sender<PersistedState>,
    },
}

pub struct Scheduler {
    store: ReminderStore,
    settings: Settings,
    engine: Engine,
    factory: EngineFactory,
    clock: Arc<dyn Clock>,
    events: mpsc::UnboundedSender<UiEvent>,
    state_path: Option<PathBuf>,
}

impl Scheduler {
    pub fn new(
        store: ReminderStore,
        settings: Settings,
        factory: EngineFactory,
        clock: Arc<dyn Clock>,
        events: mpsc::UnboundedSender<UiEvent>,
    ) -> Self {
        let engine = factory(&settings);
        Self {
            store,
            settings,
            engine,
            factory,
            clock,
            events,
            state_path: None,
        }
    }

    /// Persist to `path` after every change.
    pub fn with_state_path(mut self, path: Option<PathBuf>) -> Self {
        self.state_path = path;
        self
    }

    /// Start the scheduler thread.
    pub fn spawn(self, interval: Duration) -> std::io::Result<(SchedulerHandle, JoinHandle<()>)> {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let join = std::thread::Builder::new()
            .name("scheduler".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!(error = %e, "cannot start scheduler runtime");
                        return;
                    }
                };
                runtime.block_on(self.run(rx, interval));
            })?;
        Ok((SchedulerHandle { tx }, join))
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>, interval: Duration) {
        info!(
            reminders = self.store.len(),
            interval_ms = interval.as_millis() as u64,
            "scheduler started"
        );
        self.publish();

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick();
                }
                cmd = rx.recv() => match cmd {
                    Some(cmd) => {
                        if !self.handle(cmd) {
                            break;
                        }
                    }
                    None => {
                        debug!("all handles dropped");
                        self.persist();
                        break;
                    }
                },
            }
        }

        info!("scheduler stopped");
    }

    /// Returns `false` when the loop should stop.
    fn handle(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Add {
                title,
                target,
                reply,
            } => {
                let result = self.store.add(&title, target);
                if result.is_ok() {
                    self.changed();
                }
                let _ = reply.send(result);
            }
            Command::Edit {
                id,
                title,
                target,
                reply,
            } => {
                let result = self.store.edit(id, &title, target);
                if result.is_ok() {
                    self.changed();
                }
                let _ = reply.send(result);
            }
            Command::Remove { id, reply } => {
                let result = self.store.remove(id);
                if result.is_ok() {
                    self.changed();
                }
                let _ = reply.send(result);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Command::UpdateSettings { settings } => {
                self.engine = (self.factory)(&settings);
                self.settings = settings;
                self.changed();
            }
            Command::Tick { reply } => {
                let _ = reply.send(self.tick());
            }
            Command::Shutdown { reply } => {
                self.persist();
                let _ = reply.send(self.persisted_state());
                return false;
            }
        }
        true
    }

    fn tick(&mut self) -> TickOutcome {
        if self.store.is_empty() {
            return TickOutcome::default();
        }
        let now = self.clock.now();
        let outcome = self.engine.tick(&mut self.store, now);
        if !outcome.is_empty() {
            self.changed();
        }
        outcome
    }

    fn changed(&self) {
        self.persist();
        self.publish();
    }

    fn publish(&self) {
        let _ = self.events.send(UiEvent::Changed(self.snapshot()));
    }

    fn persist(&self) {
        let Some(path) = self.state_path.as_deref() else {
            return;
        };
        if let Err(e) = state::save(path, &self.persisted_state()) {
            error!(error = %e, "cannot persist reminders");
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            reminders: self.store.list().to_vec(),
            history: self.store.list_history().to_vec(),
            settings: self.settings.clone(),
        }
    }

    fn persisted_state(&self) -> PersistedState {
        PersistedState {
            store: self.store.export_state(),
            settings: self.settings.clone(),
        }
    }
}

/// Cloneable, blocking front for the scheduler thread.
///
/// Must not be called from inside an async context.
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::Sender<Command>,
}

impl SchedulerHandle {
    fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, SchedulerError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .blocking_send(make(reply))
            .map_err(|_| SchedulerError::Stopped)?;
        rx.blocking_recv().map_err(|_| SchedulerError::Stopped)
    }

    pub fn add(&self, title: &str, target: DateTime<Local>) -> Result<ReminderId, SchedulerError> {
        let title = title.to_string();
        Ok(self.request(|reply| Command::Add {
            title,
            target,
            reply,
        })??)
    }

    pub fn edit(
        &self,
        id: ReminderId,
        title: &str,
        target: DateTime<Local>,
    ) -> Result<(), SchedulerError> {
        let title = title.to_string();
        Ok(self.request(|reply| Command::Edit {
            id,
            title,
            target,
            reply,
        })??)
    }

    pub fn remove(&self, id: ReminderId) -> Result<Reminder, SchedulerError> {
        Ok(self.request(|reply| Command::Remove { id, reply })??)
    }

    pub fn snapshot(&self) -> Result<Snapshot, SchedulerError> {
        self.request(|reply| Command::Snapshot { reply })
    }

    pub fn update_settings(&self, settings: Settings) -> Result<(), SchedulerError> {
        self.tx
            .blocking_send(Command::UpdateSettings { settings })
            .map_err(|_| SchedulerError::Stopped)
    }

    /// Run an evaluation pass immediately.
    pub fn tick_now(&self) -> Result<TickOutcome, SchedulerError> {
        self.request(|reply| Command::Tick { reply })
    }

    /// Stop the scheduler, returning the final state.
    pub fn shutdown(&self) -> Result<PersistedState, SchedulerError> {
        self.request(|reply| Command::Shutdown { reply })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reminders::clock::ManualClock;
    use crate::reminders::engine::testing::{Call, Recorder};
    use crate::reminders::error::InvalidInput;
    use chrono::TimeZone;

    const SLOW_TICK: Duration = Duration::from_secs(3600);

    fn start() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 9, 14, 10, 0, 0).unwrap()
    }

    struct Harness {
        handle: SchedulerHandle,
        join: JoinHandle<()>,
        clock: ManualClock,
        recorder: Recorder,
        events: mpsc::UnboundedReceiver<UiEvent>,
    }

    fn harness(state_path: Option<PathBuf>) -> Harness {
        let clock = ManualClock::new(start());
        let shared: Arc<dyn Clock> = Arc::new(clock.clone());
        let recorder = Recorder::default();
        let factory_recorder = recorder.clone();
        let factory: EngineFactory = Box::new(move |settings: &Settings| {
            factory_recorder.engine().with_toggles(settings.toggles())
        });
        let (tx, events) = mpsc::unbounded_channel();

        let scheduler = Scheduler::new(
            ReminderStore::new(shared.clone()),
            Settings::default(),
            factory,
            shared,
            tx,
        )
        .with_state_path(state_path);
        let (handle, join) = scheduler.spawn(SLOW_TICK).unwrap();

        Harness {
            handle,
            join,
            clock,
            recorder,
            events,
        }
    }

    #[test]
    fn add_and_snapshot_through_handle() {
        let h = harness(None);
        let id = h
            .handle
            .add("Exam", start() + chrono::Duration::hours(2))
            .unwrap();

        let snap = h.handle.snapshot().unwrap();
        assert_eq!(snap.reminders.len(), 1);
        assert_eq!(snap.reminders[0].id, id);
        h.handle.shutdown().unwrap();
        h.join.join().unwrap();
    }

    #[test]
    fn validation_errors_come_back_typed() {
        let h = harness(None);
        let err = h
            .handle
            .add("", start() + chrono::Duration::hours(1))
            .unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::Store(StoreError::InvalidInput(InvalidInput::EmptyTitle))
        ));
        assert!(h.handle.snapshot().unwrap().reminders.is_empty());
        h.handle.shutdown().unwrap();
    }

    #[test]
    fn tick_fires_and_expires() {
        let h = harness(None);
        h.handle
            .add("Exam", start() + chrono::Duration::seconds(2))
            .unwrap();

        h.clock.advance(chrono::Duration::seconds(3));
        let outcome = h.handle.tick_now().unwrap();
        assert_eq!(outcome.firings.len(), 1);
        assert_eq!(outcome.expired.len(), 1);

        let outcome = h.handle.tick_now().unwrap();
        assert!(outcome.is_empty());

        let snap = h.handle.snapshot().unwrap();
        assert!(snap.reminders.is_empty());
        assert_eq!(snap.history.len(), 1);
        assert!(h.recorder.calls().contains(&Call::Image));
        h.handle.shutdown().unwrap();
    }

    #[test]
    fn settings_update_rebuilds_engine() {
        let h = harness(None);
        h.handle
            .update_settings(Settings {
                sound_enabled: false,
                image_enabled: false,
                ..Settings::default()
            })
            .unwrap();
        h.handle
            .add("Quiet", start() + chrono::Duration::seconds(1))
            .unwrap();

        h.clock.advance(chrono::Duration::seconds(1));
        h.handle.tick_now().unwrap();
        assert_eq!(h.recorder.calls().len(), 1);
        assert!(!h.handle.snapshot().unwrap().settings.sound_enabled);
        h.handle.shutdown().unwrap();
    }

    #[test]
    fn changes_are_published_to_ui() {
        let mut h = harness(None);
        h.handle
            .add("Gym", start() + chrono::Duration::hours(3))
            .unwrap();
        h.handle.snapshot().unwrap();

        let mut latest = None;
        while let Ok(event) = h.events.try_recv() {
            if let UiEvent::Changed(snap) = event {
                latest = Some(snap);
            }
        }
        assert_eq!(latest.unwrap().reminders.len(), 1);
        h.handle.shutdown().unwrap();
    }

    #[test]
    fn shutdown_persists_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let h = harness(Some(path.clone()));
        h.handle
            .add("Trip", start() + chrono::Duration::days(2))
            .unwrap();

        let state = h.handle.shutdown().unwrap();
        h.join.join().unwrap();

        assert_eq!(state.store.reminders.len(), 1);
        assert_eq!(state::load(&path).unwrap(), state);
        assert!(matches!(h.handle.snapshot(), Err(SchedulerError::Stopped)));
    }
}
