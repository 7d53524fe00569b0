//! Threshold evaluation and notification dispatch.
//!
//! A tick samples `now` once, walks the pending reminders in store order,
//! marks every due threshold as fired, then archives reminders whose target
//! time has passed. Side effects run only after that bookkeeping pass, so a
//! slow or failing collaborator can never leave a threshold un-fired or
//! block the rest of the tick.

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use super::error::NotifierError;
use super::reminder::{HistoryEntry, ReminderId, Threshold};
use super::store::ReminderStore;

/// Displays a system notification.
pub trait Notifier: Send {
    fn show(&self, title: &str, message: &str) -> Result<(), NotifierError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCategory {
    Regular,
    OneHourWarning,
    TwentyFourHourWarning,
}

impl From<Threshold> for SoundCategory {
    fn from(threshold: Threshold) -> Self {
        match threshold {
            Threshold::TwentyFourHour => SoundCategory::TwentyFourHourWarning,
            Threshold::OneHour => SoundCategory::OneHourWarning,
            Threshold::AtTime => SoundCategory::Regular,
        }
    }
}

pub trait SoundPlayer: Send {
    fn play(&self, category: SoundCategory) -> Result<(), NotifierError>;
}

/// Shows a transient picture when a reminder comes due.
pub trait ImagePresenter: Send {
    fn show(&self) -> Result<(), NotifierError>;
}

/// User toggles for the optional side effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineToggles {
    pub sound_enabled: bool,
    pub image_enabled: bool,
}

impl Default for EngineToggles {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            image_enabled: true,
        }
    }
}

/// One threshold crossing observed during a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Firing {
    pub id: ReminderId,
    pub title: String,
    pub threshold: Threshold,
}

impl Firing {
    pub fn notification_title(&self) -> &'static str {
        match self.threshold {
            Threshold::AtTime => "Reminder",
            _ => "Upcoming Reminder",
        }
    }

    pub fn notification_message(&self) -> String {
        match self.threshold {
            Threshold::TwentyFourHour => format!("{} in 24 hours", self.title),
            Threshold::OneHour => format!("{} in 1 hour", self.title),
            Threshold::AtTime => self.title.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutcome {
    pub firings: Vec<Firing>,
    pub expired: Vec<HistoryEntry>,
}

impl TickOutcome {
    pub fn is_empty(&self) -> bool {
        self.firings.is_empty() && self.expired.is_empty()
    }
}

pub struct Engine {
    notifier: Box<dyn Notifier>,
    sound: Box<dyn SoundPlayer>,
    image: Box<dyn ImagePresenter>,
    toggles: EngineToggles,
}

impl Engine {
    pub fn new(
        notifier: Box<dyn Notifier>,
        sound: Box<dyn SoundPlayer>,
        image: Box<dyn ImagePresenter>,
    ) -> Self {
        Self {
            notifier,
            sound,
            image,
            toggles: EngineToggles::default(),
        }
    }

    pub fn with_toggles(mut self, toggles: EngineToggles) -> Self {
        self.toggles = toggles;
        self
    }

    /// Evaluate and dispatch one tick.
    pub fn tick(&self, store: &mut ReminderStore, now: DateTime<Local>) -> TickOutcome {
        let outcome = evaluate(store, now);
        for firing in &outcome.firings {
            self.dispatch(firing);
        }
        outcome
    }

    /// Run the side effects of one firing. Failures are logged, never returned.
    pub fn dispatch(&self, firing: &Firing) {
        info!(
            id = %firing.id,
            threshold = firing.threshold.label(),
            title = %firing.title,
            "reminder threshold fired"
        );

        let message = firing.notification_message();
        if let Err(e) = self.notifier.show(firing.notification_title(), &message) {
            report(firing, "notification", e);
        }

        if self.toggles.sound_enabled {
            if let Err(e) = self.sound.play(firing.threshold.into()) {
                report(firing, "alarm sound", e);
            }
        }

        if self.toggles.image_enabled && firing.threshold == Threshold::AtTime {
            if let Err(e) = self.image.show() {
                report(firing, "image popup", e);
            }
        }
    }
}

fn report(firing: &Firing, effect: &str, error: NotifierError) {
    match error {
        NotifierError::NotConfigured => debug!(id = %firing.id, effect, "nothing configured"),
        e => warn!(id = %firing.id, effect, error = %e, "side effect failed"),
    }
}

/// Bookkeeping half of a tick: mark due thresholds and archive expired
/// reminders. Performs no side effects.
pub fn evaluate(store: &mut ReminderStore, now: DateTime<Local>) -> TickOutcome {
    let mut outcome = TickOutcome::default();
    let ids: Vec<ReminderId> = store.list().iter().map(|r| r.id).collect();

    for id in ids {
        let Some(reminder) = store.get_mut(id) else {
            continue;
        };

        for threshold in Threshold::ALL {
            if reminder.is_due(threshold, now) {
                reminder.fired.insert(threshold);
                outcome.firings.push(Firing {
                    id,
                    title: reminder.title.clone(),
                    threshold,
                });
            }
        }

        if reminder.is_expired(now) {
            match store.remove_expired(id) {
                Ok(removed) => {
                    debug!(%id, title = %removed.title, "reminder expired");
                    if let Some(entry) = store.list_history().last() {
                        outcome.expired.push(entry.clone());
                    }
                }
                Err(e) => warn!(%id, error = %e, "cannot expire reminder"),
            }
        }
    }

    outcome
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Notify { title: String, message: String },
        Sound(SoundCategory),
        Image,
    }

    /// Records every collaborator call; optionally fails each one.
    #[derive(Clone, Default)]
    pub struct Recorder {
        pub calls: Arc<Mutex<Vec<Call>>>,
        pub fail: bool,
    }

    impl Recorder {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn engine(&self) -> Engine {
            Engine::new(
                Box::new(self.clone()),
                Box::new(self.clone()),
                Box::new(self.clone()),
            )
        }

        fn record(&self, call: Call) -> Result<(), NotifierError> {
            self.calls.lock().unwrap().push(call);
            if self.fail {
                Err(NotifierError::MissingAsset("alarm.wav".into()))
            } else {
                Ok(())
            }
        }
    }

    impl Notifier for Recorder {
        fn show(&self, title: &str, message: &str) -> Result<(), NotifierError> {
            self.record(Call::Notify {
                title: title.to_string(),
                message: message.to_string(),
            })
        }
    }

    impl SoundPlayer for Recorder {
        fn play(&self, category: SoundCategory) -> Result<(), NotifierError> {
            self.record(Call::Sound(category))
        }
    }

    impl ImagePresenter for Recorder {
        fn show(&self) -> Result<(), NotifierError> {
            self.record(Call::Image)
        }
    }
}
