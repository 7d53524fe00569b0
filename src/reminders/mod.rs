pub mod clock;
pub mod engine;
pub mod error;
pub mod reminder;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use engine::{
    Engine, EngineToggles, ImagePresenter, Notifier, SoundCategory, SoundPlayer,
    TickOutcome,
};
pub use error::{NotifierError, StoreError};
pub use reminder::{HistoryEntry, Reminder, ReminderId, RemovalReason, Threshold};
pub use store::{ReminderStore, StoreState};
