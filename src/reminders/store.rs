use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::error::{InvalidInput, StoreError};
use super::reminder::{
    truncate_to_seconds, FiredFlags, HistoryEntry, Reminder, ReminderId, ReminderRecord,
    RemovalReason,
};

/// Serializable contents of the store: pending reminders plus history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    pub reminders: Vec<ReminderRecord>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// Pending reminders in insertion order, plus the append-only history.
pub struct ReminderStore {
    reminders: Vec<Reminder>,
    history: Vec<HistoryEntry>,
    next_id: u64,
    clock: Arc<dyn Clock>,
}

impl ReminderStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            reminders: Vec::new(),
            history: Vec::new(),
            next_id: 1,
            clock,
        }
    }

    pub fn add(
        &mut self,
        title: &str,
        target_time: DateTime<Local>,
    ) -> Result<ReminderId, StoreError> {
        let now = self.clock.now();
        let (title, target_time) = validate(title, target_time, now)?;
        let id = self.allocate_id();

        info!(%id, %title, target = %target_time, "reminder added");
        self.reminders.push(Reminder {
            id,
            title,
            target_time,
            fired: FiredFlags::default(),
            armed_at: now,
        });
        Ok(id)
    }

    /// Replace title and time. Clears fired flags and re-arms from now.
    pub fn edit(
        &mut self,
        id: ReminderId,
        title: &str,
        target_time: DateTime<Local>,
    ) -> Result<(), StoreError> {
        let now = self.clock.now();
        let index = self.position(id)?;
        let (title, target_time) = validate(title, target_time, now)?;

        let reminder = &mut self.reminders[index];
        info!(%id, %title, target = %target_time, "reminder edited");
        reminder.title = title;
        reminder.target_time = target_time;
        reminder.fired.clear();
        reminder.armed_at = now;
        Ok(())
    }

    /// Delete a pending reminder, archiving it to history.
    pub fn remove(&mut self, id: ReminderId) -> Result<Reminder, StoreError> {
        self.archive(id, RemovalReason::Deleted)
    }

    pub(crate) fn remove_expired(&mut self, id: ReminderId) -> Result<Reminder, StoreError> {
        self.archive(id, RemovalReason::Expired)
    }

    fn archive(&mut self, id: ReminderId, reason: RemovalReason) -> Result<Reminder, StoreError> {
        let index = self.position(id)?;
        let reminder = self.reminders.remove(index);
        let entry = reminder.snapshot(reason, self.clock.now());
        debug!(%id, ?reason, "reminder archived");
        self.history.push(entry);
        Ok(reminder)
    }

    #[cfg(test)]
    pub fn get(&self, id: ReminderId) -> Option<&Reminder> {
        self.reminders.iter().find(|r| r.id == id)
    }

    pub fn list(&self) -> &[Reminder] {
        &self.reminders
    }

    pub fn list_history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.reminders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reminders.is_empty()
    }

    pub(crate) fn get_mut(&mut self, id: ReminderId) -> Option<&mut Reminder> {
        self.reminders.iter_mut().find(|r| r.id == id)
    }

    pub fn export_state(&self) -> StoreState {
        StoreState {
            reminders: self
                .reminders
                .iter()
                .map(|r| ReminderRecord {
                    title: r.title.clone(),
                    target_time: r.target_time,
                })
                .collect(),
            history: self.history.clone(),
        }
    }

    /// Replace the store contents with a loaded document.
    ///
    /// Every imported reminder is re-armed from the current time. Overdue
    /// reminders are kept so their at-time notification still fires once.
    /// Records with a blank title go straight to history.
    pub fn import_state(&mut self, state: StoreState) -> usize {
        let now = self.clock.now();
        self.reminders.clear();
        self.history = state.history;

        for record in state.reminders {
            let title = record.title.trim();
            if title.is_empty() {
                warn!(when = %record.target_time, "archiving persisted reminder with empty title");
                self.history.push(HistoryEntry {
                    title: record.title,
                    target_time: record.target_time,
                    archived_at: Some(now),
                    reason: RemovalReason::Expired,
                });
                continue;
            }
            let id = self.allocate_id();
            self.reminders.push(Reminder {
                id,
                title: title.to_string(),
                target_time: truncate_to_seconds(record.target_time),
                fired: FiredFlags::default(),
                armed_at: now,
            });
        }

        info!(
            reminders = self.reminders.len(),
            history = self.history.len(),
            "store state imported"
        );
        self.reminders.len()
    }

    fn allocate_id(&mut self) -> ReminderId {
        let id = ReminderId(self.next_id);
        self.next_id += 1;
        id
    }

    fn position(&self, id: ReminderId) -> Result<usize, StoreError> {
        self.reminders
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))
    }
}

fn validate(
    title: &str,
    target_time: DateTime<Local>,
    now: DateTime<Local>,
) -> Result<(String, DateTime<Local>), InvalidInput> {
    let title = title.trim();
    if title.is_empty() {
        return Err(InvalidInput::EmptyTitle);
    }
    let target = truncate_to_seconds(target_time);
    if target <= now {
        return Err(InvalidInput::NotInFuture { target });
    }
    Ok((title.to_string(), target))
}
