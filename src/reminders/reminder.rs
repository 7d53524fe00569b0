use std::fmt;

use chrono::{DateTime, Duration, Local, Timelike};
use serde::{Deserialize, Serialize};

/// Stable handle for a pending reminder. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReminderId(pub u64);

impl fmt::Display for ReminderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Fixed lead times at which a reminder notifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Threshold {
    TwentyFourHour,
    OneHour,
    AtTime,
}

impl Threshold {
    /// Evaluation order within a tick.
    pub const ALL: [Threshold; 3] = [
        Threshold::TwentyFourHour,
        Threshold::OneHour,
        Threshold::AtTime,
    ];

    pub fn offset(self) -> Duration {
        match self {
            Threshold::TwentyFourHour => Duration::hours(-24),
            Threshold::OneHour => Duration::hours(-1),
            Threshold::AtTime => Duration::zero(),
        }
    }

    fn bit(self) -> u8 {
        match self {
            Threshold::TwentyFourHour => 0b001,
            Threshold::OneHour => 0b010,
            Threshold::AtTime => 0b100,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Threshold::TwentyFourHour => "24h",
            Threshold::OneHour => "1h",
            Threshold::AtTime => "now",
        }
    }
}

/// Thresholds already fired for one reminder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FiredFlags(u8);

impl FiredFlags {
    pub fn contains(self, threshold: Threshold) -> bool {
        self.0 & threshold.bit() != 0
    }

    pub fn insert(&mut self, threshold: Threshold) {
        self.0 |= threshold.bit();
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    #[cfg(test)]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdState {
    Pending,
    Fired,
    /// The lead time had already elapsed when the reminder was armed.
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reminder {
    pub id: ReminderId,
    pub title: String,
    pub target_time: DateTime<Local>,
    pub fired: FiredFlags,
    /// When the thresholds were last (re)armed: creation, edit or import.
    pub armed_at: DateTime<Local>,
}

impl Reminder {
    pub fn threshold_time(&self, threshold: Threshold) -> DateTime<Local> {
        self.target_time + threshold.offset()
    }

    /// A warning is only owed if its moment lies after the reminder was armed.
    pub fn is_eligible(&self, threshold: Threshold) -> bool {
        match threshold {
            Threshold::AtTime => true,
            _ => self.threshold_time(threshold) >= self.armed_at,
        }
    }

    pub fn threshold_state(&self, threshold: Threshold) -> ThresholdState {
        if self.fired.contains(threshold) {
            ThresholdState::Fired
        } else if self.is_eligible(threshold) {
            ThresholdState::Pending
        } else {
            ThresholdState::Skipped
        }
    }

    pub fn is_due(&self, threshold: Threshold, now: DateTime<Local>) -> bool {
        !self.fired.contains(threshold)
            && self.is_eligible(threshold)
            && now >= self.threshold_time(threshold)
    }

    pub fn is_expired(&self, now: DateTime<Local>) -> bool {
        now > self.target_time
    }

    /// Countdown string for list display, e.g. "2d 3h", "45m 10s".
    pub fn remaining_display(&self, now: DateTime<Local>) -> String {
        let secs = (self.target_time - now).num_seconds();
        if secs <= 0 {
            return "due".to_string();
        }
        let (d, h, m, s) = (secs / 86_400, (secs / 3600) % 24, (secs / 60) % 60, secs % 60);
        if d > 0 {
            format!("{}d {}h", d, h)
        } else if h > 0 {
            format!("{}h {}m", h, m)
        } else {
            format!("{}m {}s", m, s)
        }
    }

    pub fn snapshot(&self, reason: RemovalReason, archived_at: DateTime<Local>) -> HistoryEntry {
        HistoryEntry {
            title: self.title.clone(),
            target_time: self.target_time,
            archived_at: Some(archived_at),
            reason,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemovalReason {
    #[default]
    Expired,
    Deleted,
}

/// Immutable record of a reminder that left the pending list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub title: String,
    pub target_time: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Local>>,
    #[serde(default)]
    pub reason: RemovalReason,
}

/// Persisted shape of a pending reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderRecord {
    pub title: String,
    pub target_time: DateTime<Local>,
}

pub(crate) fn truncate_to_seconds(t: DateTime<Local>) -> DateTime<Local> {
    t.with_nanosecond(0).unwrap_or(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 10, h, m, s).unwrap()
    }

    fn reminder(target: DateTime<Local>, armed_at: DateTime<Local>) -> Reminder {
        Reminder {
            id: ReminderId(1),
            title: "Standup".to_string(),
            target_time: target,
            fired: FiredFlags::default(),
            armed_at,
        }
    }

    #[test]
    fn fired_flags_track_each_threshold() {
        let mut flags = FiredFlags::default();
        assert!(flags.is_empty());
        flags.insert(Threshold::OneHour);
        assert!(flags.contains(Threshold::OneHour));
        assert!(!flags.contains(Threshold::AtTime));
        flags.insert(Threshold::OneHour);
        assert_eq!(flags, FiredFlags(0b010));
        flags.clear();
        assert!(flags.is_empty());
    }

    #[test]
    fn warnings_inside_armed_window_are_skipped() {
        let r = reminder(at(12, 30, 0), at(12, 0, 0));
        assert_eq!(r.threshold_state(Threshold::TwentyFourHour), ThresholdState::Skipped);
        assert_eq!(r.threshold_state(Threshold::OneHour), ThresholdState::Skipped);
        assert_eq!(r.threshold_state(Threshold::AtTime), ThresholdState::Pending);
    }

    #[test]
    fn due_requires_threshold_moment() {
        let r = reminder(at(14, 0, 0), at(9, 0, 0));
        assert!(!r.is_due(Threshold::OneHour, at(12, 59, 59)));
        assert!(r.is_due(Threshold::OneHour, at(13, 0, 0)));
        assert!(!r.is_due(Threshold::AtTime, at(13, 0, 0)));
        assert!(r.is_due(Threshold::AtTime, at(14, 0, 0)));
    }

    #[test]
    fn expiry_is_strictly_after_target() {
        let r = reminder(at(14, 0, 0), at(9, 0, 0));
        assert!(!r.is_expired(at(14, 0, 0)));
        assert!(r.is_expired(at(14, 0, 1)));
    }

    #[test]
    fn remaining_display_picks_largest_units() {
        let r = reminder(at(14, 0, 0), at(9, 0, 0));
        assert_eq!(r.remaining_display(at(12, 30, 0)), "1h 30m");
        assert_eq!(r.remaining_display(at(13, 59, 20)), "0m 40s");
        assert_eq!(r.remaining_display(at(14, 0, 0)), "due");
    }

    #[test]
    fn history_entry_without_extras_deserializes() {
        let json = r#"{"title":"Exam","target_time":"2026-03-10T14:00:00+00:00"}"#;
        let entry: HistoryEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.title, "Exam");
        assert_eq!(entry.archived_at, None);
        assert_eq!(entry.reason, RemovalReason::Expired);
    }
}
