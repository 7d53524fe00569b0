use std::path::PathBuf;

use chrono::{DateTime, Local};

use super::reminder::ReminderId;

/// Why an add/edit was rejected. Each reason renders its own message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidInput {
    #[error("title must not be empty")]
    EmptyTitle,

    #[error("time {} is not in the future", .target.format("%Y-%m-%d %H:%M:%S"))]
    NotInFuture { target: DateTime<Local> },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("invalid reminder: {0}")]
    InvalidInput(#[from] InvalidInput),

    #[error("reminder {0} not found")]
    NotFound(ReminderId),
}

/// Failure of a notification side effect. Absorbed by the engine.
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("no asset configured")]
    NotConfigured,

    #[error("asset not found: {}", .0.display())]
    MissingAsset(PathBuf),

    #[error("no playable files in {}", .0.display())]
    EmptyDirectory(PathBuf),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ui channel closed")]
    Disconnected,
}
