//! On-disk state: pending reminders, history and user settings in one flat
//! JSON document.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::reminders::{EngineToggles, StoreState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sound_enabled: bool,
    pub image_enabled: bool,
    /// Picture shown when a reminder comes due.
    pub image_path: Option<PathBuf>,
    /// Directory of alarm sounds; one is picked at random.
    pub sound_dir: Option<PathBuf>,
    pub one_hour_sound_dir: Option<PathBuf>,
    pub twenty_four_hour_sound_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            image_enabled: true,
            image_path: None,
            sound_dir: None,
            one_hour_sound_dir: None,
            twenty_four_hour_sound_dir: None,
        }
    }
}

impl Settings {
    pub fn toggles(&self) -> EngineToggles {
        EngineToggles {
            sound_enabled: self.sound_enabled,
            image_enabled: self.image_enabled,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(flatten)]
    pub store: StoreState,
    #[serde(flatten)]
    pub settings: Settings,
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot serialize state: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("remind-tui").join("state.json"))
}

/// Load state; a missing file yields the default state.
pub fn load(path: &Path) -> Result<PersistedState, StateError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no state file, starting empty");
            return Ok(PersistedState::default());
        }
        Err(source) => {
            return Err(StateError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_slice(&bytes).map_err(|source| StateError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Write state atomically (temp file + rename).
pub fn save(path: &Path, state: &PersistedState) -> Result<(), StateError> {
    let write_err = |source| StateError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let json = serde_json::to_string_pretty(state)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(write_err)?;
    std::fs::rename(&tmp, path).map_err(write_err)?;

    debug!(path = %path.display(), "state saved");
    Ok(())
}
