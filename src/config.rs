use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_TICK_MS: u64 = 1000;
const MIN_TICK_MS: u64 = 100;
const DEFAULT_LOG_FILTER: &str = "remind_tui=info";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Application settings from `config.toml`. Every key is optional.
#[derive(Debug, Clone)]
pub struct Config {
    pub tick_interval: Duration,
    pub state_path: Option<PathBuf>,
    /// External command used to play alarm files, e.g. `paplay` or `afplay`.
    pub sound_player: Option<String>,
    pub log_filter: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(DEFAULT_TICK_MS),
            state_path: None,
            sound_player: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_dir: None,
        }
    }
}

impl Config {
    /// Load from the default location. A missing file means defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.into_config())
    }

    pub fn state_path(&self) -> Option<PathBuf> {
        self.state_path.clone().or_else(crate::state::default_path)
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.log_dir
            .clone()
            .or_else(|| dirs::data_local_dir().map(|d| d.join("remind-tui").join("logs")))
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("remind-tui").join("config.toml"))
}

// ── TOML config types ──

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    tick_interval_ms: Option<u64>,
    state_path: Option<PathBuf>,
    sound_player: Option<String>,
    log_filter: Option<String>,
    log_dir: Option<PathBuf>,
}

impl ConfigFile {
    fn into_config(self) -> Config {
        let mut config = Config::default();

        if let Some(ms) = self.tick_interval_ms {
            config.tick_interval = Duration::from_millis(ms.max(MIN_TICK_MS));
        }
        config.state_path = self.state_path;
        config.sound_player = self
            .sound_player
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if let Some(filter) = self.log_filter.filter(|f| !f.trim().is_empty()) {
            config.log_filter = filter;
        }
        config.log_dir = self.log_dir;

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.log_filter, "remind_tui=info");
        assert!(config.sound_player.is_none());
    }

    #[test]
    fn values_override_defaults() {
        let config = Config::from_toml(
            r#"
            tick_interval_ms = 500
            state_path = "/tmp/reminders.json"
            sound_player = "paplay"
            log_filter = "remind_tui=debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.tick_interval, Duration::from_millis(500));
        assert_eq!(config.state_path(), Some(PathBuf::from("/tmp/reminders.json")));
        assert_eq!(config.sound_player.as_deref(), Some("paplay"));
        assert_eq!(config.log_filter, "remind_tui=debug");
    }

    #[test]
    fn tick_interval_is_clamped() {
        let config = Config::from_toml("tick_interval_ms = 5").unwrap();
        assert_eq!(config.tick_interval, Duration::from_millis(MIN_TICK_MS));
    }

    #[test]
    fn blank_player_is_ignored() {
        let config = Config::from_toml(r#"sound_player = "  ""#).unwrap();
        assert!(config.sound_player.is_none());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_toml("tick = 3").is_err());
    }
}
