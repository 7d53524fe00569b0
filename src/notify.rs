//! Concrete notification collaborators for the terminal front end.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use rand::seq::IndexedRandom;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::reminders::{ImagePresenter, Notifier, NotifierError, SoundCategory, SoundPlayer};
use crate::scheduler::UiEvent;
use crate::state::Settings;

const SOUND_EXTENSIONS: [&str; 2] = ["mp3", "wav"];

/// Posts notifications to the UI as popups.
pub struct UiNotifier {
    events: UnboundedSender<UiEvent>,
}

impl UiNotifier {
    pub fn new(events: UnboundedSender<UiEvent>) -> Self {
        Self { events }
    }
}

impl Notifier for UiNotifier {
    fn show(&self, title: &str, message: &str) -> Result<(), NotifierError> {
        self.events
            .send(UiEvent::Notification {
                title: title.to_string(),
                message: message.to_string(),
            })
            .map_err(|_| NotifierError::Disconnected)
    }
}

/// Asks the UI to show the configured picture.
pub struct PopupImage {
    events: UnboundedSender<UiEvent>,
    path: Option<PathBuf>,
}

impl PopupImage {
    pub fn new(events: UnboundedSender<UiEvent>, path: Option<PathBuf>) -> Self {
        Self { events, path }
    }
}

impl ImagePresenter for PopupImage {
    fn show(&self) -> Result<(), NotifierError> {
        let path = self.path.as_ref().ok_or(NotifierError::NotConfigured)?;
        if !path.is_file() {
            return Err(NotifierError::MissingAsset(path.clone()));
        }
        self.events
            .send(UiEvent::Image { path: path.clone() })
            .map_err(|_| NotifierError::Disconnected)
    }
}

/// Plays a random alarm file through an external player command, or rings
/// the terminal bell when nothing is configured.
pub struct CommandSoundPlayer {
    player: Option<String>,
    regular: Option<PathBuf>,
    one_hour: Option<PathBuf>,
    twenty_four_hour: Option<PathBuf>,
    events: UnboundedSender<UiEvent>,
}

impl CommandSoundPlayer {
    pub fn new(
        player: Option<String>,
        settings: &Settings,
        events: UnboundedSender<UiEvent>,
    ) -> Self {
        Self {
            player,
            regular: settings.sound_dir.clone(),
            one_hour: settings.one_hour_sound_dir.clone(),
            twenty_four_hour: settings.twenty_four_hour_sound_dir.clone(),
            events,
        }
    }

    fn dir_for(&self, category: SoundCategory) -> Option<&Path> {
        let specific = match category {
            SoundCategory::Regular => None,
            SoundCategory::OneHourWarning => self.one_hour.as_deref(),
            SoundCategory::TwentyFourHourWarning => self.twenty_four_hour.as_deref(),
        };
        specific.or(self.regular.as_deref())
    }

    fn bell(&self) -> Result<(), NotifierError> {
        self.events
            .send(UiEvent::Bell)
            .map_err(|_| NotifierError::Disconnected)
    }
}

impl SoundPlayer for CommandSoundPlayer {
    fn play(&self, category: SoundCategory) -> Result<(), NotifierError> {
        let (Some(player), Some(dir)) = (self.player.as_deref(), self.dir_for(category)) else {
            return self.bell();
        };

        let file = pick_sound(dir)?;
        debug!(?category, file = %file.display(), "playing alarm");

        let mut child = Command::new(player)
            .arg(&file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        std::thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }
}

/// Choose a random `.mp3`/`.wav` file from `dir`.
pub fn pick_sound(dir: &Path) -> Result<PathBuf, NotifierError> {
    if !dir.is_dir() {
        return Err(NotifierError::MissingAsset(dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_sound_file(p))
        .collect();
    files.sort();

    files
        .choose(&mut rand::rng())
        .cloned()
        .ok_or_else(|| NotifierError::EmptyDirectory(dir.to_path_buf()))
}

fn is_sound_file(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| SOUND_EXTENSIONS.iter().any(|s| ext.eq_ignore_ascii_case(s)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn ui_notifier_posts_event() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        UiNotifier::new(tx).show("Reminder", "Exam").unwrap();
        match rx.try_recv().unwrap() {
            UiEvent::Notification { title, message } => {
                assert_eq!(title, "Reminder");
                assert_eq!(message, "Exam");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn ui_notifier_reports_closed_channel() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let err = UiNotifier::new(tx).show("Reminder", "Exam").unwrap_err();
        assert!(matches!(err, NotifierError::Disconnected));
    }

    #[test]
    fn image_requires_existing_file() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dir = tempfile::tempdir().unwrap();

        let unset = PopupImage::new(tx.clone(), None);
        assert!(matches!(unset.show(), Err(NotifierError::NotConfigured)));

        let missing = PopupImage::new(tx.clone(), Some(dir.path().join("chara.png")));
        assert!(matches!(missing.show(), Err(NotifierError::MissingAsset(_))));

        let path = dir.path().join("chara.png");
        std::fs::write(&path, b"png").unwrap();
        PopupImage::new(tx, Some(path.clone())).show().unwrap();
        assert!(matches!(rx.try_recv().unwrap(), UiEvent::Image { path: p } if p == path));
    }

    #[test]
    fn pick_sound_only_returns_audio_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        std::fs::write(dir.path().join("alarm.WAV"), b"").unwrap();
        std::fs::write(dir.path().join("chime.mp3"), b"").unwrap();

        for _ in 0..20 {
            let picked = pick_sound(dir.path()).unwrap();
            assert!(is_sound_file(&picked), "picked {}", picked.display());
        }
    }

    #[test]
    fn pick_sound_reports_empty_and_missing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            pick_sound(dir.path()),
            Err(NotifierError::EmptyDirectory(_))
        ));
        assert!(matches!(
            pick_sound(&dir.path().join("nope")),
            Err(NotifierError::MissingAsset(_))
        ));
    }

    #[test]
    fn unconfigured_player_rings_bell() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let player = CommandSoundPlayer::new(None, &Settings::default(), tx);
        player.play(SoundCategory::Regular).unwrap();
        assert!(matches!(rx.try_recv().unwrap(), UiEvent::Bell));
    }

    #[test]
    fn warning_categories_fall_back_to_regular_dir() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let settings = Settings {
            sound_dir: Some(PathBuf::from("/sounds/regular")),
            one_hour_sound_dir: Some(PathBuf::from("/sounds/hour")),
            ..Settings::default()
        };
        let player = CommandSoundPlayer::new(Some("paplay".to_string()), &settings, tx);
        assert_eq!(
            player.dir_for(SoundCategory::OneHourWarning),
            Some(Path::new("/sounds/hour"))
        );
        assert_eq!(
            player.dir_for(SoundCategory::TwentyFourHourWarning),
            Some(Path::new("/sounds/regular"))
        );
    }
}
