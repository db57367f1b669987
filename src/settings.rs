use std::env;
use std::fs;
use std::io;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

const APP_SETTINGS_FILE: &str = "settings.json";
const DESKTOP_FILE: &str = "ubuntu-mate-welcome.desktop";
const SYSTEM_APPLICATIONS_DIR: &str = "/usr/share/applications";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub window_width: Option<i32>,
    #[serde(default)]
    pub window_height: Option<i32>,
}

pub fn load_app_settings() -> AppSettings {
    let Some(path) = app_settings_path() else {
        return AppSettings::default();
    };

    let Ok(content) = fs::read_to_string(&path) else {
        return AppSettings::default();
    };

    serde_json::from_str(&content).unwrap_or_default()
}

pub fn save_app_settings(settings: &AppSettings) -> Result<(), String> {
    let Some(path) = app_settings_path() else {
        return Err("Unable to determine settings directory".to_string());
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| format!("Failed to create settings directory: {}", err))?;
    }

    let data = serde_json::to_string_pretty(settings)
        .map_err(|err| format!("Failed to serialize settings: {}", err))?;

    fs::write(&path, data).map_err(|err| format!("Failed to write settings: {}", err))
}

fn non_empty_env(name: &str) -> Option<PathBuf> {
    let value = env::var(name).ok()?;
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

fn user_config_home() -> Option<PathBuf> {
    non_empty_env("XDG_CONFIG_HOME").or_else(|| non_empty_env("HOME").map(|home| home.join(".config")))
}

fn app_config_dir() -> Option<PathBuf> {
    non_empty_env("WELCOME_GTK_CONFIG_DIR")
        .or_else(|| user_config_home().map(|dir| dir.join("welcome-gtk")))
}

fn app_settings_path() -> Option<PathBuf> {
    app_config_dir().map(|dir| dir.join(APP_SETTINGS_FILE))
}

/// The session autostart entry, a symlink to the installed desktop file.
#[derive(Clone, Debug)]
pub struct Autostart {
    link: PathBuf,
    target: PathBuf,
}

impl Autostart {
    pub fn for_user() -> Option<Self> {
        let dir = user_config_home()?.join("autostart");
        Some(Self::new(
            &dir,
            &Path::new(SYSTEM_APPLICATIONS_DIR).join(DESKTOP_FILE),
        ))
    }

    pub fn new(autostart_dir: &Path, target: &Path) -> Self {
        Self {
            link: autostart_dir.join(DESKTOP_FILE),
            target: target.to_path_buf(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.link.symlink_metadata().is_ok()
    }

    pub fn set_enabled(&self, enabled: bool) -> Result<(), String> {
        match (enabled, self.enabled()) {
            (true, false) => {
                if let Some(parent) = self.link.parent() {
                    fs::create_dir_all(parent)
                        .map_err(|err| format!("Failed to create autostart directory: {}", err))?;
                }
                symlink(&self.target, &self.link)
                    .map_err(|err| format!("Failed to enable autostart: {}", err))
            }
            (false, true) => match fs::remove_file(&self.link) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(format!("Failed to disable autostart: {}", err)),
            },
            _ => Ok(()),
        }
    }

    /// Flips the entry and returns the resulting state.
    pub fn toggle(&self) -> Result<bool, String> {
        self.set_enabled(!self.enabled())?;
        Ok(self.enabled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autostart_toggles_symlink() {
        let dir = tempfile::tempdir().expect("tempdir");
        let autostart = Autostart::new(&dir.path().join("autostart"), Path::new("/nonexistent.desktop"));
        assert!(!autostart.enabled());

        assert_eq!(autostart.toggle(), Ok(true));
        let link = dir.path().join("autostart").join(DESKTOP_FILE);
        assert_eq!(
            fs::read_link(&link).expect("symlink"),
            PathBuf::from("/nonexistent.desktop")
        );

        assert_eq!(autostart.toggle(), Ok(false));
        assert!(link.symlink_metadata().is_err());
        assert_eq!(autostart.set_enabled(false), Ok(()));
    }

    #[test]
    fn settings_tolerate_unknown_fields() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"window_width": 900, "theme": "dark"}"#).expect("settings");
        assert_eq!(settings.window_width, Some(900));
        assert_eq!(settings.window_height, None);
    }
}
