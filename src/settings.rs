use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const SETTINGS_FILENAME: &str = "settings.json";

/// Where the task list is stored. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub save_file: PathBuf,
    pub storage_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            save_file: PathBuf::from("tasks.redb"),
            storage_key: crate::persist::DEFAULT_KEY.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read settings file {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("cannot parse settings file {path}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Settings, SettingsError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|source| SettingsError::Read { path: path.to_path_buf(), source })?;
        serde_json::from_str(&content)
            .map_err(|source| SettingsError::Parse { path: path.to_path_buf(), source })
    }

    /// Like [`Settings::load`], but a missing file means defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Settings, SettingsError> {
        match Self::load(path) {
            Err(SettingsError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(Settings::default())
            }
            other => other,
        }
    }
}
