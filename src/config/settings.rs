//! Persisted Player Settings
//!
//! Selected archetypes and the sound flag, stored as a small JSON record.
//! Read at match setup and written on exit; the simulation never depends
//! on the file existing.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::game::archetype::Archetype;

/// Default settings file name.
pub const SETTINGS_FILE: &str = "jump-stars-settings.json";

/// Settings persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// File could not be read or written.
    #[error("Settings I/O failed for {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// File contents are not a settings record.
    #[error("Corrupt settings: {0}")]
    Format(#[from] serde_json::Error),
}

/// Player-facing settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Archetypes chosen for player 1 and player 2
    #[serde(rename = "selectedCharacters")]
    pub selected_archetypes: [Archetype; 2],
    /// Whether sound playback is enabled
    #[serde(rename = "soundEnabled")]
    pub sound_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            selected_archetypes: [Archetype::Ninja, Archetype::Warrior],
            sound_enabled: true,
        }
    }
}

impl Settings {
    /// Load settings; a missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("No settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(source) => Err(SettingsError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Write settings, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(io_err)
    }
}
