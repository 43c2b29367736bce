//! Persisted user preferences.
//!
//! Stored as JSON at `<config dir>/cockpit-review/preferences.json`
//! (e.g. `~/.config/cockpit-review/preferences.json` on Linux). A missing or
//! unreadable file means defaults; it never stops the tool.

use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const APP_DIR: &str = "cockpit-review";
const FILE_NAME: &str = "preferences.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub dark_mode: bool,
}

impl Preferences {
    /// Default location, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(FILE_NAME))
    }

    /// Load from the default location.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from `path`; missing or corrupt files yield the defaults.
    pub fn load_from(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                debug!("No preferences at {} ({})", path.display(), e);
                return Self::default();
            }
        };
        serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!("Ignoring corrupt preferences {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), AnalysisError> {
        let path = Self::default_path().ok_or_else(|| {
            AnalysisError::InvalidConfig("no config directory on this platform".into())
        })?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AnalysisError> {
        let write_err = |e| AnalysisError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AnalysisError::Internal(format!("preferences: {e}")))?;
        std::fs::write(path, json).map_err(write_err)?;
        debug!("Saved preferences to {}", path.display());
        Ok(())
    }
}

/// Flip the dark-mode flag stored at `path` and persist it. Returns the new value.
pub fn toggle_dark_mode_at(path: &Path) -> Result<bool, AnalysisError> {
    let mut prefs = Preferences::load_from(path);
    prefs.dark_mode = !prefs.dark_mode;
    prefs.save_to(path)?;
    Ok(prefs.dark_mode)
}

/// [`toggle_dark_mode_at`] on the default location.
pub fn toggle_dark_mode() -> Result<bool, AnalysisError> {
    let path = Preferences::default_path().ok_or_else(|| {
        AnalysisError::InvalidConfig("no config directory on this platform".into())
    })?;
    toggle_dark_mode_at(&path)
}
