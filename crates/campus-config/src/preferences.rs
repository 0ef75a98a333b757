//! Durable local preference storage.
//!
//! The viewer persists exactly one user preference: the chosen nickname.
//! It lives in its own small RON file next to `config.ron` so a rename
//! never rewrites (or races with) the main configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// On-disk shape of the preference file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct PreferenceFile {
    nickname: String,
}

/// Handle to the durable preference file.
///
/// Reads never fail: a missing or unparseable file yields the default
/// nickname. Writes report errors so the caller can log them.
#[derive(Debug, Clone)]
pub struct Preferences {
    path: PathBuf,
}

impl Preferences {
    /// Preference store rooted at `dir/preferences.ron`.
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join("preferences.ron"),
        }
    }

    /// Read the saved nickname, or `"Player"` when nothing valid is stored.
    pub fn nickname(&self) -> String {
        let stored = std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|contents| ron::from_str::<PreferenceFile>(&contents).ok())
            .map(|file| file.nickname)
            .unwrap_or_default();

        if stored.is_empty() {
            "Player".to_string()
        } else {
            stored
        }
    }

    /// Persist a nickname.
    pub fn save_nickname(&self, nickname: &str) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: self.path.clone(),
                source: e,
            })?;
        }

        let file = PreferenceFile {
            nickname: nickname.to_string(),
        };
        let serialized = ron::to_string(&file).map_err(|e| ConfigError::Serialize {
            path: self.path.clone(),
            source: e,
        })?;
        std::fs::write(&self.path, serialized).map_err(|e| ConfigError::Write {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(())
    }
}
