//! Persisted view preferences.
//!
//! The one preference carried across runs is the listing view mode. It
//! persists to JSON at `<data_dir>/prefs.json`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::state::ViewMode;

/// Preferences persisted across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Prefs {
    /// Grid or list rendering of the file listing.
    pub view_mode: ViewMode,
}

/// Store for the preferences file.
pub struct PrefsStore {
    path: PathBuf,
}

impl PrefsStore {
    /// Creates a store persisting to the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Creates a store at `<data_dir>/prefs.json`.
    pub fn in_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self::new(data_dir.as_ref().join("prefs.json"))
    }

    /// Returns the path to the preferences file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads preferences, defaulting when no file exists.
    pub fn load(&self) -> Result<Prefs> {
        if !self.path.exists() {
            return Ok(Prefs::default());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read preferences: {}", self.path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse preferences: {}", self.path.display()))
    }

    /// Writes preferences.
    pub fn save(&self, prefs: &Prefs) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create data directory: {}", parent.display())
            })?;
        }
        let contents =
            serde_json::to_string_pretty(prefs).context("Failed to serialize preferences")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write preferences: {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_defaults_to_grid() {
        let temp_dir = TempDir::new().unwrap();
        let store = PrefsStore::in_data_dir(temp_dir.path());
        assert_eq!(store.load().unwrap().view_mode, ViewMode::Grid);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = PrefsStore::in_data_dir(temp_dir.path());

        store.save(&Prefs { view_mode: ViewMode::List }).unwrap();
        assert_eq!(store.load().unwrap().view_mode, ViewMode::List);
    }

    #[test]
    fn test_view_mode_serializes_lowercase() {
        let json = serde_json::to_string(&Prefs { view_mode: ViewMode::List }).unwrap();
        assert_eq!(json, r#"{"view_mode":"list"}"#);
    }
}
