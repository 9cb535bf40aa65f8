//! Persistent login session.
//!
//! The session file records which account is logged in together with a
//! login flag, so a logout leaves an auditable file behind instead of
//! deleting it. It persists to JSON at `<data_dir>/session.json`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The current session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Id of the logged-in user.
    pub user_id: u64,
    /// Login flag; cleared on logout without deleting the file.
    pub logged_in: bool,
    /// When the session was created.
    pub started: DateTime<Utc>,
}

impl Session {
    /// Creates a fresh logged-in session for `user_id`.
    pub fn start(user_id: u64) -> Self {
        Self {
            user_id,
            logged_in: true,
            started: Utc::now(),
        }
    }
}

/// Store for the session file.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Creates a store persisting to the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Creates a store at `<data_dir>/session.json`.
    pub fn in_data_dir<P: AsRef<Path>>(data_dir: P) -> Self {
        Self::new(data_dir.as_ref().join("session.json"))
    }

    /// Returns the path to the session file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the session; `None` when no file exists or it records a
    /// logged-out state.
    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session: {}", self.path.display()))?;
        let session: Session = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse session: {}", self.path.display()))?;

        Ok(session.logged_in.then_some(session))
    }

    /// Writes the session.
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create data directory: {}", parent.display())
            })?;
        }
        let contents =
            serde_json::to_string_pretty(session).context("Failed to serialize session")?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, &contents)
            .with_context(|| format!("Failed to write temp session: {}", temp_path.display()))?;
        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename temp session {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;
        Ok(())
    }

    /// Marks the session logged out, keeping the file around.
    pub fn clear(&self) -> Result<()> {
        if let Some(mut session) = self.load_raw()? {
            session.logged_in = false;
            self.save(&session)?;
            tracing::info!("User {} logged out", session.user_id);
        }
        Ok(())
    }

    /// Loads the session regardless of the login flag.
    fn load_raw(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session: {}", self.path.display()))?;
        Ok(Some(serde_json::from_str(&contents).with_context(|| {
            format!("Failed to parse session: {}", self.path.display())
        })?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::in_data_dir(temp_dir.path());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::in_data_dir(temp_dir.path());

        let session = Session::start(7);
        store.save(&session).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.user_id, 7);
        assert!(loaded.logged_in);
    }

    #[test]
    fn test_clear_marks_logged_out() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::in_data_dir(temp_dir.path());
        store.save(&Session::start(7)).unwrap();

        store.clear().unwrap();
        // The file survives but a cleared session does not load.
        assert!(store.path().exists());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_clear_without_session_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let store = SessionStore::in_data_dir(temp_dir.path());
        store.clear().unwrap();
        assert!(!store.path().exists());
    }
}
