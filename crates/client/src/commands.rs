//! Server-backed operations.
//!
//! Each command is a thin wrapper over the API client: one or more awaited
//! requests, a toast per failure, and a full listing refresh after any
//! mutation. Bulk operations run strictly sequentially in selection order
//! with no rollback - partial failure leaves the server wherever it
//! stopped, and the user sees an aggregate count.
//!
//! Nothing here retries, and nothing cancels an in-flight request.

use std::path::{Path, PathBuf};
use std::time::Duration;

use api::{FileApiClient, StorageInfo};

use crate::config::Config;
use crate::entry::normalize_listing;
use crate::notify::Toasts;
use crate::state::Browser;

/// Outcome of a bulk operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BulkOutcome {
    /// Items attempted.
    pub attempted: usize,
    /// Items the server accepted.
    pub succeeded: usize,
}

/// Shared context for command handlers.
pub struct Commands {
    api: FileApiClient,
    download_dir: PathBuf,
    download_throttle: Duration,
}

impl Commands {
    /// Builds the command context from configuration.
    pub fn from_config(config: &Config) -> Result<Self, api::ApiError> {
        let api = FileApiClient::with_timeout(&config.server.url, config.request_timeout())?;
        Ok(Self {
            api,
            download_dir: config.transfer.download_dir.clone(),
            download_throttle: config.download_throttle(),
        })
    }

    /// Builds a context around an existing client (used by tests).
    pub fn new(api: FileApiClient, download_dir: PathBuf, download_throttle: Duration) -> Self {
        Self {
            api,
            download_dir,
            download_throttle,
        }
    }

    /// The underlying API client.
    pub fn api(&self) -> &FileApiClient {
        &self.api
    }

    /// Fetches and installs the listing for `folder`.
    ///
    /// On failure the listing is cleared and the error toasted; there is
    /// no retry.
    pub async fn load_files(&self, browser: &mut Browser, toasts: &mut Toasts, folder: &str) {
        match self.api.list_files(folder).await {
            Ok(raw) => {
                let entries = normalize_listing(&raw);
                tracing::debug!("Loaded {} entries for folder {:?}", entries.len(), folder);
                browser.replace_listing(entries, folder);
            }
            Err(err) => {
                tracing::warn!("Failed to load folder {:?}: {err}", folder);
                browser.clear_listing();
                toasts.error(format!("Failed to load files: {err}"));
            }
        }
    }

    /// Re-fetches the current folder.
    pub async fn refresh(&self, browser: &mut Browser, toasts: &mut Toasts) {
        let folder = browser.current_folder().to_string();
        self.load_files(browser, toasts, &folder).await;
    }

    /// Uploads local files into the current folder, one at a time.
    pub async fn upload_paths(
        &self,
        browser: &mut Browser,
        toasts: &mut Toasts,
        paths: &[PathBuf],
    ) -> BulkOutcome {
        let folder = browser.current_folder().to_string();
        let mut outcome = BulkOutcome {
            attempted: paths.len(),
            ..BulkOutcome::default()
        };

        for path in paths {
            let label = display_name(path);
            match self.api.upload_file(path, &folder).await {
                Ok(()) => outcome.succeeded += 1,
                Err(err) => toasts.error(format!("Failed to upload {label}: {err}")),
            }
        }

        if outcome.succeeded > 0 {
            toasts.success(format!(
                "Successfully uploaded {} {}",
                outcome.succeeded,
                plural(outcome.succeeded, "file")
            ));
            self.refresh(browser, toasts).await;
        }
        outcome
    }

    /// Downloads one entry into the download directory.
    ///
    /// Directories are skipped with a `false` return; the listing is not
    /// touched.
    pub async fn download_entry(&self, browser: &Browser, toasts: &mut Toasts, id: &str) -> bool {
        let Some(entry) = browser.entry(id) else {
            return false;
        };
        if entry.is_directory {
            return false;
        }

        let folder = browser.current_folder();
        match self.api.download_file(&entry.name, folder).await {
            Ok(bytes) => {
                let target = self.download_dir.join(&entry.name);
                match std::fs::write(&target, &bytes) {
                    Ok(()) => {
                        toasts.success(format!("Downloaded {}", entry.name));
                        true
                    }
                    Err(err) => {
                        toasts.error(format!("Failed to save {}: {err}", entry.name));
                        false
                    }
                }
            }
            Err(err) => {
                toasts.error(format!("Failed to download {}: {err}", entry.name));
                false
            }
        }
    }

    /// Downloads every selected file, sequentially, with a throttle delay
    /// between requests.
    pub async fn download_selected(&self, browser: &Browser, toasts: &mut Toasts) -> BulkOutcome {
        let ids: Vec<String> = browser
            .selected_entries()
            .iter()
            .filter(|e| !e.is_directory)
            .map(|e| e.id.clone())
            .collect();

        if ids.is_empty() {
            toasts.warning("No files selected for download");
            return BulkOutcome::default();
        }

        toasts.info(format!(
            "Downloading {} {}...",
            ids.len(),
            plural(ids.len(), "file")
        ));

        let mut outcome = BulkOutcome {
            attempted: ids.len(),
            ..BulkOutcome::default()
        };
        for id in &ids {
            if self.download_entry(browser, toasts, id).await {
                outcome.succeeded += 1;
            }
            tokio::time::sleep(self.download_throttle).await;
        }
        outcome
    }

    /// Deletes the given entries, choosing the file or folder endpoint per
    /// entry, then clears the selection and refreshes.
    pub async fn delete_entries(
        &self,
        browser: &mut Browser,
        toasts: &mut Toasts,
        ids: &[String],
    ) -> BulkOutcome {
        let folder = browser.current_folder().to_string();
        let mut outcome = BulkOutcome {
            attempted: ids.len(),
            ..BulkOutcome::default()
        };

        for id in ids {
            let Some(entry) = browser.entry(id).cloned() else {
                continue;
            };
            let result = if entry.is_directory {
                self.api.delete_folder(&entry.path).await
            } else {
                self.api.delete_file(&entry.name, &folder).await
            };
            match result {
                Ok(()) => {
                    outcome.succeeded += 1;
                    browser.deselect(id);
                }
                Err(err) => {
                    let kind = if entry.is_directory { "folder" } else { "file" };
                    toasts.error(format!("Failed to delete {kind} \"{}\": {err}", entry.name));
                }
            }
        }

        if outcome.attempted > 0 {
            browser.clear_selection();
            toasts.success(format!(
                "Successfully deleted {} {}",
                outcome.succeeded,
                plural(outcome.succeeded, "item")
            ));
            self.refresh(browser, toasts).await;
        }
        outcome
    }

    /// Creates a folder under the current one.
    ///
    /// Returns `false` without touching the server when the name is empty.
    pub async fn create_folder(
        &self,
        browser: &mut Browser,
        toasts: &mut Toasts,
        name: &str,
    ) -> bool {
        let name = name.trim();
        if name.is_empty() {
            toasts.error("Please enter a folder name");
            return false;
        }

        let parent = browser.current_folder().to_string();
        match self.api.create_folder(name, &parent).await {
            Ok(()) => {
                toasts.success(format!("Created folder \"{name}\""));
                self.refresh(browser, toasts).await;
                true
            }
            Err(err) => {
                toasts.error(format!("Failed to create folder: {err}"));
                false
            }
        }
    }

    /// Rename is not implemented by the server; surface that as a toast.
    pub fn rename_stub(&self, toasts: &mut Toasts) {
        toasts.info("Rename requires server support");
    }

    /// Sharing is not implemented by the server; surface that as a toast.
    pub fn share_stub(&self, toasts: &mut Toasts) {
        toasts.info("Sharing requires server support");
    }

    /// Fetches storage usage for the given folder.
    ///
    /// Failures are logged and swallowed: the usage display is cosmetic
    /// and must never interfere with a command.
    pub async fn storage_info(&self, folder: &str) -> Option<StorageInfo> {
        match self.api.storage_info(folder).await {
            Ok(info) => Some(info),
            Err(err) => {
                tracing::debug!("Failed to fetch storage info: {err}");
                None
            }
        }
    }
}

/// File name portion of a path, for messages.
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Naive pluralization for toast messages.
fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}
