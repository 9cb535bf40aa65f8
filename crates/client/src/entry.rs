//! Normalized file records.
//!
//! The server's listing records are loosely shaped (see `api::RawEntry`);
//! this module flattens them into the one [`FileEntry`] form the rest of
//! the client operates on.

use api::RawEntry;
use serde::{Deserialize, Serialize};

use crate::filetype::{classify, FileCategory};

/// Name of the parent-folder entry the server prepends inside subfolders.
pub const PARENT_ENTRY: &str = "..";

/// Timestamps below this are epoch seconds rather than milliseconds.
const MS_THRESHOLD: i64 = 10_000_000_000;

/// One normalized listing entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Listing-local identifier, derived as `"{path}_{modified}"`.
    ///
    /// Not guaranteed unique: two rows with the same path and mtime
    /// collide. Selection treats colliding rows as one entry.
    pub id: String,
    /// Entry name.
    pub name: String,
    /// Size in bytes; 0 for directories.
    pub size: u64,
    /// Last-modified time in epoch milliseconds.
    pub modified: i64,
    /// Extension-derived category; `Folder` glyph handling lives in the UI.
    pub category: FileCategory,
    /// Whether the entry is a directory.
    pub is_directory: bool,
    /// Server-side path relative to the storage root.
    pub path: String,
}

impl FileEntry {
    /// Normalizes a wire record into a [`FileEntry`].
    ///
    /// Missing fields fall back to fixed defaults: name to `"unknown"`,
    /// size to 0, path to the name. Second-resolution timestamps are
    /// scaled to milliseconds here so ordering and display agree
    /// everywhere downstream.
    pub fn from_raw(raw: &RawEntry) -> Self {
        let name = raw
            .name
            .clone()
            .unwrap_or_else(|| "unknown".to_string());
        let size = raw.size.unwrap_or(0);
        let modified = normalize_timestamp(raw.last_modified.unwrap_or(0));
        let is_directory = raw.is_directory.unwrap_or(false);
        let path = raw.path.clone().unwrap_or_else(|| name.clone());

        FileEntry {
            id: format!("{path}_{modified}"),
            name: name.clone(),
            size,
            modified,
            category: classify(&name),
            is_directory,
            path,
        }
    }

    /// Whether this is the server-provided parent-folder entry.
    pub fn is_parent(&self) -> bool {
        self.is_directory && self.name == PARENT_ENTRY
    }
}

/// Scales second-resolution timestamps to milliseconds.
fn normalize_timestamp(ts: i64) -> i64 {
    if ts > 0 && ts < MS_THRESHOLD {
        ts * 1000
    } else {
        ts
    }
}

/// Normalizes a whole listing.
pub fn normalize_listing(raw: &[RawEntry]) -> Vec<FileEntry> {
    raw.iter().map(FileEntry::from_raw).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(json: &str) -> RawEntry {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_from_raw_full_record() {
        let entry = FileEntry::from_raw(&raw(
            r#"{"name":"a.txt","size":42,"lastModified":1700000000000,"isDirectory":false,"path":"docs/a.txt"}"#,
        ));
        assert_eq!(entry.id, "docs/a.txt_1700000000000");
        assert_eq!(entry.name, "a.txt");
        assert_eq!(entry.size, 42);
        assert_eq!(entry.modified, 1_700_000_000_000);
        assert!(!entry.is_directory);
        assert_eq!(entry.path, "docs/a.txt");
    }

    #[test]
    fn test_from_raw_defaults() {
        let entry = FileEntry::from_raw(&raw("{}"));
        assert_eq!(entry.name, "unknown");
        assert_eq!(entry.size, 0);
        assert_eq!(entry.modified, 0);
        assert!(!entry.is_directory);
        // Path falls back to the name, and the id is derived from both.
        assert_eq!(entry.path, "unknown");
        assert_eq!(entry.id, "unknown_0");
    }

    #[test]
    fn test_from_raw_scales_second_timestamps() {
        let entry = FileEntry::from_raw(&raw(
            r#"{"name":"old.log","modified":1600000000,"path":"old.log"}"#,
        ));
        assert_eq!(entry.modified, 1_600_000_000_000);
        assert_eq!(entry.id, "old.log_1600000000000");
    }

    #[test]
    fn test_id_collision_is_possible() {
        // Same path + same mtime = same id. Documented, not prevented.
        let a = FileEntry::from_raw(&raw(
            r#"{"name":"dup","lastModified":1700000000000,"path":"x/dup"}"#,
        ));
        let b = FileEntry::from_raw(&raw(
            r#"{"filename":"dup","modified":1700000000000,"path":"x/dup"}"#,
        ));
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_parent_entry_detection() {
        let parent = FileEntry::from_raw(&raw(
            r#"{"name":"..","isDirectory":true,"lastModified":1700000000000,"path":"docs"}"#,
        ));
        assert!(parent.is_parent());

        // A plain file named ".." is not a parent entry.
        let oddball = FileEntry::from_raw(&raw(r#"{"name":"..","isDirectory":false}"#));
        assert!(!oddball.is_parent());
    }

    #[test]
    fn test_normalize_listing_preserves_order() {
        let rows = vec![
            raw(r#"{"name":"b","path":"b"}"#),
            raw(r#"{"name":"a","path":"a"}"#),
        ];
        let entries = normalize_listing(&rows);
        assert_eq!(entries[0].name, "b");
        assert_eq!(entries[1].name, "a");
    }
}
