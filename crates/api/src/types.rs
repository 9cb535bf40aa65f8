//! Wire record definitions for the Cabinet server API.
//!
//! The listing endpoint is served by more than one backend implementation
//! and the field names differ between them. Serde aliases absorb the
//! variants so the rest of the client works with a single shape.

use serde::{Deserialize, Serialize};

/// One entry of a directory listing, as the server sends it.
///
/// Every field except `path` has been observed missing in the wild, so all
/// of them default. `last_modified` may be in seconds or milliseconds
/// depending on the backend; callers normalize (see the client crate).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntry {
    /// Entry name. Some backends send `filename` instead.
    #[serde(default, alias = "filename")]
    pub name: Option<String>,

    /// Size in bytes. Absent for directories on some backends.
    #[serde(default)]
    pub size: Option<u64>,

    /// Last-modified timestamp, epoch seconds or milliseconds.
    #[serde(default, rename = "lastModified", alias = "modified")]
    pub last_modified: Option<i64>,

    /// Whether the entry is a directory. Some backends send `directory`.
    #[serde(default, rename = "isDirectory", alias = "directory")]
    pub is_directory: Option<bool>,

    /// Server-side path of the entry, relative to the storage root.
    #[serde(default)]
    pub path: Option<String>,
}

impl RawEntry {
    /// The entry name, falling back to `"unknown"` when the server sent
    /// neither `name` nor `filename`.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unknown")
    }
}

/// Storage usage as reported by `GET /api/storage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StorageInfo {
    /// Total size of the listed folder's contents, in bytes.
    #[serde(default, rename = "totalSize")]
    pub total_size: u64,

    /// Bytes in use across the storage root.
    #[serde(default, rename = "usedSpace")]
    pub used_space: u64,

    /// Capacity of the storage root in bytes. Zero means unreported.
    #[serde(default, rename = "totalSpace")]
    pub total_space: u64,
}

impl StorageInfo {
    /// Percentage of the storage root in use, clamped to 0..=100.
    ///
    /// An unreported capacity yields 0 rather than a division by zero.
    pub fn used_percent(&self) -> u8 {
        if self.total_space == 0 {
            return 0;
        }
        let pct = (self.used_space as f64 / self.total_space as f64) * 100.0;
        pct.round().min(100.0) as u8
    }
}

/// Status body returned by mutating endpoints: `{}` on success, `{error}`
/// on failure. Some backends add extra fields (`message`, `path`); they are
/// ignored.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct StatusBody {
    /// Error message, present only on failure responses.
    #[serde(default)]
    pub error: Option<String>,
}
