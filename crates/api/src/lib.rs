//! # Cabinet Server API
//!
//! This crate defines the wire contract of the Cabinet file server and a
//! reqwest-based client that speaks it. The server itself is external; the
//! client treats it as a black box behind seven HTTP endpoints.
//!
//! ## Endpoints
//!
//! | Method | Path | Payload | Response |
//! |--------|------|---------|----------|
//! | GET  | `/api/files[?folder=]`        | —                         | JSON array of entries |
//! | POST | `/upload`                     | multipart `file`, `folder` | `{}` or `{error}` |
//! | GET  | `/download/{name}[?folder=]`  | —                         | binary body |
//! | GET  | `/delete/{name}[?folder=]`    | —                         | `{}` or `{error}` |
//! | GET  | `/api/delete-folder?path=`    | —                         | `{}` or `{error}` |
//! | POST | `/api/folders`                | form `name`, `parent`      | `{}` or `{error}` |
//! | GET  | `/api/storage[?folder=]`      | —                         | `{totalSize, usedSpace, totalSpace}` |
//!
//! Listing entries arrive with inconsistent field names depending on the
//! server build (`name` vs `filename`, `lastModified` vs `modified`,
//! `isDirectory` vs `directory`); [`types::RawEntry`] absorbs both spellings
//! so callers never see the difference.
//!
//! ## Example
//!
//! ```rust,no_run
//! use api::FileApiClient;
//!
//! # async fn demo() -> Result<(), api::ApiError> {
//! let client = FileApiClient::new("http://localhost:8080")?;
//! for entry in client.list_files("docs/reports").await? {
//!     println!("{} ({} bytes)", entry.display_name(), entry.size.unwrap_or(0));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`]: wire record definitions
//! - [`client`]: the HTTP client
//! - [`error`]: error types

pub mod client;
pub mod error;
pub mod types;

pub use client::FileApiClient;
pub use error::ApiError;
pub use types::{RawEntry, StorageInfo};
