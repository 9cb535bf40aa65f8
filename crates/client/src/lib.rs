//! # Cabinet Client Library
//!
//! This crate provides the Cabinet terminal client: a file manager for a
//! remote Cabinet storage server, driven either interactively (ratatui TUI)
//! or through one-shot CLI commands.
//!
//! ## Overview
//!
//! The client keeps all server interaction behind the `api` crate and holds
//! its own state in plain structs:
//!
//! - **Browser state**: the current listing, selection set, folder path and
//!   view mode
//! - **Command handlers**: upload, download, delete, folder creation -
//!   sequential HTTP calls followed by a listing refresh
//! - **User directory**: a mock, JSON-persisted account store with a
//!   protected default admin
//! - **Session & preferences**: the logged-in user and the grid/list view
//!   choice, persisted across runs
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                       cabinet (bin)                       │
//! ├────────────────┬──────────────────────┬───────────────────┤
//! │   ui (TUI)     │   one-shot commands  │   users CLI       │
//! ├────────────────┴──────────┬───────────┴───────────────────┤
//! │        commands (load / upload / download / delete)       │
//! ├──────────────┬────────────┴────────────┬──────────────────┤
//! │   state      │        api client       │  users / prefs   │
//! │  (Browser)   │     (HTTP endpoints)    │  (JSON stores)   │
//! └──────────────┴─────────────────────────┴──────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`]: TOML configuration loading and validation
//! - [`entry`]: normalized file records and id derivation
//! - [`filetype`]: extension-based classification and glyph/color lookup
//! - [`format`]: size and relative-date presentation
//! - [`state`]: listing, navigation and selection state machine
//! - [`commands`]: server-backed operations
//! - [`notify`]: transient toast notifications
//! - [`users`]: mock account directory and session
//! - [`prefs`]: persisted view preferences
//! - [`ui`]: the ratatui interface

pub mod commands;
pub mod config;
pub mod entry;
pub mod filetype;
pub mod format;
pub mod notify;
pub mod prefs;
pub mod state;
pub mod ui;
pub mod users;
