//! Terminal user interface.

pub mod tui;

pub use tui::BrowserApp;
