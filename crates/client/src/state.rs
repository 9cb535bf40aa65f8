//! Listing, navigation and selection state.
//!
//! All of the browser's in-memory state lives in [`Browser`], a plain
//! struct with pure methods; rendering and HTTP are layered on top. The
//! listing is wholly replaced on every navigation or refresh - there is no
//! incremental diffing.

use serde::{Deserialize, Serialize};

use crate::entry::FileEntry;

/// Rendering density for the file listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

impl ViewMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Grid => ViewMode::List,
            ViewMode::List => ViewMode::Grid,
        }
    }
}

/// Input class of a click on a listing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickKind {
    /// Plain click: single-select, or toggle-off the sole selected entry.
    Plain,
    /// Ctrl/Cmd click: toggle membership without touching the rest.
    Control,
    /// Shift click: union a contiguous range into the selection.
    Shift,
}

/// An insertion-ordered set of entry ids.
///
/// Order matters: shift-click anchors on the most recently inserted id,
/// so the selection cannot be a plain hash set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    ids: Vec<String>,
}

impl Selection {
    /// Whether `id` is selected.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i == id)
    }

    /// Adds `id` unless already present.
    pub fn insert(&mut self, id: &str) {
        if !self.contains(id) {
            self.ids.push(id.to_string());
        }
    }

    /// Removes `id` if present.
    pub fn remove(&mut self, id: &str) {
        self.ids.retain(|i| i != id);
    }

    /// Drops every selected id.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// The most recently inserted id, if any.
    pub fn last(&self) -> Option<&str> {
        self.ids.last().map(String::as_str)
    }

    /// Number of selected ids.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Ids in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    /// Keeps only ids satisfying the predicate, preserving order.
    pub fn retain<F: FnMut(&str) -> bool>(&mut self, mut keep: F) {
        self.ids.retain(|i| keep(i));
    }
}

/// One breadcrumb segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    /// Display label ("Home" for the root).
    pub label: String,
    /// Folder path to navigate to when activated.
    pub path: String,
}

/// The browser's complete in-memory state.
#[derive(Debug, Clone, Default)]
pub struct Browser {
    /// Current listing in server order (unsorted).
    entries: Vec<FileEntry>,
    /// Selected entry ids.
    selection: Selection,
    /// Current folder path, slash-delimited, empty = root.
    current_folder: String,
    /// Grid or list rendering.
    view_mode: ViewMode,
    /// Case-insensitive name filter; empty = off.
    filter: String,
    /// Whether the Recent projection is active.
    recent_view: bool,
}

/// Cap of the Recent projection.
const RECENT_LIMIT: usize = 20;

impl Browser {
    /// Creates an empty browser at the root with the given view mode.
    pub fn new(view_mode: ViewMode) -> Self {
        Self {
            view_mode,
            ..Self::default()
        }
    }

    // -------------------------------------------------------------------
    // Listing & navigation
    // -------------------------------------------------------------------

    /// Replaces the listing after navigating to `folder`.
    ///
    /// Selected ids that no longer resolve to an entry are dropped; the
    /// filter and Recent projection reset.
    pub fn replace_listing(&mut self, entries: Vec<FileEntry>, folder: &str) {
        self.entries = entries;
        self.current_folder = folder.to_string();
        self.filter.clear();
        self.recent_view = false;
        let present: Vec<String> = self.entries.iter().map(|e| e.id.clone()).collect();
        self.selection.retain(|id| present.iter().any(|p| p == id));
    }

    /// Empties the listing (used when a load fails).
    pub fn clear_listing(&mut self) {
        self.entries.clear();
        self.selection.clear();
    }

    /// The unsorted listing, in server order.
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Looks up an entry by id.
    pub fn entry(&self, id: &str) -> Option<&FileEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Current folder path (empty = root).
    pub fn current_folder(&self) -> &str {
        &self.current_folder
    }

    /// Path of the parent of the current folder.
    pub fn parent_folder(&self) -> String {
        match self.current_folder.rfind('/') {
            Some(idx) => self.current_folder[..idx].to_string(),
            None => String::new(),
        }
    }

    /// Path obtained by descending into `name` from the current folder.
    pub fn child_path(&self, name: &str) -> String {
        if self.current_folder.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.current_folder, name)
        }
    }

    /// Folder a directory entry navigates to when activated.
    pub fn navigate_target(&self, entry: &FileEntry) -> Option<String> {
        if !entry.is_directory {
            return None;
        }
        if entry.is_parent() {
            Some(self.parent_folder())
        } else {
            Some(self.child_path(&entry.name))
        }
    }

    /// Breadcrumb trail: Home plus one crumb per path segment.
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        let mut crumbs = vec![Breadcrumb {
            label: "Home".to_string(),
            path: String::new(),
        }];
        if self.current_folder.is_empty() {
            return crumbs;
        }
        let mut so_far = String::new();
        for part in self.current_folder.split('/') {
            if so_far.is_empty() {
                so_far = part.to_string();
            } else {
                so_far = format!("{so_far}/{part}");
            }
            crumbs.push(Breadcrumb {
                label: part.to_string(),
                path: so_far.clone(),
            });
        }
        crumbs
    }

    // -------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------

    /// Applies one click to the selection state machine.
    pub fn click(&mut self, id: &str, kind: ClickKind) {
        if self.entry(id).is_none() {
            return;
        }
        match kind {
            ClickKind::Control => {
                if self.selection.contains(id) {
                    self.selection.remove(id);
                } else {
                    self.selection.insert(id);
                }
            }
            ClickKind::Shift if !self.selection.is_empty() => {
                self.extend_range(id);
            }
            _ => {
                // Plain click, or shift with nothing to anchor on.
                if self.selection.contains(id) && self.selection.len() == 1 {
                    self.selection.clear();
                } else {
                    self.selection.clear();
                    self.selection.insert(id);
                }
            }
        }
    }

    /// Unions the contiguous range between the last-selected id and `id`.
    ///
    /// Indices are taken in the unsorted listing order, while display uses
    /// the sorted order - so the on-screen span of a shift-click can look
    /// discontiguous.
    fn extend_range(&mut self, id: &str) {
        let anchor = self
            .selection
            .last()
            .and_then(|last| self.entries.iter().position(|e| e.id == last));
        let clicked = self.entries.iter().position(|e| e.id == id);

        match (anchor, clicked) {
            (Some(a), Some(c)) => {
                let (start, end) = if a <= c { (a, c) } else { (c, a) };
                let ids: Vec<String> =
                    self.entries[start..=end].iter().map(|e| e.id.clone()).collect();
                for range_id in ids {
                    self.selection.insert(&range_id);
                }
            }
            (None, Some(_)) => {
                // Anchor vanished from the listing; fall back to adding
                // just the clicked entry.
                self.selection.insert(id);
            }
            _ => {}
        }
    }

    /// Selects every entry in the listing.
    pub fn select_all(&mut self) {
        let ids: Vec<String> = self.entries.iter().map(|e| e.id.clone()).collect();
        for id in ids {
            self.selection.insert(&id);
        }
    }

    /// Clears the selection.
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Removes one id from the selection (after a delete).
    pub fn deselect(&mut self, id: &str) {
        self.selection.remove(id);
    }

    /// The selection set.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Selected entries in selection insertion order. Ids that no longer
    /// resolve are skipped.
    pub fn selected_entries(&self) -> Vec<&FileEntry> {
        self.selection
            .iter()
            .filter_map(|id| self.entry(id))
            .collect()
    }

    // -------------------------------------------------------------------
    // Projections
    // -------------------------------------------------------------------

    /// View mode accessor.
    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    /// Sets the view mode.
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    /// Current filter term (empty = off).
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Sets the name filter.
    pub fn set_filter(&mut self, term: &str) {
        self.filter = term.to_string();
    }

    /// Whether the Recent projection is active.
    pub fn recent_view(&self) -> bool {
        self.recent_view
    }

    /// Toggles the Recent projection.
    pub fn toggle_recent_view(&mut self) {
        self.recent_view = !self.recent_view;
    }

    /// Display order: directories before files, then newest first within
    /// each group. Stable with respect to server order for ties.
    pub fn sorted_entries(&self) -> Vec<&FileEntry> {
        let mut sorted: Vec<&FileEntry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| {
            b.is_directory
                .cmp(&a.is_directory)
                .then(b.modified.cmp(&a.modified))
        });
        sorted
    }

    /// Entries as the UI should show them: the Recent projection when
    /// active, otherwise the sorted listing narrowed by the filter.
    pub fn visible_entries(&self) -> Vec<&FileEntry> {
        if self.recent_view {
            // Recent ignores the folder grouping: newest first, capped.
            let mut recent: Vec<&FileEntry> = self.entries.iter().collect();
            recent.sort_by(|a, b| b.modified.cmp(&a.modified));
            recent.truncate(RECENT_LIMIT);
            return recent;
        }

        let term = self.filter.to_lowercase();
        self.sorted_entries()
            .into_iter()
            .filter(|e| term.is_empty() || e.name.to_lowercase().contains(&term))
            .collect()
    }
}
