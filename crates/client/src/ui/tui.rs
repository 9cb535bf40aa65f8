//! Terminal User Interface for the Cabinet client.
//!
//! This module provides a ratatui-based file browser over the command
//! layer: a grid or list projection of the current listing, mouse and
//! keyboard selection, navigation, and transient toasts.
//!
//! Input handling is split from effects: `handle_key`/`handle_mouse`
//! mutate local state and return a [`UiAction`] describing any server
//! operation to perform; the run loop awaits those one at a time. There
//! is deliberately no guard against queueing a second command while one
//! is in flight - the loop simply never polls input mid-command.

use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Paragraph},
    Frame, Terminal,
};

use api::StorageInfo;

use crate::commands::Commands;
use crate::entry::FileEntry;
use crate::format::{format_date, format_date_short, format_size};
use crate::notify::{ToastLevel, Toasts};
use crate::prefs::{Prefs, PrefsStore};
use crate::state::{Browser, ClickKind, ViewMode};

/// Width of one grid cell in columns.
const GRID_CELL_WIDTH: u16 = 22;
/// Height of one grid cell in rows.
const GRID_CELL_HEIGHT: u16 = 3;
/// Two clicks on the same entry within this window count as a double click.
const DOUBLE_CLICK_WINDOW: Duration = Duration::from_millis(400);

/// A server-side operation requested by an input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    /// Load the given folder.
    Navigate(String),
    /// Re-fetch the current folder.
    Refresh,
    /// Delete these entry ids (already confirmed).
    Delete(Vec<String>),
    /// Download the current selection.
    DownloadSelection,
    /// Upload a local file.
    Upload(PathBuf),
    /// Create a folder with this name.
    CreateFolder(String),
    /// Rename the selection (server support missing).
    Rename,
    /// Share the selection (server support missing).
    Share,
}

/// Kind of text prompt currently open.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PromptKind {
    NewFolder,
    UploadPath,
    Filter,
    /// Yes/no confirmation before deleting these ids.
    ConfirmDelete(Vec<String>),
}

/// An open input prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Prompt {
    kind: PromptKind,
    buffer: String,
}

impl Prompt {
    fn new(kind: PromptKind) -> Self {
        Self {
            kind,
            buffer: String::new(),
        }
    }

    fn title(&self) -> &'static str {
        match self.kind {
            PromptKind::NewFolder => " New folder name ",
            PromptKind::UploadPath => " Upload local file ",
            PromptKind::Filter => " Filter by name ",
            PromptKind::ConfirmDelete(_) => " Confirm delete (y/n) ",
        }
    }
}

/// The main browser application.
pub struct BrowserApp {
    /// The terminal backend; `None` in tests.
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    /// Listing, selection and navigation state.
    browser: Browser,
    /// Live notifications.
    toasts: Toasts,
    /// Last fetched storage usage.
    storage: Option<StorageInfo>,
    /// Display name of the logged-in user.
    username: String,
    /// Keyboard cursor index into the visible entries.
    cursor: usize,
    /// Scroll offset of the listing viewport, in rows.
    scroll: usize,
    /// Open prompt, if any.
    prompt: Option<Prompt>,
    /// Last mouse click, for double-click detection.
    last_click: Option<(Instant, String)>,
    /// Listing viewport of the previous draw, for mouse hit-testing.
    listing_area: Rect,
    /// Whether the app should quit.
    should_quit: bool,
    /// Preference persistence for the view mode.
    prefs_store: Option<PrefsStore>,
}

impl BrowserApp {
    /// Creates the application and puts the terminal into raw mode.
    pub fn new(browser: Browser, username: String, prefs_store: PrefsStore) -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal: Some(terminal),
            browser,
            toasts: Toasts::new(),
            storage: None,
            username,
            cursor: 0,
            scroll: 0,
            prompt: None,
            last_click: None,
            listing_area: Rect::default(),
            should_quit: false,
            prefs_store: Some(prefs_store),
        })
    }

    /// Creates an app without a terminal for testing.
    #[cfg(test)]
    pub fn new_for_testing(browser: Browser) -> Self {
        Self {
            terminal: None,
            browser,
            toasts: Toasts::new(),
            storage: None,
            username: "tester".to_string(),
            cursor: 0,
            scroll: 0,
            prompt: None,
            last_click: None,
            listing_area: Rect::new(0, 0, 80, 20),
            should_quit: false,
            prefs_store: None,
        }
    }

    /// The browser state (mutable for the run loop's command calls).
    pub fn browser_mut(&mut self) -> &mut Browser {
        &mut self.browser
    }

    /// The toast queue.
    pub fn toasts_mut(&mut self) -> &mut Toasts {
        &mut self.toasts
    }

    /// Split borrow of the browser state and the toast queue, for feeding
    /// both to a command handler.
    pub fn parts(&mut self) -> (&mut Browser, &mut Toasts) {
        (&mut self.browser, &mut self.toasts)
    }

    /// Updates the storage usage display.
    pub fn set_storage(&mut self, storage: Option<StorageInfo>) {
        self.storage = storage;
    }

    /// Whether the app wants to exit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Ids of the visible entries, in display order.
    fn visible_ids(&self) -> Vec<String> {
        self.browser
            .visible_entries()
            .iter()
            .map(|e| e.id.clone())
            .collect()
    }

    /// Clamps the cursor into the visible range.
    fn clamp_cursor(&mut self) {
        let len = self.browser.visible_entries().len();
        if len == 0 {
            self.cursor = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }

    /// Entry id under the keyboard cursor.
    fn cursor_id(&self) -> Option<String> {
        self.visible_ids().get(self.cursor).cloned()
    }

    /// Handles a keyboard event, returning a server action if one is due.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<UiAction> {
        if self.prompt.is_some() {
            return self.handle_prompt_key(key);
        }

        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.cursor += 1;
                self.clamp_cursor();
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
                None
            }
            KeyCode::Char(' ') => {
                if let Some(id) = self.cursor_id() {
                    self.browser.click(&id, ClickKind::Plain);
                }
                None
            }
            KeyCode::Char('x') => {
                if let Some(id) = self.cursor_id() {
                    self.browser.click(&id, ClickKind::Control);
                }
                None
            }
            KeyCode::Char('v') => {
                if let Some(id) = self.cursor_id() {
                    self.browser.click(&id, ClickKind::Shift);
                }
                None
            }
            KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.browser.select_all();
                None
            }
            KeyCode::Enter => self.activate_cursor(),
            KeyCode::Backspace => {
                if self.browser.current_folder().is_empty() {
                    None
                } else {
                    Some(UiAction::Navigate(self.browser.parent_folder()))
                }
            }
            KeyCode::Esc => {
                if !self.browser.filter().is_empty() {
                    self.browser.set_filter("");
                } else {
                    self.browser.clear_selection();
                }
                None
            }
            KeyCode::Delete | KeyCode::Char('D') => {
                let ids = self.delete_targets();
                if ids.is_empty() {
                    None
                } else {
                    self.prompt = Some(Prompt::new(PromptKind::ConfirmDelete(ids)));
                    None
                }
            }
            KeyCode::Char('d') => Some(UiAction::DownloadSelection),
            KeyCode::Char('u') => {
                self.prompt = Some(Prompt::new(PromptKind::UploadPath));
                None
            }
            KeyCode::Char('n') => {
                self.prompt = Some(Prompt::new(PromptKind::NewFolder));
                None
            }
            KeyCode::Char('/') => {
                self.prompt = Some(Prompt::new(PromptKind::Filter));
                None
            }
            KeyCode::Char('r') => {
                self.browser.toggle_recent_view();
                self.cursor = 0;
                None
            }
            KeyCode::Char('g') => {
                let mode = self.browser.view_mode().toggled();
                self.browser.set_view_mode(mode);
                self.persist_view_mode(mode);
                None
            }
            KeyCode::F(5) => Some(UiAction::Refresh),
            KeyCode::F(2) => Some(UiAction::Rename),
            KeyCode::Char('s') => Some(UiAction::Share),
            _ => None,
        }
    }

    /// Keyboard handling while a prompt is open.
    fn handle_prompt_key(&mut self, key: KeyEvent) -> Option<UiAction> {
        let prompt = self.prompt.as_mut()?;

        if let PromptKind::ConfirmDelete(ids) = &prompt.kind {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    let ids = ids.clone();
                    self.prompt = None;
                    Some(UiAction::Delete(ids))
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.prompt = None;
                    None
                }
                _ => None,
            };
        }

        match key.code {
            KeyCode::Esc => {
                self.prompt = None;
                None
            }
            KeyCode::Backspace => {
                prompt.buffer.pop();
                None
            }
            KeyCode::Char(c) => {
                prompt.buffer.push(c);
                None
            }
            KeyCode::Enter => {
                let prompt = self.prompt.take()?;
                let input = prompt.buffer.trim().to_string();
                match prompt.kind {
                    PromptKind::NewFolder => Some(UiAction::CreateFolder(input)),
                    PromptKind::UploadPath => {
                        if input.is_empty() {
                            None
                        } else {
                            Some(UiAction::Upload(PathBuf::from(input)))
                        }
                    }
                    PromptKind::Filter => {
                        self.browser.set_filter(&input);
                        self.cursor = 0;
                        None
                    }
                    PromptKind::ConfirmDelete(_) => None,
                }
            }
            _ => None,
        }
    }

    /// Ids to delete: the selection, or the cursor entry when nothing is
    /// selected. The parent entry is never a delete target.
    fn delete_targets(&self) -> Vec<String> {
        let selected: Vec<String> = self
            .browser
            .selected_entries()
            .iter()
            .filter(|e| !e.is_parent())
            .map(|e| e.id.clone())
            .collect();
        if !selected.is_empty() {
            return selected;
        }
        self.cursor_id()
            .and_then(|id| self.browser.entry(&id).cloned())
            .filter(|e| !e.is_parent())
            .map(|e| vec![e.id])
            .unwrap_or_default()
    }

    /// Activates the entry under the cursor (Enter / double click).
    fn activate_cursor(&mut self) -> Option<UiAction> {
        let id = self.cursor_id()?;
        let entry = self.browser.entry(&id)?.clone();
        self.browser
            .navigate_target(&entry)
            .map(UiAction::Navigate)
    }

    /// Handles a mouse event, returning a server action if one is due.
    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> Option<UiAction> {
        if self.prompt.is_some() {
            return None;
        }
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let index = self.hit_test(mouse.column, mouse.row)?;
                let ids = self.visible_ids();
                let id = ids.get(index)?.clone();
                self.cursor = index;

                // Double click on a directory navigates.
                let now = Instant::now();
                let double = matches!(
                    &self.last_click,
                    Some((at, last)) if *last == id && now.duration_since(*at) < DOUBLE_CLICK_WINDOW
                );
                self.last_click = Some((now, id.clone()));

                if double {
                    return self.activate_cursor();
                }

                let kind = if mouse.modifiers.contains(KeyModifiers::CONTROL) {
                    ClickKind::Control
                } else if mouse.modifiers.contains(KeyModifiers::SHIFT) {
                    ClickKind::Shift
                } else {
                    ClickKind::Plain
                };
                self.browser.click(&id, kind);
                None
            }
            MouseEventKind::ScrollDown => {
                self.cursor += 1;
                self.clamp_cursor();
                None
            }
            MouseEventKind::ScrollUp => {
                self.cursor = self.cursor.saturating_sub(1);
                None
            }
            _ => None,
        }
    }

    /// Maps viewport coordinates to a visible-entry index.
    fn hit_test(&self, column: u16, row: u16) -> Option<usize> {
        let count = self.browser.visible_entries().len();
        match self.browser.view_mode() {
            ViewMode::Grid => grid_hit(self.listing_area, self.scroll, column, row, count),
            ViewMode::List => list_hit(self.listing_area, self.scroll, column, row, count),
        }
    }

    /// Persists the view mode, best-effort.
    fn persist_view_mode(&mut self, mode: ViewMode) {
        if let Some(store) = &self.prefs_store {
            if let Err(err) = store.save(&Prefs { view_mode: mode }) {
                tracing::warn!("Failed to save view preference: {err}");
            }
        }
    }

    /// Draws one frame.
    pub fn draw(&mut self) -> io::Result<()> {
        let Some(mut terminal) = self.terminal.take() else {
            return Ok(());
        };

        let browser = &self.browser;
        let visible: Vec<FileEntry> = browser.visible_entries().into_iter().cloned().collect();
        let selection = browser.selection().clone();
        let crumbs = browser.breadcrumbs();
        let view_mode = browser.view_mode();
        let filter = browser.filter().to_string();
        let recent = browser.recent_view();
        let storage = self.storage;
        let username = self.username.clone();
        let cursor = self.cursor;
        let prompt = self.prompt.clone();
        let toasts: Vec<(ToastLevel, String)> = self
            .toasts
            .iter()
            .map(|t| (t.level, t.message.clone()))
            .collect();

        let mut listing_area = self.listing_area;
        let mut scroll = self.scroll;

        terminal.draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3), // Header: breadcrumbs + user
                    Constraint::Min(0),    // Listing
                    Constraint::Length(3), // Status bar
                ])
                .split(frame.area());

            Self::render_header(frame, chunks[0], &crumbs, &username, recent, &filter);

            listing_area = inner(chunks[1]);
            // The scroll offset depends on the final geometry, so settle it
            // here before rendering the listing.
            scroll = settle_scroll(scroll, cursor, view_mode, listing_area, visible.len());
            match view_mode {
                ViewMode::Grid => Self::render_grid(
                    frame,
                    chunks[1],
                    &visible,
                    &selection,
                    cursor,
                    scroll,
                ),
                ViewMode::List => Self::render_list(
                    frame,
                    chunks[1],
                    &visible,
                    &selection,
                    cursor,
                    scroll,
                ),
            }

            Self::render_status(frame, chunks[2], &selection, storage, &toasts);

            if let Some(prompt) = &prompt {
                Self::render_prompt(frame, prompt);
            }
        })?;

        self.listing_area = listing_area;
        self.scroll = scroll;
        self.terminal = Some(terminal);
        Ok(())
    }

    /// Renders the breadcrumb/header bar.
    fn render_header(
        frame: &mut Frame,
        area: Rect,
        crumbs: &[crate::state::Breadcrumb],
        username: &str,
        recent: bool,
        filter: &str,
    ) {
        let mut spans = Vec::new();
        for (i, crumb) in crumbs.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" / ", Style::default().fg(Color::DarkGray)));
            }
            let style = if i == crumbs.len() - 1 {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            spans.push(Span::styled(crumb.label.clone(), style));
        }
        if recent {
            spans.push(Span::styled(
                "  [Recent]",
                Style::default().fg(Color::Cyan),
            ));
        }
        if !filter.is_empty() {
            spans.push(Span::styled(
                format!("  [filter: {filter}]"),
                Style::default().fg(Color::Cyan),
            ));
        }

        let header = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Cabinet - {username} ")),
        );
        frame.render_widget(header, area);
    }

    /// Renders the grid projection.
    fn render_grid(
        frame: &mut Frame,
        area: Rect,
        entries: &[FileEntry],
        selection: &crate::state::Selection,
        cursor: usize,
        scroll: usize,
    ) {
        let block = Block::default().borders(Borders::ALL);
        let inner_area = block.inner(area);
        frame.render_widget(block, area);

        if entries.is_empty() {
            let empty = Paragraph::new("No files found")
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(empty, inner_area);
            return;
        }

        let now = chrono::Local::now();
        let cols = grid_columns(inner_area) as usize;
        if cols == 0 {
            return;
        }

        let first = scroll * cols;
        let mut lines: Vec<Line> = Vec::new();
        for row_entries in entries.iter().skip(first).collect::<Vec<_>>().chunks(cols) {
            let mut glyph_line = Vec::new();
            let mut info_line = Vec::new();
            for &entry in row_entries {
                let index = entries.iter().position(|e| e.id == entry.id).unwrap_or(0);
                let style = cell_style(entry, selection.contains(&entry.id), index == cursor);

                let glyph = if entry.is_parent() {
                    "\u{2B06}".to_string()
                } else if entry.is_directory {
                    "\u{1F4C1}".to_string()
                } else {
                    entry.category.glyph().to_string()
                };
                glyph_line.push(Span::styled(
                    pad_cell(&format!("{glyph} {}", entry.name), GRID_CELL_WIDTH),
                    style,
                ));

                let info = if entry.is_parent() {
                    "Parent Folder".to_string()
                } else if entry.is_directory {
                    "Folder".to_string()
                } else {
                    format!(
                        "{} \u{2022} {}",
                        format_date_short(entry.modified, now),
                        format_size(entry.size)
                    )
                };
                info_line.push(Span::styled(
                    pad_cell(&info, GRID_CELL_WIDTH),
                    style.add_modifier(Modifier::DIM),
                ));
            }
            lines.push(Line::from(glyph_line));
            lines.push(Line::from(info_line));
            lines.push(Line::from(""));
        }

        let grid = Paragraph::new(lines);
        frame.render_widget(grid, inner_area);
    }

    /// Renders the list projection.
    fn render_list(
        frame: &mut Frame,
        area: Rect,
        entries: &[FileEntry],
        selection: &crate::state::Selection,
        cursor: usize,
        scroll: usize,
    ) {
        let now = chrono::Local::now();
        let items: Vec<ListItem> = entries
            .iter()
            .enumerate()
            .skip(scroll)
            .map(|(index, entry)| {
                let style = cell_style(entry, selection.contains(&entry.id), index == cursor);

                let glyph = if entry.is_parent() {
                    "\u{2B06}"
                } else if entry.is_directory {
                    "\u{1F4C1}"
                } else {
                    entry.category.glyph()
                };
                let size = if entry.is_directory {
                    "\u{2014}".to_string()
                } else {
                    format_size(entry.size)
                };
                let date = if entry.is_parent() {
                    "Parent Folder".to_string()
                } else {
                    format_date(entry.modified, now)
                };

                let line = Line::from(vec![
                    Span::styled(format!("{glyph} "), style),
                    Span::styled(pad_cell(&entry.name, 32), style),
                    Span::styled(pad_cell(&size, 12), style),
                    Span::styled(date, style.add_modifier(Modifier::DIM)),
                ]);
                ListItem::new(line)
            })
            .collect();

        let list = List::new(items).block(Block::default().borders(Borders::ALL));
        frame.render_widget(list, area);
    }

    /// Renders the status bar: selection count, storage gauge, toasts.
    fn render_status(
        frame: &mut Frame,
        area: Rect,
        selection: &crate::state::Selection,
        storage: Option<StorageInfo>,
        toasts: &[(ToastLevel, String)],
    ) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(30)])
            .split(area);

        let mut spans = Vec::new();
        if let Some((level, message)) = toasts.last() {
            let color = match level {
                ToastLevel::Info => Color::Cyan,
                ToastLevel::Success => Color::Green,
                ToastLevel::Warning => Color::Yellow,
                ToastLevel::Error => Color::Red,
            };
            spans.push(Span::styled(message.clone(), Style::default().fg(color)));
        } else if !selection.is_empty() {
            let n = selection.len();
            spans.push(Span::styled(
                format!("{n} {} selected", if n == 1 { "file" } else { "files" }),
                Style::default().fg(Color::Yellow),
            ));
        } else {
            spans.push(Span::styled(
                "space select  x toggle  v range  enter open  d download  del delete  n mkdir  u upload  g view  q quit",
                Style::default().fg(Color::DarkGray),
            ));
        }
        let status = Paragraph::new(Line::from(spans))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(status, chunks[0]);

        let (ratio, label) = match storage {
            Some(info) => (
                f64::from(info.used_percent()) / 100.0,
                format!(
                    "{} of {}",
                    format_size(info.used_space),
                    format_size(info.total_space)
                ),
            ),
            None => (0.0, "storage unknown".to_string()),
        };
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL))
            .gauge_style(Style::default().fg(Color::Blue))
            .ratio(ratio.clamp(0.0, 1.0))
            .label(label);
        frame.render_widget(gauge, chunks[1]);
    }

    /// Renders the prompt overlay.
    fn render_prompt(frame: &mut Frame, prompt: &Prompt) {
        let area = centered_rect(50, 3, frame.area());
        frame.render_widget(Clear, area);

        let content = match &prompt.kind {
            PromptKind::ConfirmDelete(ids) => {
                format!("Delete {} item(s)? (y/n)", ids.len())
            }
            _ => format!("{}\u{2588}", prompt.buffer),
        };
        let widget = Paragraph::new(content).block(
            Block::default()
                .borders(Borders::ALL)
                .title(prompt.title())
                .border_style(Style::default().fg(Color::Yellow)),
        );
        frame.render_widget(widget, area);
    }

    /// Runs the main event loop.
    ///
    /// Commands execute inline: while one is awaited, input is not polled,
    /// which is what serializes user-triggered operations.
    pub async fn run(&mut self, commands: &Commands) -> io::Result<()> {
        let tick_rate = Duration::from_millis(250);
        let mut last_tick = Instant::now();

        loop {
            self.draw()?;

            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));

            let mut action = None;
            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) => action = self.handle_key(key),
                    Event::Mouse(mouse) => action = self.handle_mouse(mouse),
                    _ => {}
                }
            }

            if let Some(action) = action {
                self.apply(commands, action).await;
            }

            if self.should_quit {
                break;
            }

            if last_tick.elapsed() >= tick_rate {
                self.toasts.prune();
                last_tick = Instant::now();
            }
        }

        Ok(())
    }

    /// Executes one requested action against the server.
    async fn apply(&mut self, commands: &Commands, action: UiAction) {
        match action {
            UiAction::Navigate(folder) => {
                commands
                    .load_files(&mut self.browser, &mut self.toasts, &folder)
                    .await;
                self.cursor = 0;
                self.scroll = 0;
                self.storage = commands.storage_info(&folder).await;
            }
            UiAction::Refresh => {
                commands.refresh(&mut self.browser, &mut self.toasts).await;
                self.clamp_cursor();
            }
            UiAction::Delete(ids) => {
                commands
                    .delete_entries(&mut self.browser, &mut self.toasts, &ids)
                    .await;
                self.clamp_cursor();
                let folder = self.browser.current_folder().to_string();
                self.storage = commands.storage_info(&folder).await;
            }
            UiAction::DownloadSelection => {
                commands.download_selected(&self.browser, &mut self.toasts).await;
            }
            UiAction::Upload(path) => {
                commands
                    .upload_paths(&mut self.browser, &mut self.toasts, &[path])
                    .await;
                self.clamp_cursor();
            }
            UiAction::CreateFolder(name) => {
                commands
                    .create_folder(&mut self.browser, &mut self.toasts, &name)
                    .await;
            }
            UiAction::Rename => commands.rename_stub(&mut self.toasts),
            UiAction::Share => commands.share_stub(&mut self.toasts),
        }
    }

    /// Restores the terminal to its original state.
    pub fn restore(&mut self) -> io::Result<()> {
        if let Some(terminal) = &mut self.terminal {
            disable_raw_mode()?;
            execute!(
                terminal.backend_mut(),
                LeaveAlternateScreen,
                DisableMouseCapture
            )?;
            terminal.show_cursor()?;
        }
        Ok(())
    }
}

impl Drop for BrowserApp {
    fn drop(&mut self) {
        // Best effort cleanup
        if let Some(terminal) = &mut self.terminal {
            let _ = disable_raw_mode();
            let _ = execute!(
                terminal.backend_mut(),
                LeaveAlternateScreen,
                DisableMouseCapture
            );
            let _ = terminal.show_cursor();
        }
    }
}

/// Style for one listing cell.
fn cell_style(entry: &FileEntry, selected: bool, under_cursor: bool) -> Style {
    let mut style = if entry.is_directory {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(entry.category.color())
    };
    if selected {
        style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
    }
    if under_cursor {
        style = style.add_modifier(Modifier::REVERSED);
    }
    style
}

/// Pads or truncates text to a fixed cell width.
fn pad_cell(text: &str, width: u16) -> String {
    let width = width as usize;
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    while out.chars().count() < width {
        out.push(' ');
    }
    out
}

/// Number of grid columns fitting the viewport.
fn grid_columns(area: Rect) -> u16 {
    (area.width / GRID_CELL_WIDTH).max(1)
}

/// The inner rect of a bordered block.
fn inner(area: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(area)
}

/// Settles the scroll offset so `cursor` is inside the viewport.
fn settle_scroll(
    scroll: usize,
    cursor: usize,
    view_mode: ViewMode,
    area: Rect,
    count: usize,
) -> usize {
    if count == 0 {
        return 0;
    }
    let (per_row, row_height) = match view_mode {
        ViewMode::Grid => (grid_columns(area) as usize, GRID_CELL_HEIGHT as usize),
        ViewMode::List => (1, 1),
    };
    let cursor_row = cursor / per_row.max(1);
    let rows_visible = (area.height as usize / row_height).max(1);
    if cursor_row < scroll {
        cursor_row
    } else if cursor_row >= scroll + rows_visible {
        cursor_row + 1 - rows_visible
    } else {
        scroll
    }
}

/// Maps viewport coordinates to an index in grid mode.
fn grid_hit(area: Rect, scroll: usize, column: u16, row: u16, count: usize) -> Option<usize> {
    if !contains(area, column, row) {
        return None;
    }
    let col = ((column - area.x) / GRID_CELL_WIDTH) as usize;
    let visual_row = ((row - area.y) / GRID_CELL_HEIGHT) as usize;
    let cols = grid_columns(area) as usize;
    if col >= cols {
        return None;
    }
    let index = (scroll + visual_row) * cols + col;
    (index < count).then_some(index)
}

/// Maps viewport coordinates to an index in list mode.
fn list_hit(area: Rect, scroll: usize, column: u16, row: u16, count: usize) -> Option<usize> {
    if !contains(area, column, row) {
        return None;
    }
    let index = scroll + (row - area.y) as usize;
    (index < count).then_some(index)
}

/// Whether a point falls inside a rect.
fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x + area.width
        && row >= area.y
        && row < area.y + area.height
}

/// A centered rect of fixed size within `base`.
fn centered_rect(width: u16, height: u16, base: Rect) -> Rect {
    let x = base.x + base.width.saturating_sub(width) / 2;
    let y = base.y + base.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(base.width), height.min(base.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filetype::classify;

    fn entry(name: &str, modified: i64, is_directory: bool) -> FileEntry {
        FileEntry {
            id: format!("{name}_{modified}"),
            name: name.to_string(),
            size: 10,
            modified,
            category: classify(name),
            is_directory,
            path: name.to_string(),
        }
    }

    fn test_app() -> BrowserApp {
        let mut browser = Browser::new(ViewMode::List);
        browser.replace_listing(
            vec![
                entry("docs", 300, true),
                entry("a.txt", 200, false),
                entry("b.txt", 100, false),
            ],
            "",
        );
        BrowserApp::new_for_testing(browser)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_quit_key() {
        let mut app = test_app();
        assert!(app.handle_key(key(KeyCode::Char('q'))).is_none());
        assert!(app.should_quit());
    }

    #[test]
    fn test_space_selects_cursor_entry() {
        let mut app = test_app();
        // Display order: docs (dir), a.txt, b.txt.
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char(' ')));
        assert!(app.browser.selection().contains("a.txt_200"));
    }

    #[test]
    fn test_enter_on_directory_navigates() {
        let mut app = test_app();
        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(action, Some(UiAction::Navigate("docs".to_string())));
    }

    #[test]
    fn test_enter_on_file_does_nothing() {
        let mut app = test_app();
        app.handle_key(key(KeyCode::Down));
        assert!(app.handle_key(key(KeyCode::Enter)).is_none());
    }

    #[test]
    fn test_backspace_at_root_does_nothing() {
        let mut app = test_app();
        assert!(app.handle_key(key(KeyCode::Backspace)).is_none());
    }

    #[test]
    fn test_backspace_navigates_to_parent() {
        let mut app = test_app();
        app.browser.replace_listing(Vec::new(), "docs/reports");
        let action = app.handle_key(key(KeyCode::Backspace));
        assert_eq!(action, Some(UiAction::Navigate("docs".to_string())));
    }

    #[test]
    fn test_delete_opens_confirmation_then_yes_fires_action() {
        let mut app = test_app();
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Char(' ')));

        assert!(app.handle_key(key(KeyCode::Delete)).is_none());
        assert!(app.prompt.is_some());

        let action = app.handle_key(key(KeyCode::Char('y')));
        assert_eq!(action, Some(UiAction::Delete(vec!["a.txt_200".to_string()])));
        assert!(app.prompt.is_none());
    }

    #[test]
    fn test_delete_confirmation_no_cancels() {
        let mut app = test_app();
        app.handle_key(key(KeyCode::Char(' ')));
        app.handle_key(key(KeyCode::Delete));
        let action = app.handle_key(key(KeyCode::Char('n')));
        assert!(action.is_none());
        assert!(app.prompt.is_none());
    }

    #[test]
    fn test_delete_without_selection_targets_cursor() {
        let mut app = test_app();
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Delete));
        match &app.prompt {
            Some(Prompt {
                kind: PromptKind::ConfirmDelete(ids),
                ..
            }) => assert_eq!(ids, &vec!["a.txt_200".to_string()]),
            other => panic!("expected delete confirmation, got {other:?}"),
        }
    }

    #[test]
    fn test_new_folder_prompt_produces_action() {
        let mut app = test_app();
        app.handle_key(key(KeyCode::Char('n')));
        for c in "reports".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        let action = app.handle_key(key(KeyCode::Enter));
        assert_eq!(action, Some(UiAction::CreateFolder("reports".to_string())));
    }

    #[test]
    fn test_filter_prompt_sets_filter() {
        let mut app = test_app();
        app.handle_key(key(KeyCode::Char('/')));
        app.handle_key(key(KeyCode::Char('a')));
        assert!(app.handle_key(key(KeyCode::Enter)).is_none());
        assert_eq!(app.browser.filter(), "a");

        // Esc clears the filter before it clears the selection.
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.browser.filter(), "");
    }

    #[test]
    fn test_rename_and_share_are_stub_actions() {
        let mut app = test_app();
        assert_eq!(app.handle_key(key(KeyCode::F(2))), Some(UiAction::Rename));
        assert_eq!(app.handle_key(key(KeyCode::Char('s'))), Some(UiAction::Share));
    }

    #[test]
    fn test_view_toggle_key() {
        let mut app = test_app();
        assert_eq!(app.browser.view_mode(), ViewMode::List);
        app.handle_key(key(KeyCode::Char('g')));
        assert_eq!(app.browser.view_mode(), ViewMode::Grid);
    }

    #[test]
    fn test_cursor_clamps_to_listing() {
        let mut app = test_app();
        for _ in 0..10 {
            app.handle_key(key(KeyCode::Down));
        }
        assert_eq!(app.cursor, 2);
        for _ in 0..10 {
            app.handle_key(key(KeyCode::Up));
        }
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn test_mouse_plain_click_selects() {
        let mut app = test_app();
        app.browser.set_view_mode(ViewMode::List);
        let mouse = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 1,
            row: 1,
            modifiers: KeyModifiers::NONE,
        };
        assert!(app.handle_mouse(mouse).is_none());
        // Row 1 of the listing area is display index 1 (a.txt).
        assert!(app.browser.selection().contains("a.txt_200"));
    }

    #[test]
    fn test_mouse_ctrl_click_toggles() {
        let mut app = test_app();
        app.browser.set_view_mode(ViewMode::List);
        let click = |row, modifiers| MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 1,
            row,
            modifiers,
        };
        app.handle_mouse(click(1, KeyModifiers::NONE));
        app.handle_mouse(click(2, KeyModifiers::CONTROL));
        assert_eq!(app.browser.selection().len(), 2);
    }

    #[test]
    fn test_grid_hit_maps_cells() {
        let area = Rect::new(0, 0, 66, 12);
        // Three 22-wide columns; cell height 3.
        assert_eq!(grid_hit(area, 0, 0, 0, 9), Some(0));
        assert_eq!(grid_hit(area, 0, 23, 0, 9), Some(1));
        assert_eq!(grid_hit(area, 0, 0, 3, 9), Some(3));
        assert_eq!(grid_hit(area, 1, 0, 0, 9), Some(3));
        assert_eq!(grid_hit(area, 0, 0, 9, 9), None);
        assert_eq!(grid_hit(area, 0, 70, 0, 9), None);
    }

    #[test]
    fn test_list_hit_maps_rows() {
        let area = Rect::new(1, 1, 40, 10);
        assert_eq!(list_hit(area, 0, 5, 1, 3), Some(0));
        assert_eq!(list_hit(area, 0, 5, 3, 3), Some(2));
        assert_eq!(list_hit(area, 2, 5, 1, 5), Some(2));
        assert_eq!(list_hit(area, 0, 5, 4, 3), None);
        assert_eq!(list_hit(area, 0, 0, 1, 3), None);
    }

    #[test]
    fn test_pad_cell_fixed_width() {
        assert_eq!(pad_cell("abc", 6).chars().count(), 6);
        assert_eq!(pad_cell("a-very-long-name.txt", 6).chars().count(), 6);
    }

    #[test]
    fn test_settle_scroll_follows_cursor() {
        let area = Rect::new(0, 0, 40, 5);
        // List mode: 5 visible rows.
        assert_eq!(settle_scroll(0, 2, ViewMode::List, area, 20), 0);
        assert_eq!(settle_scroll(0, 7, ViewMode::List, area, 20), 3);
        assert_eq!(settle_scroll(5, 2, ViewMode::List, area, 20), 2);
        assert_eq!(settle_scroll(3, 0, ViewMode::List, area, 0), 0);
    }
}
