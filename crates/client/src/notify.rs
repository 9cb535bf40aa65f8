//! Transient toast notifications.
//!
//! Commands push toasts; the UI drains expired ones on every tick. Each
//! toast lives for a fixed TTL and is never fatal to anything.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One on-screen notification.
#[derive(Debug, Clone)]
pub struct Toast {
    /// Message text.
    pub message: String,
    /// Severity, used for coloring.
    pub level: ToastLevel,
    /// When the toast was created.
    created: Instant,
}

/// How long a toast stays visible.
const TOAST_TTL: Duration = Duration::from_secs(3);

/// Queue of live toasts, newest last.
#[derive(Debug, Default)]
pub struct Toasts {
    queue: VecDeque<Toast>,
}

impl Toasts {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a toast.
    pub fn push(&mut self, level: ToastLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            ToastLevel::Error => tracing::warn!("toast: {message}"),
            _ => tracing::debug!("toast: {message}"),
        }
        self.queue.push_back(Toast {
            message,
            level,
            created: Instant::now(),
        });
    }

    /// Convenience constructors mirroring the severity levels.
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Success, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(ToastLevel::Error, message);
    }

    /// Drops toasts older than the TTL. Called from the UI tick.
    pub fn prune(&mut self) {
        let now = Instant::now();
        self.queue
            .retain(|t| now.duration_since(t.created) < TOAST_TTL);
    }

    /// Live toasts, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.queue.iter()
    }

    /// Number of live toasts.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether no toasts are live.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
