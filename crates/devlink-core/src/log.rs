//! Human-readable activity log.

use chrono::{DateTime, Local};

/// Category of a log entry; front ends style entries by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    Connected,
    Error,
    Sent,
    Received,
    Info,
}

impl LogCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Error => "error",
            Self::Sent => "sent",
            Self::Received => "received",
            Self::Info => "info",
        }
    }
}

/// One line of the activity log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub text: String,
    pub category: LogCategory,
    pub timestamp: DateTime<Local>,
}

impl LogEntry {
    pub fn new(category: LogCategory, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category,
            timestamp: Local::now(),
        }
    }

    /// Local wall-clock time, `HH:MM:SS`.
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Append-only log plus the auto-scroll preference of whoever displays it.
#[derive(Debug, Clone)]
pub struct MessageLog {
    entries: Vec<LogEntry>,
    auto_scroll: bool,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new(true)
    }
}

impl MessageLog {
    pub fn new(auto_scroll: bool) -> Self {
        Self {
            entries: Vec::new(),
            auto_scroll,
        }
    }

    pub fn push(&mut self, entry: LogEntry) -> &LogEntry {
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Flip auto-scroll and return the new value.
    pub fn toggle_auto_scroll(&mut self) -> bool {
        self.auto_scroll = !self.auto_scroll;
        self.auto_scroll
    }

    pub fn auto_scroll(&self) -> bool {
        self.auto_scroll
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
