//! Test helpers: a [`RenderSink`] that records every call.

use crate::{FilesystemStatus, LedState, LogCategory, LogEntry, RenderSink};
use std::sync::{Arc, Mutex};

/// One recorded sink call.
#[derive(Debug, Clone, PartialEq)]
pub enum Render {
    Connection(bool),
    Message(LogCategory, String),
    Cleared,
    AutoScroll(bool),
    Led(LedState),
    FreeHeap(String),
    Uptime(String),
    Counter(u64),
    ClientCount(u64),
    Filesystem(FilesystemStatus),
}

/// Records sink calls. Clones share the same record, so a test can keep one
/// clone while the other is moved into a client.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    renders: Arc<Mutex<Vec<Render>>>,
}

impl RecordingSink {
    pub fn renders(&self) -> Vec<Render> {
        self.renders.lock().unwrap().clone()
    }

    /// Log lines of the given category, in order.
    pub fn messages(&self, category: LogCategory) -> Vec<String> {
        self.renders()
            .into_iter()
            .filter_map(|r| match r {
                Render::Message(c, text) if c == category => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn take(&self) -> Vec<Render> {
        std::mem::take(&mut *self.renders.lock().unwrap())
    }

    fn record(&self, render: Render) {
        self.renders.lock().unwrap().push(render);
    }
}

impl RenderSink for RecordingSink {
    fn connection_changed(&mut self, connected: bool) {
        self.record(Render::Connection(connected));
    }

    fn message_appended(&mut self, entry: &LogEntry) {
        self.record(Render::Message(entry.category, entry.text.clone()));
    }

    fn messages_cleared(&mut self) {
        self.record(Render::Cleared);
    }

    fn auto_scroll_changed(&mut self, enabled: bool) {
        self.record(Render::AutoScroll(enabled));
    }

    fn led_changed(&mut self, state: LedState) {
        self.record(Render::Led(state));
    }

    fn free_heap_changed(&mut self, text: &str) {
        self.record(Render::FreeHeap(text.to_string()));
    }

    fn uptime_changed(&mut self, text: &str) {
        self.record(Render::Uptime(text.to_string()));
    }

    fn counter_changed(&mut self, counter: u64) {
        self.record(Render::Counter(counter));
    }

    fn client_count_changed(&mut self, count: u64) {
        self.record(Render::ClientCount(count));
    }

    fn filesystem_status_changed(&mut self, status: &FilesystemStatus) {
        self.record(Render::Filesystem(status.clone()));
    }
}
