//! Line-oriented rendering to a terminal.

use devlink_core::{FilesystemStatus, LedState, LogEntry, RenderSink};
use std::io::Write;

/// Prints status changes and log lines as they happen.
///
/// With auto-scroll off, log lines are held back and flushed when it is
/// turned on again; status lines always print.
pub struct TerminalSink<W> {
    out: W,
    held: Vec<String>,
    auto_scroll: bool,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, auto_scroll: bool) -> Self {
        Self {
            out,
            held: Vec::new(),
            auto_scroll,
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        // Nothing sensible to do if stdout is gone.
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }

    fn field(&mut self, label: &str, value: &str) {
        self.line(&format!("  {label:<8} {value}"));
    }
}

impl<W: Write> RenderSink for TerminalSink<W> {
    fn connection_changed(&mut self, connected: bool) {
        if connected {
            self.line("● Connected to device");
        } else {
            self.line("○ Disconnected - Reconnecting...");
        }
    }

    fn message_appended(&mut self, entry: &LogEntry) {
        let text = format!(
            "[{}] {:<9} {}",
            entry.time_label(),
            entry.category.as_str(),
            entry.text
        );
        if self.auto_scroll {
            self.line(&text);
        } else {
            self.held.push(text);
        }
    }

    fn messages_cleared(&mut self) {
        self.held.clear();
        self.line("-- messages cleared --");
    }

    fn auto_scroll_changed(&mut self, enabled: bool) {
        self.auto_scroll = enabled;
        self.field("Scroll", if enabled { "ON" } else { "OFF" });
        if enabled {
            for text in std::mem::take(&mut self.held) {
                self.line(&text);
            }
        }
    }

    fn led_changed(&mut self, state: LedState) {
        self.field("LED", state.label());
    }

    fn free_heap_changed(&mut self, text: &str) {
        self.field("Heap", text);
    }

    fn uptime_changed(&mut self, text: &str) {
        self.field("Uptime", text);
    }

    fn counter_changed(&mut self, counter: u64) {
        self.field("Counter", &counter.to_string());
    }

    fn client_count_changed(&mut self, count: u64) {
        self.field("Clients", &count.to_string());
    }

    fn filesystem_status_changed(&mut self, status: &FilesystemStatus) {
        let text = format!("{} ({})", status.status, status.source_label());
        self.field("Files", &text);
    }
}
