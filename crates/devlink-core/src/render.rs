use crate::{FilesystemStatus, LedState, LogEntry};

/// Display surface implemented by a front end.
///
/// The client only ever writes to it. Every call happens on the task that
/// owns the connection manager, one event at a time.
pub trait RenderSink {
    /// The link opened (`true`) or dropped (`false`).
    fn connection_changed(&mut self, connected: bool);

    /// A log entry was added.
    fn message_appended(&mut self, entry: &LogEntry);

    /// The log was emptied.
    fn messages_cleared(&mut self) {}

    fn auto_scroll_changed(&mut self, _enabled: bool) {}

    fn led_changed(&mut self, state: LedState);

    /// Already formatted, e.g. `"200.0 KB"`.
    fn free_heap_changed(&mut self, text: &str);

    /// Already formatted, e.g. `"1h 2m 5s"`.
    fn uptime_changed(&mut self, text: &str);

    fn counter_changed(&mut self, _counter: u64) {}

    /// Clients connected to the device, this one included.
    fn client_count_changed(&mut self, count: u64);

    fn filesystem_status_changed(&mut self, _status: &FilesystemStatus) {}
}
