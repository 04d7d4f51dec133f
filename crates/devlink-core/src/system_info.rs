//! Device status snapshot and the updater that renders it.

use crate::{RenderSink, format_uptime};

/// A partial status snapshot. `None` means "no update for this field".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemInfo {
    pub led_status: Option<bool>,
    /// Free heap in bytes.
    pub free_heap: Option<f64>,
    /// Uptime in seconds.
    pub uptime: Option<u64>,
    /// Firmware tick counter.
    pub counter: Option<u64>,
}

impl SystemInfo {
    /// Push every present field to the sink. Absent fields are left alone.
    pub fn apply<S: RenderSink + ?Sized>(&self, sink: &mut S) {
        if let Some(on) = self.led_status {
            sink.led_changed(LedState::from(on));
        }
        if let Some(bytes) = self.free_heap {
            sink.free_heap_changed(&format_free_heap(bytes));
        }
        if let Some(secs) = self.uptime {
            sink.uptime_changed(&format_uptime(secs));
        }
        if let Some(counter) = self.counter {
            sink.counter_changed(counter);
        }
    }
}

/// Render a byte count as kilobytes with one decimal.
///
/// Ties round up, so 256 bytes is `0.3 KB`.
pub fn format_free_heap(bytes: f64) -> String {
    let tenths = (bytes / 1024.0 * 10.0).round();
    format!("{:.1} KB", tenths / 10.0)
}

/// LED display state. There is no "unknown" once a value has arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedState {
    On,
    Off,
}

impl LedState {
    /// `ON` or `OFF`.
    pub fn label(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }

    /// Display colour as a CSS hex string.
    pub fn color(self) -> &'static str {
        match self {
            Self::On => "#2ecc71",
            Self::Off => "#e74c3c",
        }
    }
}

impl From<bool> for LedState {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

/// Where the device serves its page assets from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemStatus {
    pub using_filesystem: bool,
    /// Human-readable status, e.g. "LittleFS Active".
    pub status: String,
}

impl FilesystemStatus {
    /// Short badge text.
    pub fn source_label(&self) -> &'static str {
        if self.using_filesystem { "Filesystem" } else { "Embedded" }
    }
}
