//! Core types for devlink.
//!
//! This crate holds everything that does not touch a socket: the command
//! envelope, endpoint derivation, inbound payload classification, the
//! SystemInfo updater and the [`RenderSink`] a front end implements.

mod command;
mod endpoint;
pub mod inbound;
mod log;
mod message;
mod render;
mod system_info;
mod uptime;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use command::{CommandName, CommandNameError};
pub use endpoint::{DEVICE_WS_PORT, Endpoint, EndpointError};
pub use inbound::{DeviceUpdate, Inbound, SkippedField, Structured, TextSignal, classify, route};
pub use log::{LogCategory, LogEntry, MessageLog};
pub use message::{DeviceMessage, OutboundMessage, epoch_millis};
pub use render::RenderSink;
pub use system_info::{FilesystemStatus, LedState, SystemInfo, format_free_heap};
pub use uptime::format_uptime;

/// Transport lifecycle state, named after the WebSocket ready states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// Handshake in flight.
    Connecting,
    /// Frames can be sent.
    Open,
    /// Local teardown started.
    Closing,
    /// Link gone; a reconnect may be pending.
    Closed,
}

impl ReadyState {
    /// Upper-case label used in user-visible log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "CONNECTING",
            Self::Open => "OPEN",
            Self::Closing => "CLOSING",
            Self::Closed => "CLOSED",
        }
    }

    /// Label for an optional state; `UNKNOWN` before any link exists.
    pub fn label(state: Option<Self>) -> &'static str {
        state.map_or("UNKNOWN", Self::as_str)
    }
}

impl std::fmt::Display for ReadyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_state_labels() {
        assert_eq!(ReadyState::label(Some(ReadyState::Connecting)), "CONNECTING");
        assert_eq!(ReadyState::label(Some(ReadyState::Closed)), "CLOSED");
        assert_eq!(ReadyState::label(None), "UNKNOWN");
    }
}
