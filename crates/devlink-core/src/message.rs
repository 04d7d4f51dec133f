//! Wire messages.
//!
//! [`OutboundMessage`] is what the client sends. [`DeviceMessage`] is the
//! structured half of what a device sends; the client never deserializes it
//! directly (see [`crate::inbound`] for field-by-field validation), it exists
//! so device implementations produce the exact shape the client expects.

use crate::{CommandName, FilesystemStatus};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Messages sent from client to device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Ask the device to run a command.
    Command {
        command: CommandName,
        /// Epoch milliseconds at the time of sending.
        timestamp: u64,
    },
}

impl OutboundMessage {
    /// Build a command envelope stamped with the current time.
    pub fn command(command: CommandName) -> Self {
        Self::Command {
            command,
            timestamp: epoch_millis(),
        }
    }

    /// Serialize to a JSON text frame.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Parse a JSON text frame.
    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Structured messages sent from device to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceMessage {
    /// Full status snapshot.
    #[serde(rename_all = "camelCase")]
    SystemInfo {
        led_status: bool,
        counter: u64,
        free_heap: u64,
        uptime: u64,
    },
    /// Number of connected WebSocket clients.
    ClientCount { count: u64 },
    /// Whether the page assets come from flash storage or the built-in copy.
    #[serde(rename_all = "camelCase")]
    FilesystemStatus {
        using_filesystem: bool,
        status: String,
    },
}

impl DeviceMessage {
    /// A `filesystem_status` frame for `status`.
    pub fn filesystem(status: &FilesystemStatus) -> Self {
        Self::FilesystemStatus {
            using_filesystem: status.using_filesystem,
            status: status.status.clone(),
        }
    }

    /// Serialize to a JSON text frame.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Milliseconds since the Unix epoch, zero if the clock is before it.
pub fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_envelope_shape() {
        let text = OutboundMessage::command(CommandName::led_on()).encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "command");
        assert_eq!(value["command"], "LED_ON");
        assert!(value["timestamp"].as_u64().unwrap() > 0);

        let OutboundMessage::Command { command, .. } = OutboundMessage::decode(&text).unwrap();
        assert_eq!(command, CommandName::led_on());
    }

    #[test]
    fn decode_rejects_bad_name() {
        let text = r#"{"type":"command","command":"","timestamp":1}"#;
        assert!(OutboundMessage::decode(text).is_err());
    }

    #[test]
    fn device_message_uses_camel_case() {
        let text = DeviceMessage::SystemInfo {
            led_status: true,
            counter: 7,
            free_heap: 204_800,
            uptime: 61,
        }
        .encode()
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "system_info");
        assert_eq!(value["ledStatus"], true);
        assert_eq!(value["freeHeap"], 204_800);
    }
}
