//! Simulated device state.

use devlink_core::{DeviceMessage, FilesystemStatus, OutboundMessage};
use std::time::Instant;

/// Heap reported with no clients connected.
const BASE_FREE_HEAP: u64 = 245_760;
/// Heap each connected client costs.
const HEAP_PER_CLIENT: u64 = 4_096;

/// What the server should do after a frame from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    /// Reply to the sender only.
    Reply(String),
    /// Reply to the sender, then broadcast fresh status to everyone.
    ReplyAndBroadcast(String),
    /// Send status and filesystem frames to the sender.
    Status,
    /// Tell the sender, then drop every client and reset.
    Restart(String),
    Ignore,
}

pub struct Device {
    pub name: String,
    led: bool,
    counter: u64,
    booted: Instant,
    clients: u64,
    next_client: u64,
    filesystem: FilesystemStatus,
}

impl Device {
    pub fn new(name: String, using_filesystem: bool) -> Self {
        let status = if using_filesystem { "LittleFS Active" } else { "Embedded HTML" };
        Self {
            name,
            led: false,
            counter: 0,
            booted: Instant::now(),
            clients: 0,
            next_client: 0,
            filesystem: FilesystemStatus {
                using_filesystem,
                status: status.to_string(),
            },
        }
    }

    /// Register a client and return its number.
    pub fn connect(&mut self) -> u64 {
        let id = self.next_client;
        self.next_client += 1;
        self.clients += 1;
        id
    }

    pub fn disconnect(&mut self) {
        self.clients = self.clients.saturating_sub(1);
    }

    pub fn tick(&mut self) {
        self.counter += 1;
    }

    pub fn system_info(&self) -> DeviceMessage {
        DeviceMessage::SystemInfo {
            led_status: self.led,
            counter: self.counter,
            free_heap: BASE_FREE_HEAP.saturating_sub(self.clients * HEAP_PER_CLIENT),
            uptime: self.booted.elapsed().as_secs(),
        }
    }

    pub fn client_count(&self) -> DeviceMessage {
        DeviceMessage::ClientCount {
            count: self.clients,
        }
    }

    pub fn filesystem_status(&self) -> DeviceMessage {
        DeviceMessage::filesystem(&self.filesystem)
    }

    /// Apply one text frame from a client.
    pub fn handle(&mut self, text: &str) -> Reaction {
        if serde_json::from_str::<serde_json::Value>(text).is_err() {
            return Reaction::Reply(format!("Echo: {text}"));
        }
        let Ok(OutboundMessage::Command { command, .. }) = OutboundMessage::decode(text) else {
            tracing::debug!("Ignoring non-command JSON: {}", text);
            return Reaction::Ignore;
        };

        match command.as_str() {
            "LED_ON" => {
                self.led = true;
                tracing::info!("LED turned ON");
                Reaction::ReplyAndBroadcast("LED turned ON".to_string())
            }
            "LED_OFF" => {
                self.led = false;
                tracing::info!("LED turned OFF");
                Reaction::ReplyAndBroadcast("LED turned OFF".to_string())
            }
            "GET_STATUS" => Reaction::Status,
            "RESTART" => Reaction::Restart(format!("Restarting {}...", self.name)),
            other => {
                tracing::debug!("Unknown command: {}", other);
                Reaction::Ignore
            }
        }
    }

    /// Power-cycle: LED off, counters and uptime from zero.
    pub fn reset(&mut self) {
        self.led = false;
        self.counter = 0;
        self.booted = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devlink_core::CommandName;

    fn command(name: CommandName) -> String {
        OutboundMessage::command(name).encode().unwrap()
    }

    fn led(device: &Device) -> bool {
        matches!(device.system_info(), DeviceMessage::SystemInfo { led_status: true, .. })
    }

    #[test]
    fn led_commands_toggle_state() {
        let mut device = Device::new("test".into(), false);
        assert_eq!(
            device.handle(&command(CommandName::led_on())),
            Reaction::ReplyAndBroadcast("LED turned ON".into())
        );
        assert!(led(&device));
        device.handle(&command(CommandName::led_off()));
        assert!(!led(&device));
    }

    #[test]
    fn plain_text_is_echoed() {
        let mut device = Device::new("test".into(), false);
        assert_eq!(device.handle("hello"), Reaction::Reply("Echo: hello".into()));
    }

    #[test]
    fn other_json_is_ignored() {
        let mut device = Device::new("test".into(), false);
        assert_eq!(device.handle(r#"{"type":"ping"}"#), Reaction::Ignore);
        assert_eq!(device.handle(&command("BLINK".parse().unwrap())), Reaction::Ignore);
    }

    #[test]
    fn status_and_restart() {
        let mut device = Device::new("bench".into(), true);
        assert_eq!(device.handle(&command(CommandName::get_status())), Reaction::Status);
        assert_eq!(
            device.handle(&command(CommandName::restart())),
            Reaction::Restart("Restarting bench...".into())
        );
    }

    #[test]
    fn heap_shrinks_with_clients() {
        let mut device = Device::new("test".into(), false);
        assert_eq!(device.connect(), 0);
        assert_eq!(device.connect(), 1);
        device.disconnect();
        device.tick();
        let DeviceMessage::SystemInfo { free_heap, counter, .. } = device.system_info() else {
            panic!("expected system info");
        };
        assert_eq!(free_heap, BASE_FREE_HEAP - HEAP_PER_CLIENT);
        assert_eq!(counter, 1);
        assert_eq!(device.client_count(), DeviceMessage::ClientCount { count: 1 });
    }
}
