//! Reconnecting WebSocket client for devlink devices.
//!
//! [`ConnectionManager`] owns the single link to a device, reconnects on a
//! fixed delay whenever it closes, and routes inbound frames to a
//! [`RenderSink`](devlink_core::RenderSink). Front ends drive it through a
//! cloned [`ClientHandle`] while [`ConnectionManager::run`] processes one
//! event at a time.

mod config;
mod error;
mod event;
mod handle;
mod manager;
mod timer;
mod transport;

pub use config::{ClientConfig, ConfigError};
pub use error::ClientError;
pub use event::ConnectionEvent;
pub use handle::{ClientHandle, UiRequest};
pub use manager::ConnectionManager;
pub use timer::ReconnectTimer;
pub use transport::{Connector, Link, LinkEvents, WsConnector};
