/// Something that happened on a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Handshake completed.
    Opened,
    /// Link is gone, whatever the reason.
    Closed,
    /// A text frame arrived.
    Payload(String),
    /// Transport-level failure. A `Closed` is expected to follow.
    TransportError(String),
}

/// Internal queue item consumed by the manager.
#[derive(Debug)]
pub(crate) enum Signal {
    Link {
        generation: u64,
        event: ConnectionEvent,
    },
    ReconnectDue {
        generation: u64,
    },
}
