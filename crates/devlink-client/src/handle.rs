use crate::ClientError;
use devlink_core::CommandName;
use tokio::sync::mpsc;

/// Requests a front end can make of a running client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiRequest {
    /// Send a command if the link is open, otherwise log an error.
    SendCommand(CommandName),
    ClearMessages,
    ToggleAutoScroll,
    /// Stop the client: cancel any reconnect and close the link.
    Shutdown,
}

/// Cloneable handle for UI code; requests are applied by
/// [`ConnectionManager::run`](crate::ConnectionManager::run) in order.
///
/// Errors only mean the client task has stopped. Whether a command actually
/// went out is reported through the message log.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    requests: mpsc::UnboundedSender<UiRequest>,
}

impl ClientHandle {
    pub(crate) fn new(requests: mpsc::UnboundedSender<UiRequest>) -> Self {
        Self { requests }
    }

    /// Queue a command for the device.
    pub fn send_command(&self, name: CommandName) -> Result<(), ClientError> {
        self.request(UiRequest::SendCommand(name))
    }

    /// Empty the message log.
    pub fn clear_messages(&self) -> Result<(), ClientError> {
        self.request(UiRequest::ClearMessages)
    }

    /// Flip auto-scroll.
    pub fn toggle_auto_scroll(&self) -> Result<(), ClientError> {
        self.request(UiRequest::ToggleAutoScroll)
    }

    /// Ask the client to stop. [`run`](crate::ConnectionManager::run)
    /// returns once the link is closed.
    pub fn shutdown(&self) -> Result<(), ClientError> {
        self.request(UiRequest::Shutdown)
    }

    /// Send any request.
    pub fn request(&self, request: UiRequest) -> Result<(), ClientError> {
        self.requests.send(request).map_err(|_| ClientError::Stopped)
    }
}
