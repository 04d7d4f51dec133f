/// Errors surfaced to callers of the client API.
///
/// Transport failures are not in here: they become log entries and a
/// reconnect, never an error returned to the UI.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("client task is no longer running")]
    Stopped,
    #[error("link is closed")]
    LinkClosed,
}
