//! Transport seam.
//!
//! A [`Connector`] opens one link per call and reports what happens on it
//! through [`LinkEvents`]. [`WsConnector`] is the real WebSocket transport;
//! tests plug in their own.

use crate::ClientError;
use crate::event::{ConnectionEvent, Signal};
use devlink_core::Endpoint;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

/// Opens links to a device.
pub trait Connector {
    /// Start connecting and return immediately. The outcome arrives later as
    /// events: `Opened` on success, or `TransportError` then `Closed`.
    fn connect(&mut self, endpoint: &Endpoint, events: LinkEvents) -> Link;
}

/// Event sender for one link. Events are tagged so the manager can drop
/// anything a replaced link still reports.
#[derive(Debug, Clone)]
pub struct LinkEvents {
    generation: u64,
    signals: mpsc::UnboundedSender<Signal>,
}

impl LinkEvents {
    pub(crate) fn new(generation: u64, signals: mpsc::UnboundedSender<Signal>) -> Self {
        Self {
            generation,
            signals,
        }
    }

    /// Report an event. Returns `false` once the manager is gone.
    pub fn emit(&self, event: ConnectionEvent) -> bool {
        self.signals
            .send(Signal::Link {
                generation: self.generation,
                event,
            })
            .is_ok()
    }
}

/// The manager's side of a link: a queue of outgoing text frames.
///
/// Dropping the link tells the transport to close.
#[derive(Debug)]
pub struct Link {
    outbound: mpsc::UnboundedSender<String>,
    task: Option<JoinHandle<()>>,
}

impl Link {
    pub fn new(outbound: mpsc::UnboundedSender<String>, task: Option<JoinHandle<()>>) -> Self {
        Self { outbound, task }
    }

    /// Queue a text frame. Fire-and-forget: success means queued, not delivered.
    pub fn send(&self, text: String) -> Result<(), ClientError> {
        self.outbound.send(text).map_err(|_| ClientError::LinkClosed)
    }

    /// Stop accepting frames and hand back the transport task, if any, so the
    /// caller can wait for the close handshake.
    pub fn close(self) -> Option<JoinHandle<()>> {
        let Self { outbound, task } = self;
        drop(outbound);
        task
    }
}

/// WebSocket transport over tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn connect(&mut self, endpoint: &Endpoint, events: LinkEvents) -> Link {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_link(endpoint.as_str().to_string(), rx, events));
        Link::new(tx, Some(task))
    }
}

async fn run_link(url: String, mut outbound: mpsc::UnboundedReceiver<String>, events: LinkEvents) {
    let ws = tokio::select! {
        result = tokio_tungstenite::connect_async(url.as_str()) => match result {
            Ok((ws, _)) => ws,
            Err(e) => {
                tracing::debug!("Connect to {} failed: {}", url, e);
                events.emit(ConnectionEvent::TransportError(e.to_string()));
                events.emit(ConnectionEvent::Closed);
                return;
            }
        },
        // Link dropped mid-handshake.
        _ = drain(&mut outbound) => return,
    };

    tracing::debug!("Connected to {}", url);
    events.emit(ConnectionEvent::Opened);
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            msg = stream.next() => {
                let msg = match msg {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        events.emit(ConnectionEvent::TransportError(e.to_string()));
                        break;
                    }
                    None => break,
                };

                match msg {
                    Message::Text(text) => {
                        events.emit(ConnectionEvent::Payload(text.as_str().to_owned()));
                    }
                    Message::Binary(data) => {
                        tracing::debug!("Ignoring binary frame of {} bytes", data.len());
                    }
                    Message::Close(frame) => {
                        tracing::debug!("Close frame from {}: {:?}", url, frame);
                        break;
                    }
                    _ => {}
                }
            }

            frame = outbound.recv() => match frame {
                Some(text) => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        events.emit(ConnectionEvent::TransportError(e.to_string()));
                        break;
                    }
                }
                None => {
                    let _ = sink.close().await;
                    break;
                }
            }
        }
    }

    tracing::debug!("Link to {} closed", url);
    events.emit(ConnectionEvent::Closed);
}

/// Resolves once every sender is gone; frames queued before then are dropped.
async fn drain(outbound: &mut mpsc::UnboundedReceiver<String>) {
    while outbound.recv().await.is_some() {}
}
