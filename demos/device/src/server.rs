//! WebSocket server speaking the device protocol.

use crate::device::{Device, Reaction};
use devlink_core::DeviceMessage;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{RwLock, broadcast};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

type SharedDevice = Arc<RwLock<Device>>;
type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Channels shared by every connection.
#[derive(Clone)]
struct Hub {
    device: SharedDevice,
    /// Frames for every client.
    broadcast_tx: broadcast::Sender<String>,
    /// Fired on `RESTART`; every connection drops.
    restart_tx: broadcast::Sender<()>,
}

impl Hub {
    fn broadcast(&self, msg: &DeviceMessage) -> anyhow::Result<()> {
        // No receivers just means no clients.
        let _ = self.broadcast_tx.send(msg.encode()?);
        Ok(())
    }
}

pub async fn run(listener: TcpListener, device: Device, interval: Duration) -> anyhow::Result<()> {
    let hub = Hub {
        device: Arc::new(RwLock::new(device)),
        broadcast_tx: broadcast::channel(64).0,
        restart_tx: broadcast::channel(4).0,
    };

    tracing::info!("Listening on ws://{}", listener.local_addr()?);

    // Periodic status, like the firmware's main loop.
    let tick_hub = hub.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let info = {
                let mut d = tick_hub.device.write().await;
                d.tick();
                d.system_info()
            };
            if let Err(e) = tick_hub.broadcast(&info) {
                tracing::warn!("Status broadcast failed: {}", e);
            }
        }
    });

    loop {
        let (stream, client_addr) = listener.accept().await?;
        let hub = hub.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, client_addr, hub).await {
                tracing::warn!("Connection error from {}: {}", client_addr, e);
            }
        });
    }
}

async fn handle_connection(stream: TcpStream, addr: SocketAddr, hub: Hub) -> anyhow::Result<()> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let (mut sink, mut stream) = ws.split();

    // Subscribe before announcing so this client sees its own client_count.
    let mut broadcast_rx = hub.broadcast_tx.subscribe();
    let mut restart_rx = hub.restart_tx.subscribe();

    let (id, name) = {
        let mut d = hub.device.write().await;
        (d.connect(), d.name.clone())
    };
    tracing::info!("[{}] Connected from {}", id, addr);

    send_text(&mut sink, format!("Connected to {name}. Client #{id}")).await?;
    send_status(&mut sink, &hub).await?;
    let count = hub.device.read().await.client_count();
    hub.broadcast(&count)?;

    let result = serve(&mut sink, &mut stream, &mut broadcast_rx, &mut restart_rx, &hub, id).await;

    let count = {
        let mut d = hub.device.write().await;
        d.disconnect();
        d.client_count()
    };
    hub.broadcast(&count)?;
    tracing::info!("[{}] Disconnected", id);
    result
}

async fn serve(
    sink: &mut WsSink,
    stream: &mut futures_util::stream::SplitStream<WebSocketStream<TcpStream>>,
    broadcast_rx: &mut broadcast::Receiver<String>,
    restart_rx: &mut broadcast::Receiver<()>,
    hub: &Hub,
    id: u64,
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            msg = stream.next() => {
                let msg = match msg {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        tracing::debug!("[{}] WebSocket error: {}", id, e);
                        return Ok(());
                    }
                    None => return Ok(()),
                };

                match msg {
                    Message::Text(text) => {
                        tracing::debug!("[{}] Received: {}", id, text.as_str());
                        let reaction = hub.device.write().await.handle(text.as_str());
                        if react(sink, hub, reaction).await? {
                            return Ok(());
                        }
                    }
                    Message::Binary(data) => {
                        tracing::debug!("[{}] Received binary length: {}", id, data.len());
                    }
                    Message::Close(_) => return Ok(()),
                    _ => {}
                }
            }

            frame = broadcast_rx.recv() => match frame {
                Ok(frame) => send_text(sink, frame).await?,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::debug!("[{}] Skipped {} broadcast frames", id, n);
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(()),
            },

            _ = restart_rx.recv() => {
                let _ = sink.close().await;
                return Ok(());
            }
        }
    }
}

/// Carry out a reaction. Returns `true` when the connection should end.
async fn react(sink: &mut WsSink, hub: &Hub, reaction: Reaction) -> anyhow::Result<bool> {
    match reaction {
        Reaction::Reply(text) => send_text(sink, text).await?,
        Reaction::ReplyAndBroadcast(text) => {
            send_text(sink, text).await?;
            let info = hub.device.read().await.system_info();
            hub.broadcast(&info)?;
        }
        Reaction::Status => send_status(sink, hub).await?,
        Reaction::Restart(text) => {
            send_text(sink, text).await?;
            tokio::time::sleep(Duration::from_secs(1)).await;
            hub.device.write().await.reset();
            tracing::info!("Restarting; dropping all clients");
            let _ = hub.restart_tx.send(());
            let _ = sink.close().await;
            return Ok(true);
        }
        Reaction::Ignore => {}
    }
    Ok(false)
}

async fn send_status(sink: &mut WsSink, hub: &Hub) -> anyhow::Result<()> {
    let (info, fs) = {
        let d = hub.device.read().await;
        (d.system_info(), d.filesystem_status())
    };
    send_text(sink, info.encode()?).await?;
    send_text(sink, fs.encode()?).await
}

async fn send_text(sink: &mut WsSink, text: String) -> anyhow::Result<()> {
    sink.send(Message::Text(text.into())).await?;
    Ok(())
}
