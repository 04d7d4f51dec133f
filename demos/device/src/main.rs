//! Simulated devlink device.
//!
//! Speaks the same WebSocket protocol as the board firmware, so the console
//! can be tried without hardware:
//! - `LED_ON` / `LED_OFF` reply with "LED turned ON/OFF" and broadcast status
//! - `GET_STATUS` sends `system_info` and `filesystem_status`
//! - `RESTART` drops every client and resets uptime
//! - plain text is echoed back
//!
//! Run it next to the console:
//!   cargo run -p devlink-demo-device -- --port 8081
//!   cargo run -p devlink-demo-console -- --origin http://127.0.0.1 --port 8081

mod device;
mod server;

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "devlink-device", about = "Simulated devlink device")]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: std::net::IpAddr,
    /// WebSocket port (the firmware uses 81).
    #[arg(long, default_value_t = devlink_core::DEVICE_WS_PORT)]
    port: u16,
    /// Milliseconds between status broadcasts.
    #[arg(long, default_value_t = 1_000)]
    interval_ms: u64,
    /// Name used in greetings and restart notices.
    #[arg(long, default_value = "device")]
    name: String,
    /// Report page assets as served from flash storage.
    #[arg(long)]
    filesystem: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("devlink_device=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let addr = SocketAddr::new(args.host, args.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Starting {} on {}", args.name, addr);

    let device = device::Device::new(args.name, args.filesystem);
    server::run(listener, device, Duration::from_millis(args.interval_ms.max(1))).await
}
