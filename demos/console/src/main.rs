//! Terminal dashboard for a devlink device.
//!
//! Connects to the device's WebSocket endpoint, prints status and the
//! message log, and turns typed lines into commands. The connection is
//! re-established every `retry_delay_ms` whenever it drops.
//!
//!   cargo run -p devlink-demo-console -- --origin http://192.168.4.1
//!   cargo run -p devlink-demo-console -- --config devlink.toml

mod input;
mod terminal;

use clap::Parser;
use devlink_client::{ClientConfig, ClientHandle, ConnectionManager, WsConnector};
use input::Input;
use std::path::PathBuf;
use terminal::TerminalSink;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "devlink-console", about = "Terminal dashboard for a devlink device")]
struct Args {
    /// TOML config file; flags override its values.
    #[arg(short, long, env = "DEVLINK_CONFIG")]
    config: Option<PathBuf>,
    /// Origin the device page is served from, e.g. http://192.168.4.1.
    #[arg(long, env = "DEVLINK_ORIGIN")]
    origin: Option<String>,
    /// Device WebSocket port.
    #[arg(long)]
    port: Option<u16>,
    /// Fixed delay before reconnecting, in milliseconds.
    #[arg(long)]
    retry_ms: Option<u64>,
    /// Do not send GET_STATUS when a connection opens.
    #[arg(long)]
    no_status_on_open: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::load(path)?,
            None => ClientConfig::default(),
        };
        if let Some(origin) = self.origin {
            config.origin = origin;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(retry_ms) = self.retry_ms {
            config.retry_delay_ms = retry_ms;
        }
        if self.no_status_on_open {
            config.request_status_on_open = false;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("devlink_console=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config()?;
    let sink = TerminalSink::new(std::io::stdout(), config.auto_scroll);
    let manager = ConnectionManager::new(&config, WsConnector, sink)?;

    tracing::info!("Device endpoint {}", manager.endpoint());
    println!("{}", input::HELP);

    tokio::spawn(read_input(manager.handle()));
    manager.run().await;
    Ok(())
}

/// Forward stdin lines to the client until it stops or input ends.
async fn read_input(handle: ClientHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("stdin: {}", e);
                break;
            }
        };

        let sent = match input::parse_line(&line) {
            Input::Request(request) => handle.request(request),
            Input::Help => {
                println!("{}", input::HELP);
                Ok(())
            }
            Input::Invalid(reason) => {
                eprintln!("{reason} (type `help`)");
                Ok(())
            }
            Input::Empty => Ok(()),
        };
        if sent.is_err() {
            return;
        }
    }
    // End of input means quit.
    let _ = handle.shutdown();
}
