//! Gateway Demo
//!
//! Runs the compatibility gateway against a simulated WhatsApp connection.
//!
//! The first `/session/qr` or `/session/status` call creates the `default`
//! session. It shows a QR code for a while and then reports `open`. Every
//! line typed on stdin becomes an inbound message, which is forwarded to
//! `RAPIDPRO_INBOUND_URL` (when set) before it is logged.
//!
//! Stdin lines are `<from>: <text>`, or just `<text>` from a fixed sender.
//!
//! # Usage
//!
//! ```bash
//! RAPIDPRO_INBOUND_URL=http://localhost:8000/c/wa/receive \
//!     cargo run --package wagate-demo-gateway -- --bind 127.0.0.1:8080
//!
//! curl -X POST localhost:8080/session/status
//! curl -X POST localhost:8080/session/pairphone -d '{"phone":"+49 170 1234567"}'
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use rand::Rng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use wagate::core::{PairingError, PairingResult, RegistryResult, TransportResult};
use wagate::prelude::*;

const DEMO_SENDER: &str = "+15550100";

#[derive(Parser, Debug)]
#[command(about = "wagate gateway over a simulated WhatsApp connection")]
struct Args {
    /// Configuration file to load instead of searching the working directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding `server.host` and `server.port`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Seconds a new session shows its QR code before it connects.
    #[arg(long, default_value_t = 30)]
    connect_after: u64,
}

// ============================================================================
// Simulated Connection Layer
// ============================================================================

struct SimulatedSocket {
    session_id: String,
}

#[async_trait]
impl PairingSocket for SimulatedSocket {
    async fn request_pairing_code(&self, phone: &str) -> PairingResult<String> {
        if phone.len() < 6 {
            return Err(PairingError::Rejected(format!("{phone} is too short")));
        }
        let code = random_code(8);
        info!(session = %self.session_id, phone, code = %code, "Issued pairing code");
        Ok(format!("{}-{}", &code[..4], &code[4..]))
    }
}

/// Opens simulated sockets and reports each new session id.
struct SimulatedFactory {
    created: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl SocketFactory for SimulatedFactory {
    async fn create_socket(&self, session_id: &str) -> RegistryResult<BoxedPairingSocket> {
        let _ = self.created.send(session_id.to_string());
        Ok(Arc::new(SimulatedSocket {
            session_id: session_id.to_string(),
        }))
    }
}

fn random_code(len: usize) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTVWXYZ0123456789";
    let mut rng = rand::rng();
    (0..len)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Walks each new session through `connecting` with a QR code to `open`.
async fn drive_sessions(
    registry: Arc<MemorySessionRegistry>,
    mut created: mpsc::UnboundedReceiver<String>,
    connect_after: Duration,
) {
    while let Some(id) = created.recv().await {
        let registry = registry.clone();
        tokio::spawn(async move {
            let qr = format!("2@{}", random_code(32));
            registry.set_qr_code(&id, Some(qr)).await;
            info!(session = %id, "QR code ready");

            tokio::time::sleep(connect_after).await;
            if registry.set_connection_state(&id, ConnectionState::Open).await {
                info!(session = %id, "Session connected");
            }
        });
    }
}

// ============================================================================
// Stdin Inbox
// ============================================================================

/// Native inbox that reads one message per stdin line.
struct StdinMonitor;

#[async_trait]
impl InboxMonitor for StdinMonitor {
    async fn monitor(&self, options: InboxOptions) -> TransportResult<ListenerHandle> {
        let token = CancellationToken::new();
        let stop = token.clone();
        let Some(handler) = options.on_message else {
            warn!("Inbox started without a message handler");
            return Ok(ListenerHandle::new(options.account_id, token));
        };

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                let line = tokio::select! {
                    _ = stop.cancelled() => break,
                    line = lines.next_line() => line,
                };
                match line {
                    Ok(Some(line)) if !line.trim().is_empty() => {
                        handler.on_message(parse_line(&line)).await;
                    }
                    Ok(Some(_)) => {}
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "Failed to read stdin");
                        break;
                    }
                }
            }
        });

        Ok(ListenerHandle::new(options.account_id, token))
    }
}

fn parse_line(line: &str) -> InboundMessage {
    let message = match line.split_once(": ") {
        Some((from, text)) => InboundMessage::new(from.trim(), text),
        None => InboundMessage::new(DEMO_SENDER, line),
    };
    message.with_push_name("demo")
}

async fn log_message(message: InboundMessage) {
    info!("[{}] {}", message.from, message.body);
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (created_tx, created_rx) = mpsc::unbounded_channel();
    let registry = Arc::new(MemorySessionRegistry::new(Arc::new(SimulatedFactory {
        created: created_tx,
    })));

    let mut builder = GatewayRuntime::builder().registry(registry.clone());
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    if let Some(bind) = &args.bind {
        builder = builder.bind_addr(bind);
    }
    let runtime = builder.build()?;

    tokio::spawn(drive_sessions(
        registry,
        created_rx,
        Duration::from_secs(args.connect_after),
    ));

    let monitor = runtime.monitor_with_forwarding(StdinMonitor);
    let _inbox = monitor
        .monitor(InboxOptions::new("default").with_on_message(handler_fn(log_message)))
        .await?;

    runtime.run().await?;
    Ok(())
}
