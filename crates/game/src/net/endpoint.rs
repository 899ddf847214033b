use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};

use super::broadcast::{DeliveryError, Outbound};
use super::codec::{CodecError, read_frame_async};
use super::protocol::ClientPacket;
use super::registry::SlotId;
use crate::table::Table;

const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub type SharedTable = Arc<Mutex<Table<PeerHandle>>>;

#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Frames a peer may fall behind by before it is dropped.
    pub outbound_queue: usize,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self { outbound_queue: 64 }
    }
}

/// Registry entry for a TCP peer. Bytes go through a bounded queue to the
/// connection's writer task, so delivering never waits on the socket.
#[derive(Debug, Clone)]
pub struct PeerHandle {
    pub addr: SocketAddr,
    pub connected_at: Instant,
    outbound: mpsc::Sender<Arc<[u8]>>,
}

impl Outbound for PeerHandle {
    fn deliver(&self, bytes: Arc<[u8]>) -> Result<(), DeliveryError> {
        self.outbound.deliver(bytes)
    }
}

#[derive(Debug)]
enum Hangup {
    Read(CodecError),
    Write(io::Error),
    Retired,
}

impl std::fmt::Display for Hangup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hangup::Read(CodecError::Closed) => write!(f, "disconnected"),
            Hangup::Read(err) => write!(f, "protocol error: {}", err),
            Hangup::Write(err) => write!(f, "send failed: {}", err),
            Hangup::Retired => write!(f, "dropped by server"),
        }
    }
}

/// Accepts forever. Each socket runs in its own task; nothing that happens
/// on one connection can stop the loop or another connection.
pub async fn serve(listener: TcpListener, table: SharedTable, config: EndpointConfig) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                log::info!("Connected with {}", addr);
                tokio::spawn(handle_connection(
                    stream,
                    addr,
                    Arc::clone(&table),
                    config.clone(),
                ));
            }
            Err(err) => {
                log::warn!("Accept failed: {}", err);
                tokio::time::sleep(ACCEPT_BACKOFF).await;
            }
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    table: SharedTable,
    config: EndpointConfig,
) {
    if let Err(err) = stream.set_nodelay(true) {
        log::debug!("Could not set TCP_NODELAY for {}: {}", addr, err);
    }

    let (tx, rx) = mpsc::channel(config.outbound_queue.max(1));
    let peer = PeerHandle {
        addr,
        connected_at: Instant::now(),
        outbound: tx,
    };

    let joined = table.lock().await.join(peer);
    let slot = match joined {
        Ok(slot) => slot,
        Err(reason) => {
            log::info!("Closing {}: {}", addr, reason);
            return;
        }
    };

    let (reader, writer) = stream.into_split();
    let hangup = tokio::select! {
        err = read_loop(reader, slot, &table) => Hangup::Read(err),
        result = write_loop(writer, rx) => match result {
            Ok(()) => Hangup::Retired,
            Err(err) => Hangup::Write(err),
        },
    };

    log::info!("Client {} ({}) {}", slot.player, addr, hangup);
    table.lock().await.leave(slot);
}

async fn read_loop(mut reader: OwnedReadHalf, slot: SlotId, table: &SharedTable) -> CodecError {
    loop {
        let frame = match read_frame_async(&mut reader).await {
            Ok(frame) => frame,
            Err(err) => return err,
        };
        let packet = match ClientPacket::deserialize(&frame) {
            Ok(packet) => packet,
            Err(err) => return err.into(),
        };
        table.lock().await.handle(slot, packet.payload);
    }
}

/// Ends cleanly once the table drops this peer's sender.
async fn write_loop(
    mut writer: OwnedWriteHalf,
    mut rx: mpsc::Receiver<Arc<[u8]>>,
) -> io::Result<()> {
    while let Some(bytes) = rx.recv().await {
        writer.write_all(&bytes).await?;
    }
    writer.shutdown().await
}
