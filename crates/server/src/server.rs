use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use tokio::net::TcpListener;
use tokio::sync::Mutex;

use dropfour::{EndpointConfig, PlayerIndex, SessionSnapshot, SharedTable, Table, TableEvent};

use crate::config::ServerConfig;

pub struct GameServer {
    listener: TcpListener,
    table: SharedTable,
    endpoint: EndpointConfig,
    local_addr: SocketAddr,
    start_time: Instant,
}

impl GameServer {
    pub async fn bind(config: &ServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(config.bind_addr()).await?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            listener,
            table: Arc::new(Mutex::new(Table::new(config.table()))),
            endpoint: config.endpoint(),
            local_addr,
            start_time: Instant::now(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn monitor(&self) -> ServerMonitor {
        ServerMonitor {
            table: Arc::clone(&self.table),
            local_addr: self.local_addr,
            start_time: self.start_time,
        }
    }

    /// Serves until the surrounding runtime is dropped.
    pub async fn run(self) {
        dropfour::net::serve(self.listener, self.table, self.endpoint).await;
    }
}

/// Read side of a running server for the dashboard thread.
#[derive(Clone)]
pub struct ServerMonitor {
    table: SharedTable,
    local_addr: SocketAddr,
    start_time: Instant,
}

impl ServerMonitor {
    /// Must be called from outside the runtime.
    pub fn poll_blocking(&self) -> (ServerStats, Vec<TableEvent>) {
        let mut table = self.table.blocking_lock();
        let events = table.drain_events().collect();

        let players = table
            .registry()
            .broadcast_targets()
            .map(|(slot, peer)| PlayerInfo {
                player: slot.player,
                addr: peer.addr,
                connected_secs: peer.connected_at.elapsed().as_secs(),
            })
            .collect();

        let stats = ServerStats {
            local_addr: self.local_addr,
            uptime_secs: self.start_time.elapsed().as_secs(),
            session: table.snapshot(),
            players,
            seats_open: !table.registry().is_full() && !table.registry().is_draining(),
        };
        (stats, events)
    }
}

#[derive(Debug, Clone)]
pub struct ServerStats {
    pub local_addr: SocketAddr,
    pub uptime_secs: u64,
    pub session: SessionSnapshot,
    pub players: Vec<PlayerInfo>,
    /// False while both seats are taken or the last pairing is still leaving.
    pub seats_open: bool,
}

#[derive(Debug, Clone)]
pub struct PlayerInfo {
    pub player: PlayerIndex,
    pub addr: SocketAddr,
    pub connected_secs: u64,
}
