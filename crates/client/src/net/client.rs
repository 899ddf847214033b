use std::io;
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use dropfour::net::{read_frame, read_handshake, write_frame};
use dropfour::{ClientMessage, ClientPacket, CodecError, PlayerIndex, ServerMessage, ServerPacket};

use super::config::ClientConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("could not resolve {addr}: {source}")]
    Resolve { addr: String, source: io::Error },
    #[error("{0} did not resolve to any address")]
    NoAddress(String),
    #[error("could not connect to {addr}: {source}")]
    Connect { addr: String, source: io::Error },
    #[error("server closed the connection without assigning a seat")]
    Rejected,
    #[error("handshake failed: {0}")]
    Handshake(CodecError),
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NetworkEvent {
    Message(ServerMessage),
    Disconnected,
}

/// Blocking TCP connection to the game server.
///
/// Server messages are read on a background thread and queued until the UI
/// calls [`NetworkClient::poll`]. Writes happen inline on the caller's thread.
pub struct NetworkClient {
    stream: TcpStream,
    server_addr: SocketAddr,
    player: PlayerIndex,
    events: Receiver<NetworkEvent>,
    reader: Option<JoinHandle<()>>,
}

impl NetworkClient {
    pub fn connect(config: &ClientConfig) -> Result<Self, ConnectError> {
        let target = format!("{}:{}", config.host, config.port);
        let addrs: Vec<SocketAddr> = (config.host.as_str(), config.port)
            .to_socket_addrs()
            .map_err(|source| ConnectError::Resolve {
                addr: target.clone(),
                source,
            })?
            .collect();

        let mut last_err = None;
        let mut connected = None;
        for addr in &addrs {
            log::info!("Connecting to {}", addr);
            match TcpStream::connect_timeout(addr, config.connect_timeout()) {
                Ok(stream) => {
                    connected = Some((stream, *addr));
                    break;
                }
                Err(err) => {
                    log::debug!("Connect to {} failed: {}", addr, err);
                    last_err = Some(err);
                }
            }
        }

        let (mut stream, server_addr) = match (connected, last_err) {
            (Some(found), _) => found,
            (None, Some(source)) => {
                return Err(ConnectError::Connect {
                    addr: target,
                    source,
                });
            }
            (None, None) => return Err(ConnectError::NoAddress(target)),
        };

        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(config.connect_timeout()))?;
        let player = match read_handshake(&mut stream) {
            Ok(player) => player,
            Err(CodecError::Closed) => return Err(ConnectError::Rejected),
            Err(err) => return Err(ConnectError::Handshake(err)),
        };
        stream.set_read_timeout(None)?;
        log::info!("Connected to {} as player {}", server_addr, player + 1);

        let (tx, rx) = mpsc::channel();
        let reader_stream = stream.try_clone()?;
        let reader = thread::Builder::new()
            .name("dropfour-recv".to_string())
            .spawn(move || receive_loop(reader_stream, tx))?;

        Ok(Self {
            stream,
            server_addr,
            player,
            events: rx,
            reader: Some(reader),
        })
    }

    pub fn player(&self) -> PlayerIndex {
        self.player
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// Everything received since the last call, oldest first.
    pub fn poll(&self) -> Vec<NetworkEvent> {
        self.events.try_iter().collect()
    }

    pub fn send_move(&self, column: u8) -> Result<(), CodecError> {
        self.send(ClientMessage::Move { column })
    }

    pub fn request_restart(&self) -> Result<(), CodecError> {
        self.send(ClientMessage::RestartRequest)
    }

    fn send(&self, message: ClientMessage) -> Result<(), CodecError> {
        log::debug!("Sending {}", message.type_name());
        let bytes = ClientPacket::new(message).serialize()?;
        let mut stream = &self.stream;
        write_frame(&mut stream, &bytes)
    }

    pub fn shutdown(&mut self) {
        let _ = self.stream.shutdown(Shutdown::Both);
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

impl Drop for NetworkClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn receive(stream: &mut TcpStream) -> Result<ServerMessage, CodecError> {
    let frame = read_frame(stream)?;
    Ok(ServerPacket::deserialize(&frame)?.payload)
}

fn receive_loop(mut stream: TcpStream, events: Sender<NetworkEvent>) {
    loop {
        match receive(&mut stream) {
            Ok(message) => {
                log::debug!("Received {}", message.type_name());
                if events.send(NetworkEvent::Message(message)).is_err() {
                    return;
                }
            }
            Err(CodecError::Closed) => {
                log::info!("Server closed the connection");
                break;
            }
            Err(err) => {
                log::warn!("Dropping server connection: {}", err);
                break;
            }
        }
    }
    let _ = events.send(NetworkEvent::Disconnected);
}
