use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize, rancor};

use crate::PlayerIndex;
use crate::board::{BoardGrid, COLUMN_COUNT};

pub const MAX_FRAME_SIZE: usize = 1200;
pub const PROTOCOL_VERSION: u32 = 1;
pub const PROTOCOL_MAGIC: u32 = 0x4434_4650;
pub const DEFAULT_PORT: u16 = 5555;
pub const DEFAULT_HOST: &str = "localhost";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct PacketHeader {
    pub magic: u32,
    pub version: u32,
}

impl PacketHeader {
    pub fn new() -> Self {
        Self {
            magic: PROTOCOL_MAGIC,
            version: PROTOCOL_VERSION,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == PROTOCOL_MAGIC && self.version == PROTOCOL_VERSION
    }
}

impl Default for PacketHeader {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum GameResult {
    Win,
    Draw,
}

/// Client to server intents.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum ClientMessage {
    Move { column: u8 },
    RestartRequest,
}

/// Server to client state changes.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum ServerMessage {
    GameStart {
        board: BoardGrid,
        turn: PlayerIndex,
        game_over: bool,
        game_id: u64,
    },
    GameUpdate {
        board: BoardGrid,
        turn: PlayerIndex,
        game_over: bool,
        result: Option<GameResult>,
        winner: Option<PlayerIndex>,
    },
    RestartRequested {
        player: PlayerIndex,
        waiting_restart: [bool; 2],
    },
    PlayerDisconnected {
        player: PlayerIndex,
    },
}

impl ServerMessage {
    pub fn type_name(&self) -> &'static str {
        match self {
            ServerMessage::GameStart { .. } => "game_start",
            ServerMessage::GameUpdate { .. } => "game_update",
            ServerMessage::RestartRequested { .. } => "restart_requested",
            ServerMessage::PlayerDisconnected { .. } => "player_disconnected",
        }
    }

    /// Field-level checks the archive layout alone cannot express.
    pub fn validate(&self) -> Result<(), PacketError> {
        match self {
            ServerMessage::GameStart { board, turn, .. } => {
                validate_grid(board)?;
                validate_player("turn", *turn)
            }
            ServerMessage::GameUpdate {
                board,
                turn,
                game_over,
                result,
                winner,
            } => {
                validate_grid(board)?;
                validate_player("turn", *turn)?;
                match (result, winner) {
                    (Some(GameResult::Win), Some(w)) if *game_over => validate_player("winner", *w),
                    (Some(GameResult::Draw), None) | (None, None) if *game_over == result.is_some() => {
                        Ok(())
                    }
                    _ => Err(PacketError::InvalidField("result")),
                }
            }
            ServerMessage::RestartRequested { player, .. } => validate_player("player", *player),
            ServerMessage::PlayerDisconnected { player } => validate_player("player", *player),
        }
    }
}

impl ClientMessage {
    pub fn type_name(&self) -> &'static str {
        match self {
            ClientMessage::Move { .. } => "move",
            ClientMessage::RestartRequest => "restart_request",
        }
    }

}

fn validate_grid(board: &BoardGrid) -> Result<(), PacketError> {
    if board.iter().flatten().all(|&v| v <= 2) {
        Ok(())
    } else {
        Err(PacketError::InvalidField("board"))
    }
}

fn validate_player(field: &'static str, player: PlayerIndex) -> Result<(), PacketError> {
    if player <= 1 {
        Ok(())
    } else {
        Err(PacketError::InvalidField(field))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
    #[error("bad packet header (magic {magic:#x}, version {version})")]
    BadHeader { magic: u32, version: u32 },
    #[error("invalid value in field `{0}`")]
    InvalidField(&'static str),
}

macro_rules! packet {
    ($name:ident, $payload:ty $(, $validate:ident)?) => {
        #[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize)]
        #[rkyv(derive(Debug))]
        pub struct $name {
            pub header: PacketHeader,
            pub payload: $payload,
        }

        impl $name {
            pub fn new(payload: $payload) -> Self {
                Self {
                    header: PacketHeader::new(),
                    payload,
                }
            }

            pub fn serialize(&self) -> Result<Vec<u8>, PacketError> {
                rkyv::to_bytes::<rancor::Error>(self)
                    .map(|aligned| aligned.into_vec())
                    .map_err(PacketError::Serialize)
            }

            /// Validates the archive and the header, plus the payload fields
            /// for packet types that declare a validator.
            pub fn deserialize(data: &[u8]) -> Result<Self, PacketError> {
                let mut aligned = AlignedVec::<16>::with_capacity(data.len());
                aligned.extend_from_slice(data);

                let packet = rkyv::from_bytes::<Self, rancor::Error>(&aligned)
                    .map_err(PacketError::Deserialize)?;

                if !packet.header.is_valid() {
                    return Err(PacketError::BadHeader {
                        magic: packet.header.magic,
                        version: packet.header.version,
                    });
                }
                $(packet.payload.$validate()?;)?
                Ok(packet)
            }
        }
    };
}

// A column out of range is a game rule, answered by ignoring the move, so
// client payloads are not field-checked at the wire.
packet!(ClientPacket, ClientMessage);
packet!(ServerPacket, ServerMessage, validate);

/// Handshake byte announcing the assigned player index.
pub fn handshake_byte(player: PlayerIndex) -> u8 {
    b'0' + player
}

pub fn parse_handshake(byte: u8) -> Option<PlayerIndex> {
    match byte {
        b'0' => Some(0),
        b'1' => Some(1),
        _ => None,
    }
}

pub fn is_valid_column(column: u8) -> bool {
    (column as usize) < COLUMN_COUNT
}
