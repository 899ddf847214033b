pub mod board;
pub mod net;
pub mod projection;
pub mod session;
pub mod table;

pub use board::{Board, BoardGrid, COLUMN_COUNT, Cell, ROW_COUNT, WIN_LENGTH};
pub use net::{
    ClientMessage, ClientPacket, CodecError, DEFAULT_HOST, DEFAULT_PORT, DeliveryError,
    EndpointConfig, GameResult, Outbound, PacketError, PeerHandle, Registry, RegistryError,
    ServerMessage, ServerPacket, SharedTable, SlotId,
};
pub use projection::{GameView, RestartNotice, Status};
pub use session::{MoveRejected, Phase, RestartRejected, Session, SessionSnapshot};
pub use table::{Table, TableConfig, TableEvent};

/// Player number, 0 or 1, fixed for the lifetime of a connection.
pub type PlayerIndex = u8;

pub const PLAYER_COUNT: usize = 2;

#[inline]
pub fn opponent(player: PlayerIndex) -> PlayerIndex {
    1 - player
}
