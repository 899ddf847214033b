mod broadcast;
mod codec;
mod endpoint;
mod protocol;
mod registry;

pub use broadcast::{DeliveryError, Outbound, broadcast, encode_server_frame};
pub use codec::{
    CodecError, encode_frame, read_frame, read_frame_async, read_handshake, read_handshake_async,
    write_frame,
};
pub use endpoint::{EndpointConfig, PeerHandle, SharedTable, serve};
pub use protocol::{
    ClientMessage, ClientPacket, DEFAULT_HOST, DEFAULT_PORT, GameResult, MAX_FRAME_SIZE,
    PROTOCOL_MAGIC, PROTOCOL_VERSION, PacketError, PacketHeader, ServerMessage, ServerPacket,
    handshake_byte, is_valid_column, parse_handshake,
};
pub use registry::{Registry, RegistryError, SlotId};
