use std::sync::Arc;

use tokio::sync::mpsc;

use super::codec::{CodecError, encode_frame};
use super::protocol::{ServerMessage, ServerPacket};
use super::registry::{Registry, SlotId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("recipient is gone")]
    Closed,
    #[error("recipient is not draining its queue")]
    Backlogged,
}

/// Sink for bytes bound to a single peer. Implementations must not block.
pub trait Outbound {
    fn deliver(&self, bytes: Arc<[u8]>) -> Result<(), DeliveryError>;
}

impl Outbound for mpsc::Sender<Arc<[u8]>> {
    fn deliver(&self, bytes: Arc<[u8]>) -> Result<(), DeliveryError> {
        self.try_send(bytes).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Backlogged,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}

pub fn encode_server_frame(message: &ServerMessage) -> Result<Arc<[u8]>, CodecError> {
    let payload = ServerPacket::new(message.clone()).serialize()?;
    Ok(encode_frame(&payload)?.into())
}

/// Serializes once and hands the frame to every live recipient. Returns the
/// slots that could not take it; the caller decides how to retire them.
pub fn broadcast<C: Outbound>(
    registry: &Registry<C>,
    message: &ServerMessage,
) -> Result<Vec<SlotId>, CodecError> {
    let frame = encode_server_frame(message)?;

    let mut failed = Vec::new();
    for (slot, connection) in registry.broadcast_targets() {
        if let Err(err) = connection.deliver(Arc::clone(&frame)) {
            log::warn!(
                "Dropping player {} after failed {} delivery: {}",
                slot.player,
                message.type_name(),
                err
            );
            failed.push(slot);
        }
    }
    Ok(failed)
}
