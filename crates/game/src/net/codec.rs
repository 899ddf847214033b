//! Length-prefixed framing over a byte stream.
//!
//! Every frame is a 4-byte big-endian length followed by that many bytes of
//! packet archive. The one exception is the handshake: a single ASCII digit
//! written once, unframed, right after accept.

use std::io::{self, Read, Write};

use tokio::io::{AsyncRead, AsyncReadExt};

use super::protocol::{MAX_FRAME_SIZE, PacketError, parse_handshake};
use crate::PlayerIndex;

const LENGTH_PREFIX: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("connection closed by peer")]
    Closed,
    #[error("empty frame")]
    EmptyFrame,
    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge { len: usize, max: usize },
    #[error("invalid handshake byte {0:#04x}")]
    Handshake(u8),
    #[error(transparent)]
    Packet(#[from] PacketError),
    #[error("i/o error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for CodecError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => CodecError::Closed,
            _ => CodecError::Io(err),
        }
    }
}

pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>, CodecError> {
    check_length(payload.len())?;
    let mut frame = Vec::with_capacity(LENGTH_PREFIX + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<(), CodecError> {
    let frame = encode_frame(payload)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}

pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>, CodecError> {
    let mut prefix = [0u8; LENGTH_PREFIX];
    reader.read_exact(&mut prefix)?;
    let len = check_length(u32::from_be_bytes(prefix) as usize)?;

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

pub async fn read_frame_async<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, CodecError> {
    let mut prefix = [0u8; LENGTH_PREFIX];
    reader.read_exact(&mut prefix).await?;
    let len = check_length(u32::from_be_bytes(prefix) as usize)?;

    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

pub fn read_handshake<R: Read>(reader: &mut R) -> Result<PlayerIndex, CodecError> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    parse_handshake(byte[0]).ok_or(CodecError::Handshake(byte[0]))
}

pub async fn read_handshake_async<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<PlayerIndex, CodecError> {
    let byte = reader.read_u8().await?;
    parse_handshake(byte).ok_or(CodecError::Handshake(byte))
}

fn check_length(len: usize) -> Result<usize, CodecError> {
    if len == 0 {
        return Err(CodecError::EmptyFrame);
    }
    if len > MAX_FRAME_SIZE {
        return Err(CodecError::FrameTooLarge {
            len,
            max: MAX_FRAME_SIZE,
        });
    }
    Ok(len)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::net::protocol::{ClientMessage, ClientPacket};

    #[test]
    fn test_frame_through_stream() {
        let packet = ClientPacket::new(ClientMessage::Move { column: 5 });
        let mut wire = Vec::new();
        write_frame(&mut wire, &packet.serialize().unwrap()).unwrap();
        write_frame(&mut wire, &packet.serialize().unwrap()).unwrap();

        let mut cursor = Cursor::new(wire);
        for _ in 0..2 {
            let frame = read_frame(&mut cursor).unwrap();
            assert_eq!(ClientPacket::deserialize(&frame).unwrap(), packet);
        }
        assert!(matches!(read_frame(&mut cursor), Err(CodecError::Closed)));
    }

    #[test]
    fn test_zero_length_frame_is_error() {
        let mut cursor = Cursor::new(vec![0, 0, 0, 0]);
        assert!(matches!(read_frame(&mut cursor), Err(CodecError::EmptyFrame)));
        assert!(matches!(encode_frame(&[]), Err(CodecError::EmptyFrame)));
    }

    #[test]
    fn test_oversized_frame_is_error() {
        let len = (MAX_FRAME_SIZE as u32 + 1).to_be_bytes();
        let mut cursor = Cursor::new(len.to_vec());
        assert!(matches!(
            read_frame(&mut cursor),
            Err(CodecError::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn test_truncated_frame_reads_as_closed() {
        let mut cursor = Cursor::new(vec![0, 0, 0, 10, 1, 2]);
        assert!(matches!(read_frame(&mut cursor), Err(CodecError::Closed)));
    }

    #[test]
    fn test_handshake() {
        assert_eq!(read_handshake(&mut Cursor::new(b"1".to_vec())).unwrap(), 1);
        assert!(matches!(
            read_handshake(&mut Cursor::new(b"x".to_vec())),
            Err(CodecError::Handshake(b'x'))
        ));
    }

    #[tokio::test]
    async fn test_async_reader_matches_sync_writer() {
        let mut wire = b"0".to_vec();
        write_frame(&mut wire, b"hello").unwrap();

        let mut reader = wire.as_slice();
        assert_eq!(read_handshake_async(&mut reader).await.unwrap(), 0);
        assert_eq!(read_frame_async(&mut reader).await.unwrap(), b"hello");
    }
}
