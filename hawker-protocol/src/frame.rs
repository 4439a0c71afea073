//! Length-prefixed CBOR framing.
//!
//! A frame is a big-endian `u32` byte count followed by that many bytes of
//! CBOR. The length prefix is bounded so a corrupt or hostile peer cannot
//! make us allocate unbounded buffers.

use crate::error::ProtocolError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on a single frame body.
pub const MAX_FRAME_BYTES: usize = 1 << 20;

/// Encode `msg` and write it as one frame.
pub async fn write_frame<W, T>(writer: &mut W, msg: &T) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
    T: minicbor::Encode<()>,
{
    let mut body = Vec::with_capacity(128);
    minicbor::encode(msg, &mut body)?;
    if body.len() > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge {
            got: body.len(),
            limit: MAX_FRAME_BYTES,
        });
    }
    writer.write_u32(body.len() as u32).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame and decode it. Returns `Ok(None)` on a clean EOF at a
/// frame boundary.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<Option<T>, ProtocolError>
where
    R: AsyncRead + Unpin,
    T: for<'b> minicbor::Decode<'b, ()>,
{
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if len > MAX_FRAME_BYTES {
        return Err(ProtocolError::FrameTooLarge {
            got: len,
            limit: MAX_FRAME_BYTES,
        });
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(minicbor::decode(&body)?))
}
