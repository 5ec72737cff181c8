//! Length-delimited framing for command streams.
//!
//! Each frame is a big-endian `u32` length followed by that many payload
//! bytes.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{trace, warn};

/// Default maximum frame size accepted on command streams (64 KiB).
pub const MAX_COMMAND_FRAME_BYTES: usize = 64 * 1024;

const LEN_PREFIX: usize = 4;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame exceeds max: {len} > {max}")]
    Oversize { len: usize, max: usize },
    #[error("stream ended inside a frame, expected {expected} bytes")]
    Truncated { expected: usize },
    #[error("frame io failed: {0}")]
    Io(#[from] io::Error),
}

/// Write one frame, refusing payloads above `max_frame_bytes`.
pub async fn write_frame<W>(
    writer: &mut W,
    payload: &[u8],
    max_frame_bytes: usize,
) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > max_frame_bytes || payload.len() > u32::MAX as usize {
        return Err(FrameError::Oversize {
            len: payload.len(),
            max: max_frame_bytes,
        });
    }
    let len = payload.len() as u32;

    trace!(stage = "write_frame", len, "writing command frame");
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame.
///
/// Returns `Ok(None)` when the stream ends cleanly on a frame boundary.
pub async fn read_frame<R>(
    reader: &mut R,
    max_frame_bytes: usize,
) -> Result<Option<Vec<u8>>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; LEN_PREFIX];
    let n = reader.read(&mut len_buf).await?;
    if n == 0 {
        return Ok(None);
    }
    if n < LEN_PREFIX {
        read_exact_or_truncated(reader, &mut len_buf[n..], LEN_PREFIX).await?;
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > max_frame_bytes {
        warn!(len, max = max_frame_bytes, "rejecting oversize command frame");
        return Err(FrameError::Oversize {
            len,
            max: max_frame_bytes,
        });
    }

    let mut payload = vec![0u8; len];
    trace!(stage = "read_frame", len, "reading command frame");
    read_exact_or_truncated(reader, &mut payload, len).await?;
    Ok(Some(payload))
}

async fn read_exact_or_truncated<R>(
    reader: &mut R,
    buf: &mut [u8],
    expected: usize,
) -> Result<(), FrameError>
where
    R: AsyncRead + Unpin,
{
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            Err(FrameError::Truncated { expected })
        }
        Err(e) => Err(e.into()),
    }
}
