use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::WireError;

/// Read one length-prefixed frame. `Ok(None)` means the link closed cleanly
/// before any bytes of a new frame arrived; `Err(BrokenLink)` means it
/// closed partway through a frame (length prefix or payload).
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>, WireError> {
    let mut len_buf = [0u8; 4];
    let read = fill(reader, &mut len_buf).await?;
    if read == 0 {
        return Ok(None);
    }
    if read < len_buf.len() {
        return Err(WireError::BrokenLink);
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    let mut payload = vec![0u8; len];
    let read = fill(reader, &mut payload).await?;
    if read < payload.len() {
        return Err(WireError::BrokenLink);
    }
    Ok(Some(payload))
}

/// Write one length-prefixed frame: `u32 big-endian length || payload`.
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) -> Result<(), WireError> {
    let len = u32::try_from(payload.len()).unwrap_or(u32::MAX);
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read into `buf` until it is full or the stream hits EOF, coalescing the
/// short reads TCP fragmentation produces. Returns the number of bytes
/// actually read, which is less than `buf.len()` only on EOF.
async fn fill<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let n = reader.read(&mut buf[total..]).await?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}
