//! Bounded capture of child output streams.

use tokio::io::{AsyncRead, AsyncReadExt};

const CHUNK_SIZE: usize = 8 * 1024;

/// Bytes captured from one stream
#[derive(Debug, Default)]
pub struct Captured {
    pub bytes: Vec<u8>,
    pub truncated: bool,
    /// Bytes read from the stream, kept or not
    pub total: usize,
}

impl Captured {
    /// Decode as UTF-8 without exceeding `max_bytes`
    pub fn into_string(self, max_bytes: usize) -> String {
        let mut text = String::from_utf8_lossy(&self.bytes).into_owned();
        truncate_utf8(&mut text, max_bytes);
        text
    }
}

/// Read a stream to EOF, keeping at most `max_bytes`
///
/// Bytes past the bound are read and discarded so the child never blocks on
/// a full pipe. A read error ends the capture with what was kept so far.
pub async fn read_bounded<R: AsyncRead + Unpin>(mut reader: R, max_bytes: usize) -> Captured {
    let mut captured = Captured::default();
    let mut chunk = vec![0u8; CHUNK_SIZE];

    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                captured.total += n;
                let room = max_bytes.saturating_sub(captured.bytes.len());
                if n > room {
                    captured.truncated = true;
                }
                captured.bytes.extend_from_slice(&chunk[..n.min(room)]);
            }
            Err(e) => {
                tracing::debug!("Output stream read failed: {}", e);
                break;
            }
        }
    }

    captured
}

/// Shorten a string to at most `max_bytes`, on a character boundary
pub fn truncate_utf8(text: &mut String, max_bytes: usize) -> bool {
    if text.len() <= max_bytes {
        return false;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
    true
}
