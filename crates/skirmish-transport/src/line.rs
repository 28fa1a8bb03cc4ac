//! Newline framing over any `AsyncRead`.

use bytes::{Bytes, BytesMut};
use memchr::memchr;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::TransportError;

/// Splits a byte stream into `\n`-terminated frames.
///
/// A trailing `\r` is stripped so telnet-style clients work too. Bytes left
/// in the buffer when the peer closes are returned as a final frame.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    buf: BytesMut,
    max_line_len: usize,
}

impl<R> LineReader<R> {
    pub fn new(inner: R, max_line_len: usize) -> Self {
        let max_line_len = max_line_len.max(1);
        Self {
            inner,
            buf: BytesMut::with_capacity(max_line_len.min(8 * 1024)),
            max_line_len,
        }
    }
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Reads one frame without its line terminator.
    ///
    /// Returns:
    /// - `Ok(Some(bytes))` for a frame (may be empty),
    /// - `Ok(None)` on clean EOF with no buffered data.
    pub async fn read_line(&mut self) -> Result<Option<Bytes>, TransportError> {
        loop {
            if let Some(i) = memchr(b'\n', &self.buf) {
                if content_len(&self.buf[..i]) > self.max_line_len {
                    return Err(TransportError::FrameTooLong(self.max_line_len));
                }
                let raw = self.buf.split_to(i + 1).freeze();
                return Ok(Some(trim_crlf(raw)));
            }

            if content_len(&self.buf) > self.max_line_len {
                return Err(TransportError::FrameTooLong(self.max_line_len));
            }

            let n = self
                .inner
                .read_buf(&mut self.buf)
                .await
                .map_err(TransportError::ReceiveFailed)?;
            if n == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                let rest = self.buf.split().freeze();
                return Ok(Some(trim_crlf(rest)));
            }
        }
    }
}

/// Length of a partial or complete line, not counting a trailing `\r`.
/// The limit applies to the frame content only, whatever the line ending.
fn content_len(line: &[u8]) -> usize {
    match line.last() {
        Some(b'\r') => line.len() - 1,
        _ => line.len(),
    }
}

fn trim_crlf(mut b: Bytes) -> Bytes {
    let mut end = b.len();
    if end > 0 && b[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && b[end - 1] == b'\r' {
        end -= 1;
    }
    b.truncate(end);
    b
}
