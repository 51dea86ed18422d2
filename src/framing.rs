//! Newline framing
//!
//! TCP delivers a byte stream, not messages: one read may hold half a
//! line or several lines. `LineReader` buffers until `\n` and carries
//! leftovers across reads.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

use crate::error::AppError;

/// Longest accepted line, delimiter included
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Buffered line reader over any async byte stream
pub struct LineReader<R> {
    inner: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: BufReader::new(reader),
            buf: Vec::new(),
        }
    }

    /// Read the next complete line, without its terminator
    ///
    /// Returns `Ok(None)` once the stream closes. Bytes after the last
    /// `\n` at close are an unfinished line and are dropped.
    pub async fn next_line(&mut self) -> Result<Option<String>, AppError> {
        self.buf.clear();

        let limit = MAX_LINE_LENGTH as u64;
        let n = (&mut self.inner)
            .take(limit)
            .read_until(b'\n', &mut self.buf)
            .await?;

        if n == 0 {
            return Ok(None);
        }

        if self.buf.last() != Some(&b'\n') {
            // Hit the limit with more data pending: the line is too long.
            // Otherwise the stream closed mid-line.
            if n as u64 == limit && !self.inner.fill_buf().await?.is_empty() {
                return Err(AppError::LineTooLong(MAX_LINE_LENGTH));
            }
            return Ok(None);
        }

        self.buf.pop();
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }

        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}
