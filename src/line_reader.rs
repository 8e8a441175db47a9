//! Line reading with a hard per-line memory cap.
//!
//! `BufRead::read_line` grows its buffer until it finds a newline, so one
//! pathological line can pull an entire file into memory. [`BoundedLineReader`]
//! stops buffering at `max_line_bytes` and discards the rest of that line.

use std::borrow::Cow;
use std::io::{self, BufRead};

/// Outcome of one [`BoundedLineReader::read_line`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStatus {
    /// A full line is available through [`BoundedLineReader::line`].
    Complete,
    /// The line exceeded the limit and was dropped. `length` is its full size
    /// in bytes, terminator excluded.
    Oversized { length: usize },
}

pub struct BoundedLineReader<R> {
    inner: R,
    buf: Vec<u8>,
    max_line_bytes: usize,
    bytes_read: u64,
}

impl<R: BufRead> BoundedLineReader<R> {
    pub fn new(inner: R, max_line_bytes: usize) -> Self {
        Self {
            inner,
            buf: Vec::new(),
            max_line_bytes,
            bytes_read: 0,
        }
    }

    /// Read the next line. Returns `Ok(None)` at end of input. A final line
    /// without a trailing newline is still returned.
    pub fn read_line(&mut self) -> io::Result<Option<LineStatus>> {
        self.buf.clear();
        let mut length = 0usize;
        let mut last = None;
        let mut saw_any = false;

        loop {
            let available = match self.inner.fill_buf() {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if available.is_empty() {
                break;
            }
            saw_any = true;

            let (chunk, consumed, done) = match available.iter().position(|&b| b == b'\n') {
                Some(i) => (&available[..i], i + 1, true),
                None => (available, available.len(), false),
            };

            length += chunk.len();
            if let Some(&b) = chunk.last() {
                last = Some(b);
            }
            let room = self.max_line_bytes.saturating_sub(self.buf.len());
            self.buf.extend_from_slice(&chunk[..chunk.len().min(room)]);

            self.inner.consume(consumed);
            self.bytes_read += consumed as u64;
            if done {
                break;
            }
        }

        if !saw_any {
            return Ok(None);
        }

        if last == Some(b'\r') {
            length -= 1;
            self.buf.truncate(length);
        }

        if length > self.max_line_bytes {
            self.buf.clear();
            return Ok(Some(LineStatus::Oversized { length }));
        }
        Ok(Some(LineStatus::Complete))
    }

    /// The most recent complete line, invalid UTF-8 replaced.
    pub fn line(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buf)
    }

    /// Total bytes consumed from the underlying reader, terminators included.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Current buffer capacity. Never grows much past `max_line_bytes`.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }
}
