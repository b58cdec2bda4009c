//! Line framing: one JSON document per `\n`-terminated line.

use std::io::{self, BufRead, Read};

use bomber_shared::{ClientCommand, ProtocolError, ProtocolResult};

/// Longest excerpt of a bad frame that goes into a log line.
const LOG_EXCERPT_CHARS: usize = 120;

/// Encodes a command as one wire line, newline included.
pub fn encode_line(command: &ClientCommand) -> ProtocolResult<String> {
    let mut line = command.encode()?;
    line.push('\n');
    Ok(line)
}

/// Reads bounded lines from a byte stream.
///
/// A line longer than the limit is consumed up to its newline and reported
/// as [`ProtocolError::Oversized`]; the stream stays usable afterwards.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    limit: usize,
    buf: Vec<u8>,
}

impl<R: BufRead> LineReader<R> {
    /// Wraps a reader with a per-line byte limit.
    pub fn new(inner: R, limit: usize) -> Self {
        Self { inner, limit, buf: Vec::new() }
    }

    /// Next non-blank line.
    ///
    /// `Ok(None)` is end of stream. The inner result is the frame or the
    /// reason it was dropped.
    pub fn next_frame(&mut self) -> io::Result<Option<ProtocolResult<String>>> {
        loop {
            self.buf.clear();
            let cap = u64::try_from(self.limit).unwrap_or(u64::MAX).saturating_add(1);
            let n = (&mut self.inner).take(cap).read_until(b'\n', &mut self.buf)?;
            if n == 0 {
                return Ok(None);
            }

            let terminated = self.buf.last() == Some(&b'\n');
            if !terminated && self.buf.len() > self.limit {
                let len = self.buf.len() + self.skip_line()?;
                return Ok(Some(Err(ProtocolError::Oversized { len, limit: self.limit })));
            }

            while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
                self.buf.pop();
            }
            if self.buf.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Ok(Some(Ok(String::from_utf8_lossy(&self.buf).into_owned())));
        }
    }

    /// Discards through the next newline; returns bytes skipped before it.
    fn skip_line(&mut self) -> io::Result<usize> {
        let mut skipped = 0;
        loop {
            let available = self.inner.fill_buf()?;
            if available.is_empty() {
                return Ok(skipped);
            }
            if let Some(i) = available.iter().position(|b| *b == b'\n') {
                self.inner.consume(i + 1);
                return Ok(skipped + i);
            }
            let len = available.len();
            self.inner.consume(len);
            skipped += len;
        }
    }
}

/// Shortens a frame for logging without splitting a character.
#[must_use]
pub fn excerpt(frame: &str) -> &str {
    match frame.char_indices().nth(LOG_EXCERPT_CHARS) {
        Some((end, _)) => &frame[..end],
        None => frame,
    }
}
