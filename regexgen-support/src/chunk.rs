/*!
The streaming chunk buffer every generated `FindReader`/`ReplaceReader`/
`SelectReader`/`RejectReader` is built on (`spec.md` §4.6).

The pure leftover/reportable-end arithmetic this module implements is
deliberately re-derived here rather than imported from `regexgen`'s own
`streaming::chunk` module (that module lives in the *generator*, this one
ships with the *generated code*, and the two crates are not allowed to
depend on each other in that direction). Keep the two in sync by hand; they
encode the same three formulas from `spec.md` §4.6.
*/

use std::io::{self, Read};

use crate::cancel::CancellationToken;

/// A growable read buffer that slides its retained suffix forward as
/// matches are committed, bounded by `buffer_size`/`max_leftover`
/// (`spec.md` §4.6, "Configuration"/"Chunk invariant").
pub struct ChunkBuffer<R> {
    reader: R,
    cancel: CancellationToken,
    buf: Vec<u8>,
    /// Bytes of `buf[..filled]` already reported as part of a committed
    /// match; never retained across a slide.
    committed_end: usize,
    filled: usize,
    buffer_size: usize,
    max_leftover: usize,
    stream_offset: usize,
    eof: bool,
}

impl<R: Read> ChunkBuffer<R> {
    pub fn new(reader: R, buffer_size: usize, max_leftover: usize, cancel: CancellationToken) -> ChunkBuffer<R> {
        ChunkBuffer {
            reader,
            cancel,
            buf: vec![0u8; buffer_size],
            committed_end: 0,
            filled: 0,
            buffer_size,
            max_leftover,
            stream_offset: 0,
            eof: false,
        }
    }

    /// The bytes currently available to search.
    pub fn data(&self) -> &[u8] {
        &self.buf[..self.filled]
    }

    /// Absolute stream offset of `self.data()[0]`.
    pub fn stream_offset(&self) -> usize {
        self.stream_offset
    }

    pub fn is_eof(&self) -> bool {
        self.eof
    }

    /// Marks `end` (relative to `data()`) as committed: no future slide may
    /// discard bytes before it.
    pub fn commit(&mut self, end: usize) {
        self.committed_end = self.committed_end.max(end);
    }

    /// Fills the buffer as full as possible, reading from `self.reader`.
    /// Returns the number of new bytes read (`0` at EOF).
    pub fn fill(&mut self) -> io::Result<usize> {
        self.cancel.check().map_err(io::Error::from)?;
        if self.eof {
            return Ok(0);
        }
        let mut total = 0;
        while self.filled < self.buf.len() {
            let n = self.reader.read(&mut self.buf[self.filled..])?;
            if n == 0 {
                self.eof = true;
                break;
            }
            self.filled += n;
            total += n;
        }
        Ok(total)
    }

    /// Whether the buffer is currently full (`spec.md` §4.6: matches near
    /// the tail are deferred only when the buffer is full).
    pub fn is_full(&self) -> bool {
        self.filled >= self.buffer_size
    }

    /// The last offset (relative to `data()`) a match may end at and still
    /// be reported this round.
    pub fn reportable_end(&self) -> usize {
        reportable_end(self.filled, self.max_leftover, self.is_full())
    }

    /// Slides the retained suffix to the front of the buffer, dropping
    /// everything before `max(committed_end, filled - max_leftover)`, and
    /// advances `stream_offset` by the number of bytes dropped. Returns
    /// `false` (no room was freed) when nothing could be slid, signaling the
    /// caller that the buffer is irrecoverably full for its current
    /// configuration (`max_leftover` too close to `buffer_size`).
    pub fn slide(&mut self) -> bool {
        let start = retained_start(self.committed_end, self.filled, self.max_leftover);
        if start == 0 {
            return false;
        }
        self.buf.copy_within(start..self.filled, 0);
        self.filled -= start;
        self.committed_end = self.committed_end.saturating_sub(start);
        self.stream_offset += start;
        true
    }
}

/// `spec.md` §4.6: matches ending past this point are deferred to the next
/// chunk, but only once the buffer is actually full.
pub fn reportable_end(data_len: usize, max_leftover: usize, buffer_full: bool) -> usize {
    if buffer_full {
        data_len.saturating_sub(max_leftover)
    } else {
        data_len
    }
}

/// `spec.md` §4.6, "Chunk invariant": retain at least `max_leftover` bytes,
/// or everything since the last committed match, whichever is larger.
pub fn retained_start(committed_end: usize, data_len: usize, max_leftover: usize) -> usize {
    committed_end.max(data_len.saturating_sub(max_leftover)).min(data_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_reads_until_eof_or_full() {
        let data = b"hello world".to_vec();
        let mut buf = ChunkBuffer::new(&data[..], 64, 8, CancellationToken::new());
        let n = buf.fill().unwrap();
        assert_eq!(n, data.len());
        assert!(buf.is_eof());
        assert_eq!(buf.data(), &data[..]);
    }

    #[test]
    fn slide_retains_the_configured_leftover() {
        let data = vec![b'x'; 100];
        let mut buf = ChunkBuffer::new(&data[..], 100, 10, CancellationToken::new());
        buf.fill().unwrap();
        buf.commit(50);
        assert!(buf.slide());
        assert_eq!(buf.data().len(), 50);
        assert_eq!(buf.stream_offset(), 50);
    }

    #[test]
    fn cancellation_surfaces_as_an_io_error() {
        let data = b"abc".to_vec();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut buf = ChunkBuffer::new(&data[..], 16, 4, cancel);
        assert!(buf.fill().is_err());
    }
}
