/*!
Pure chunk/leftover arithmetic for the streaming protocol (`spec.md` §4.6).

Deliberately free of any I/O: every function here takes plain integers (or
a match's end offset) and returns plain integers or booleans, so the
chunk-sliding invariant can be unit-tested without a fake `Read`
implementation. [`crate::streaming`] wires this arithmetic to an actual
buffer and reader.
*/

use crate::error::StreamConfigError;

/// One stream's worth of buffer-size/leftover configuration (`spec.md`
/// §4.6, "Configuration" table).
#[derive(Clone, Copy, Debug)]
pub struct ChunkConfig {
    pub buffer_size: usize,
    pub max_leftover: usize,
}

const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;
const MAX_LEFTOVER_CEILING: usize = 1024 * 1024;

impl ChunkConfig {
    /// `spec.md` §4.6: `buffer_size` defaults to 64 KiB, floored at
    /// `2*max_len`.
    pub fn default_buffer_size(max_len: usize) -> usize {
        DEFAULT_BUFFER_SIZE.max(saturating_double(max_len))
    }

    /// `spec.md` §4.6: `max_leftover` defaults to `min(10*max_len, 1 MiB)`,
    /// or 1 MiB outright if `max_len` is unbounded.
    pub fn default_max_leftover(max_len: usize) -> usize {
        if max_len == crate::analysis::UNBOUNDED {
            return MAX_LEFTOVER_CEILING;
        }
        max_len.saturating_mul(10).min(MAX_LEFTOVER_CEILING)
    }

    /// Builds a config for `max_len`, using the spec's defaults for any
    /// `None` field and validating the result (`spec.md` §7:
    /// "Streaming-config: buffer smaller than `2*max_len` -> config error
    /// before reading").
    pub fn new(
        max_len: usize,
        buffer_size: Option<usize>,
        max_leftover: Option<usize>,
    ) -> Result<ChunkConfig, StreamConfigError> {
        let buffer_size = buffer_size.unwrap_or_else(|| Self::default_buffer_size(max_len));
        let max_leftover = max_leftover.unwrap_or_else(|| Self::default_max_leftover(max_len));
        let minimum = saturating_double(max_len);
        if buffer_size < minimum {
            return Err(StreamConfigError { buffer_size, minimum });
        }
        Ok(ChunkConfig { buffer_size, max_leftover })
    }
}

fn saturating_double(n: usize) -> usize {
    n.saturating_mul(2)
}

/// The last byte offset (exclusive, relative to the start of `data`) a
/// match may end at and still be reported this round (`spec.md` §4.6 steps
/// 3-5: deferred near the tail only "when the buffer is full").
pub fn reportable_end(data_len: usize, max_leftover: usize, buffer_full: bool) -> usize {
    if buffer_full {
        data_len.saturating_sub(max_leftover)
    } else {
        data_len
    }
}

/// Whether a match ending at `match_end` (exclusive, relative to `data`)
/// should be reported now or deferred to the next chunk.
pub fn is_reportable(match_end: usize, data_len: usize, max_leftover: usize, buffer_full: bool) -> bool {
    match_end <= reportable_end(data_len, max_leftover, buffer_full)
}

/// The start (relative to `data`) of the suffix retained across the slide
/// (`spec.md` §4.6, "Chunk invariant"): at least `max_leftover` bytes, or
/// everything since the last committed match, whichever is larger.
pub fn retained_start(committed_end: usize, data_len: usize, max_leftover: usize) -> usize {
    committed_end.max(data_len.saturating_sub(max_leftover)).min(data_len)
}

/// Tracks the absolute stream position across chunk slides. Each slide
/// drops `retained_start` bytes from the front of the logical stream;
/// [`StreamCursor::advance`] folds that into a running `stream_offset` so
/// callers can report absolute match positions (`spec.md` §4.6, "Reported
/// offsets").
#[derive(Clone, Copy, Debug, Default)]
pub struct StreamCursor {
    stream_offset: usize,
}

impl StreamCursor {
    pub fn new() -> StreamCursor {
        StreamCursor { stream_offset: 0 }
    }

    pub fn stream_offset(&self) -> usize {
        self.stream_offset
    }

    /// Converts a `data`-relative offset into an absolute stream offset.
    pub fn to_absolute(&self, relative: usize) -> usize {
        self.stream_offset + relative
    }

    /// Records that `dropped` bytes were dropped from the front of the
    /// buffer during a slide.
    pub fn advance(&mut self, dropped: usize) {
        self.stream_offset += dropped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_size_floors_at_twice_max_len() {
        assert_eq!(ChunkConfig::default_buffer_size(10), 64 * 1024);
        assert_eq!(ChunkConfig::default_buffer_size(100_000), 200_000);
    }

    #[test]
    fn max_leftover_caps_at_one_mebibyte() {
        assert_eq!(ChunkConfig::default_max_leftover(10), 100);
        assert_eq!(ChunkConfig::default_max_leftover(1_000_000), 1024 * 1024);
        assert_eq!(ChunkConfig::default_max_leftover(crate::analysis::UNBOUNDED), 1024 * 1024);
    }

    #[test]
    fn config_rejects_undersized_buffer() {
        let err = ChunkConfig::new(1000, Some(100), None).unwrap_err();
        assert_eq!(err.minimum, 2000);
    }

    #[test]
    fn matches_near_the_tail_are_deferred_only_when_full() {
        assert!(!is_reportable(95, 100, 10, true));
        assert!(is_reportable(95, 100, 10, false));
        assert!(is_reportable(80, 100, 10, true));
    }

    #[test]
    fn retained_start_keeps_the_larger_of_the_two_floors() {
        assert_eq!(retained_start(5, 100, 10), 90);
        assert_eq!(retained_start(95, 100, 10), 95);
    }

    #[test]
    fn stream_cursor_accumulates_dropped_bytes() {
        let mut cursor = StreamCursor::new();
        assert_eq!(cursor.to_absolute(5), 5);
        cursor.advance(90);
        assert_eq!(cursor.to_absolute(5), 95);
    }
}
