//! Resynchronizing stream decoder.
//!
//! Walks a byte buffer with an explicit offset: where a record decodes it is
//! emitted and the offset jumps by one record width, otherwise the offset
//! advances by a single byte. Text markers, the registry block and corrupt
//! records are skipped without aborting the pass.
//!
//! A text byte sequence that happens to start with a known kind byte will
//! decode as a spurious record. That false-positive risk is accepted in
//! exchange for never losing the records that follow a damaged region.
//!
//! Three entry points share one window algorithm ([`decode_window`]):
//!
//! - [`decode_stream`] - batch pass over a complete buffer
//! - [`StreamDecoder`] - lazy iterator over a complete buffer
//! - [`IncrementalDecoder`] - growing buffer fed chunk by chunk; the undecided
//!   remainder is carried across chunk boundaries so output is identical to
//!   the batch pass for any chunking

use log::debug;
use rtt_trace_common::TRACE_RECORD_SIZE;

use super::codec::EventRecord;

/// Byte accounting for one decoding pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Records successfully decoded
    pub records: usize,
    /// Bytes stepped over one at a time while resynchronizing
    pub skipped_bytes: usize,
    /// Bytes left at the end, fewer than one record width
    pub trailing_bytes: usize,
}

/// Result of a batch decode
#[derive(Debug, Clone, Default)]
pub struct DecodedStream {
    pub events: Vec<EventRecord>,
    pub stats: DecodeStats,
}

/// Decode every full window of `buf`, appending records to `out`.
///
/// Returns `(consumed, skipped)`: the offset at which fewer than one record
/// width remains, and how many of the consumed bytes were skipped. Bytes past
/// `consumed` are undecided and must be retried once more data is appended.
pub fn decode_window(buf: &[u8], out: &mut Vec<EventRecord>) -> (usize, usize) {
    let mut offset = 0;
    let mut skipped = 0;

    while offset + TRACE_RECORD_SIZE <= buf.len() {
        if let Some(record) = EventRecord::decode(&buf[offset..offset + TRACE_RECORD_SIZE]) {
            out.push(record);
            offset += TRACE_RECORD_SIZE;
        } else {
            offset += 1;
            skipped += 1;
        }
    }

    (offset, skipped)
}

/// Decode a complete buffer in one pass
pub fn decode_stream(buf: &[u8]) -> DecodedStream {
    let mut events = Vec::with_capacity(buf.len() / TRACE_RECORD_SIZE);
    let (consumed, skipped_bytes) = decode_window(buf, &mut events);

    let stats = DecodeStats {
        records: events.len(),
        skipped_bytes,
        trailing_bytes: buf.len() - consumed,
    };
    debug!(
        "Decoded {} records ({} bytes skipped, {} trailing)",
        stats.records, stats.skipped_bytes, stats.trailing_bytes
    );

    DecodedStream { events, stats }
}

/// Lazy decoder over a complete buffer
///
/// Each instance is a fresh pass; it is not restartable mid-stream.
#[derive(Debug)]
pub struct StreamDecoder<'a> {
    buf: &'a [u8],
    offset: usize,
    stats: DecodeStats,
}

impl<'a> StreamDecoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0, stats: DecodeStats::default() }
    }

    /// Byte accounting so far; `trailing_bytes` is final once exhausted
    pub fn stats(&self) -> DecodeStats {
        self.stats
    }
}

impl Iterator for StreamDecoder<'_> {
    type Item = EventRecord;

    fn next(&mut self) -> Option<EventRecord> {
        while self.offset + TRACE_RECORD_SIZE <= self.buf.len() {
            let window = &self.buf[self.offset..self.offset + TRACE_RECORD_SIZE];
            if let Some(record) = EventRecord::decode(window) {
                self.offset += TRACE_RECORD_SIZE;
                self.stats.records += 1;
                return Some(record);
            }
            self.offset += 1;
            self.stats.skipped_bytes += 1;
        }

        self.stats.trailing_bytes = self.buf.len() - self.offset;
        None
    }
}

/// Decoder over an appendable buffer
///
/// Feed chunks as they arrive from the transport. Positions with fewer than
/// one record width of data behind them are deferred to the next push, which
/// is what keeps a record split across two chunks intact.
#[derive(Debug, Default)]
pub struct IncrementalDecoder {
    pending: Vec<u8>,
    stats: DecodeStats,
}

impl IncrementalDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return the records it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<EventRecord> {
        self.pending.extend_from_slice(chunk);

        let mut events = Vec::new();
        let (consumed, skipped) = decode_window(&self.pending, &mut events);
        self.pending.drain(..consumed);

        self.stats.records += events.len();
        self.stats.skipped_bytes += skipped;
        events
    }

    /// Bytes waiting for more data
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// End of input: whatever is still pending is a truncated trailer
    pub fn finish(mut self) -> DecodeStats {
        self.stats.trailing_bytes = self.pending.len();
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::codec::EventKind;

    fn sample_records() -> Vec<EventRecord> {
        vec![
            EventRecord::new(EventKind::TaskSwitchedIn, 100, 0x2000_0100, 0),
            EventRecord::new(EventKind::IsrEnter, 150, 0, 0),
            EventRecord::new(EventKind::IsrExit, 180, 0, 0),
            EventRecord::new(EventKind::Malloc, 200, 0x2000_4000, 64),
            EventRecord::new(EventKind::TaskSwitchedOut, 400, 0x2000_0100, 0),
        ]
    }

    fn concat(records: &[EventRecord]) -> Vec<u8> {
        records.iter().flat_map(EventRecord::encode).collect()
    }

    #[test]
    fn test_decodes_concatenated_records_in_order() {
        let records = sample_records();
        let decoded = decode_stream(&concat(&records));

        assert_eq!(decoded.events, records);
        assert_eq!(decoded.stats.records, 5);
        assert_eq!(decoded.stats.skipped_bytes, 0);
        assert_eq!(decoded.stats.trailing_bytes, 0);
    }

    #[test]
    fn test_short_buffer_yields_nothing() {
        let decoded = decode_stream(&[0x01, 0x02, 0x03]);
        assert!(decoded.events.is_empty());
        assert_eq!(decoded.stats.trailing_bytes, 3);

        assert!(decode_stream(&[]).events.is_empty());
    }

    #[test]
    fn test_resynchronizes_after_invalid_byte() {
        let records = sample_records();
        let mut buf = records[0].encode().to_vec();
        buf.push(0xFF);
        buf.extend_from_slice(&records[1].encode());

        let decoded = decode_stream(&buf);
        assert_eq!(decoded.events, vec![records[0], records[1]]);
        assert_eq!(decoded.stats.skipped_bytes, 1);
    }

    #[test]
    fn test_skips_text_noise() {
        let record = EventRecord::new(EventKind::TaskCreate, 5, 0x2000_0200, 0);
        let mut buf = b"hello\n".to_vec();
        buf.extend_from_slice(&record.encode());
        buf.extend_from_slice(b"hello\n");

        let decoded = decode_stream(&buf);
        assert_eq!(decoded.events, vec![record]);
        assert_eq!(decoded.stats.skipped_bytes, 6);
        assert_eq!(decoded.stats.trailing_bytes, 6);
    }

    #[test]
    fn test_text_starting_with_kind_byte_decodes_spuriously() {
        // 'R' is 0x52 (TIMER_STOP)
        let mut buf = b"R".to_vec();
        buf.extend_from_slice(&[0u8; 12]);

        let decoded = decode_stream(&buf);
        assert_eq!(decoded.events.len(), 1);
        assert_eq!(decoded.events[0].kind, EventKind::TimerStop);
    }

    #[test]
    fn test_incomplete_trailing_record_is_reported() {
        let records = sample_records();
        let mut buf = concat(&records[..2]);
        buf.extend_from_slice(&records[2].encode()[..6]);

        let decoded = decode_stream(&buf);
        assert_eq!(decoded.events.len(), 2);
        assert_eq!(decoded.stats.trailing_bytes, 6);
    }

    #[test]
    fn test_lazy_decoder_matches_batch() {
        let mut buf = b"noise".to_vec();
        buf.extend_from_slice(&concat(&sample_records()));
        buf.extend_from_slice(&[0x01, 0x00]);

        let batch = decode_stream(&buf);
        let mut lazy = StreamDecoder::new(&buf);
        let events: Vec<_> = lazy.by_ref().collect();

        assert_eq!(events, batch.events);
        assert_eq!(lazy.stats(), batch.stats);
    }

    #[test]
    fn test_incremental_keeps_record_split_across_chunks() {
        let records = sample_records();
        let buf = concat(&records);

        let mut decoder = IncrementalDecoder::new();
        let mut events = decoder.push(&buf[..20]);
        assert_eq!(events.len(), 1);
        assert_eq!(decoder.pending_len(), 7);

        events.extend(decoder.push(&buf[20..]));
        let stats = decoder.finish();

        assert_eq!(events, records);
        assert_eq!(stats.records, records.len());
        assert_eq!(stats.trailing_bytes, 0);
    }
}
