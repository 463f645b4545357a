//! Loaded trace capture
//!
//! A capture is read into memory once, then the binary and text scans run
//! over the same bytes. Everything downstream works on the decoded
//! [`TraceData`].

use log::{info, warn};
use std::io::Read;
use std::path::Path;

use crate::decode::{
    decode_stream, extract_registry, scan_markers, DecodeStats, EventRecord, IncrementalDecoder,
    StreamMarkers, TaskRegistry,
};
use crate::domain::TraceError;

/// Read size used by [`TraceData::from_reader`]
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Decoded capture (immutable once loaded)
#[derive(Debug, Clone)]
pub struct TraceData {
    pub events: Vec<EventRecord>,
    pub registry: TaskRegistry,
    pub markers: StreamMarkers,
    pub decode_stats: DecodeStats,
}

impl TraceData {
    /// Read and decode a capture file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|source| TraceError::Read { path: path.to_path_buf(), source })?;
        info!("Read {} bytes from {}", bytes.len(), path.display());
        Self::from_bytes(&bytes)
    }

    /// Decode an in-memory capture
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TraceError> {
        if bytes.is_empty() {
            return Err(TraceError::Empty);
        }

        let decoded = decode_stream(bytes);
        Ok(Self::assemble(bytes, decoded.events, decoded.stats))
    }

    /// Decode a capture from any reader in fixed-size chunks
    ///
    /// Records are decoded as chunks arrive; records split across a chunk
    /// boundary are carried over. The raw bytes are still retained for the
    /// registry and marker scans.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, TraceError> {
        let mut decoder = IncrementalDecoder::new();
        let mut raw = Vec::new();
        let mut events = Vec::new();
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];

        loop {
            let read = match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            raw.extend_from_slice(&chunk[..read]);
            events.extend(decoder.push(&chunk[..read]));
        }

        if raw.is_empty() {
            return Err(TraceError::Empty);
        }
        let stats = decoder.finish();
        Ok(Self::assemble(&raw, events, stats))
    }

    fn assemble(bytes: &[u8], events: Vec<EventRecord>, decode_stats: DecodeStats) -> Self {
        if decode_stats.trailing_bytes > 0 {
            warn!(
                "Incomplete trailing record ({} bytes) at end of capture",
                decode_stats.trailing_bytes
            );
        }
        info!(
            "Decoded {} events ({} bytes skipped while resynchronizing)",
            events.len(),
            decode_stats.skipped_bytes
        );

        let registry = extract_registry(bytes);
        info!("Task registry contains {} tasks", registry.len());

        Self { events, registry, markers: scan_markers(bytes), decode_stats }
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn first_timestamp(&self) -> Option<u32> {
        self.events.first().map(|event| event.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<u32> {
        self.events.last().map(|event| event.timestamp)
    }
}
