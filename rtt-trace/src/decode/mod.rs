//! Capture decoding
//!
//! Two independent scans over the same raw buffer:
//!
//! - **Binary**: [`stream`] resynchronizes on record boundaries using [`codec`]
//! - **Text**: [`registry`] recovers task names, [`markers`] recovers session markers

pub mod codec;
pub mod markers;
pub mod registry;
pub mod stream;

pub use codec::{EventKind, EventRecord, EVENT_KINDS};
pub use markers::{scan_markers, StreamMarkers};
pub use registry::{extract_registry, TaskRegistry};
pub use stream::{decode_stream, DecodeStats, DecodedStream, IncrementalDecoder, StreamDecoder};
