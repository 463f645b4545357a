//! Stream marker scan.
//!
//! The target brackets a capture with text markers. They carry no data but tell
//! whether the capture covers a complete start/stop session.

use log::warn;
use rtt_trace_common::{STREAM_HEADER_MARKER, TRACE_START_MARKER, TRACE_STOP_MARKER};

/// Which session markers appear in a capture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamMarkers {
    /// `RTT_TRACE_V1`, written once at init
    pub header: bool,
    /// `TRACE_START`
    pub start: bool,
    /// `TRACE_STOP`; missing when the capture was cut before `rtt_trace_stop`
    pub stop: bool,
}

impl StreamMarkers {
    pub fn is_complete(&self) -> bool {
        self.start && self.stop
    }
}

pub fn scan_markers(buf: &[u8]) -> StreamMarkers {
    let text = String::from_utf8_lossy(buf);
    let markers = StreamMarkers {
        header: text.contains(STREAM_HEADER_MARKER),
        start: text.contains(TRACE_START_MARKER),
        stop: text.contains(TRACE_STOP_MARKER),
    };

    if markers.start && !markers.stop {
        warn!("No {TRACE_STOP_MARKER} marker found, capture may be truncated");
    }
    markers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_session() {
        let markers = scan_markers(b"RTT_TRACE_V1\nTRACE_START\n\x01\x02TRACE_STOP\n");
        assert!(markers.header);
        assert!(markers.is_complete());
    }

    #[test]
    fn test_truncated_session() {
        let markers = scan_markers(b"TRACE_START\nTASK_REGISTRY_START\nTASK_REGISTRY_END\n");
        assert!(!markers.header);
        assert!(markers.start);
        assert!(!markers.stop);
        assert!(!markers.is_complete());
    }

    #[test]
    fn test_registry_markers_are_not_session_markers() {
        let markers = scan_markers(b"TASK_REGISTRY_START\nTASK_REGISTRY_END\n");
        assert_eq!(markers, StreamMarkers::default());
    }
}
