use rtt_trace::analysis::{analyze_interrupts, analyze_memory, analyze_task_runtime, summarize};
use rtt_trace::decode::{decode_stream, extract_registry, EventKind, EventRecord};
use rtt_trace::domain::{CpuFrequency, Handle, TraceError};
use rtt_trace::trace_data::TraceData;
use std::io::Write;

fn sample_records() -> Vec<EventRecord> {
    vec![
        EventRecord::new(EventKind::TaskSwitchedIn, 1_000, 537_133_568, 0),
        EventRecord::new(EventKind::IsrEnter, 1_200, 0, 0),
        EventRecord::new(EventKind::IsrExit, 1_260, 0, 0),
        EventRecord::new(EventKind::Malloc, 1_300, 0x2000_4000, 64),
        EventRecord::new(EventKind::TaskSwitchedOut, 2_000, 537_133_568, 0),
        EventRecord::new(EventKind::TaskSwitchedIn, 2_000, 537_133_312, 0),
        EventRecord::new(EventKind::Free, 2_500, 0x2000_4000, 0),
        EventRecord::new(EventKind::TaskSwitchedOut, 3_000, 537_133_312, 0),
    ]
}

/// Capture laid out the way the target writes it: header, registry block,
/// start marker, binary records, stop marker.
///
/// Some marker characters are valid kind bytes and decode as spurious
/// records; the zero padding keeps them from reaching into the binary part.
fn sample_capture() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RTT_TRACE_V1\n");
    bytes.extend_from_slice(b"TASK_REGISTRY_START\nTASK:537133312:IDLE\nTASK:537133568:Main\nTASK_REGISTRY_END\n");
    bytes.extend_from_slice(b"TRACE_START\n");
    bytes.extend_from_slice(&[0u8; 16]);
    for rec in sample_records() {
        bytes.extend_from_slice(&rec.encode());
    }
    bytes.extend_from_slice(b"\nTRACE_STOP\n");
    bytes
}

fn is_subsequence(needle: &[EventRecord], haystack: &[EventRecord]) -> bool {
    let mut rest = haystack.iter();
    needle.iter().all(|wanted| rest.any(|event| event == wanted))
}

#[test]
fn test_load_capture_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(&sample_capture()).expect("Failed to write capture");

    let trace = TraceData::from_file(file.path()).expect("Failed to load capture");

    assert_eq!(trace.registry.get(Handle(537_133_312)), Some("IDLE"));
    assert_eq!(trace.registry.get(Handle(537_133_568)), Some("Main"));
    assert!(trace.markers.header);
    assert!(trace.markers.is_complete());

    assert!(is_subsequence(&sample_records(), &trace.events));
    assert!(trace.event_count() >= sample_records().len());
}

#[test]
fn test_empty_file_is_rejected() {
    let file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let err = TraceData::from_file(file.path()).unwrap_err();
    assert!(matches!(err, TraceError::Empty));
}

#[test]
fn test_short_buffer_yields_no_records() {
    let decoded = decode_stream(&[0x01, 0, 0, 0]);
    assert!(decoded.events.is_empty());
    assert_eq!(decoded.stats.trailing_bytes, 4);
}

#[test]
fn test_invalid_byte_between_records_is_skipped() {
    let first = EventRecord::new(EventKind::QueueSend, 10, 0x2000_0010, 0);
    let second = EventRecord::new(EventKind::QueueReceive, 20, 0x2000_0010, 0);
    let mut bytes = first.encode().to_vec();
    bytes.push(0xFF);
    bytes.extend_from_slice(&second.encode());

    let decoded = decode_stream(&bytes);
    assert_eq!(decoded.events, vec![first, second]);
    assert_eq!(decoded.stats.skipped_bytes, 1);
}

#[test]
fn test_registry_example() {
    let registry =
        extract_registry(b"TASK_REGISTRY_START\nTASK:100:Idle\nTASK:200:Main\nTASK_REGISTRY_END\n");
    let entries: Vec<(Handle, &str)> = registry.iter().collect();
    assert_eq!(entries, vec![(Handle(100), "Idle"), (Handle(200), "Main")]);
}

#[test]
fn test_single_interval_runtime() {
    let events = [
        EventRecord::new(EventKind::TaskSwitchedIn, 0, 5, 0),
        EventRecord::new(EventKind::TaskSwitchedOut, 1000, 5, 0),
    ];
    let report = analyze_task_runtime(&events);
    let task = report.task(Handle(5)).expect("task 5 should have runtime");

    assert_eq!(task.total_seconds(CpuFrequency::new(1000).unwrap()), 1.0);
    assert_eq!(task.intervals, 1);
    assert_eq!(task.min_ticks, 1000);
    assert_eq!(task.max_ticks, 1000);
    assert_eq!(report.cpu_utilization(), 100.0);
}

#[test]
fn test_open_interval_closed_at_last_event() {
    let events = [
        EventRecord::new(EventKind::TaskSwitchedIn, 100, 7, 0),
        EventRecord::new(EventKind::QueueSend, 400, 0x10, 0),
    ];
    let report = analyze_task_runtime(&events);

    assert_eq!(report.still_running, Some(Handle(7)));
    assert_eq!(report.task(Handle(7)).map(|t| t.total_ticks), Some(300));
}

#[test]
fn test_zero_duration_utilization() {
    let events = [EventRecord::new(EventKind::TaskSwitchedIn, 50, 1, 0)];
    let report = analyze_task_runtime(&events);
    assert_eq!(report.trace_duration_ticks, 0);
    assert_eq!(report.cpu_utilization(), 0.0);
}

#[test]
fn test_double_allocation_and_untracked_free() {
    let events = [
        EventRecord::new(EventKind::Malloc, 0, 0x1000, 64),
        EventRecord::new(EventKind::Malloc, 1, 0x1000, 32),
        EventRecord::new(EventKind::Free, 2, 0x2000, 16),
    ];
    let report = analyze_memory(&events);

    assert_eq!(report.double_allocations, 1);
    assert_eq!(report.untracked_frees, 1);
    assert_eq!(report.current_bytes, 32);
}

#[test]
fn test_full_capture_analyses() {
    let real = sample_records();
    let trace = TraceData::from_bytes(&sample_capture()).expect("Failed to decode capture");
    assert!(is_subsequence(&real, &trace.events));

    let summary = summarize(&real);
    assert_eq!(summary.total_events, 8);
    assert_eq!(summary.count_of(EventKind::TaskSwitchedIn), 2);

    let runtime = analyze_task_runtime(&real);
    assert_eq!(runtime.task(Handle(537_133_568)).map(|t| t.total_ticks), Some(1_000));
    assert_eq!(runtime.task(Handle(537_133_312)).map(|t| t.total_ticks), Some(1_000));
    assert!(!runtime.has_validation_warnings());

    let isr = analyze_interrupts(&real);
    assert_eq!(isr.completed, 1);
    assert_eq!(isr.total_ticks, 60);

    let memory = analyze_memory(&real);
    assert_eq!(memory.current_bytes, 0);
    assert_eq!(memory.peak_bytes, 64);
}
