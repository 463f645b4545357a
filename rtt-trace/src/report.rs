//! Console rendering of the analyses
//!
//! Every view writes to a caller-supplied writer; `main` passes locked
//! stdout. These are program output, not log records.

// Time conversions intentionally lose precision for display purposes
#![allow(clippy::cast_precision_loss)]

use std::io::{self, Write};

use crate::analysis::{InterruptStats, MemoryReport, RuntimeReport, TraceSummary};
use crate::decode::{EventKind, EventRecord, StreamMarkers, TaskRegistry};
use crate::domain::CpuFrequency;

/// Task registry listing printed after loading
pub fn write_registry<W: Write>(out: &mut W, registry: &TaskRegistry) -> io::Result<()> {
    if registry.is_empty() {
        return Ok(());
    }
    writeln!(out, "Task registry:")?;
    for (handle, name) in registry.iter() {
        writeln!(out, "  {handle}: {name}")?;
    }
    Ok(())
}

pub fn write_summary<W: Write>(
    out: &mut W,
    summary: &TraceSummary,
    markers: StreamMarkers,
    freq: CpuFrequency,
) -> io::Result<()> {
    writeln!(out, "\n=== Trace Summary ===")?;
    writeln!(out, "Total events: {}", summary.total_events)?;
    if summary.total_events == 0 {
        return Ok(());
    }

    writeln!(out, "\nEvent type breakdown:")?;
    for (kind, count, percentage) in &summary.breakdown {
        writeln!(out, "  {:25}: {count:6} ({percentage:5.1}%)", kind.name())?;
    }

    writeln!(
        out,
        "\nTrace duration: {:.6} seconds",
        freq.ticks_to_seconds(summary.duration_ticks())
    )?;
    if let (Some(first), Some(last)) = (summary.first_timestamp, summary.last_timestamp) {
        writeln!(out, "Start timestamp: {first}")?;
        writeln!(out, "End timestamp: {last}")?;
    }
    writeln!(
        out,
        "Session markers: header={} start={} stop={}",
        yes_no(markers.header),
        yes_no(markers.start),
        yes_no(markers.stop)
    )?;
    Ok(())
}

pub fn write_task_runtime<W: Write>(
    out: &mut W,
    report: &RuntimeReport,
    registry: &TaskRegistry,
    freq: CpuFrequency,
) -> io::Result<()> {
    writeln!(out, "\n=== Task Runtime Analysis ===")?;
    if report.tasks.is_empty() {
        writeln!(out, "No task switch events found")?;
        return Ok(());
    }

    if report.has_validation_warnings() {
        writeln!(
            out,
            "\nValidation warnings: {} unmatched SWITCHED_IN, {} unmatched SWITCHED_OUT events",
            report.unmatched_switch_in, report.unmatched_switch_out
        )?;
    }
    if report.handle_mismatches > 0 {
        writeln!(out, "Handle mismatches: {}", report.handle_mismatches)?;
    }
    if report.negative_intervals > 0 {
        writeln!(out, "Negative intervals skipped: {}", report.negative_intervals)?;
    }
    if let Some(handle) = report.still_running {
        writeln!(out, "Note: {} was still running when trace ended", registry.task_name(handle))?;
    }

    writeln!(
        out,
        "\nTrace duration: {:.6} seconds",
        freq.ticks_to_seconds(report.trace_duration_ticks)
    )?;
    writeln!(
        out,
        "Total task runtime: {:.6} seconds",
        freq.ticks_to_seconds(report.total_runtime_ticks)
    )?;
    writeln!(out, "CPU utilization: {:.1}%", report.cpu_utilization())?;
    writeln!(out, "Idle time: {:.1}%", report.idle_percentage())?;

    writeln!(out, "\nTask runtime breakdown:")?;
    writeln!(
        out,
        "{:<20} {:>12} {:>7} {:>12} {:>12} {:>12} {:>12}",
        "Task Name", "Runtime", "CPU %", "Executions", "Avg Time", "Min Time", "Max Time"
    )?;
    writeln!(out, "{}", "-".repeat(95))?;
    for task in &report.tasks {
        writeln!(
            out,
            "{:<20} {:>11.6}s {:>6.1}% {:>12} {:>11.6}s {:>11.6}s {:>11.6}s",
            registry.task_name(task.handle),
            task.total_seconds(freq),
            report.task_percentage(task),
            task.intervals,
            task.average_ticks() / f64::from(freq.hz()),
            freq.ticks_to_seconds(task.min_ticks),
            freq.ticks_to_seconds(task.max_ticks),
        )?;
    }
    Ok(())
}

pub fn write_interrupts<W: Write>(
    out: &mut W,
    stats: &InterruptStats,
    freq: CpuFrequency,
) -> io::Result<()> {
    writeln!(out, "\n=== Interrupt Analysis ===")?;
    if stats.enters == 0 && stats.unmatched_exits == 0 {
        writeln!(out, "No interrupts recorded")?;
        return Ok(());
    }

    writeln!(out, "Total interrupts: {}", stats.enters)?;
    writeln!(out, "Completed intervals: {}", stats.completed)?;
    if stats.unmatched_exits > 0 {
        writeln!(out, "Unmatched exits: {}", stats.unmatched_exits)?;
    }
    if stats.replaced > 0 {
        writeln!(out, "Overwritten enters (nested or lost exit): {}", stats.replaced)?;
    }
    if stats.negative_durations > 0 {
        writeln!(out, "Negative durations skipped: {}", stats.negative_durations)?;
    }

    if let (Some(min), Some(max)) = (stats.min_ticks, stats.max_ticks) {
        writeln!(
            out,
            "Average ISR duration: {:.6}s",
            stats.average_ticks() / f64::from(freq.hz())
        )?;
        writeln!(out, "Min ISR duration: {:.6}s", freq.ticks_to_seconds(min))?;
        writeln!(out, "Max ISR duration: {:.6}s", freq.ticks_to_seconds(max))?;
        writeln!(out, "Total ISR time: {:.6}s", freq.ticks_to_seconds(stats.total_ticks))?;
    }
    Ok(())
}

pub fn write_memory<W: Write>(out: &mut W, report: &MemoryReport) -> io::Result<()> {
    writeln!(out, "\n=== Memory Analysis ===")?;
    if report.allocations == 0 && report.frees == 0 {
        writeln!(out, "No heap events recorded")?;
        return Ok(());
    }

    writeln!(out, "Allocations: {}", report.allocations)?;
    writeln!(out, "Frees: {}", report.frees)?;
    writeln!(out, "Current tracked bytes: {}", report.current_bytes)?;
    writeln!(out, "Peak tracked bytes: {}", report.peak_bytes)?;
    writeln!(out, "Outstanding allocations: {}", report.outstanding_allocations)?;
    if report.double_allocations > 0 {
        writeln!(out, "Double allocations: {}", report.double_allocations)?;
    }
    if report.invalid_sizes > 0 {
        writeln!(out, "Invalid sizes: {}", report.invalid_sizes)?;
    }
    if report.untracked_frees > 0 {
        writeln!(out, "Untracked frees: {}", report.untracked_frees)?;
        writeln!(
            out,
            "  Memory counter may be inaccurate if tracing started mid-execution"
        )?;
    }
    Ok(())
}

pub fn write_timeline<W: Write>(
    out: &mut W,
    events: &[EventRecord],
    registry: &TaskRegistry,
    freq: CpuFrequency,
    max_events: usize,
) -> io::Result<()> {
    writeln!(out, "\n=== Event Timeline ===")?;
    writeln!(out, "Showing first {} events:\n", max_events.min(events.len()))?;

    for event in events.iter().take(max_events) {
        writeln!(out, "{}", timeline_line(event, registry, freq))?;
    }
    Ok(())
}

/// `<seconds>s: <KIND> <task name | handle=0x........>`
pub fn timeline_line(event: &EventRecord, registry: &TaskRegistry, freq: CpuFrequency) -> String {
    let seconds = freq.ticks_to_seconds(u64::from(event.timestamp));
    let subject = match event.kind {
        EventKind::TaskSwitchedIn | EventKind::TaskSwitchedOut => registry.task_name(event.handle),
        _ => format!("handle={}", event.handle),
    };
    format!("{seconds:12.6}s: {:25} {subject}", event.kind.name())
}

fn yes_no(seen: bool) -> &'static str {
    if seen {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze_interrupts, analyze_memory, analyze_task_runtime, summarize};
    use crate::domain::Handle;

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buffer = Vec::new();
        f(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    fn registry() -> TaskRegistry {
        [(Handle(0x100), "Main".to_string())].into_iter().collect()
    }

    fn freq() -> CpuFrequency {
        CpuFrequency::new(1000).unwrap()
    }

    #[test]
    fn test_timeline_line_uses_task_names_for_switches() {
        let registry = registry();
        let switch = EventRecord::new(EventKind::TaskSwitchedIn, 1500, 0x100, 0);
        let queue = EventRecord::new(EventKind::QueueSend, 2000, 0x2000_0010, 0);

        let line = timeline_line(&switch, &registry, freq());
        assert!(line.trim_start().starts_with("1.500000s: TASK_SWITCHED_IN"));
        assert!(line.ends_with("Main"));
        assert!(timeline_line(&queue, &registry, freq()).ends_with("handle=0x20000010"));
    }

    #[test]
    fn test_timeline_is_limited() {
        let events: Vec<EventRecord> =
            (0..10).map(|ts| EventRecord::new(EventKind::TimerStart, ts, 1, 0)).collect();
        let text = render(|out| write_timeline(out, &events, &TaskRegistry::new(), freq(), 3));

        assert!(text.contains("Showing first 3 events"));
        assert_eq!(text.matches("TIMER_START").count(), 3);
    }

    #[test]
    fn test_runtime_report_validation_line() {
        let events = [
            EventRecord::new(EventKind::TaskSwitchedOut, 0, 0x100, 0),
            EventRecord::new(EventKind::TaskSwitchedIn, 10, 0x100, 0),
            EventRecord::new(EventKind::TaskSwitchedOut, 20, 0x100, 0),
        ];
        let report = analyze_task_runtime(&events);
        let text = render(|out| write_task_runtime(out, &report, &registry(), freq()));

        assert!(text.contains("0 unmatched SWITCHED_IN, 1 unmatched SWITCHED_OUT"));
        assert!(text.contains("Main"));
        assert!(text.contains("CPU utilization: 50.0%"));
    }

    #[test]
    fn test_empty_views() {
        let runtime = render(|out| {
            write_task_runtime(out, &analyze_task_runtime(&[]), &registry(), freq())
        });
        assert!(runtime.contains("No task switch events found"));

        let isr = render(|out| write_interrupts(out, &analyze_interrupts(&[]), freq()));
        assert!(isr.contains("No interrupts recorded"));

        let memory = render(|out| write_memory(out, &analyze_memory(&[])));
        assert!(memory.contains("No heap events recorded"));
    }

    #[test]
    fn test_memory_caveat_for_untracked_frees() {
        let events = [EventRecord::new(EventKind::Free, 0, 0x2000, 16)];
        let text = render(|out| write_memory(out, &analyze_memory(&events)));
        assert!(text.contains("Untracked frees: 1"));
        assert!(text.contains("tracing started mid-execution"));
    }

    #[test]
    fn test_summary_breakdown() {
        let events = [
            EventRecord::new(EventKind::IsrEnter, 0, 0, 0),
            EventRecord::new(EventKind::IsrExit, 1000, 0, 0),
        ];
        let text = render(|out| {
            write_summary(out, &summarize(&events), StreamMarkers::default(), freq())
        });
        assert!(text.contains("Total events: 2"));
        assert!(text.contains("ISR_ENTER"));
        assert!(text.contains("( 50.0%)"));
        assert!(text.contains("Trace duration: 1.000000 seconds"));
    }
}
