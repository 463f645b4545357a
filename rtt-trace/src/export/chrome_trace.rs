//! Chrome Trace Event Format exporter.
//!
//! Produces a document loadable by chrome://tracing and Perfetto:
//!
//! - task execution intervals and ISR intervals as complete (`"X"`) events
//! - lifecycle, state, queue, sync, timer and heap events as instants (`"i"`)
//! - the running heap total as a `"Memory Usage"` counter (`"C"`)
//!
//! Pairing runs on fresh [`TaskSwitchTracker`] / [`IsrTracker`] /
//! [`MemoryLedger`] instances, so exported intervals match the analysis
//! passes exactly. Anomalies found here were already reported by the
//! analyzers and are only logged at debug level.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use crate::analysis::{
    AllocOutcome, FreeOutcome, IsrOutcome, IsrTracker, MemoryLedger, SwitchOutcome, TaskInterval,
    TaskSwitchTracker,
};
use crate::decode::{EventKind, EventRecord, TaskRegistry};
use crate::domain::{CpuFrequency, ExportError, Handle};

/// Reserved thread id for the interrupt track
pub const ISR_THREAD_ID: u32 = 999_999;

/// Thread id for kernel objects (queues, timers) that belong to no task
const KERNEL_THREAD_ID: u32 = 0;

const PROCESS_ID: u32 = 0;

/// Chrome Trace Event format
/// Spec: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU/preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromeTraceEvent {
    /// Task name, `"ISR"`, event label, or `"Memory Usage"`
    pub name: String,
    /// Category for filtering/coloring
    pub cat: String,
    /// Phase: "X" = complete, "i" = instant, "C" = counter, "M" = metadata
    pub ph: String,
    /// Timestamp in microseconds
    pub ts: f64,
    /// Duration in microseconds (complete events only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dur: Option<f64>,
    /// Instant scope: "g" global, "p" process, "t" thread
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<String>,
    pub pid: u32,
    /// Task handle, [`ISR_THREAD_ID`], or 0; absent on counters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tid: Option<u32>,
    pub args: BTreeMap<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromeTraceMetadata {
    pub cpu_frequency: u32,
    /// Decimal handle → task name
    pub task_registry: BTreeMap<String, String>,
    pub total_events: usize,
}

/// Chrome Trace Format container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChromeTrace {
    #[serde(rename = "traceEvents")]
    pub trace_events: Vec<ChromeTraceEvent>,
    #[serde(rename = "displayTimeUnit")]
    pub display_time_unit: String,
    pub metadata: ChromeTraceMetadata,
}

/// Chrome trace exporter for timeline visualization
pub struct ChromeTraceExporter {
    trace: ChromeTrace,
    /// Frees of addresses the exporter's own ledger never saw allocated
    untracked_frees: u64,
}

impl ChromeTraceExporter {
    pub fn new(events: &[EventRecord], registry: &TaskRegistry, freq: CpuFrequency) -> Self {
        Self::build(events, registry, freq, false)
    }

    /// Like [`ChromeTraceExporter::new`], plus `thread_name` metadata events
    /// naming each task track and the ISR track
    pub fn with_thread_names(
        events: &[EventRecord],
        registry: &TaskRegistry,
        freq: CpuFrequency,
    ) -> Self {
        Self::build(events, registry, freq, true)
    }

    fn build(
        events: &[EventRecord],
        registry: &TaskRegistry,
        freq: CpuFrequency,
        thread_names: bool,
    ) -> Self {
        let mut builder = TraceBuilder::new(registry, freq);
        for event in events {
            builder.record(event);
        }
        builder.close_open_task();

        if builder.untracked_frees > 0 {
            warn!(
                "{} free event(s) for untracked allocations; memory counter may be inaccurate \
                 if tracing started mid-execution",
                builder.untracked_frees
            );
        }
        if thread_names {
            builder.push_thread_names();
        }

        let untracked_frees = builder.untracked_frees;
        let trace = ChromeTrace {
            trace_events: builder.events,
            display_time_unit: "ms".to_string(),
            metadata: ChromeTraceMetadata {
                cpu_frequency: freq.hz(),
                task_registry: registry.to_string_map(),
                total_events: events.len(),
            },
        };
        Self { trace, untracked_frees }
    }

    pub fn trace(&self) -> &ChromeTrace {
        &self.trace
    }

    /// Get the number of trace events produced
    pub fn event_count(&self) -> usize {
        self.trace.trace_events.len()
    }

    pub fn untracked_frees(&self) -> u64 {
        self.untracked_frees
    }

    /// Export the trace to any writer (file, stdout, buffer, etc.)
    ///
    /// # Example
    /// ```
    /// use rtt_trace::decode::TaskRegistry;
    /// use rtt_trace::domain::CpuFrequency;
    /// use rtt_trace::export::ChromeTraceExporter;
    ///
    /// let exporter = ChromeTraceExporter::new(&[], &TaskRegistry::new(), CpuFrequency::default());
    /// let mut buffer = Vec::new();
    /// exporter.export(&mut buffer).unwrap();
    /// assert!(!buffer.is_empty());
    /// ```
    pub fn export<W: Write>(&self, mut writer: W) -> Result<(), ExportError> {
        serde_json::to_writer_pretty(&mut writer, &self.trace)?;
        writer.flush()?;
        Ok(())
    }
}

/// Single pass over the decoded events
struct TraceBuilder<'a> {
    registry: &'a TaskRegistry,
    freq: CpuFrequency,
    tasks: TaskSwitchTracker,
    isr: IsrTracker,
    memory: MemoryLedger,
    events: Vec<ChromeTraceEvent>,
    task_tracks: BTreeSet<Handle>,
    has_isr_track: bool,
    untracked_frees: u64,
    last_timestamp: Option<u32>,
}

impl<'a> TraceBuilder<'a> {
    fn new(registry: &'a TaskRegistry, freq: CpuFrequency) -> Self {
        Self {
            registry,
            freq,
            tasks: TaskSwitchTracker::new(),
            isr: IsrTracker::new(),
            memory: MemoryLedger::new(),
            events: Vec::new(),
            task_tracks: BTreeSet::new(),
            has_isr_track: false,
            untracked_frees: 0,
            last_timestamp: None,
        }
    }

    fn micros(&self, ticks: u32) -> f64 {
        self.freq.ticks_to_micros(u64::from(ticks))
    }

    /// The task still running at the end is closed at the last timestamp
    fn close_open_task(&mut self) {
        let Some(last) = self.last_timestamp else {
            return;
        };
        match self.tasks.close_at(last) {
            Some(SwitchOutcome::Closed { interval, .. }) => self.push_task_interval(interval),
            Some(outcome) => debug!("Open task not exported at end of trace: {outcome:?}"),
            None => {}
        }
    }

    fn push_task_interval(&mut self, interval: TaskInterval) {
        self.task_tracks.insert(interval.handle);
        self.events.push(ChromeTraceEvent {
            name: self.registry.task_name(interval.handle),
            cat: "task".to_string(),
            ph: "X".to_string(),
            ts: self.micros(interval.start),
            dur: Some(self.freq.ticks_to_micros(interval.ticks())),
            s: None,
            pid: PROCESS_ID,
            tid: Some(interval.handle.0),
            args: args([("handle", json!(interval.handle.to_string()))]),
        });
    }

    fn record(&mut self, event: &EventRecord) {
        let ts = self.micros(event.timestamp);
        let handle = event.handle;
        self.last_timestamp = Some(event.timestamp);

        match event.kind {
            EventKind::TaskSwitchedIn => {
                if let SwitchOutcome::Reopened { abandoned } = self.tasks.switch_in(handle, event.timestamp) {
                    debug!("Dropping open interval of {abandoned} at {}", event.timestamp);
                }
            }
            EventKind::TaskSwitchedOut => match self.tasks.switch_out(handle, event.timestamp) {
                SwitchOutcome::Closed { interval, .. } => self.push_task_interval(interval),
                SwitchOutcome::NegativeInterval { handle, start, end } => {
                    debug!("Skipping negative interval for {handle} ({start} -> {end})");
                }
                SwitchOutcome::Unmatched { handle } => {
                    debug!("Unmatched switch-out for {handle} at {}", event.timestamp);
                }
                SwitchOutcome::Opened | SwitchOutcome::Reopened { .. } => {}
            },
            EventKind::IsrEnter => {
                self.isr.enter(event.timestamp);
            }
            EventKind::IsrExit => match self.isr.exit(event.timestamp) {
                IsrOutcome::Closed { start, end } => {
                    self.has_isr_track = true;
                    self.events.push(ChromeTraceEvent {
                        name: "ISR".to_string(),
                        cat: "interrupt".to_string(),
                        ph: "X".to_string(),
                        ts: self.micros(start),
                        dur: Some(self.freq.ticks_to_micros(u64::from(end - start))),
                        s: None,
                        pid: PROCESS_ID,
                        tid: Some(ISR_THREAD_ID),
                        args: BTreeMap::new(),
                    });
                }
                outcome => debug!("ISR exit at {} not exported: {outcome:?}", event.timestamp),
            },
            EventKind::TaskCreate | EventKind::TaskDelete => {
                let name = self.task_instant_name(event.kind, handle);
                self.push_instant(name, "task_lifecycle", "g", ts, handle.0, args([
                    ("handle", json!(handle.to_string())),
                ]));
            }
            EventKind::TaskReady | EventKind::TaskSuspended => {
                let state = if event.kind == EventKind::TaskReady { "ready" } else { "suspended" };
                self.push_instant(
                    self.task_instant_name(event.kind, handle),
                    "task_state",
                    "t",
                    ts,
                    handle.0,
                    args([("handle", json!(handle.to_string())), ("state", json!(state))]),
                );
            }
            EventKind::TaskResumed => {
                let from_isr = event.data != 0;
                let mut name = self.task_instant_name(event.kind, handle);
                if from_isr {
                    name.push_str(" (from ISR)");
                }
                self.push_instant(name, "task_state", "t", ts, handle.0, args([
                    ("handle", json!(handle.to_string())),
                    ("state", json!("resumed")),
                    ("from_isr", json!(from_isr)),
                ]));
            }
            EventKind::QueueCreate | EventKind::QueueSend | EventKind::QueueReceive => {
                self.push_instant(event.kind.label(), "queue", "p", ts, KERNEL_THREAD_ID, args([
                    ("queue", json!(handle.to_string())),
                ]));
            }
            EventKind::SemaphoreCreate
            | EventKind::SemaphoreGive
            | EventKind::SemaphoreTake
            | EventKind::MutexCreate
            | EventKind::MutexGive
            | EventKind::MutexTake => {
                self.push_instant(event.kind.label(), "sync", "p", ts, KERNEL_THREAD_ID, args([
                    ("handle", json!(handle.to_string())),
                ]));
            }
            EventKind::TimerCreate | EventKind::TimerStart | EventKind::TimerStop => {
                self.push_instant(event.kind.label(), "timer", "p", ts, KERNEL_THREAD_ID, args([
                    ("timer", json!(handle.to_string())),
                ]));
            }
            EventKind::Malloc => {
                let size = match self.memory.allocate(handle, event.data) {
                    AllocOutcome::Tracked { size } => Some(size),
                    AllocOutcome::DoubleAllocation { previous, size } => {
                        debug!("Address {handle} re-allocated ({previous} -> {size} bytes)");
                        Some(size)
                    }
                    AllocOutcome::InvalidSize => None,
                };
                self.push_heap_instant(event.kind, ts, handle, size.unwrap_or(0));
                if size.is_some() {
                    self.push_memory_counter(ts);
                }
            }
            EventKind::Free => match self.memory.free(handle, event.data) {
                FreeOutcome::Released { size } => {
                    self.push_heap_instant(event.kind, ts, handle, size);
                    self.push_memory_counter(ts);
                }
                FreeOutcome::Untracked { size } => {
                    self.untracked_frees += 1;
                    self.push_heap_instant(event.kind, ts, handle, size);
                }
            },
        }
    }

    /// `Create: Main`, `Ready: Main`, ...
    fn task_instant_name(&self, kind: EventKind, handle: Handle) -> String {
        let verb = match kind {
            EventKind::TaskCreate => "Create",
            EventKind::TaskDelete => "Delete",
            EventKind::TaskReady => "Ready",
            EventKind::TaskSuspended => "Suspended",
            _ => "Resumed",
        };
        format!("{verb}: {}", self.registry.task_name(handle))
    }

    fn push_instant(
        &mut self,
        name: String,
        cat: &str,
        scope: &str,
        ts: f64,
        tid: u32,
        args: BTreeMap<String, JsonValue>,
    ) {
        self.events.push(ChromeTraceEvent {
            name,
            cat: cat.to_string(),
            ph: "i".to_string(),
            ts,
            dur: None,
            s: Some(scope.to_string()),
            pid: PROCESS_ID,
            tid: Some(tid),
            args,
        });
    }

    fn push_heap_instant(&mut self, kind: EventKind, ts: f64, address: Handle, size: u32) {
        self.push_instant(kind.name().to_lowercase(), "memory", "p", ts, KERNEL_THREAD_ID, args([
            ("address", json!(address.to_string())),
            ("size", json!(size)),
        ]));
    }

    fn push_memory_counter(&mut self, ts: f64) {
        self.events.push(ChromeTraceEvent {
            name: "Memory Usage".to_string(),
            cat: "memory".to_string(),
            ph: "C".to_string(),
            ts,
            dur: None,
            s: None,
            pid: PROCESS_ID,
            tid: None,
            args: args([("bytes", json!(self.memory.current_bytes()))]),
        });
    }

    fn push_thread_names(&mut self) {
        let mut tracks: Vec<(u32, String)> = self
            .task_tracks
            .iter()
            .map(|handle| (handle.0, self.registry.task_name(*handle)))
            .collect();
        if self.has_isr_track {
            tracks.push((ISR_THREAD_ID, "ISR".to_string()));
        }

        for (tid, name) in tracks {
            self.events.push(ChromeTraceEvent {
                name: "thread_name".to_string(),
                cat: String::new(),
                ph: "M".to_string(),
                ts: 0.0,
                dur: None,
                s: None,
                pid: PROCESS_ID,
                tid: Some(tid),
                args: args([("name", json!(name))]),
            });
        }
    }
}

fn args<const N: usize>(entries: [(&str, JsonValue); N]) -> BTreeMap<String, JsonValue> {
    entries.into_iter().map(|(key, value)| (key.to_string(), value)).collect()
}
