//! Task runtime reconstruction.
//!
//! Rebuilds task execution intervals from switch-in / switch-out pairs and
//! aggregates them per task.
//!
//! # Architecture
//!
//! - **`TaskSwitchTracker`** - single-slot state machine, pure (no logging)
//! - **`RuntimeAnalyzer`** - drives the tracker, logs anomalies, accumulates
//!   per-task statistics
//! - **`analyze_task_runtime()`** - batch analysis of a decoded trace
//!
//! ## State Machine
//!
//! ```text
//!            switch_in(h)                switch_out(h')
//!   Idle ───────────────▶ Running(h, t0) ───────────────▶ Idle
//!    │ ▲                    │      ▲        accumulate t - t0 for h'
//!    │ └── switch_out ──────┘      │
//!    │     (unmatched)       switch_in(h2): prior interval dropped
//!    └── switch_out: unmatched, stay Idle
//! ```
//!
//! Anomalies never abort the pass. A capture that starts mid-execution
//! typically opens with an unmatched switch-out, and one that is cut short ends
//! with a task still running; both are counted and reported.

// Percentage calculations intentionally convert u64 to f64
#![allow(clippy::cast_precision_loss)]

use log::{info, warn};
use std::collections::HashMap;

use crate::decode::{EventKind, EventRecord};
use crate::domain::{CpuFrequency, Handle};

/// Current state of the single execution slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwitchState {
    #[default]
    Idle,
    Running { handle: Handle, start: u32 },
}

/// A closed execution interval. `end >= start` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskInterval {
    pub handle: Handle,
    pub start: u32,
    pub end: u32,
}

impl TaskInterval {
    pub fn ticks(&self) -> u64 {
        u64::from(self.end - self.start)
    }
}

/// What a switch event did to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Idle → Running
    Opened,
    /// Switch-in while another task was running; its open interval is dropped
    Reopened { abandoned: Handle },
    /// Interval closed. `mismatch` holds the running handle when the
    /// switched-out handle differed from it; the interval is attributed to the
    /// switched-out handle.
    Closed { interval: TaskInterval, mismatch: Option<Handle> },
    /// Close timestamp precedes the open timestamp; nothing accumulated
    NegativeInterval { handle: Handle, start: u32, end: u32 },
    /// Switch-out while idle
    Unmatched { handle: Handle },
}

/// Single-slot switch pairing state machine
#[derive(Debug, Clone, Default)]
pub struct TaskSwitchTracker {
    state: SwitchState,
}

impl TaskSwitchTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SwitchState {
        self.state
    }

    pub fn switch_in(&mut self, handle: Handle, timestamp: u32) -> SwitchOutcome {
        let previous = std::mem::replace(
            &mut self.state,
            SwitchState::Running { handle, start: timestamp },
        );
        match previous {
            SwitchState::Idle => SwitchOutcome::Opened,
            SwitchState::Running { handle: abandoned, .. } => SwitchOutcome::Reopened { abandoned },
        }
    }

    pub fn switch_out(&mut self, handle: Handle, timestamp: u32) -> SwitchOutcome {
        match std::mem::take(&mut self.state) {
            SwitchState::Idle => SwitchOutcome::Unmatched { handle },
            SwitchState::Running { handle: running, start } => {
                let mismatch = (running != handle).then_some(running);
                close(handle, start, timestamp, mismatch)
            }
        }
    }

    /// Close a still-running task at `last_timestamp` (end of trace)
    pub fn close_at(&mut self, last_timestamp: u32) -> Option<SwitchOutcome> {
        match std::mem::take(&mut self.state) {
            SwitchState::Idle => None,
            SwitchState::Running { handle, start } => Some(close(handle, start, last_timestamp, None)),
        }
    }
}

fn close(handle: Handle, start: u32, end: u32, mismatch: Option<Handle>) -> SwitchOutcome {
    if end < start {
        SwitchOutcome::NegativeInterval { handle, start, end }
    } else {
        SwitchOutcome::Closed { interval: TaskInterval { handle, start, end }, mismatch }
    }
}

/// Per-task accumulator, created on first closed interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRuntime {
    pub handle: Handle,
    pub total_ticks: u64,
    pub intervals: u64,
    pub min_ticks: u64,
    pub max_ticks: u64,
}

impl TaskRuntime {
    fn new(handle: Handle) -> Self {
        Self { handle, total_ticks: 0, intervals: 0, min_ticks: u64::MAX, max_ticks: 0 }
    }

    fn record(&mut self, ticks: u64) {
        self.total_ticks += ticks;
        self.intervals += 1;
        self.min_ticks = self.min_ticks.min(ticks);
        self.max_ticks = self.max_ticks.max(ticks);
    }

    pub fn average_ticks(&self) -> f64 {
        if self.intervals == 0 {
            0.0
        } else {
            self.total_ticks as f64 / self.intervals as f64
        }
    }

    pub fn total_seconds(&self, freq: CpuFrequency) -> f64 {
        freq.ticks_to_seconds(self.total_ticks)
    }
}

/// Result of a runtime reconstruction pass
#[derive(Debug, Clone, Default)]
pub struct RuntimeReport {
    /// Sorted by descending total runtime
    pub tasks: Vec<TaskRuntime>,
    pub total_runtime_ticks: u64,
    /// Last timestamp minus first timestamp, 0 when not positive
    pub trace_duration_ticks: u64,
    pub unmatched_switch_in: usize,
    pub unmatched_switch_out: usize,
    pub handle_mismatches: usize,
    pub negative_intervals: usize,
    /// Task closed implicitly at the last event's timestamp
    pub still_running: Option<Handle>,
}

impl RuntimeReport {
    pub fn task(&self, handle: Handle) -> Option<&TaskRuntime> {
        self.tasks.iter().find(|task| task.handle == handle)
    }

    /// Total task runtime as a percentage of trace duration (0 for an empty span)
    pub fn cpu_utilization(&self) -> f64 {
        self.percentage_of_trace(self.total_runtime_ticks)
    }

    pub fn idle_percentage(&self) -> f64 {
        100.0 - self.cpu_utilization()
    }

    pub fn task_percentage(&self, task: &TaskRuntime) -> f64 {
        self.percentage_of_trace(task.total_ticks)
    }

    pub fn has_validation_warnings(&self) -> bool {
        self.unmatched_switch_in > 0 || self.unmatched_switch_out > 0
    }

    fn percentage_of_trace(&self, ticks: u64) -> f64 {
        if self.trace_duration_ticks == 0 {
            0.0
        } else {
            ticks as f64 / self.trace_duration_ticks as f64 * 100.0
        }
    }
}

/// Streaming runtime reconstructor
#[derive(Debug, Default)]
pub struct RuntimeAnalyzer {
    tracker: TaskSwitchTracker,
    tasks: HashMap<Handle, TaskRuntime>,
    first_timestamp: Option<u32>,
    last_timestamp: Option<u32>,
    unmatched_switch_in: usize,
    unmatched_switch_out: usize,
    handle_mismatches: usize,
    negative_intervals: usize,
}

impl RuntimeAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one event; non-switch events only advance the trace span
    pub fn record_event(&mut self, event: &EventRecord) {
        self.first_timestamp.get_or_insert(event.timestamp);
        self.last_timestamp = Some(event.timestamp);

        let outcome = match event.kind {
            EventKind::TaskSwitchedIn => self.tracker.switch_in(event.handle, event.timestamp),
            EventKind::TaskSwitchedOut => self.tracker.switch_out(event.handle, event.timestamp),
            _ => return,
        };
        self.apply(outcome);
    }

    fn apply(&mut self, outcome: SwitchOutcome) {
        match outcome {
            SwitchOutcome::Opened => {}
            SwitchOutcome::Reopened { abandoned } => {
                warn!("Task {abandoned} switched in without switching out");
                self.unmatched_switch_in += 1;
            }
            SwitchOutcome::Unmatched { handle } => {
                warn!("Task {handle} switched out without switching in");
                self.unmatched_switch_out += 1;
            }
            SwitchOutcome::NegativeInterval { handle, start, end } => {
                warn!(
                    "Negative runtime for task {handle} ({} cycles)",
                    i64::from(end) - i64::from(start)
                );
                self.negative_intervals += 1;
            }
            SwitchOutcome::Closed { interval, mismatch } => {
                if let Some(running) = mismatch {
                    warn!(
                        "Handle mismatch - active task {running} but switched out {}",
                        interval.handle
                    );
                    self.handle_mismatches += 1;
                }
                self.tasks
                    .entry(interval.handle)
                    .or_insert_with(|| TaskRuntime::new(interval.handle))
                    .record(interval.ticks());
            }
        }
    }

    /// Flush the open interval (if any) and build the report
    pub fn finish(mut self) -> RuntimeReport {
        let mut still_running = None;
        if let Some(last) = self.last_timestamp {
            if let SwitchState::Running { handle, .. } = self.tracker.state() {
                info!("Task {handle} was still running when trace ended");
                still_running = Some(handle);
            }
            if let Some(outcome) = self.tracker.close_at(last) {
                self.apply(outcome);
            }
        }

        let trace_duration_ticks = match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) if last > first => u64::from(last - first),
            _ => 0,
        };

        let mut tasks: Vec<TaskRuntime> = self.tasks.into_values().collect();
        tasks.sort_by(|a, b| b.total_ticks.cmp(&a.total_ticks).then(a.handle.cmp(&b.handle)));
        let total_runtime_ticks = tasks.iter().map(|task| task.total_ticks).sum();

        RuntimeReport {
            tasks,
            total_runtime_ticks,
            trace_duration_ticks,
            unmatched_switch_in: self.unmatched_switch_in,
            unmatched_switch_out: self.unmatched_switch_out,
            handle_mismatches: self.handle_mismatches,
            negative_intervals: self.negative_intervals,
            still_running,
        }
    }
}

/// Reconstruct task runtimes over a whole decoded trace
pub fn analyze_task_runtime(events: &[EventRecord]) -> RuntimeReport {
    let mut analyzer = RuntimeAnalyzer::new();
    for event in events {
        analyzer.record_event(event);
    }
    analyzer.finish()
}
