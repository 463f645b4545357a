//! Interrupt service interval reconstruction.
//!
//! Two-state machine (`Idle` / `InIsr(start)`) over ISR enter/exit events.
//! Only one nesting level is tracked: an enter while an interval is open
//! replaces it, so a nested interrupt's exit closes the interval started by
//! the inner enter and the outer exit is counted as unmatched.

#![allow(clippy::cast_precision_loss)]

use log::{debug, warn};

use crate::decode::{EventKind, EventRecord};

/// What an ISR event did to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsrOutcome {
    Opened,
    /// Enter while an interval was open; the older start is discarded
    Replaced { discarded_start: u32 },
    Closed { start: u32, end: u32 },
    NegativeDuration { start: u32, end: u32 },
    UnmatchedExit,
}

/// Single-slot ISR pairing state machine
#[derive(Debug, Clone, Copy, Default)]
pub struct IsrTracker {
    open: Option<u32>,
}

impl IsrTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn enter(&mut self, timestamp: u32) -> IsrOutcome {
        match self.open.replace(timestamp) {
            None => IsrOutcome::Opened,
            Some(discarded_start) => IsrOutcome::Replaced { discarded_start },
        }
    }

    pub fn exit(&mut self, timestamp: u32) -> IsrOutcome {
        match self.open.take() {
            None => IsrOutcome::UnmatchedExit,
            Some(start) if timestamp < start => IsrOutcome::NegativeDuration { start, end: timestamp },
            Some(start) => IsrOutcome::Closed { start, end: timestamp },
        }
    }
}

/// Aggregated interrupt statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterruptStats {
    /// ISR_ENTER events seen
    pub enters: u64,
    /// Closed intervals
    pub completed: u64,
    pub total_ticks: u64,
    pub min_ticks: Option<u64>,
    pub max_ticks: Option<u64>,
    pub unmatched_exits: u64,
    /// Enters that replaced a still-open interval
    pub replaced: u64,
    pub negative_durations: u64,
    /// An interval was still open when the trace ended
    pub open_at_end: bool,
}

impl InterruptStats {
    pub fn average_ticks(&self) -> f64 {
        if self.completed == 0 {
            0.0
        } else {
            self.total_ticks as f64 / self.completed as f64
        }
    }

    fn record(&mut self, ticks: u64) {
        self.completed += 1;
        self.total_ticks += ticks;
        self.min_ticks = Some(self.min_ticks.map_or(ticks, |min| min.min(ticks)));
        self.max_ticks = Some(self.max_ticks.map_or(ticks, |max| max.max(ticks)));
    }
}

/// Streaming interrupt reconstructor
#[derive(Debug, Default)]
pub struct InterruptAnalyzer {
    tracker: IsrTracker,
    stats: InterruptStats,
}

impl InterruptAnalyzer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&mut self, event: &EventRecord) {
        match event.kind {
            EventKind::IsrEnter => {
                self.stats.enters += 1;
                if let IsrOutcome::Replaced { discarded_start } = self.tracker.enter(event.timestamp) {
                    debug!("ISR enter at {} replaced open interval from {discarded_start}", event.timestamp);
                    self.stats.replaced += 1;
                }
            }
            EventKind::IsrExit => match self.tracker.exit(event.timestamp) {
                IsrOutcome::Closed { start, end } => self.stats.record(u64::from(end - start)),
                IsrOutcome::NegativeDuration { start, end } => {
                    warn!("Negative ISR duration (enter {start}, exit {end})");
                    self.stats.negative_durations += 1;
                }
                IsrOutcome::UnmatchedExit => {
                    warn!("ISR exit at {} without matching enter", event.timestamp);
                    self.stats.unmatched_exits += 1;
                }
                IsrOutcome::Opened | IsrOutcome::Replaced { .. } => {}
            },
            _ => {}
        }
    }

    pub fn finish(mut self) -> InterruptStats {
        self.stats.open_at_end = self.tracker.is_open();
        self.stats
    }
}

/// Reconstruct interrupt statistics over a whole decoded trace
pub fn analyze_interrupts(events: &[EventRecord]) -> InterruptStats {
    let mut analyzer = InterruptAnalyzer::new();
    for event in events {
        analyzer.record_event(event);
    }
    analyzer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enter(ts: u32) -> EventRecord {
        EventRecord::new(EventKind::IsrEnter, ts, 0, 0)
    }

    fn exit(ts: u32) -> EventRecord {
        EventRecord::new(EventKind::IsrExit, ts, 0, 0)
    }

    #[test]
    fn test_paired_intervals() {
        let stats = analyze_interrupts(&[enter(100), exit(130), enter(200), exit(210)]);

        assert_eq!(stats.enters, 2);
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.total_ticks, 40);
        assert_eq!(stats.min_ticks, Some(10));
        assert_eq!(stats.max_ticks, Some(30));
        assert_eq!(stats.average_ticks(), 20.0);
        assert!(!stats.open_at_end);
    }

    #[test]
    fn test_nested_enter_replaces_open_interval() {
        // Outer 100..200 with inner 120..150: only the inner interval is measured
        let stats = analyze_interrupts(&[enter(100), enter(120), exit(150), exit(200)]);

        assert_eq!(stats.enters, 2);
        assert_eq!(stats.replaced, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.total_ticks, 30);
        assert_eq!(stats.unmatched_exits, 1);
    }

    #[test]
    fn test_unmatched_exit_and_open_at_end() {
        let stats = analyze_interrupts(&[exit(5), enter(10)]);

        assert_eq!(stats.unmatched_exits, 1);
        assert_eq!(stats.completed, 0);
        assert_eq!(stats.min_ticks, None);
        assert_eq!(stats.average_ticks(), 0.0);
        assert!(stats.open_at_end);
    }

    #[test]
    fn test_negative_duration_is_skipped() {
        let stats = analyze_interrupts(&[enter(100), exit(50)]);
        assert_eq!(stats.negative_durations, 1);
        assert_eq!(stats.completed, 0);
    }

    #[test]
    fn test_tracker_transitions() {
        let mut tracker = IsrTracker::new();
        assert_eq!(tracker.exit(1), IsrOutcome::UnmatchedExit);
        assert_eq!(tracker.enter(2), IsrOutcome::Opened);
        assert_eq!(tracker.enter(3), IsrOutcome::Replaced { discarded_start: 2 });
        assert_eq!(tracker.exit(9), IsrOutcome::Closed { start: 3, end: 9 });
        assert!(!tracker.is_open());
    }
}
