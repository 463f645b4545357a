//! Whole-trace summary: event counts per kind and time span.

#![allow(clippy::cast_precision_loss)]

use std::collections::HashMap;

use crate::decode::{EventKind, EventRecord};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceSummary {
    pub total_events: usize,
    /// `(kind, count, percentage of all events)`, sorted by kind name
    pub breakdown: Vec<(EventKind, usize, f64)>,
    pub first_timestamp: Option<u32>,
    pub last_timestamp: Option<u32>,
}

impl TraceSummary {
    /// Last minus first timestamp, 0 when not positive
    pub fn duration_ticks(&self) -> u64 {
        match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) if last > first => u64::from(last - first),
            _ => 0,
        }
    }

    pub fn count_of(&self, kind: EventKind) -> usize {
        self.breakdown
            .iter()
            .find(|(k, _, _)| *k == kind)
            .map_or(0, |(_, count, _)| *count)
    }
}

pub fn summarize(events: &[EventRecord]) -> TraceSummary {
    let mut counts: HashMap<EventKind, usize> = HashMap::new();
    for event in events {
        *counts.entry(event.kind).or_insert(0) += 1;
    }

    let total = events.len();
    let mut breakdown: Vec<(EventKind, usize, f64)> = counts
        .into_iter()
        .map(|(kind, count)| (kind, count, count as f64 / total as f64 * 100.0))
        .collect();
    breakdown.sort_by_key(|(kind, _, _)| kind.name());

    TraceSummary {
        total_events: total,
        breakdown,
        first_timestamp: events.first().map(|event| event.timestamp),
        last_timestamp: events.last().map(|event| event.timestamp),
    }
}
