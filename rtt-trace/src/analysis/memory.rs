//! Heap allocation tracking.
//!
//! Reconciles malloc/free events into a running byte counter keyed by address.
//!
//! - **`MemoryLedger`** - address → size map plus running total, pure
//! - **`analyze_memory()`** - whole-trace pass with warnings and a report
//!
//! A capture that starts after boot sees frees for blocks allocated before
//! tracing began. Those are counted as untracked and never subtracted, so the
//! running total cannot go negative; it reflects only blocks seen allocated.

use log::warn;
use std::collections::HashMap;

use crate::decode::{EventKind, EventRecord};
use crate::domain::Handle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocOutcome {
    Tracked { size: u32 },
    /// Address already tracked; the new size replaces the old one
    DoubleAllocation { previous: u32, size: u32 },
    /// Zero size; the ledger is left untouched
    InvalidSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeOutcome {
    /// Tracked block removed, its recorded size subtracted
    Released { size: u32 },
    /// Address unknown; `size` is the event's own data for display only (0 if absent)
    Untracked { size: u32 },
}

/// Address → size map with a running total
///
/// Invariant: `current_bytes()` equals the sum of all tracked sizes.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    allocations: HashMap<Handle, u32>,
    current: u64,
    peak: u64,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, address: Handle, size: u32) -> AllocOutcome {
        if size == 0 {
            return AllocOutcome::InvalidSize;
        }

        self.current += u64::from(size);
        let outcome = match self.allocations.insert(address, size) {
            None => AllocOutcome::Tracked { size },
            Some(previous) => {
                self.current -= u64::from(previous);
                AllocOutcome::DoubleAllocation { previous, size }
            }
        };
        self.peak = self.peak.max(self.current);
        outcome
    }

    pub fn free(&mut self, address: Handle, data: u32) -> FreeOutcome {
        match self.allocations.remove(&address) {
            Some(size) => {
                self.current -= u64::from(size);
                FreeOutcome::Released { size }
            }
            None => FreeOutcome::Untracked { size: data },
        }
    }

    pub fn current_bytes(&self) -> u64 {
        self.current
    }

    pub fn peak_bytes(&self) -> u64 {
        self.peak
    }

    /// Blocks allocated and not yet freed
    pub fn outstanding(&self) -> usize {
        self.allocations.len()
    }

    pub fn size_of(&self, address: Handle) -> Option<u32> {
        self.allocations.get(&address).copied()
    }
}

/// Result of a memory tracking pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryReport {
    pub allocations: u64,
    pub frees: u64,
    pub current_bytes: u64,
    pub peak_bytes: u64,
    pub outstanding_allocations: usize,
    pub double_allocations: u64,
    pub invalid_sizes: u64,
    pub untracked_frees: u64,
}

/// Track heap usage over a whole decoded trace
pub fn analyze_memory(events: &[EventRecord]) -> MemoryReport {
    let mut ledger = MemoryLedger::new();
    let mut report = MemoryReport::default();

    for event in events {
        let address = event.handle;
        match event.kind {
            EventKind::Malloc => {
                report.allocations += 1;
                match ledger.allocate(address, event.data) {
                    AllocOutcome::Tracked { .. } => {}
                    AllocOutcome::DoubleAllocation { previous, size } => {
                        warn!(
                            "Address {address} allocated twice without free ({previous} -> {size} bytes)"
                        );
                        report.double_allocations += 1;
                    }
                    AllocOutcome::InvalidSize => {
                        warn!("Invalid malloc size {} at address {address}", event.data);
                        report.invalid_sizes += 1;
                    }
                }
            }
            EventKind::Free => {
                report.frees += 1;
                if let FreeOutcome::Untracked { size } = ledger.free(address, event.data) {
                    if size == 0 {
                        warn!("Invalid free size {size} at address {address}");
                    }
                    warn!("Free of untracked address {address}");
                    report.untracked_frees += 1;
                }
            }
            _ => {}
        }
    }

    report.current_bytes = ledger.current_bytes();
    report.peak_bytes = ledger.peak_bytes();
    report.outstanding_allocations = ledger.outstanding();
    report
}
