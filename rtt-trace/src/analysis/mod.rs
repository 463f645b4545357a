//! Analysis logic for decoded traces
//!
//! This module contains pure business logic for reconstructing scheduling and
//! resource behavior, separated from console presentation. Each analysis is an
//! independent pass that owns its own accumulators.

pub mod interrupts;
pub mod memory;
pub mod runtime;
pub mod summary;

pub use interrupts::{analyze_interrupts, InterruptAnalyzer, InterruptStats, IsrOutcome, IsrTracker};
pub use memory::{analyze_memory, AllocOutcome, FreeOutcome, MemoryLedger, MemoryReport};
pub use runtime::{
    analyze_task_runtime, RuntimeAnalyzer, RuntimeReport, SwitchOutcome, SwitchState, TaskInterval,
    TaskRuntime, TaskSwitchTracker,
};
pub use summary::{summarize, TraceSummary};
