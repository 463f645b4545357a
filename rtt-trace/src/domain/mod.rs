//! Domain model for rtt-trace
//!
//! This module contains core domain types and errors that provide:
//! - Compile-time safety via newtype pattern
//! - Self-documenting function signatures
//! - Structured error handling

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{CpuFrequency, Handle, DEFAULT_CPU_FREQUENCY};

pub use errors::{ExportError, TraceError};
