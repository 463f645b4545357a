//! # Shared Wire Contract (Target ↔ Host)
//!
//! Defines the constants shared between the trace hooks running on the target
//! firmware and the host-side decoder. The target writes these bytes into an RTT
//! up-channel; the host reads them back from a capture file.
//!
//! ## Stream Layout
//!
//! A capture is a single byte stream mixing two kinds of content:
//!
//! 1. **Text markers** - newline-terminated ASCII lines (`RTT_TRACE_V1`,
//!    `TRACE_START`, the task registry block, `TRACE_STOP`)
//! 2. **Binary records** - fixed [`TRACE_RECORD_SIZE`]-byte packed records
//!
//! The host never relies on framing: it resynchronizes byte-by-byte until a
//! record with a known kind byte decodes.
//!
//! ## Record Layout (little-endian, packed)
//!
//! ```text
//! offset  0  1        5        9        13
//!         ┌──┬────────┬────────┬────────┐
//!         │k │  ts    │ handle │  data  │
//!         └──┴────────┴────────┴────────┘
//! ```

#![no_std]

// ============================================================================
// Record Layout
// ============================================================================

/// Size of one packed trace record in bytes.
pub const TRACE_RECORD_SIZE: usize = 13;

/// Offset of the event kind byte.
pub const RECORD_KIND_OFFSET: usize = 0;

/// Offset of the `u32` timestamp (DWT cycle counter on Cortex-M).
pub const RECORD_TIMESTAMP_OFFSET: usize = 1;

/// Offset of the `u32` handle (task, queue, semaphore, mutex or address).
pub const RECORD_HANDLE_OFFSET: usize = 5;

/// Offset of the `u32` auxiliary data word.
pub const RECORD_DATA_OFFSET: usize = 9;

// ============================================================================
// Event Kind Constants
// ============================================================================

/// **Scheduler**: task placed on the CPU
///
/// Paired with: `TRACE_EVENT_TASK_SWITCHED_OUT`
pub const TRACE_EVENT_TASK_SWITCHED_IN: u8 = 0x01;

/// **Scheduler**: task removed from the CPU
///
/// Paired with: `TRACE_EVENT_TASK_SWITCHED_IN`
pub const TRACE_EVENT_TASK_SWITCHED_OUT: u8 = 0x02;

/// **Task lifecycle**: `xTaskCreate` returned
pub const TRACE_EVENT_TASK_CREATE: u8 = 0x03;

/// **Task lifecycle**: `vTaskDelete` called
pub const TRACE_EVENT_TASK_DELETE: u8 = 0x04;

/// **Task state**: task moved to the ready list
pub const TRACE_EVENT_TASK_READY: u8 = 0x05;

/// **Task state**: task suspended
pub const TRACE_EVENT_TASK_SUSPENDED: u8 = 0x06;

/// **Task state**: task resumed
///
/// Data: `1` when resumed from an ISR, `0` otherwise.
pub const TRACE_EVENT_TASK_RESUMED: u8 = 0x07;

/// **Interrupt**: ISR entry
///
/// Paired with: `TRACE_EVENT_ISR_EXIT`
pub const TRACE_EVENT_ISR_ENTER: u8 = 0x10;

/// **Interrupt**: ISR exit
pub const TRACE_EVENT_ISR_EXIT: u8 = 0x11;

pub const TRACE_EVENT_QUEUE_CREATE: u8 = 0x20;
pub const TRACE_EVENT_QUEUE_SEND: u8 = 0x21;
pub const TRACE_EVENT_QUEUE_RECEIVE: u8 = 0x22;

pub const TRACE_EVENT_SEMAPHORE_CREATE: u8 = 0x30;
pub const TRACE_EVENT_SEMAPHORE_GIVE: u8 = 0x31;
pub const TRACE_EVENT_SEMAPHORE_TAKE: u8 = 0x32;

pub const TRACE_EVENT_MUTEX_CREATE: u8 = 0x40;
pub const TRACE_EVENT_MUTEX_GIVE: u8 = 0x41;
pub const TRACE_EVENT_MUTEX_TAKE: u8 = 0x42;

pub const TRACE_EVENT_TIMER_CREATE: u8 = 0x50;
pub const TRACE_EVENT_TIMER_START: u8 = 0x51;
pub const TRACE_EVENT_TIMER_STOP: u8 = 0x52;

/// **Heap**: `pvPortMalloc` returned
///
/// Handle: allocated address. Data: requested size in bytes.
pub const TRACE_EVENT_MALLOC: u8 = 0x60;

/// **Heap**: `vPortFree` called
///
/// Handle: freed address. Data: block size if the port knows it, else 0.
pub const TRACE_EVENT_FREE: u8 = 0x61;

// ============================================================================
// Text Markers
// ============================================================================

/// Written once by `rtt_trace_init`.
pub const STREAM_HEADER_MARKER: &str = "RTT_TRACE_V1";

/// Written by `rtt_trace_start`, immediately followed by the task registry.
pub const TRACE_START_MARKER: &str = "TRACE_START";

/// Written by `rtt_trace_stop` after the final flush.
pub const TRACE_STOP_MARKER: &str = "TRACE_STOP";

pub const TASK_REGISTRY_START: &str = "TASK_REGISTRY_START";
pub const TASK_REGISTRY_END: &str = "TASK_REGISTRY_END";

/// Registry entry prefix. Full line format: `TASK:<decimal handle>:<name>`.
pub const TASK_ENTRY_PREFIX: &str = "TASK:";
