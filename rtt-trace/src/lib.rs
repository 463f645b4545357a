//! # rtt-trace - RTOS Trace Decoder and Analyzer
//!
//! rtt-trace turns a raw capture of kernel scheduling events, streamed from an
//! embedded target over a debug channel, into runtime statistics and into
//! documents for trace viewers. The capture mixes fixed-width binary records
//! with text markers and a task-name registry; the decoder recovers from both.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Embedded Target (RTOS)                       │
//! │   kernel trace hooks → 13-byte records + text markers/registry  │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ raw capture (file or stdin)
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     rtt-trace (This Crate)                      │
//! │                                                                 │
//! │  ┌──────────────┐          ┌──────────────┐                     │
//! │  │   Stream     │          │  Registry +  │                     │
//! │  │   Decoder    │          │   Markers    │                     │
//! │  │  (binary)    │          │   (text)     │                     │
//! │  └──────┬───────┘          └──────┬───────┘                     │
//! │         └──────────┬──────────────┘                             │
//! │                    ▼                                            │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐         │
//! │  │   Analysis   │   │    Export    │   │    Report    │         │
//! │  │ runtime/ISR/ │   │ JSON, Chrome │   │  (console)   │         │
//! │  │    memory    │   │    trace     │   │              │         │
//! │  └──────────────┘   └──────────────┘   └──────────────┘         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`decode`]: record codec, resynchronizing stream decoder (batch, lazy,
//!   incremental), task registry extraction, session markers
//! - [`analysis`]: event summary, task runtime reconstruction, interrupt
//!   intervals, heap tracking
//! - [`export`]: generic JSON document and Chrome Trace Event Format
//!   (chrome://tracing, Perfetto)
//! - [`report`]: console views of the analyses
//! - [`trace_data`]: loads a capture from a file, buffer, or reader
//! - [`config`]: tick frequency and display options
//! - [`cli`]: command-line argument parsing
//! - [`domain`]: core domain types (Handle, CpuFrequency) and errors
//!
//! ## Typical Usage
//!
//! ```bash
//! # Event summary
//! rtt-trace capture.bin
//!
//! # Task CPU usage and interrupt latency at the target's real clock
//! rtt-trace capture.bin --task-runtime --interrupts --cpu-freq 168000000
//!
//! # Open in chrome://tracing or https://ui.perfetto.dev
//! rtt-trace capture.bin --export-chrome-trace trace.json
//! ```
//!
//! ## Key Concepts
//!
//! - **Tick**: target timer unit; converted to time via the configured frequency
//! - **Resynchronization**: single-byte advance past anything that is not a record
//! - **Handle**: opaque target pointer naming a task, kernel object, or heap block

pub mod analysis;
pub mod cli;
pub mod config;
pub mod decode;
pub mod domain;
pub mod export;
pub mod report;
pub mod trace_data;
