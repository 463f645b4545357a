//! Trace export functionality
//!
//! Two independent projections of a decoded trace:
//! - [`json`]: one flat record per event plus trace metadata
//! - [`chrome_trace`]: Chrome Trace Event Format for chrome://tracing and Perfetto
//!
//! Both are pure functions of (events, registry, tick frequency) and build
//! their document once at construction.

pub mod chrome_trace;
pub mod json;

pub use chrome_trace::{ChromeTrace, ChromeTraceEvent, ChromeTraceExporter, ISR_THREAD_ID};
pub use json::{JsonEvent, JsonExporter, JsonTraceDocument};

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::domain::ExportError;

/// Open `path` for a buffered export write
pub fn create_output(path: &Path) -> Result<BufWriter<File>, ExportError> {
    let file = File::create(path)
        .map_err(|source| ExportError::WriteFailed { path: path.to_path_buf(), source })?;
    Ok(BufWriter::new(file))
}
