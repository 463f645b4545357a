//! Task registry extraction.
//!
//! The target announces its tasks as a text block inside the same stream as
//! the binary records:
//!
//! ```text
//! TASK_REGISTRY_START
//! TASK:537133312:IDLE
//! TASK:537133568:Main
//! TASK_REGISTRY_END
//! ```
//!
//! The buffer is viewed as lossy UTF-8 so binary bytes around the block never
//! fail the scan. Malformed entry lines are logged and skipped.

use log::{debug, warn};
use rtt_trace_common::{TASK_ENTRY_PREFIX, TASK_REGISTRY_END, TASK_REGISTRY_START};
use std::collections::BTreeMap;

use crate::domain::Handle;

/// Handle → task name mapping, built once per trace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskRegistry {
    tasks: BTreeMap<Handle, String>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task; a repeated handle keeps the latest name
    pub fn insert(&mut self, handle: Handle, name: impl Into<String>) {
        let name = name.into();
        if let Some(previous) = self.tasks.insert(handle, name.clone()) {
            debug!("Task {handle} re-registered: '{previous}' -> '{name}'");
        }
    }

    pub fn get(&self, handle: Handle) -> Option<&str> {
        self.tasks.get(&handle).map(String::as_str)
    }

    /// Registered name, or `Task_0x........` for unknown handles
    pub fn task_name(&self, handle: Handle) -> String {
        match self.get(handle) {
            Some(name) => name.to_string(),
            None => format!("Task_{handle}"),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Entries ordered by handle
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &str)> {
        self.tasks.iter().map(|(handle, name)| (*handle, name.as_str()))
    }

    /// Decimal-string keyed copy for JSON metadata
    pub fn to_string_map(&self) -> BTreeMap<String, String> {
        self.tasks.iter().map(|(handle, name)| (handle.0.to_string(), name.clone())).collect()
    }
}

impl FromIterator<(Handle, String)> for TaskRegistry {
    fn from_iter<I: IntoIterator<Item = (Handle, String)>>(iter: I) -> Self {
        let mut registry = TaskRegistry::new();
        for (handle, name) in iter {
            registry.insert(handle, name);
        }
        registry
    }
}

/// Scan `buf` for the registry block.
///
/// Returns an empty registry when either marker is missing.
pub fn extract_registry(buf: &[u8]) -> TaskRegistry {
    let text = String::from_utf8_lossy(buf);
    let mut registry = TaskRegistry::new();

    let Some(start) = text.find(TASK_REGISTRY_START) else {
        warn!("No task registry found in trace data");
        return registry;
    };
    let body_start = start + TASK_REGISTRY_START.len();
    let Some(body_len) = text[body_start..].find(TASK_REGISTRY_END) else {
        warn!("Task registry start marker has no matching end marker");
        return registry;
    };

    for line in text[body_start..body_start + body_len].lines() {
        let Some(entry) = line.strip_prefix(TASK_ENTRY_PREFIX) else {
            continue;
        };
        match parse_entry(entry) {
            Some((handle, name)) => {
                debug!("Registered task: handle={handle} ({}), name='{name}'", handle.0);
                registry.insert(handle, name);
            }
            None => warn!("Failed to parse task entry '{line}'"),
        }
    }

    registry
}

/// Parse `<decimal handle>:<name>` (the part after `TASK:`)
fn parse_entry(entry: &str) -> Option<(Handle, String)> {
    let (handle, name) = entry.split_once(':')?;
    let handle = handle.trim().parse::<u32>().ok()?;
    Some((Handle(handle), name.trim().to_string()))
}
