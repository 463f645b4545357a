//! Generic JSON export: one flat record per decoded event.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

use crate::decode::{EventRecord, TaskRegistry};
use crate::domain::{CpuFrequency, ExportError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonMetadata {
    pub total_events: usize,
    pub cpu_frequency: u32,
    /// Decimal handle → task name
    pub task_registry: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonEvent {
    /// Wire name of the kind (e.g. `TASK_SWITCHED_IN`)
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: u32,
    pub time_seconds: f64,
    pub handle: u32,
    pub data: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonTraceDocument {
    pub metadata: JsonMetadata,
    pub events: Vec<JsonEvent>,
}

/// JSON exporter; the document is fixed at construction
pub struct JsonExporter {
    document: JsonTraceDocument,
}

impl JsonExporter {
    pub fn new(events: &[EventRecord], registry: &TaskRegistry, freq: CpuFrequency) -> Self {
        let events = events
            .iter()
            .map(|event| JsonEvent {
                kind: event.kind.name().to_string(),
                timestamp: event.timestamp,
                time_seconds: freq.ticks_to_seconds(u64::from(event.timestamp)),
                handle: event.handle.0,
                data: event.data,
            })
            .collect::<Vec<_>>();

        let metadata = JsonMetadata {
            total_events: events.len(),
            cpu_frequency: freq.hz(),
            task_registry: registry.to_string_map(),
        };

        Self { document: JsonTraceDocument { metadata, events } }
    }

    pub fn document(&self) -> &JsonTraceDocument {
        &self.document
    }

    pub fn event_count(&self) -> usize {
        self.document.events.len()
    }

    /// Write the document as pretty-printed JSON to any writer
    pub fn export<W: Write>(&self, mut writer: W) -> Result<(), ExportError> {
        serde_json::to_writer_pretty(&mut writer, &self.document)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::EventKind;
    use crate::domain::Handle;

    #[test]
    fn test_flat_records_and_metadata() {
        let events = [
            EventRecord::new(EventKind::TaskSwitchedIn, 1000, 100, 0),
            EventRecord::new(EventKind::Malloc, 2000, 0x2000_4000, 64),
        ];
        let registry: TaskRegistry = [(Handle(100), "Idle".to_string())].into_iter().collect();
        let exporter = JsonExporter::new(&events, &registry, CpuFrequency::new(1000).unwrap());

        let mut buffer = Vec::new();
        exporter.export(&mut buffer).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buffer).unwrap();

        assert_eq!(json["metadata"]["total_events"], 2);
        assert_eq!(json["metadata"]["cpu_frequency"], 1000);
        assert_eq!(json["metadata"]["task_registry"]["100"], "Idle");
        assert_eq!(json["events"][0]["type"], "TASK_SWITCHED_IN");
        assert_eq!(json["events"][0]["time_seconds"], 1.0);
        assert_eq!(json["events"][1]["type"], "MALLOC");
        assert_eq!(json["events"][1]["handle"], 0x2000_4000);
        assert_eq!(json["events"][1]["data"], 64);
    }

    #[test]
    fn test_empty_trace_exports_empty_event_list() {
        let exporter = JsonExporter::new(&[], &TaskRegistry::new(), CpuFrequency::default());
        assert_eq!(exporter.event_count(), 0);
        assert!(exporter.document().metadata.task_registry.is_empty());
    }
}
