//! Analyzer configuration
//!
//! Resolved once from the command line (flag, then `RTT_TRACE_CPU_FREQ`, then
//! defaults) and passed by reference to the reports and exporters.

use crate::domain::CpuFrequency;

/// Events shown by the timeline view unless overridden
pub const DEFAULT_TIMELINE_EVENTS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Tick frequency used for every tick → time conversion
    pub cpu_frequency: CpuFrequency,
    pub timeline_events: usize,
    /// Emit `thread_name` metadata events in the Chrome trace
    pub thread_names: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            cpu_frequency: CpuFrequency::default(),
            timeline_events: DEFAULT_TIMELINE_EVENTS,
            thread_names: false,
        }
    }
}

impl AnalyzerConfig {
    #[must_use]
    pub fn with_cpu_frequency(mut self, cpu_frequency: CpuFrequency) -> Self {
        self.cpu_frequency = cpu_frequency;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DEFAULT_CPU_FREQUENCY;

    #[test]
    fn test_defaults() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.cpu_frequency.hz(), DEFAULT_CPU_FREQUENCY);
        assert_eq!(config.timeline_events, 100);
        assert!(!config.thread_names);
    }

    #[test]
    fn test_with_cpu_frequency() {
        let freq = CpuFrequency::new(48_000_000).unwrap();
        let config = AnalyzerConfig::default().with_cpu_frequency(freq);
        assert_eq!(config.cpu_frequency, freq);
    }
}
