//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use crate::config::{AnalyzerConfig, DEFAULT_TIMELINE_EVENTS};
use crate::domain::{CpuFrequency, DEFAULT_CPU_FREQUENCY};

#[derive(Parser, Debug)]
#[command(
    name = "rtt-trace",
    version,
    about = "Analyze RTOS scheduling traces captured over RTT",
    after_help = "\
EXAMPLES:
    rtt-trace capture.bin                               Event summary
    rtt-trace capture.bin --task-runtime --interrupts   Runtime and ISR statistics
    rtt-trace capture.bin --export-chrome-trace out.json
    probe-rs attach ... | rtt-trace -                   Read the capture from stdin"
)]
pub struct Args {
    /// Binary trace capture ('-' reads stdin)
    #[arg(value_name = "TRACEFILE")]
    pub tracefile: PathBuf,

    /// Show event statistics (default when no other analysis is requested)
    #[arg(long)]
    pub stats: bool,

    /// Show per-task runtime and CPU utilization
    #[arg(long)]
    pub task_runtime: bool,

    /// Show interrupt service statistics
    #[arg(long)]
    pub interrupts: bool,

    /// Show heap allocation tracking
    #[arg(long)]
    pub memory: bool,

    /// Show the first events as a timeline
    #[arg(long)]
    pub timeline: bool,

    /// Number of events shown by --timeline
    #[arg(long, value_name = "N", default_value_t = DEFAULT_TIMELINE_EVENTS)]
    pub timeline_events: usize,

    /// Export decoded events as JSON
    #[arg(long, value_name = "FILE")]
    pub export_json: Option<PathBuf>,

    /// Export Chrome Trace Event Format (chrome://tracing)
    #[arg(long, value_name = "FILE")]
    pub export_chrome_trace: Option<PathBuf>,

    /// Export for Perfetto (same document as --export-chrome-trace)
    #[arg(long, value_name = "FILE")]
    pub export_perfetto: Option<PathBuf>,

    /// Add thread_name metadata to the Chrome trace
    #[arg(long)]
    pub thread_names: bool,

    /// Target tick frequency in Hz
    #[arg(
        long,
        value_name = "HZ",
        env = "RTT_TRACE_CPU_FREQ",
        default_value_t = DEFAULT_CPU_FREQUENCY,
        value_parser = parse_cpu_frequency
    )]
    pub cpu_freq: u32,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// True when no analysis flag was given, so the summary is shown.
    /// Export flags do not count as analysis flags.
    pub fn wants_default_summary(&self) -> bool {
        !(self.stats || self.task_runtime || self.interrupts || self.memory || self.timeline)
    }

    pub fn reads_stdin(&self) -> bool {
        self.tracefile.as_os_str() == "-"
    }

    pub fn analyzer_config(&self) -> AnalyzerConfig {
        let cpu_frequency = CpuFrequency::new(self.cpu_freq).unwrap_or_default();
        AnalyzerConfig {
            cpu_frequency,
            timeline_events: self.timeline_events,
            thread_names: self.thread_names,
        }
    }
}

fn parse_cpu_frequency(value: &str) -> Result<u32, String> {
    let hz: u32 = value.parse().map_err(|e| format!("invalid frequency '{value}': {e}"))?;
    if hz == 0 {
        return Err("CPU frequency must be greater than zero".to_string());
    }
    Ok(hz)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["rtt-trace", "capture.bin"]).unwrap();
        assert!(args.wants_default_summary());
        assert!(!args.reads_stdin());

        let config = args.analyzer_config();
        assert_eq!(config.timeline_events, DEFAULT_TIMELINE_EVENTS);
        assert!(!config.thread_names);
    }

    #[test]
    fn test_analysis_flags_disable_default_summary() {
        let args =
            Args::try_parse_from(["rtt-trace", "capture.bin", "--task-runtime", "--cpu-freq", "1000"])
                .unwrap();
        assert!(!args.wants_default_summary());
        assert_eq!(args.analyzer_config().cpu_frequency.hz(), 1000);
    }

    #[test]
    fn test_zero_frequency_rejected() {
        assert!(Args::try_parse_from(["rtt-trace", "capture.bin", "--cpu-freq", "0"]).is_err());
        assert!(Args::try_parse_from(["rtt-trace", "capture.bin", "--cpu-freq", "fast"]).is_err());
    }

    #[test]
    fn test_stdin_and_exports() {
        let args = Args::try_parse_from([
            "rtt-trace",
            "-",
            "--export-chrome-trace",
            "out.json",
            "--thread-names",
        ])
        .unwrap();
        assert!(args.reads_stdin());
        assert!(args.wants_default_summary());
        assert!(args.analyzer_config().thread_names);
    }
}
