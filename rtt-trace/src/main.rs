//! # rtt-trace - Main Entry Point
//!
//! Loads a capture (file or stdin), prints the requested analyses and writes
//! the requested exports. With no analysis flag the event summary is shown.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::io::Write;
use std::path::Path;

use rtt_trace::analysis::{analyze_interrupts, analyze_memory, analyze_task_runtime, summarize};
use rtt_trace::cli::Args;
use rtt_trace::config::AnalyzerConfig;
use rtt_trace::domain::TraceError;
use rtt_trace::export::{create_output, ChromeTraceExporter, JsonExporter};
use rtt_trace::report;
use rtt_trace::trace_data::TraceData;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_NOINPUT: i32 = 66;

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { EXIT_USAGE } else { EXIT_SUCCESS };
            e.print().ok();
            std::process::exit(code);
        }
    };

    let default_filter = if args.quiet { "error" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    std::process::exit(match run(&args) {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<TraceError>() {
        Some(TraceError::Read { .. } | TraceError::Empty) => EXIT_NOINPUT,
        _ => EXIT_ERROR,
    }
}

fn load(args: &Args) -> Result<TraceData> {
    if args.reads_stdin() {
        let stdin = std::io::stdin();
        Ok(TraceData::from_reader(stdin.lock())?)
    } else {
        Ok(TraceData::from_file(&args.tracefile)?)
    }
}

fn run(args: &Args) -> Result<()> {
    let config = args.analyzer_config();
    let quiet = args.quiet;
    let trace = load(args)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if !quiet {
        writeln!(out, "rtt-trace v{}", env!("CARGO_PKG_VERSION"))?;
        writeln!(out, "Parsed {} trace events", trace.event_count())?;
        writeln!(out, "Registered {} tasks", trace.registry.len())?;
        writeln!(out, "CPU frequency: {}", config.cpu_frequency)?;
        report::write_registry(&mut out, &trace.registry)?;
    }

    let freq = config.cpu_frequency;
    if args.stats || args.wants_default_summary() {
        let summary = summarize(&trace.events);
        report::write_summary(&mut out, &summary, trace.markers, freq)?;
    }
    if args.task_runtime {
        let runtime = analyze_task_runtime(&trace.events);
        report::write_task_runtime(&mut out, &runtime, &trace.registry, freq)?;
    }
    if args.interrupts {
        report::write_interrupts(&mut out, &analyze_interrupts(&trace.events), freq)?;
    }
    if args.memory {
        report::write_memory(&mut out, &analyze_memory(&trace.events))?;
    }
    if args.timeline {
        report::write_timeline(
            &mut out,
            &trace.events,
            &trace.registry,
            freq,
            config.timeline_events,
        )?;
    }

    if let Some(ref path) = args.export_json {
        let exporter = JsonExporter::new(&trace.events, &trace.registry, freq);
        exporter
            .export(create_output(path)?)
            .with_context(|| format!("Failed to export JSON to {}", path.display()))?;
        if !quiet {
            writeln!(out, "saved: {} ({} events)", path.display(), exporter.event_count())?;
        }
    }

    for path in [&args.export_chrome_trace, &args.export_perfetto].into_iter().flatten() {
        export_chrome_trace(&mut out, &trace, &config, path, quiet)?;
    }

    Ok(())
}

fn export_chrome_trace<W: Write>(
    out: &mut W,
    trace: &TraceData,
    config: &AnalyzerConfig,
    path: &Path,
    quiet: bool,
) -> Result<()> {
    let exporter = if config.thread_names {
        ChromeTraceExporter::with_thread_names(&trace.events, &trace.registry, config.cpu_frequency)
    } else {
        ChromeTraceExporter::new(&trace.events, &trace.registry, config.cpu_frequency)
    };
    info!("Chrome trace contains {} events", exporter.event_count());

    exporter
        .export(create_output(path)?)
        .with_context(|| format!("Failed to export trace to {}", path.display()))?;

    if !quiet {
        writeln!(out, "saved: {} ({} trace events)", path.display(), exporter.event_count())?;
        writeln!(out, "View in Chrome: chrome://tracing")?;
        writeln!(out, "View in Perfetto: https://ui.perfetto.dev/")?;
    }
    Ok(())
}
