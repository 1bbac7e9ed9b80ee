//! Results analysis CLI for MANETSim runs.
//!
//! Reads one or more results CSVs, splits flows into intra- and
//! inter-cluster traffic and reports descriptive statistics per run and
//! across runs.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::{bail, Context, Result};
use rayon::prelude::*;
use serde::Serialize;

use manetsim::analysis::{parse_results_csv, summarize_by_class, summarize_by_run, GroupSummary, MetricSummary, ResultRow};

#[derive(Parser)]
#[command(name = "flow-analyzer")]
#[command(about = "Per-run and per-class statistics for MANETSim results CSVs")]
#[command(version)]
struct Cli {
    /// Results CSV files (with or without header)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Write a JSON report to this path
    #[arg(long)]
    json: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Number of parallel workers (0 = auto-detect)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,
}

#[derive(Serialize)]
struct AnalysisReport {
    generated_at: String,
    inputs: Vec<String>,
    total_flows: usize,
    by_run: Vec<GroupSummary>,
    by_class: Vec<GroupSummary>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level)).init();

    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    let rows = load_rows(&cli.inputs)?;
    if rows.is_empty() {
        bail!("No flow rows found in {} input file(s)", cli.inputs.len());
    }
    log::info!("Loaded {} flow rows from {} file(s)", rows.len(), cli.inputs.len());

    let by_run = summarize_by_run(&rows);
    let by_class = summarize_by_class(&rows);

    println!("\n=== PER-RUN STATISTICS ===\n");
    for group in &by_run {
        print_group(group);
    }
    println!("\n=== ACROSS ALL RUNS ===\n");
    for group in &by_class {
        print_group(group);
    }

    if let Some(path) = &cli.json {
        let report = AnalysisReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            inputs: cli.inputs.iter().map(|p| p.display().to_string()).collect(),
            total_flows: rows.len(),
            by_run,
            by_class,
        };
        let json = serde_json::to_string_pretty(&report)?;
        fs::write(path, json).with_context(|| format!("Failed to write JSON report to {}", path.display()))?;
        log::info!("JSON report written to {}", path.display());
    }

    Ok(())
}

/// Read and parse every input in parallel, keeping input order
fn load_rows(inputs: &[PathBuf]) -> Result<Vec<ResultRow>> {
    let parsed: Vec<Vec<ResultRow>> = inputs
        .par_iter()
        .map(|path| load_file(path))
        .collect::<Result<_>>()?;
    Ok(parsed.into_iter().flatten().collect())
}

fn load_file(path: &Path) -> Result<Vec<ResultRow>> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let rows = parse_results_csv(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    log::debug!("{}: {} rows", path.display(), rows.len());
    Ok(rows)
}

fn print_group(group: &GroupSummary) {
    let class = if group.inter_cluster { "inter-cluster" } else { "intra-cluster" };
    match group.run {
        Some(run) => println!("Run {} ({}, {} flows)", run, class, group.flows),
        None => println!("All runs ({}, {} flows)", class, group.flows),
    }
    print_metric("Throughput (Mbps)", &group.throughput_mbps);
    print_metric("Delay (s)", &group.delay_seconds);
    print_metric("Hop count", &group.hop_count);
    print_metric("PDR", &group.pdr);
    println!();
}

fn print_metric(label: &str, metric: &MetricSummary) {
    println!(
        "  {:<18} mean {:.6}  std {:.6}  min {:.6}  max {:.6}",
        label, metric.mean, metric.std, metric.min, metric.max
    );
}
