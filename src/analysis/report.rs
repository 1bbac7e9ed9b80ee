//! Report generation for flow statistics.
//!
//! Writes a human-readable summary per flow and one CSV row per flow. CSV
//! output is all-or-nothing: an overwrite goes through a temporary sibling
//! file that is renamed into place, an append is a single write.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};

use super::types::FlowReport;

/// Column header of the results CSV
pub const CSV_HEADER: &str =
    "run,flowId,srcAddr,dstAddr,txPackets,rxPackets,lostPackets,throughputMbps,delaySeconds,hopCount,pdr";

/// How the CSV sink treats an existing file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the file and write the header first
    Overwrite,
    /// Add rows after existing content, never a header
    Append,
}

impl WriteMode {
    pub fn from_append(append: bool) -> Self {
        if append {
            WriteMode::Append
        } else {
            WriteMode::Overwrite
        }
    }
}

/// Format one CSV row; floats use six fixed decimals
pub fn format_csv_row(run: u64, report: &FlowReport) -> String {
    format!(
        "{},{},{},{},{},{},{},{:.6},{:.6},{:.6},{:.6}",
        run,
        report.flow_id,
        report.tuple.source_address,
        report.tuple.destination_address,
        report.record.tx_packets,
        report.record.rx_packets,
        report.record.lost_packets,
        report.metrics.throughput_mbps,
        report.metrics.mean_delay,
        report.metrics.mean_hop_count,
        report.metrics.pdr,
    )
}

/// Render the full CSV payload for one run
pub fn render_csv(run: u64, reports: &[FlowReport], mode: WriteMode) -> String {
    let mut content = String::new();
    if mode == WriteMode::Overwrite {
        content.push_str(CSV_HEADER);
        content.push('\n');
    }
    for report in reports {
        content.push_str(&format_csv_row(run, report));
        content.push('\n');
    }
    content
}

/// Write the results of one run to `path`
pub fn write_csv_report(path: &Path, run: u64, reports: &[FlowReport], mode: WriteMode) -> Result<()> {
    let content = render_csv(run, reports, mode);

    match mode {
        WriteMode::Overwrite => {
            let staging = staging_path(path);
            if let Err(err) = fs::write(&staging, &content) {
                let _ = fs::remove_file(&staging);
                return Err(err).with_context(|| format!("Failed to write CSV results to {}", staging.display()));
            }
            if let Err(err) = fs::rename(&staging, path) {
                let _ = fs::remove_file(&staging);
                return Err(err).with_context(|| format!("Failed to move CSV results into {}", path.display()));
            }
        }
        WriteMode::Append => {
            let mut file = OpenOptions::new()
                .read(true)
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open {} for appending", path.display()))?;
            let needs_newline = ends_without_newline(&mut file)
                .with_context(|| format!("Failed to inspect {} before appending", path.display()))?;
            let payload = if needs_newline && !content.is_empty() {
                format!("\n{}", content)
            } else {
                content
            };
            file.write_all(payload.as_bytes())
                .and_then(|_| file.flush())
                .with_context(|| format!("Failed to append CSV results to {}", path.display()))?;
        }
    }

    log::info!("CSV results ({} flows, {:?}) written to {}", reports.len(), mode, path.display());
    Ok(())
}

/// True when the file has content whose last byte is not a line break
fn ends_without_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "manet-results.csv".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Print the per-flow summary block to `out`
pub fn write_flow_summary<W: Write>(out: &mut W, reports: &[FlowReport]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "*** Flow monitor statistics ***")?;
    for report in reports {
        writeln!(
            out,
            "Flow {} ({} -> {})",
            report.flow_id, report.tuple.source_address, report.tuple.destination_address
        )?;
        writeln!(out, "  Tx Packets:   {}", report.record.tx_packets)?;
        writeln!(out, "  Rx Packets:   {}", report.record.rx_packets)?;
        writeln!(out, "  Lost Packets: {}", report.record.lost_packets)?;
        if report.record.rx_packets > 0 {
            writeln!(out, "  Throughput:   {:.4} Mbps", report.metrics.throughput_mbps)?;
            writeln!(out, "  Mean Delay:   {:.6} s", report.metrics.mean_delay)?;
            writeln!(out, "  Mean Hop Cnt: {:.3}", report.metrics.mean_hop_count)?;
            writeln!(out, "  PDR:          {:.2}%", report.metrics.pdr * 100.0)?;
        }
    }
    Ok(())
}

/// Print the per-flow summary to stdout
pub fn print_flow_summary(reports: &[FlowReport]) -> Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    write_flow_summary(&mut lock, reports).context("Failed to print flow summary")
}
