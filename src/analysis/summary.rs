//! Cross-run summaries of results CSV files.
//!
//! Parses rows written by [`super::report`], splits flows into
//! inter-cluster and intra-cluster traffic, and computes descriptive
//! statistics per group.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::Serialize;

use super::report::CSV_HEADER;

/// One parsed row of a results CSV
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub run: u64,
    pub flow_id: u32,
    pub src_addr: Ipv4Addr,
    pub dst_addr: Ipv4Addr,
    pub tx_packets: u64,
    pub rx_packets: u64,
    pub lost_packets: u64,
    pub throughput_mbps: f64,
    pub delay_seconds: f64,
    pub hop_count: f64,
    pub pdr: f64,
}

impl ResultRow {
    /// Flows whose endpoints sit in different /24 segments cross the backbone
    pub fn is_inter_cluster(&self) -> bool {
        self.src_addr.octets()[2] != self.dst_addr.octets()[2]
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}: expected 11 columns, found {found}")]
    ColumnCount { line: usize, found: usize },
    #[error("line {line}: invalid value '{value}' in column {column}")]
    InvalidValue { line: usize, column: &'static str, value: String },
}

const COLUMNS: [&str; 11] = [
    "run",
    "flowId",
    "srcAddr",
    "dstAddr",
    "txPackets",
    "rxPackets",
    "lostPackets",
    "throughputMbps",
    "delaySeconds",
    "hopCount",
    "pdr",
];

/// Parse results CSV content. Header lines (including repeated ones from
/// concatenated files) and blank lines are skipped.
pub fn parse_results_csv(content: &str) -> Result<Vec<ResultRow>, ParseError> {
    let mut rows = Vec::new();
    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line == CSV_HEADER {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != COLUMNS.len() {
            return Err(ParseError::ColumnCount {
                line: index + 1,
                found: fields.len(),
            });
        }

        let line_no = index + 1;
        rows.push(ResultRow {
            run: parse_field(&fields, 0, line_no)?,
            flow_id: parse_field(&fields, 1, line_no)?,
            src_addr: parse_field(&fields, 2, line_no)?,
            dst_addr: parse_field(&fields, 3, line_no)?,
            tx_packets: parse_field(&fields, 4, line_no)?,
            rx_packets: parse_field(&fields, 5, line_no)?,
            lost_packets: parse_field(&fields, 6, line_no)?,
            throughput_mbps: parse_field(&fields, 7, line_no)?,
            delay_seconds: parse_field(&fields, 8, line_no)?,
            hop_count: parse_field(&fields, 9, line_no)?,
            pdr: parse_field(&fields, 10, line_no)?,
        });
    }
    Ok(rows)
}

fn parse_field<T: FromStr>(fields: &[&str], column: usize, line: usize) -> Result<T, ParseError> {
    fields[column].parse().map_err(|_| ParseError::InvalidValue {
        line,
        column: COLUMNS[column],
        value: fields[column].to_string(),
    })
}

/// Descriptive statistics of one metric
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricSummary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; zero with fewer than two samples
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricSummary {
    pub fn from_values(values: &[f64]) -> Self {
        let count = values.len();
        if count == 0 {
            return Self::default();
        }
        let mean = values.iter().sum::<f64>() / count as f64;
        let std = if count > 1 {
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self { count, mean, std, min, max }
    }
}

/// Statistics for one group of flows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    /// `None` when the group spans all runs
    pub run: Option<u64>,
    pub inter_cluster: bool,
    pub flows: usize,
    pub throughput_mbps: MetricSummary,
    pub delay_seconds: MetricSummary,
    pub hop_count: MetricSummary,
    pub pdr: MetricSummary,
}

fn summarize_group(run: Option<u64>, inter_cluster: bool, rows: &[&ResultRow]) -> GroupSummary {
    let collect = |f: fn(&ResultRow) -> f64| rows.iter().map(|r| f(r)).collect::<Vec<f64>>();
    GroupSummary {
        run,
        inter_cluster,
        flows: rows.len(),
        throughput_mbps: MetricSummary::from_values(&collect(|r| r.throughput_mbps)),
        delay_seconds: MetricSummary::from_values(&collect(|r| r.delay_seconds)),
        hop_count: MetricSummary::from_values(&collect(|r| r.hop_count)),
        pdr: MetricSummary::from_values(&collect(|r| r.pdr)),
    }
}

/// Group by (run, inter/intra-cluster), ordered by run then intra before inter
pub fn summarize_by_run(rows: &[ResultRow]) -> Vec<GroupSummary> {
    let mut groups: BTreeMap<(u64, bool), Vec<&ResultRow>> = BTreeMap::new();
    for row in rows {
        groups.entry((row.run, row.is_inter_cluster())).or_default().push(row);
    }
    groups
        .into_iter()
        .map(|((run, inter), members)| summarize_group(Some(run), inter, &members))
        .collect()
}

/// Group by traffic class only, across all runs
pub fn summarize_by_class(rows: &[ResultRow]) -> Vec<GroupSummary> {
    let mut groups: BTreeMap<bool, Vec<&ResultRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.is_inter_cluster()).or_default().push(row);
    }
    groups
        .into_iter()
        .map(|(inter, members)| summarize_group(None, inter, &members))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
run,flowId,srcAddr,dstAddr,txPackets,rxPackets,lostPackets,throughputMbps,delaySeconds,hopCount,pdr
1,1,10.1.1.2,10.1.2.2,100,80,20,0.400000,0.010000,4.000000,0.800000
1,2,10.1.2.2,10.1.1.2,100,60,40,0.300000,0.020000,4.000000,0.600000
1,3,10.1.1.2,10.1.1.3,50,50,0,0.200000,0.001000,1.000000,1.000000

2,1,10.1.1.2,10.1.2.2,100,0,100,0.000000,0.000000,0.000000,0.000000
";

    #[test]
    fn test_parse_skips_header_and_blank_lines() {
        let rows = parse_results_csv(SAMPLE).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].src_addr, Ipv4Addr::new(10, 1, 1, 2));
        assert!(rows[0].is_inter_cluster());
        assert!(!rows[2].is_inter_cluster());
        assert_eq!(rows[3].run, 2);
    }

    #[test]
    fn test_parse_reports_bad_rows() {
        assert!(matches!(
            parse_results_csv("1,2,3\n"),
            Err(ParseError::ColumnCount { line: 1, found: 3 })
        ));
        let bad = "1,1,10.1.1.x,10.1.2.2,1,1,0,0.1,0.1,1.0,1.0\n";
        assert!(matches!(
            parse_results_csv(bad),
            Err(ParseError::InvalidValue { column: "srcAddr", .. })
        ));
    }

    #[test]
    fn test_metric_summary() {
        let summary = MetricSummary::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(summary.count, 8);
        assert!((summary.mean - 5.0).abs() < 1e-12);
        assert!((summary.std - 2.138089935299395).abs() < 1e-9);
        assert_eq!(summary.min, 2.0);
        assert_eq!(summary.max, 9.0);

        assert_eq!(MetricSummary::from_values(&[3.0]).std, 0.0);
        assert_eq!(MetricSummary::from_values(&[]), MetricSummary::default());
    }

    #[test]
    fn test_grouping() {
        let rows = parse_results_csv(SAMPLE).unwrap();
        let by_run = summarize_by_run(&rows);
        let keys: Vec<(Option<u64>, bool)> = by_run.iter().map(|g| (g.run, g.inter_cluster)).collect();
        assert_eq!(keys, vec![(Some(1), false), (Some(1), true), (Some(2), true)]);
        assert_eq!(by_run[1].flows, 2);
        assert!((by_run[1].pdr.mean - 0.7).abs() < 1e-12);

        let by_class = summarize_by_class(&rows);
        assert_eq!(by_class.len(), 2);
        assert_eq!(by_class[1].flows, 3);
        assert_eq!(by_class[1].run, None);
    }
}
