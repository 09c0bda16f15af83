// Copyright 2025 OptiBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Markdown report rendering.
//!
//! Reports are pipe-delimited tables for the CI job summary: one document
//! for the per-benchmark run results, one for the comparison against a
//! previous commit. Cells are rendered as-is with no width computation, so
//! the output is stable regardless of content length.

use crate::compare::BenchmarkChange;
use crate::result::BenchmarkSummary;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Render a pipe-delimited Markdown table.
///
/// Emits the header row, a `---` separator row, and one row per data row.
/// With zero data rows the output is header plus separator only.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format!("| {} |", headers.join(" | ")));
    lines.push(format!(
        "| {} |",
        headers.iter().map(|_| "---").collect::<Vec<_>>().join(" | ")
    ));
    for row in rows {
        lines.push(format!("| {} |", row.join(" | ")));
    }
    lines.join("\n")
}

const RUN_TABLE_HEADERS: [&str; 4] = ["Benchmark", "Total Time", "Status", "Substatus"];

/// Render the per-benchmark summary document.
///
/// One `##` section per benchmark with a single-row table per run, then the
/// average and median lines. A run whose time failed to parse is reported
/// inline instead of producing a row.
pub fn summary_report(summaries: &[BenchmarkSummary], generated_at: DateTime<Utc>) -> String {
    let mut output = String::new();

    writeln!(output, "# Benchmark results").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "Generated: {}", generated_at.to_rfc3339()).unwrap();

    for summary in summaries {
        writeln!(output).unwrap();
        writeln!(output, "## {}", summary.name).unwrap();
        for (index, run) in summary.runs.iter().enumerate() {
            writeln!(output).unwrap();
            match run.time {
                Some(time) => {
                    let row = vec![
                        format!("{} Run #{}", summary.name, index),
                        format!("{:.2}", time),
                        run.status.clone(),
                        run.substatus.clone(),
                    ];
                    writeln!(output, "{}", render_table(&RUN_TABLE_HEADERS, &[row])).unwrap();
                }
                None => {
                    writeln!(output, "Error while parsing time for {}", summary.name).unwrap();
                }
            }
        }
        writeln!(output).unwrap();
        writeln!(output, "Average time: {:.2}", summary.average_time).unwrap();
        writeln!(output, "Median time: {:.2}", summary.median_time).unwrap();
    }

    output
}

const COMPARISON_HEADERS: [&str; 11] = [
    "Benchmark",
    "Status changed",
    "New status",
    "Old status",
    "Substatus changed",
    "New substatus",
    "Old substatus",
    "Time changed",
    "Time change",
    "New time",
    "Old time",
];

/// Render the comparison document against a previous commit.
///
/// Boolean change cells are `:white_check_mark:` / `:x:`; fields the
/// comparator could not compare render as empty cells.
pub fn comparison_report(changes: &BTreeMap<String, BenchmarkChange>, backend: &str) -> String {
    let mut rows = Vec::with_capacity(changes.len());
    for (name, change) in changes {
        let fields = &change.changes;
        rows.push(vec![
            name.clone(),
            change_cell(fields.status_changed),
            change.current.most_common_status.clone(),
            change.previous.most_common_status.clone().unwrap_or_default(),
            change_cell(fields.substatus_changed),
            change.current.most_common_substatus.clone(),
            change
                .previous
                .most_common_substatus
                .clone()
                .unwrap_or_default(),
            change_cell(fields.time_changed),
            fields
                .time_delta
                .map(|delta| format!("{:.2}", delta))
                .unwrap_or_default(),
            format!("{:.2}", change.current.average_time),
            previous_time_cell(change),
        ]);
    }

    let mut output = String::new();
    writeln!(output, "# Comparison to previous commit").unwrap();
    writeln!(output).unwrap();
    writeln!(output, "## {}", backend).unwrap();
    writeln!(output).unwrap();
    writeln!(output, "{}", render_table(&COMPARISON_HEADERS, &rows)).unwrap();
    output
}

fn change_cell(changed: Option<bool>) -> String {
    match changed {
        Some(true) => ":white_check_mark:".to_string(),
        Some(false) => ":x:".to_string(),
        None => String::new(),
    }
}

fn previous_time_cell(change: &BenchmarkChange) -> String {
    use crate::result::TimeField;
    match change.previous.average_time.as_ref() {
        None => String::new(),
        Some(TimeField::Number(seconds)) => format!("{:.2}", seconds),
        Some(TimeField::Text(text)) => match text.trim().parse::<f64>() {
            Ok(seconds) => format!("{:.2}", seconds),
            // Show the raw stored text when it is not numeric.
            Err(_) => text.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::FieldChange;
    use crate::result::{PriorSummary, RunResult, TimeField};
    use chrono::TimeZone;

    #[test]
    fn test_table_with_rows() {
        let table = render_table(
            &["A", "B"],
            &[vec!["1".to_string(), "2".to_string()]],
        );
        assert_eq!(table, "| A | B |\n| --- | --- |\n| 1 | 2 |");
    }

    #[test]
    fn test_table_with_zero_rows_is_header_and_separator() {
        let table = render_table(&["A", "B", "C"], &[]);
        assert_eq!(table, "| A | B | C |\n| --- | --- | --- |");
    }

    fn summary_with_hole() -> BenchmarkSummary {
        BenchmarkSummary {
            average_time: 1.5,
            median_time: 1.5,
            most_common_status: "optimal".to_string(),
            most_common_substatus: "none".to_string(),
            name: "cost_min".to_string(),
            runs: vec![
                RunResult {
                    status: "optimal".to_string(),
                    substatus: "none".to_string(),
                    time: Some(1.5),
                },
                RunResult {
                    status: "error".to_string(),
                    substatus: String::new(),
                    time: None,
                },
            ],
        }
    }

    #[test]
    fn test_summary_report_sections_and_hole_line() {
        let generated = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let report = summary_report(&[summary_with_hole()], generated);

        assert!(report.starts_with("# Benchmark results\n"));
        assert!(report.contains("## cost_min"));
        assert!(report.contains("| cost_min Run #0 | 1.50 | optimal | none |"));
        assert!(report.contains("Error while parsing time for cost_min"));
        assert!(report.contains("Average time: 1.50"));
        assert!(report.contains("Median time: 1.50"));
    }

    #[test]
    fn test_comparison_report_cells() {
        let current = BenchmarkSummary {
            average_time: 2.0,
            median_time: 2.0,
            most_common_status: "optimal".to_string(),
            most_common_substatus: "none".to_string(),
            name: "cost_min".to_string(),
            runs: vec![RunResult {
                status: "optimal".to_string(),
                substatus: "none".to_string(),
                time: Some(2.0),
            }],
        };
        let previous = PriorSummary {
            average_time: Some(TimeField::Number(1.8)),
            median_time: None,
            most_common_status: Some("timeLimit".to_string()),
            most_common_substatus: None,
            name: "cost_min".to_string(),
            runs: None,
        };
        let mut changes = BTreeMap::new();
        changes.insert(
            "cost_min".to_string(),
            BenchmarkChange {
                changes: FieldChange {
                    status_changed: Some(true),
                    substatus_changed: None,
                    time_changed: Some(true),
                    time_delta: Some(0.2),
                },
                current,
                previous,
            },
        );

        let report = comparison_report(&changes, "Ipopt/Cbc");
        assert!(report.contains("# Comparison to previous commit"));
        assert!(report.contains("## Ipopt/Cbc"));
        assert!(report.contains(
            "| cost_min | :white_check_mark: | optimal | timeLimit |  | none |  | :white_check_mark: | 0.20 | 2.00 | 1.80 |"
        ));
    }
}
