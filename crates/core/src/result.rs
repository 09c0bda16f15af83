// Copyright 2025 OptiBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark data model.
//!
//! Struct fields are declared in sorted-key order and collections use
//! [`BTreeMap`](std::collections::BTreeMap) where ordering matters, so the
//! persisted JSON always serializes with deterministic key order and diffs
//! between commits stay reproducible.

use serde::{Deserialize, Serialize};

/// One execution of one benchmark against the solver.
///
/// Built from a parsed result document. A total time that failed to parse
/// (for example a crashed-solver placeholder) is recorded as `None` rather
/// than a garbage value; the aggregation step excludes such holes from the
/// numeric statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Solver status category, empty when the document carried none.
    pub status: String,
    /// Solver substatus category, empty when the document carried none.
    pub substatus: String,
    /// Total wall time in seconds; `None` when the value did not parse.
    pub time: Option<f64>,
}

/// Aggregate over the ordered runs of one benchmark.
///
/// Invariant: `runs` is non-empty and its length equals the configured run
/// count. Constructed only through [`summarize`](crate::aggregate::summarize),
/// which enforces both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSummary {
    /// Arithmetic mean of the parsed run times.
    pub average_time: f64,
    /// Lower-middle element of the sorted parsed run times (index `len / 2`).
    pub median_time: f64,
    /// Mode of the run statuses, first-appearance tie-break.
    pub most_common_status: String,
    /// Mode of the run substatuses, first-appearance tie-break.
    pub most_common_substatus: String,
    /// Benchmark name.
    pub name: String,
    /// The individual runs, in execution order.
    pub runs: Vec<RunResult>,
}

/// A previously stored average time: either a JSON number or a numeric
/// string left behind by older result layouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeField {
    /// A plain JSON number.
    Number(f64),
    /// A string that should hold a number but may not.
    Text(String),
}

impl TimeField {
    /// Numeric value of the field, if the text form parses.
    pub fn as_seconds(&self) -> Option<f64> {
        match self {
            TimeField::Number(n) => Some(*n),
            TimeField::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Lenient mirror of [`BenchmarkSummary`] for JSON read back from the
/// artifact store.
///
/// Only `name` is required: older stored layouts may omit the flattened
/// statistics or carry the average as a numeric string, and the comparator
/// must treat an absent field as "not comparable" instead of failing the
/// whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorSummary {
    /// Stored average time, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_time: Option<TimeField>,
    /// Stored median time, when present. Not compared, kept for round-trips.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median_time: Option<TimeField>,
    /// Stored status mode, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub most_common_status: Option<String>,
    /// Stored substatus mode, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub most_common_substatus: Option<String>,
    /// Benchmark name.
    pub name: String,
    /// Stored per-run records, when present. Ignored by the comparator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runs: Option<Vec<RunResult>>,
}

impl From<&BenchmarkSummary> for PriorSummary {
    fn from(summary: &BenchmarkSummary) -> Self {
        PriorSummary {
            average_time: Some(TimeField::Number(summary.average_time)),
            median_time: Some(TimeField::Number(summary.median_time)),
            most_common_status: Some(summary.most_common_status.clone()),
            most_common_substatus: Some(summary.most_common_substatus.clone()),
            name: summary.name.clone(),
            runs: Some(summary.runs.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_summary() -> BenchmarkSummary {
        BenchmarkSummary {
            average_time: 2.0,
            median_time: 2.5,
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
                    status: "optimal".to_string(),
                    substatus: "none".to_string(),
                    time: Some(2.5),
                },
            ],
        }
    }

    #[test]
    fn test_summary_json_keys_are_sorted() {
        let json = serde_json::to_string_pretty(&vec![sample_summary()]).unwrap();
        let average = json.find("\"average_time\"").unwrap();
        let median = json.find("\"median_time\"").unwrap();
        let status = json.find("\"most_common_status\"").unwrap();
        let name = json.find("\"name\"").unwrap();
        let runs = json.find("\"runs\"").unwrap();
        assert!(average < median && median < status && status < name && name < runs);
    }

    #[test]
    fn test_summary_round_trips_through_prior() {
        let summary = sample_summary();
        let json = serde_json::to_string_pretty(&vec![summary.clone()]).unwrap();
        let prior: Vec<PriorSummary> = serde_json::from_str(&json).unwrap();

        assert_eq!(prior.len(), 1);
        assert_eq!(prior[0].name, summary.name);
        assert_eq!(prior[0].average_time, Some(TimeField::Number(2.0)));
        assert_eq!(prior[0].median_time, Some(TimeField::Number(2.5)));
        assert_eq!(prior[0].most_common_status.as_deref(), Some("optimal"));
        assert_eq!(prior[0].most_common_substatus.as_deref(), Some("none"));
        assert_eq!(prior[0].runs.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_prior_summary_accepts_sparse_layout() {
        let prior: PriorSummary =
            serde_json::from_str(r#"{"name": "cost_min", "average_time": "1.8"}"#).unwrap();
        assert_eq!(prior.name, "cost_min");
        assert_eq!(prior.average_time, Some(TimeField::Text("1.8".to_string())));
        assert!(prior.most_common_status.is_none());
    }

    #[test]
    fn test_time_field_numeric_conversion() {
        assert_eq!(TimeField::Number(1.5).as_seconds(), Some(1.5));
        assert_eq!(TimeField::Text(" 1.5 ".to_string()).as_seconds(), Some(1.5));
        assert_eq!(TimeField::Text("NA".to_string()).as_seconds(), None);
    }

    #[test]
    fn test_run_hole_serializes_as_null() {
        let run = RunResult {
            status: String::new(),
            substatus: String::new(),
            time: None,
        };
        let json = serde_json::to_string(&run).unwrap();
        assert!(json.contains("\"time\":null"));
    }
}
