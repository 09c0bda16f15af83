// Copyright 2025 OptiBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Per-benchmark run aggregation.
//!
//! Reduces the ordered runs of one benchmark into a [`BenchmarkSummary`]:
//! arithmetic mean and lower-middle median over the parsed times, and the
//! most common status/substatus categories.
//!
//! Two behaviors are fixed deliberately and pinned by tests:
//!
//! - `median_time` is the element at integer index `len / 2` of the sorted
//!   time sequence. For even counts this is the lower-middle element, not
//!   the averaged statistical median; downstream consumers of the stored
//!   JSON rely on the existing values.
//! - The mode tie-break iterates distinct values in the order they first
//!   appear in `runs` and keeps the first maximum, so the result is
//!   deterministic for a given input ordering.

use crate::result::{BenchmarkSummary, RunResult};
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while reducing one benchmark's runs.
///
/// Aggregation failure skips that benchmark's summary only; the batch
/// continues with the remaining benchmarks.
#[derive(Debug, Error)]
pub enum AggregationError {
    /// The run sequence length does not match the configured run count.
    #[error("benchmark \"{name}\" has {actual} runs, expected {expected}")]
    RunCountMismatch {
        /// Benchmark name.
        name: String,
        /// Configured run count.
        expected: usize,
        /// Actual length of the run sequence.
        actual: usize,
    },

    /// Every run's total time failed to parse; there is nothing to average.
    #[error("benchmark \"{name}\" has no usable time samples")]
    NoUsableSamples {
        /// Benchmark name.
        name: String,
    },
}

/// Result alias for aggregation operations.
pub type Result<T> = std::result::Result<T, AggregationError>;

/// Reduce the ordered runs of one benchmark into a summary.
///
/// Runs whose time failed to parse stay in the summary's `runs` sequence as
/// holes but are excluded from the mean and median.
///
/// # Errors
///
/// Returns [`AggregationError::RunCountMismatch`] when `runs` is empty or
/// its length differs from `run_count`, and
/// [`AggregationError::NoUsableSamples`] when no run carries a parsed time.
pub fn summarize(
    name: impl Into<String>,
    runs: Vec<RunResult>,
    run_count: usize,
) -> Result<BenchmarkSummary> {
    let name = name.into();
    if runs.is_empty() || runs.len() != run_count {
        return Err(AggregationError::RunCountMismatch {
            name,
            expected: run_count,
            actual: runs.len(),
        });
    }

    let mut times: Vec<f64> = runs.iter().filter_map(|run| run.time).collect();
    if times.is_empty() {
        return Err(AggregationError::NoUsableSamples { name });
    }

    let average_time = times.iter().sum::<f64>() / times.len() as f64;
    times.sort_by(f64::total_cmp);
    let median_time = times[times.len() / 2];

    let most_common_status = most_common(runs.iter().map(|run| run.status.as_str()));
    let most_common_substatus = most_common(runs.iter().map(|run| run.substatus.as_str()));

    Ok(BenchmarkSummary {
        average_time,
        median_time,
        most_common_status,
        most_common_substatus,
        name,
        runs,
    })
}

/// Mode of a non-empty value sequence, first-appearance tie-break.
fn most_common<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for value in values {
        let count = counts.entry(value).or_insert(0);
        if *count == 0 {
            order.push(value);
        }
        *count += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for value in order {
        let count = counts[value];
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(time: Option<f64>, status: &str, substatus: &str) -> RunResult {
        RunResult {
            status: status.to_string(),
            substatus: substatus.to_string(),
            time,
        }
    }

    fn timed_runs(times: &[f64]) -> Vec<RunResult> {
        times
            .iter()
            .map(|t| run(Some(*t), "optimal", "none"))
            .collect()
    }

    #[test]
    fn test_average_is_arithmetic_mean() {
        let summary = summarize("bench", timed_runs(&[1.5, 2.5]), 2).unwrap();
        assert!((summary.average_time - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_median_odd_count_is_middle_element() {
        let summary = summarize("bench", timed_runs(&[3.0, 1.0, 2.0]), 3).unwrap();
        assert_eq!(summary.median_time, 2.0);
    }

    #[test]
    fn test_median_even_count_is_lower_middle_index() {
        // sorted [1, 2, 3, 4], index 4 / 2 = 2 -> 3.0, not the averaged 2.5
        let summary = summarize("bench", timed_runs(&[4.0, 1.0, 3.0, 2.0]), 4).unwrap();
        assert_eq!(summary.median_time, 3.0);
    }

    #[test]
    fn test_most_common_status_majority() {
        let runs = vec![
            run(Some(1.0), "optimal", "none"),
            run(Some(1.0), "optimal", "none"),
            run(Some(1.0), "timeLimit", "none"),
        ];
        let summary = summarize("bench", runs, 3).unwrap();
        assert_eq!(summary.most_common_status, "optimal");
    }

    #[test]
    fn test_most_common_tie_keeps_first_seen() {
        let runs = vec![
            run(Some(1.0), "timeLimit", "b"),
            run(Some(1.0), "optimal", "a"),
            run(Some(1.0), "optimal", "b"),
            run(Some(1.0), "timeLimit", "a"),
        ];
        let summary = summarize("bench", runs, 4).unwrap();
        assert_eq!(summary.most_common_status, "timeLimit");
        assert_eq!(summary.most_common_substatus, "b");
    }

    #[test]
    fn test_holes_are_excluded_from_statistics() {
        let runs = vec![
            run(Some(2.0), "optimal", "none"),
            run(None, "error", "userInterrupt"),
            run(Some(4.0), "optimal", "none"),
        ];
        let summary = summarize("bench", runs, 3).unwrap();
        assert!((summary.average_time - 3.0).abs() < 1e-9);
        // parsed [2, 4], index 2 / 2 = 1 -> 4.0
        assert_eq!(summary.median_time, 4.0);
        assert_eq!(summary.runs.len(), 3);
    }

    #[test]
    fn test_all_holes_is_no_usable_samples() {
        let runs = vec![run(None, "error", ""), run(None, "error", "")];
        assert!(matches!(
            summarize("bench", runs, 2),
            Err(AggregationError::NoUsableSamples { .. })
        ));
    }

    #[test]
    fn test_run_count_mismatch_is_rejected() {
        assert!(matches!(
            summarize("bench", timed_runs(&[1.0]), 2),
            Err(AggregationError::RunCountMismatch { .. })
        ));
        assert!(matches!(
            summarize("bench", Vec::new(), 0),
            Err(AggregationError::RunCountMismatch { .. })
        ));
    }
}
