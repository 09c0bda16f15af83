// Copyright 2025 OptiBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Comparison of two benchmark summary collections.
//!
//! The comparator inner-joins the current and previous collections on
//! benchmark name and computes field-level deltas for each match. Benchmarks
//! present on only one side are dropped; an empty join is the distinct
//! [`Comparison::NoComparableData`] outcome so callers can skip report
//! generation instead of rendering an empty table.
//!
//! A field is only compared when both sides carry it. Previous-side data
//! comes back from stored JSON and may omit fields or hold a non-numeric
//! average; such fields stay `None` in the output rather than reporting a
//! spurious change, and a non-numeric average is logged per benchmark
//! without aborting the rest of the comparison.

use crate::result::{BenchmarkSummary, PriorSummary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Field-level deltas for one matched benchmark.
///
/// `None` means "not comparable on this field", never "unchanged".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Whether the status mode differs, when both sides carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_changed: Option<bool>,
    /// Whether the substatus mode differs, when both sides carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substatus_changed: Option<bool>,
    /// Whether the average time differs, by exact (non-epsilon) comparison.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_changed: Option<bool>,
    /// Current average minus previous average, when both are numeric.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_delta: Option<f64>,
}

impl FieldChange {
    /// True when no field could be compared.
    pub fn is_empty(&self) -> bool {
        self.status_changed.is_none()
            && self.substatus_changed.is_none()
            && self.time_changed.is_none()
            && self.time_delta.is_none()
    }
}

/// Comparison output for one matched benchmark: the deltas plus both sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkChange {
    /// The field-level deltas.
    pub changes: FieldChange,
    /// The current run's summary.
    pub current: BenchmarkSummary,
    /// The previous run's stored summary.
    pub previous: PriorSummary,
}

/// Outcome of comparing two summary collections.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    /// No benchmark name appears on both sides, or no matched pair had a
    /// comparable field. Callers skip report generation.
    NoComparableData,
    /// Deltas for every matched benchmark, keyed by name.
    Matched(BTreeMap<String, BenchmarkChange>),
}

/// Compare the current summaries against a previously stored collection.
///
/// Pure function over two immutable inputs; the output map is ordered by
/// benchmark name so reports and serialized output are deterministic.
pub fn compare(current: &[BenchmarkSummary], previous: &[PriorSummary]) -> Comparison {
    let previous_by_name: BTreeMap<&str, &PriorSummary> = previous
        .iter()
        .map(|summary| (summary.name.as_str(), summary))
        .collect();

    let mut matched = BTreeMap::new();
    for summary in current {
        let Some(prior) = previous_by_name.get(summary.name.as_str()) else {
            continue;
        };
        let changes = diff_fields(summary, prior);
        if changes.is_empty() {
            continue;
        }
        matched.insert(
            summary.name.clone(),
            BenchmarkChange {
                changes,
                current: summary.clone(),
                previous: (*prior).clone(),
            },
        );
    }

    if matched.is_empty() {
        info!("no common benchmarks between the current and the previous run");
        return Comparison::NoComparableData;
    }
    Comparison::Matched(matched)
}

fn diff_fields(current: &BenchmarkSummary, previous: &PriorSummary) -> FieldChange {
    let status_changed = previous
        .most_common_status
        .as_ref()
        .map(|prev| current.most_common_status != *prev);
    let substatus_changed = previous
        .most_common_substatus
        .as_ref()
        .map(|prev| current.most_common_substatus != *prev);

    let (time_changed, time_delta) = match previous.average_time.as_ref() {
        None => (None, None),
        Some(field) => match field.as_seconds() {
            // Exact comparison on purpose: two averages only count as
            // unchanged when the stored values are identical.
            Some(prev_avg) => (
                Some(current.average_time != prev_avg),
                Some(current.average_time - prev_avg),
            ),
            None => {
                warn!(
                    benchmark = %current.name,
                    "previous average time is not numeric, delta omitted"
                );
                (Some(true), None)
            }
        },
    };

    FieldChange {
        status_changed,
        substatus_changed,
        time_changed,
        time_delta,
    }
}
