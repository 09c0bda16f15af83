// Copyright 2025 OptiBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core benchmark data handling for the OptiBench harness.
//!
//! This crate holds the pure parts of the harness: parsing one OSrL result
//! document into a [`RunResult`], reducing repeated runs into a
//! [`BenchmarkSummary`], diffing two summary collections into a
//! [`Comparison`], and rendering Markdown reports. Everything here is a
//! plain transformation over values the orchestrator already materialized;
//! process execution, git and object-store I/O live in the runner and store
//! crates.
//!
//! # Modules
//!
//! - [`osrl`] - OSrL XML result-document parser
//! - [`aggregate`] - per-benchmark run aggregation
//! - [`compare`] - summary-collection comparison
//! - [`markdown`] - pipe-table report rendering
//! - [`result`] - the benchmark data model

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod aggregate;
pub mod compare;
pub mod markdown;
pub mod osrl;
pub mod result;

pub use aggregate::{summarize, AggregationError};
pub use compare::{compare, BenchmarkChange, Comparison, FieldChange};
pub use osrl::{ParseError, ResultDocument};
pub use result::{BenchmarkSummary, PriorSummary, RunResult, TimeField};
