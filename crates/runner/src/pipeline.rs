// Copyright 2025 OptiBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! The sequential benchmark pipeline.
//!
//! One run of the harness is a fixed sequence: prepare the problem set,
//! execute the solver once per benchmark per run index, move the result
//! files into the results directory, parse and aggregate, emit the summary
//! report and `data.json`, then optionally upload the results and compare
//! against a previous commit's stored results.
//!
//! Only configuration-shaped failures abort the run. A result document
//! that does not parse leaves a hole in that run, a benchmark with no
//! usable samples is skipped, and an unreachable store or a missing prior
//! artifact only cancels the upload or the comparison — each with a logged
//! message so the operator can see what was skipped and why.

use crate::commits::CommitResolver;
use crate::config::{HarnessConfig, RefContext};
use crate::problems::{self, ProblemInstance, ProblemsError};
use crate::sinks::{self, ReportSink};
use crate::solver::{RunPaths, Solver, SolverCommand, SolverError};
use chrono::Utc;
use optibench_core::compare::{compare, Comparison};
use optibench_core::result::{BenchmarkSummary, PriorSummary, RunResult};
use optibench_core::{aggregate, markdown, osrl::ResultDocument};
use optibench_store::{ArtifactStore, ObjectKey, StoreError, SwiftStore};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

/// Directory under the work dir collecting result files and JSON output.
pub const RESULTS_DIR: &str = "benchmarks";

/// Filename of the persisted summary collection.
pub const DATA_FILE: &str = "data.json";

/// Filename of the persisted comparison output.
pub const COMPARISON_FILE: &str = "comparison.json";

/// Fatal pipeline errors. Everything else is logged and skipped.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Problem-set preparation failed.
    #[error(transparent)]
    Problems(#[from] ProblemsError),

    /// The solver could not be launched at all.
    #[error(transparent)]
    Solver(#[from] SolverError),

    /// The explicit comparison commit is unknown to the checkout.
    #[error("commit {0} not found")]
    UnknownCommit(String),

    /// A file the pipeline must produce could not be written.
    #[error("failed to {action} {path}: {source}")]
    Io {
        /// What was being done.
        action: &'static str,
        /// The path involved.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The summary collection could not be serialized.
    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Run the whole pipeline for one configuration.
pub fn execute(cfg: &HarnessConfig) -> Result<()> {
    let resolver = CommitResolver::new(&cfg.workspace_dir);
    if let Some(sha) = &cfg.compare_sha {
        if !resolver.contains(sha) {
            return Err(HarnessError::UnknownCommit(sha.clone()));
        }
    }

    let problem_set = problems::prepare(&cfg.work_dir, cfg)?;

    info!("executing solver at {}", cfg.solver_executable.display());
    let solver = SolverCommand::new(cfg.solver_executable.clone());
    let scratch_dir = solver.working_dir().to_path_buf();
    let results_dir = cfg.work_dir.join(RESULTS_DIR);
    fs::create_dir_all(&results_dir).map_err(|source| HarnessError::Io {
        action: "create",
        path: results_dir.clone(),
        source,
    })?;

    let summaries = collect_summaries(
        &problem_set.problems,
        &solver,
        cfg.runs,
        &scratch_dir,
        &results_dir,
    )?;
    if summaries.is_empty() {
        warn!("no benchmark produced a usable summary");
    }

    if cfg.ci {
        if let Some(output_path) = &cfg.output_path {
            let names: Vec<&str> = problem_set
                .problems
                .iter()
                .map(|problem| problem.name.as_str())
                .collect();
            if let Err(err) = sinks::append_output(output_path, "benchmarks", &names.join(",")) {
                warn!("failed to append CI output: {err}");
            }
        }
    }

    let sink = ReportSink::from_config(cfg.ci, cfg.summary_path.as_deref());
    let report = markdown::summary_report(&summaries, Utc::now());
    sink.write(&report).map_err(|source| HarnessError::Io {
        action: "write report to",
        path: match &sink {
            ReportSink::JobSummary(path) => path.clone(),
            ReportSink::Stdout => PathBuf::from("<stdout>"),
        },
        source,
    })?;

    let payload = serde_json::to_vec_pretty(&summaries)?;
    let data_path = results_dir.join(DATA_FILE);
    fs::write(&data_path, &payload).map_err(|source| HarnessError::Io {
        action: "write",
        path: data_path.clone(),
        source,
    })?;
    info!("results written to {}", data_path.display());

    if cfg.store_result {
        upload_results(cfg, &resolver, &payload);
    }

    if cfg.compare {
        run_comparison(cfg, &resolver, &summaries, &sink, &results_dir);
    }

    Ok(())
}

/// Execute every selected benchmark `run_count` times, relocate the output
/// files, parse the result documents and aggregate per benchmark.
///
/// Holes and skipped benchmarks are logged here; only a solver that cannot
/// be launched at all aborts.
pub fn collect_summaries(
    problems: &[ProblemInstance],
    solver: &dyn Solver,
    run_count: usize,
    scratch_dir: &Path,
    results_dir: &Path,
) -> Result<Vec<BenchmarkSummary>> {
    for run_index in 0..run_count {
        for problem in problems {
            info!(benchmark = %problem.name, run = run_index, "running benchmark");
            let outputs = RunPaths::new(&problem.name, run_index);
            let run = solver.run(&problem.path, &outputs)?;
            if !run.success {
                warn!(
                    benchmark = %problem.name,
                    run = run_index,
                    code = ?run.code,
                    "solver exited with failure"
                );
            }
        }
    }

    relocate_run_files(problems, run_count, scratch_dir, results_dir);

    let mut summaries = Vec::with_capacity(problems.len());
    for problem in problems {
        let mut runs = Vec::with_capacity(run_count);
        for run_index in 0..run_count {
            let osrl_path = results_dir.join(RunPaths::new(&problem.name, run_index).osrl);
            runs.push(read_run(&osrl_path, &problem.name));
        }
        match aggregate::summarize(&problem.name, runs, run_count) {
            Ok(summary) => summaries.push(summary),
            Err(err) => error!("skipping benchmark: {err}"),
        }
    }
    Ok(summaries)
}

fn relocate_run_files(
    problems: &[ProblemInstance],
    run_count: usize,
    scratch_dir: &Path,
    results_dir: &Path,
) {
    for run_index in 0..run_count {
        for problem in problems {
            let outputs = RunPaths::new(&problem.name, run_index);
            for file in outputs.all() {
                let from = scratch_dir.join(file);
                let to = results_dir.join(file);
                if let Err(err) = fs::rename(&from, &to) {
                    // A missing .osrl turns into a parse hole below.
                    warn!("could not move {}: {err}", from.display());
                }
            }
        }
    }
}

/// Read and parse one run's result document.
///
/// Any failure — missing file, malformed XML, non-numeric total time — is
/// logged and recorded as an explicit hole; the batch always continues.
fn read_run(osrl_path: &Path, benchmark: &str) -> RunResult {
    let hole = |status: String, substatus: String| RunResult {
        status,
        substatus,
        time: None,
    };

    let xml = match fs::read_to_string(osrl_path) {
        Ok(xml) => xml,
        Err(err) => {
            warn!(benchmark, "missing result document {}: {err}", osrl_path.display());
            return hole(String::new(), String::new());
        }
    };
    let doc = match ResultDocument::parse(&xml) {
        Ok(doc) => doc,
        Err(err) => {
            warn!(benchmark, "unreadable result document: {err}");
            return hole(String::new(), String::new());
        }
    };
    let time = match doc.total_time() {
        Ok(time) => Some(time),
        Err(err) => {
            warn!("error while parsing time for {benchmark}: {err}");
            None
        }
    };
    RunResult {
        status: doc.status().to_string(),
        substatus: doc.substatus().to_string(),
        time,
    }
}

fn upload_results(cfg: &HarnessConfig, resolver: &CommitResolver, payload: &[u8]) {
    let Some((context, credentials)) = cfg.ref_context.as_ref().zip(cfg.swift.as_ref()) else {
        warn!("store mode without ref context or credentials, skipping upload");
        return;
    };
    let sha = match current_sha(cfg, resolver) {
        Some(sha) => sha,
        None => {
            warn!("current commit could not be resolved, skipping upload");
            return;
        }
    };
    let key = object_key(context, &sha);

    let store = match SwiftStore::connect(credentials, &cfg.container) {
        Ok(store) => store,
        Err(err) => {
            warn!("object store unavailable, skipping upload: {err}");
            return;
        }
    };
    if let Err(err) = store
        .ensure_container()
        .and_then(|()| store.put(&key, payload))
    {
        warn!("upload failed: {err}");
    }
}

fn run_comparison(
    cfg: &HarnessConfig,
    resolver: &CommitResolver,
    summaries: &[BenchmarkSummary],
    sink: &ReportSink,
    results_dir: &Path,
) {
    let Some((context, credentials)) = cfg.ref_context.as_ref().zip(cfg.swift.as_ref()) else {
        warn!("compare mode without ref context or credentials, skipping comparison");
        return;
    };
    let prior_sha = match &cfg.compare_sha {
        Some(sha) => sha.clone(),
        None => match resolver.parent_of_head() {
            Some(sha) => sha,
            None => {
                info!("no previous commit found, exiting comparison");
                return;
            }
        },
    };
    let key = object_key(context, &prior_sha);

    let store = match SwiftStore::connect(credentials, &cfg.container) {
        Ok(store) => store,
        Err(err) => {
            warn!("object store unavailable, skipping comparison: {err}");
            return;
        }
    };

    match compare_with_prior(&store, &key, summaries) {
        Err(CompareFlowError::Store(StoreError::NotFound(_))) => {
            info!("no stored results for commit {prior_sha}, exiting comparison");
        }
        Err(err) => warn!("comparison skipped: {err}"),
        Ok(Comparison::NoComparableData) => {
            info!("failed to get changes or no changes detected, see log for more information");
        }
        Ok(Comparison::Matched(changes)) => {
            let report = markdown::comparison_report(&changes, cfg.backend_label());
            if let Err(err) = sink.write(&report) {
                warn!("failed to write comparison report: {err}");
            }
            match serde_json::to_vec_pretty(&changes) {
                Ok(bytes) => {
                    let path = results_dir.join(COMPARISON_FILE);
                    if let Err(err) = fs::write(&path, bytes) {
                        warn!("failed to write {}: {err}", path.display());
                    } else {
                        info!("comparison written to {}", path.display());
                    }
                }
                Err(err) => warn!("failed to serialize comparison: {err}"),
            }
        }
    }
}

fn current_sha(cfg: &HarnessConfig, resolver: &CommitResolver) -> Option<String> {
    if let Some(sha) = &cfg.commit_sha {
        return Some(sha.clone());
    }
    match resolver.head() {
        Ok(sha) => Some(sha),
        Err(err) => {
            warn!("failed to resolve HEAD: {err}");
            None
        }
    }
}

fn object_key(context: &RefContext, sha: &str) -> ObjectKey {
    ObjectKey::new(context.kind.as_str(), &context.short_name, sha)
}

/// Errors fetching or decoding a previous run's stored results.
#[derive(Debug, Error)]
pub enum CompareFlowError {
    /// The store call failed; `NotFound` means no prior artifact exists.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The stored blob is not a summary collection.
    #[error("stored results are malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Fetch the stored results under `key` and compare the current summaries
/// against them.
pub fn compare_with_prior(
    store: &dyn ArtifactStore,
    key: &ObjectKey,
    current: &[BenchmarkSummary],
) -> std::result::Result<Comparison, CompareFlowError> {
    let bytes = store.get(key)?;
    let previous: Vec<PriorSummary> = serde_json::from_slice(&bytes)?;
    Ok(compare(current, &previous))
}
