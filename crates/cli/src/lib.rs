//! CLI for the OptiBench harness.
//!
//! The flags mirror how the harness runs in CI: `--runs` controls the
//! repetition count, `--store-result` uploads this run's results keyed by
//! the current commit, and `--compare` diffs against the stored results of
//! the parent commit (or of an explicit `--sha`). The benchmark selection
//! and solver location come from the `INPUT_*` action inputs, exposed here
//! as env-backed options so local runs can pass them as flags instead.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

use clap::Parser;
use optibench_runner::config::{CliOptions, EnvSnapshot};
use optibench_runner::HarnessConfig;
use std::path::PathBuf;

/// Benchmark harness for an external optimization solver.
#[derive(Parser, Debug)]
#[command(name = "optibench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Compare this run against a previous run's stored results.
    #[arg(short, long)]
    pub compare: bool,

    /// Upload this run's results to the object store.
    #[arg(short, long)]
    pub store_result: bool,

    /// Number of runs to perform per benchmark.
    #[arg(short, long, default_value_t = 1)]
    pub runs: usize,

    /// SHA of the commit to compare to instead of the parent of HEAD.
    #[arg(long)]
    pub sha: Option<String>,

    /// Folder inside the problem repository holding the benchmark set.
    #[arg(long, env = "INPUT_BENCHMARK_FOLDER")]
    pub benchmark_folder: Option<String>,

    /// Problem format subfolder and file extension (e.g. `nl`).
    #[arg(long, env = "INPUT_BENCHMARK_TYPE")]
    pub benchmark_type: Option<String>,

    /// Comma-separated benchmark names; empty or `all` runs everything.
    #[arg(long, env = "INPUT_BENCHMARKS")]
    pub benchmarks: Option<String>,

    /// Path to the solver executable.
    #[arg(long, env = "INPUT_SOLVER_EXECUTABLE")]
    pub solver_executable: Option<PathBuf>,

    /// Problem-set repository URL override.
    #[arg(long, env = "INPUT_PROBLEMS_REPO")]
    pub problems_repo: Option<String>,
}

impl Cli {
    fn into_options(self) -> CliOptions {
        CliOptions {
            compare: self.compare,
            store_result: self.store_result,
            runs: self.runs,
            sha: self.sha,
            benchmark_folder: self.benchmark_folder,
            benchmark_type: self.benchmark_type,
            benchmarks: self.benchmarks,
            solver_executable: self.solver_executable,
            problems_repo: self.problems_repo,
        }
    }
}

/// Parse the command line, assemble the configuration and run the pipeline.
///
/// # Errors
///
/// Returns configuration errors (missing inputs, unknown comparison SHA)
/// and fatal pipeline errors; everything recoverable is logged inside the
/// pipeline instead.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = HarnessConfig::resolve(cli.into_options(), EnvSnapshot::capture())?;
    optibench_runner::execute(&config)?;
    Ok(())
}
