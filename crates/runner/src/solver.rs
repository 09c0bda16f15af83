// Copyright 2025 OptiBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Solver process invocation.
//!
//! One run is one synchronous child process: the problem file as the first
//! argument plus `--trc/--log/--osrl` output flags, executed from the
//! solver's own directory so relative output paths land next to the
//! executable. There is no timeout on the child; the documented contract
//! is that a run blocks until the solver finishes.
//!
//! The [`Solver`] trait is the seam the pipeline is tested through.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// Errors launching the solver process.
#[derive(Debug, Error)]
pub enum SolverError {
    /// The executable could not be started at all.
    #[error("failed to launch solver {executable}: {source}")]
    Launch {
        /// The configured executable.
        executable: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

/// Result alias for solver operations.
pub type Result<T> = std::result::Result<T, SolverError>;

/// Output file names of one benchmark run, relative to the solver's
/// working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    /// OSrL result document.
    pub osrl: String,
    /// Trace file.
    pub trace: String,
    /// Solver log.
    pub log: String,
}

impl RunPaths {
    /// File names for one `(benchmark, run index)` pair.
    pub fn new(benchmark: &str, run_index: usize) -> Self {
        RunPaths {
            osrl: format!("{benchmark}-run-{run_index}.osrl"),
            trace: format!("{benchmark}-run-{run_index}.trc"),
            log: format!("{benchmark}-run-{run_index}.log"),
        }
    }

    /// All three file names.
    pub fn all(&self) -> [&str; 3] {
        [&self.osrl, &self.trace, &self.log]
    }
}

/// Exit information of one solver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverRun {
    /// The child exited successfully.
    pub success: bool,
    /// Raw exit code, when the platform reports one.
    pub code: Option<i32>,
}

/// The one operation the pipeline needs from a solver.
pub trait Solver {
    /// Execute the solver on one problem, writing the run's output files.
    fn run(&self, problem: &Path, outputs: &RunPaths) -> Result<SolverRun>;
}

/// The external solver executable.
#[derive(Debug, Clone)]
pub struct SolverCommand {
    executable: PathBuf,
    working_dir: PathBuf,
}

impl SolverCommand {
    /// Wrap the configured executable. Output files are written to the
    /// executable's directory, mirroring how the solver resolves relative
    /// paths.
    pub fn new(executable: PathBuf) -> Self {
        let working_dir = executable
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        SolverCommand {
            executable,
            working_dir,
        }
    }

    /// Directory the solver runs in and writes its output files to.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}

impl Solver for SolverCommand {
    fn run(&self, problem: &Path, outputs: &RunPaths) -> Result<SolverRun> {
        let status = Command::new(&self.executable)
            .current_dir(&self.working_dir)
            .arg(problem)
            .arg("--trc")
            .arg(&outputs.trace)
            .arg("--log")
            .arg(&outputs.log)
            .arg("--osrl")
            .arg(&outputs.osrl)
            .status()
            .map_err(|source| SolverError::Launch {
                executable: self.executable.clone(),
                source,
            })?;
        Ok(SolverRun {
            success: status.success(),
            code: status.code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_paths_naming() {
        let paths = RunPaths::new("cost_min", 2);
        assert_eq!(paths.osrl, "cost_min-run-2.osrl");
        assert_eq!(paths.trace, "cost_min-run-2.trc");
        assert_eq!(paths.log, "cost_min-run-2.log");
        assert_eq!(paths.all().len(), 3);
    }

    #[test]
    fn test_working_dir_is_executable_parent() {
        let solver = SolverCommand::new(PathBuf::from("/opt/solver/bin/solve"));
        assert_eq!(solver.working_dir(), Path::new("/opt/solver/bin"));
    }

    #[test]
    fn test_bare_executable_name_runs_in_current_dir() {
        let solver = SolverCommand::new(PathBuf::from("solve"));
        assert_eq!(solver.working_dir(), Path::new("."));
    }
}
