// Copyright 2025 OptiBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Problem-set repository preparation.
//!
//! The benchmark inputs live in a separate git repository. A fresh run
//! clones it next to the harness; a reused workspace is switched back to
//! `main` and pulled. The configured folder, type and every selected
//! benchmark file must exist before the solver starts — a missing piece
//! here is a configuration error, not something to discover after an hour
//! of runs.

use crate::config::{BenchmarkSelection, HarnessConfig};
use crate::git::{self, GitError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Directory the problem repository is cloned into, under the work dir.
pub const PROBLEMS_DIR: &str = "benchmark-problems";

/// Errors while preparing the problem set.
#[derive(Debug, Error)]
pub enum ProblemsError {
    /// A git operation failed.
    #[error(transparent)]
    Git(#[from] GitError),

    /// The configured benchmark folder is not in the repository.
    #[error("benchmark folder does not exist: {0}")]
    FolderMissing(PathBuf),

    /// The configured benchmark type is not in the folder.
    #[error("benchmark type does not exist: {0}")]
    TypeMissing(PathBuf),

    /// A selected benchmark file is not in the type folder.
    #[error("benchmark does not exist: {0}")]
    BenchmarkMissing(PathBuf),

    /// The type folder could not be listed.
    #[error("failed to list {path}: {source}")]
    List {
        /// The folder being listed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

/// Result alias for problem-set operations.
pub type Result<T> = std::result::Result<T, ProblemsError>;

/// One selected benchmark problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemInstance {
    /// Benchmark name, the file stem of the problem file.
    pub name: String,
    /// Absolute path of the problem file.
    pub path: PathBuf,
}

/// The prepared problem repository and the selected problems.
#[derive(Debug, Clone)]
pub struct ProblemSet {
    /// Local checkout of the problem repository.
    pub repo_dir: PathBuf,
    /// Selected problems, in execution order.
    pub problems: Vec<ProblemInstance>,
}

/// Clone or update the problem repository and resolve the selection.
pub fn prepare(work_dir: &Path, cfg: &HarnessConfig) -> Result<ProblemSet> {
    let repo_dir = work_dir.join(PROBLEMS_DIR);
    if repo_dir.is_dir() && git::git_succeeds(&repo_dir, &["rev-parse", "--git-dir"]) {
        info!("problem repository already present, updating");
        git::run_git(&repo_dir, &["checkout", "main"])?;
        git::run_git(&repo_dir, &["pull"])?;
    } else {
        info!(url = %cfg.problems_repo_url, "cloning problem repository");
        git::run_git(work_dir, &["clone", &cfg.problems_repo_url, PROBLEMS_DIR])?;
    }

    let folder_dir = repo_dir.join(&cfg.benchmark_folder);
    if !folder_dir.is_dir() {
        return Err(ProblemsError::FolderMissing(folder_dir));
    }
    let type_dir = folder_dir.join(&cfg.benchmark_type);
    if !type_dir.is_dir() {
        return Err(ProblemsError::TypeMissing(type_dir));
    }

    let problems = resolve_selection(&type_dir, &cfg.benchmark_type, &cfg.selection)?;
    info!("selected benchmarks:");
    for problem in &problems {
        info!("  {}", problem.path.display());
    }

    Ok(ProblemSet { repo_dir, problems })
}

/// Expand the selection against the type folder.
///
/// Named selections must resolve to existing files; `All` takes every file
/// in the folder, sorted by name so the execution order is stable.
fn resolve_selection(
    type_dir: &Path,
    benchmark_type: &str,
    selection: &BenchmarkSelection,
) -> Result<Vec<ProblemInstance>> {
    match selection {
        BenchmarkSelection::Named(names) => names
            .iter()
            .map(|name| {
                let path = type_dir.join(format!("{name}.{benchmark_type}"));
                if !path.is_file() {
                    return Err(ProblemsError::BenchmarkMissing(path));
                }
                Ok(ProblemInstance {
                    name: name.clone(),
                    path,
                })
            })
            .collect(),
        BenchmarkSelection::All => {
            let entries = fs::read_dir(type_dir).map_err(|source| ProblemsError::List {
                path: type_dir.to_path_buf(),
                source,
            })?;
            let mut problems = Vec::new();
            for entry in entries {
                let entry = entry.map_err(|source| ProblemsError::List {
                    path: type_dir.to_path_buf(),
                    source,
                })?;
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                let name = path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if name.is_empty() {
                    continue;
                }
                problems.push(ProblemInstance { name, path });
            }
            problems.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(problems)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};

    fn scratch_type_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("optibench-problems-{}-{tag}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        for file in ["cost_min.nl", "cost_min_2.nl", "notes.txt"] {
            File::create(dir.join(file)).unwrap();
        }
        dir
    }

    #[test]
    fn test_named_selection_resolves_paths() {
        let dir = scratch_type_dir("named");
        let problems = resolve_selection(
            &dir,
            "nl",
            &BenchmarkSelection::Named(vec!["cost_min".to_string()]),
        )
        .unwrap();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].name, "cost_min");
        assert_eq!(problems[0].path, dir.join("cost_min.nl"));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_named_selection_missing_file_is_an_error() {
        let dir = scratch_type_dir("missing");
        let result = resolve_selection(
            &dir,
            "nl",
            &BenchmarkSelection::Named(vec!["no_such_benchmark".to_string()]),
        );
        assert!(matches!(result, Err(ProblemsError::BenchmarkMissing(_))));
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_all_selection_is_sorted_by_name() {
        let dir = scratch_type_dir("all");
        let problems = resolve_selection(&dir, "nl", &BenchmarkSelection::All).unwrap();
        let names: Vec<&str> = problems.iter().map(|p| p.name.as_str()).collect();
        // every file counts, in sorted order
        assert_eq!(names, vec!["cost_min", "cost_min_2", "notes"]);
        fs::remove_dir_all(&dir).ok();
    }
}
