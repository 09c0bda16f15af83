// Copyright 2025 OptiBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Thin wrapper around the `git` binary.
//!
//! The harness only needs clone/pull/rev-parse/cat-file, and every CI image
//! it runs on ships git, so commands go through [`std::process::Command`]
//! instead of a libgit binding.

use std::path::Path;
use std::process::Command;
use thiserror::Error;

/// Errors from invoking git.
#[derive(Debug, Error)]
pub enum GitError {
    /// The git binary could not be started.
    #[error("failed to launch git: {0}")]
    Launch(#[source] std::io::Error),

    /// git ran and reported failure.
    #[error("`git {command}` failed: {stderr}")]
    Failed {
        /// The subcommand and arguments that were run.
        command: String,
        /// Trimmed stderr of the failed invocation.
        stderr: String,
    },
}

/// Run git in `dir` and return its trimmed stdout.
pub(crate) fn run_git(dir: &Path, args: &[&str]) -> Result<String, GitError> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .map_err(GitError::Launch)?;
    if !output.status.success() {
        return Err(GitError::Failed {
            command: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Whether git in `dir` accepts the given command.
pub(crate) fn git_succeeds(dir: &Path, args: &[&str]) -> bool {
    run_git(dir, args).is_ok()
}
