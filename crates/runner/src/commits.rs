// Copyright 2025 OptiBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Commit resolution for the repository under test.
//!
//! Uploaded results are keyed by commit, and a comparison needs the commit
//! to look the previous results up under. Both come from the CI checkout
//! itself via `git rev-parse`; an explicit comparison SHA is verified to
//! exist before any benchmark runs.

use crate::git::{self, GitError};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves commits in one repository checkout.
#[derive(Debug, Clone)]
pub struct CommitResolver {
    repo_dir: PathBuf,
}

impl CommitResolver {
    /// Bind the resolver to a checkout directory.
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        CommitResolver {
            repo_dir: repo_dir.into(),
        }
    }

    /// The checkout this resolver works on.
    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Full SHA of `HEAD`.
    pub fn head(&self) -> Result<String, GitError> {
        git::run_git(&self.repo_dir, &["rev-parse", "HEAD"])
    }

    /// Full SHA of the parent of `HEAD`, or `None` when there is no parent
    /// (shallow or initial commit) — the caller then has nothing to compare
    /// against.
    pub fn parent_of_head(&self) -> Option<String> {
        match git::run_git(&self.repo_dir, &["rev-parse", "HEAD~1"]) {
            Ok(sha) => Some(sha),
            Err(err) => {
                debug!("no parent commit resolved: {err}");
                None
            }
        }
    }

    /// Whether the checkout knows the given commit.
    pub fn contains(&self, sha: &str) -> bool {
        git::git_succeeds(&self.repo_dir, &["cat-file", "-e", &format!("{sha}^{{commit}}")])
    }
}
