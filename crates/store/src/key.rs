// Copyright 2025 OptiBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Object key layout.
//!
//! Stored results are keyed by where and when they were produced:
//! `{ref_kind}/{ref_short_name}/{commit_sha}/data.json`. The three
//! components come from the CI ref context; the filename is fixed so a
//! commit's results are always found at the same place.

use std::fmt;

/// Fixed filename of a stored result blob.
pub const DATA_FILENAME: &str = "data.json";

/// A normalized object-store key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Build the key for one commit's results.
    ///
    /// The components are joined as a path and normalized: empty and `.`
    /// segments are dropped, `..` pops the previous segment, and there is
    /// no leading separator. Branch names containing `/` therefore nest
    /// naturally.
    pub fn new(ref_kind: &str, ref_short_name: &str, commit_sha: &str) -> Self {
        let mut segments: Vec<&str> = Vec::new();
        for component in [ref_kind, ref_short_name, commit_sha] {
            for segment in component.split('/') {
                match segment {
                    "" | "." => {}
                    ".." => {
                        segments.pop();
                    }
                    _ => segments.push(segment),
                }
            }
        }
        segments.push(DATA_FILENAME);
        ObjectKey(segments.join("/"))
    }

    /// The key as a path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        let key = ObjectKey::new("branch", "main", "abc123");
        assert_eq!(key.as_str(), "branch/main/abc123/data.json");
    }

    #[test]
    fn test_nested_branch_name() {
        let key = ObjectKey::new("branch", "feature/faster-presolve", "abc123");
        assert_eq!(key.as_str(), "branch/feature/faster-presolve/abc123/data.json");
    }

    #[test]
    fn test_empty_and_dot_segments_collapse() {
        let key = ObjectKey::new("branch/", "./main//", "abc123");
        assert_eq!(key.as_str(), "branch/main/abc123/data.json");
    }

    #[test]
    fn test_parent_segments_are_resolved() {
        let key = ObjectKey::new("branch", "oops/../main", "abc123");
        assert_eq!(key.as_str(), "branch/main/abc123/data.json");
    }
}
