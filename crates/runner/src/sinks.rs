// Copyright 2025 OptiBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Report and CI output sinks.
//!
//! Under CI the rendered Markdown goes to the job-summary file; anywhere
//! else it goes to stdout. Both sinks append, so the summary and the
//! comparison sections of one run end up in the same document.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Destination for rendered report documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportSink {
    /// Append to the CI job-summary file.
    JobSummary(PathBuf),
    /// Print to standard output.
    Stdout,
}

impl ReportSink {
    /// Pick the sink: the job-summary file when CI provides one, stdout
    /// otherwise.
    pub fn from_config(ci: bool, summary_path: Option<&Path>) -> Self {
        match summary_path {
            Some(path) if ci => ReportSink::JobSummary(path.to_path_buf()),
            _ => ReportSink::Stdout,
        }
    }

    /// Append one rendered document to the sink.
    pub fn write(&self, document: &str) -> io::Result<()> {
        match self {
            ReportSink::JobSummary(path) => {
                let mut file = OpenOptions::new().create(true).append(true).open(path)?;
                writeln!(file, "{document}")
            }
            ReportSink::Stdout => {
                println!("{document}");
                Ok(())
            }
        }
    }
}

/// Append one `key=value` line to the CI output file.
pub fn append_output(path: &Path, key: &str, value: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{key}={value}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_file(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("optibench-sink-{}-{tag}", std::process::id()))
    }

    #[test]
    fn test_job_summary_appends_documents() {
        let path = scratch_file("summary");
        fs::remove_file(&path).ok();
        let sink = ReportSink::JobSummary(path.clone());
        sink.write("# first").unwrap();
        sink.write("# second").unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "# first\n# second\n");
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_sink_selection() {
        let path = PathBuf::from("/tmp/summary");
        assert_eq!(
            ReportSink::from_config(true, Some(&path)),
            ReportSink::JobSummary(path.clone())
        );
        assert_eq!(ReportSink::from_config(false, Some(&path)), ReportSink::Stdout);
        assert_eq!(ReportSink::from_config(true, None), ReportSink::Stdout);
    }

    #[test]
    fn test_ci_output_line_format() {
        let path = scratch_file("output");
        fs::remove_file(&path).ok();
        append_output(&path, "benchmarks", "cost_min,cost_min_2").unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "benchmarks=cost_min,cost_min_2\n");
        fs::remove_file(&path).ok();
    }
}
