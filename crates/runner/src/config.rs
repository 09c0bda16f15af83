// Copyright 2025 OptiBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Harness configuration.
//!
//! All ambient environment — the `INPUT_*` action inputs, the `GITHUB_*`
//! ref/sha/sink variables, the `OS_*` object-store credentials and the `CI`
//! marker — is read exactly once, at startup, into [`EnvSnapshot`].
//! [`HarnessConfig::resolve`] combines that snapshot with the parsed CLI
//! options into one explicit struct that is passed by parameter to every
//! component; nothing below this module touches the environment.
//!
//! Missing required inputs are fatal here, before any benchmark runs.

use optibench_store::SwiftCredentials;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Default problem-set repository cloned when no override is configured.
pub const DEFAULT_PROBLEMS_REPO: &str = "https://github.com/optibench/benchmark-problems.git";

/// Default object-store container holding uploaded results.
pub const DEFAULT_CONTAINER: &str = "solver-benchmarks";

/// Errors detected while assembling the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required input variable or flag is unset.
    #[error("missing required input {0}")]
    MissingInput(&'static str),

    /// The configured solver executable is not a file.
    #[error("solver executable does not exist: {0}")]
    SolverMissing(PathBuf),

    /// The run count must be at least one.
    #[error("run count must be at least 1")]
    InvalidRunCount,

    /// An explicit comparison SHA only makes sense in comparison mode.
    #[error("cannot compare to a specific SHA without passing --compare")]
    ShaWithoutCompare,

    /// Storing or comparing needs the CI ref context.
    #[error("CI ref context not detected ({0} unset)")]
    MissingRefContext(&'static str),

    /// Storing or comparing needs object-store credentials.
    #[error("missing object-store credential {0}")]
    MissingCredential(&'static str),

    /// The ref kind reported by CI is not one the key layout knows.
    #[error("unknown ref kind {0:?}")]
    UnknownRefKind(String),
}

/// Result alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Parsed command-line options, produced by the CLI crate.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    /// Compare against a previous run's stored results.
    pub compare: bool,
    /// Upload this run's results to the object store.
    pub store_result: bool,
    /// Number of runs per benchmark.
    pub runs: usize,
    /// Explicit commit to compare against instead of the parent of HEAD.
    pub sha: Option<String>,
    /// Folder inside the problem repository holding the benchmark set.
    pub benchmark_folder: Option<String>,
    /// Problem format subfolder and file extension.
    pub benchmark_type: Option<String>,
    /// Comma-separated benchmark names, empty or `all` for everything.
    pub benchmarks: Option<String>,
    /// Path to the solver executable.
    pub solver_executable: Option<PathBuf>,
    /// Problem-set repository URL override.
    pub problems_repo: Option<String>,
}

/// One-time snapshot of the ambient environment.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    /// `CI` is set.
    pub ci: bool,
    /// `INPUT_IS_GAMS` is set to a truthy value.
    pub is_gams: bool,
    /// `INPUT_IS_GUROBI` is set to a truthy value.
    pub is_gurobi: bool,
    /// `GITHUB_REF_TYPE`.
    pub ref_type: Option<String>,
    /// `GITHUB_REF_NAME`.
    pub ref_name: Option<String>,
    /// `GITHUB_SHA`.
    pub commit_sha: Option<String>,
    /// `GITHUB_STEP_SUMMARY`.
    pub step_summary: Option<PathBuf>,
    /// `GITHUB_OUTPUT`.
    pub output_file: Option<PathBuf>,
    /// `GITHUB_WORKSPACE`: the checkout of the repository under test.
    pub workspace: Option<PathBuf>,
    /// Harness working directory.
    pub current_dir: PathBuf,
    /// `OS_AUTH_URL`.
    pub os_auth_url: Option<String>,
    /// `OS_USERNAME`.
    pub os_username: Option<String>,
    /// `OS_PASSWORD`.
    pub os_password: Option<String>,
    /// `OS_PROJECT_NAME`.
    pub os_project_name: Option<String>,
    /// `OS_USER_DOMAIN_NAME`.
    pub os_user_domain_name: Option<String>,
    /// `OS_STORAGE_URL` endpoint override.
    pub os_storage_url: Option<String>,
}

impl EnvSnapshot {
    /// Capture the process environment. Called once from the binary.
    pub fn capture() -> Self {
        EnvSnapshot {
            ci: env::var_os("CI").is_some(),
            is_gams: truthy_var("INPUT_IS_GAMS"),
            is_gurobi: truthy_var("INPUT_IS_GUROBI"),
            ref_type: env::var("GITHUB_REF_TYPE").ok(),
            ref_name: env::var("GITHUB_REF_NAME").ok(),
            commit_sha: env::var("GITHUB_SHA").ok(),
            step_summary: env::var_os("GITHUB_STEP_SUMMARY").map(PathBuf::from),
            output_file: env::var_os("GITHUB_OUTPUT").map(PathBuf::from),
            workspace: env::var_os("GITHUB_WORKSPACE").map(PathBuf::from),
            current_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            os_auth_url: env::var("OS_AUTH_URL").ok(),
            os_username: env::var("OS_USERNAME").ok(),
            os_password: env::var("OS_PASSWORD").ok(),
            os_project_name: env::var("OS_PROJECT_NAME").ok(),
            os_user_domain_name: env::var("OS_USER_DOMAIN_NAME").ok(),
            os_storage_url: env::var("OS_STORAGE_URL").ok(),
        }
    }
}

/// Kind of git ref the CI run executes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// A branch head.
    Branch,
    /// A tag.
    Tag,
}

impl RefKind {
    /// The key-layout segment for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            RefKind::Branch => "branch",
            RefKind::Tag => "tag",
        }
    }
}

impl FromStr for RefKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "branch" => Ok(RefKind::Branch),
            "tag" => Ok(RefKind::Tag),
            other => Err(ConfigError::UnknownRefKind(other.to_string())),
        }
    }
}

/// The CI ref the current run belongs to.
#[derive(Debug, Clone)]
pub struct RefContext {
    /// Branch or tag.
    pub kind: RefKind,
    /// Short ref name, e.g. `main` or `v1.2.0`.
    pub short_name: String,
}

/// Which benchmarks of the configured set to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BenchmarkSelection {
    /// Every problem file in the type folder.
    All,
    /// An explicit list of benchmark names.
    Named(Vec<String>),
}

/// The assembled harness configuration, passed by parameter everywhere.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Folder inside the problem repository holding the benchmark set.
    pub benchmark_folder: String,
    /// Problem format subfolder and file extension.
    pub benchmark_type: String,
    /// Which benchmarks to run.
    pub selection: BenchmarkSelection,
    /// Path to the solver executable.
    pub solver_executable: PathBuf,
    /// Problem-set repository URL.
    pub problems_repo_url: String,
    /// Number of runs per benchmark, at least 1.
    pub runs: usize,
    /// Compare against a previous run's stored results.
    pub compare: bool,
    /// Upload this run's results.
    pub store_result: bool,
    /// Explicit commit to compare against.
    pub compare_sha: Option<String>,
    /// Solver runs through GAMS.
    pub is_gams: bool,
    /// Solver uses Gurobi as subsolver.
    pub is_gurobi: bool,
    /// Running under CI.
    pub ci: bool,
    /// Job-summary file, when CI provides one.
    pub summary_path: Option<PathBuf>,
    /// CI output file, when CI provides one.
    pub output_path: Option<PathBuf>,
    /// Checkout of the repository under test, for commit resolution.
    pub workspace_dir: PathBuf,
    /// Harness working directory: problem repo and results land here.
    pub work_dir: PathBuf,
    /// CI ref context; present whenever storing or comparing.
    pub ref_context: Option<RefContext>,
    /// Commit the CI run was triggered for.
    pub commit_sha: Option<String>,
    /// Object-store credentials; present whenever storing or comparing.
    pub swift: Option<SwiftCredentials>,
    /// Object-store container name.
    pub container: String,
}

impl HarnessConfig {
    /// Combine CLI options and the environment snapshot, validating every
    /// requirement that must hold before a benchmark runs.
    pub fn resolve(options: CliOptions, env: EnvSnapshot) -> Result<Self> {
        if options.runs == 0 {
            return Err(ConfigError::InvalidRunCount);
        }
        if options.sha.is_some() && !options.compare {
            return Err(ConfigError::ShaWithoutCompare);
        }

        let benchmark_folder = required(options.benchmark_folder, "INPUT_BENCHMARK_FOLDER")?;
        let benchmark_type = required(options.benchmark_type, "INPUT_BENCHMARK_TYPE")?;
        let solver_executable = options
            .solver_executable
            .ok_or(ConfigError::MissingInput("INPUT_SOLVER_EXECUTABLE"))?;
        if !solver_executable.is_file() {
            return Err(ConfigError::SolverMissing(solver_executable));
        }

        let selection = parse_selection(options.benchmarks.as_deref());

        let wants_store = options.store_result || options.compare;
        let ref_context = if wants_store {
            let kind = env
                .ref_type
                .as_deref()
                .ok_or(ConfigError::MissingRefContext("GITHUB_REF_TYPE"))?
                .parse::<RefKind>()?;
            let short_name = env
                .ref_name
                .clone()
                .ok_or(ConfigError::MissingRefContext("GITHUB_REF_NAME"))?;
            Some(RefContext { kind, short_name })
        } else {
            None
        };
        let swift = if wants_store {
            Some(swift_credentials(&env)?)
        } else {
            None
        };

        Ok(HarnessConfig {
            benchmark_folder,
            benchmark_type,
            selection,
            solver_executable,
            problems_repo_url: options
                .problems_repo
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_PROBLEMS_REPO.to_string()),
            runs: options.runs,
            compare: options.compare,
            store_result: options.store_result,
            compare_sha: options.sha,
            is_gams: env.is_gams,
            is_gurobi: env.is_gurobi,
            ci: env.ci,
            summary_path: env.step_summary,
            output_path: env.output_file,
            workspace_dir: env.workspace.unwrap_or_else(|| env.current_dir.clone()),
            work_dir: env.current_dir,
            ref_context,
            commit_sha: env.commit_sha,
            swift,
            container: DEFAULT_CONTAINER.to_string(),
        })
    }

    /// Heading label for the comparison report, derived from the subsolver
    /// configuration.
    pub fn backend_label(&self) -> &'static str {
        match (self.is_gams, self.is_gurobi) {
            (true, true) => "GAMS/Gurobi",
            (true, false) => "GAMS",
            (false, true) => "Gurobi",
            (false, false) => "Ipopt/Cbc",
        }
    }
}

/// CI action inputs arrive as strings even when unset; only a non-empty,
/// non-`"false"` value counts as enabled.
fn truthy_var(name: &str) -> bool {
    env::var(name)
        .map(|value| !value.is_empty() && value != "false" && value != "0")
        .unwrap_or(false)
}

fn required(value: Option<String>, name: &'static str) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::MissingInput(name)),
    }
}

fn parse_selection(benchmarks: Option<&str>) -> BenchmarkSelection {
    match benchmarks {
        None | Some("") | Some("all") => BenchmarkSelection::All,
        Some(list) => {
            let names: Vec<String> = list
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
            if names.is_empty() {
                BenchmarkSelection::All
            } else {
                BenchmarkSelection::Named(names)
            }
        }
    }
}

fn swift_credentials(env: &EnvSnapshot) -> Result<SwiftCredentials> {
    fn need(value: &Option<String>, name: &'static str) -> Result<String> {
        value
            .clone()
            .ok_or(ConfigError::MissingCredential(name))
    }

    Ok(SwiftCredentials {
        auth_url: need(&env.os_auth_url, "OS_AUTH_URL")?,
        username: need(&env.os_username, "OS_USERNAME")?,
        password: need(&env.os_password, "OS_PASSWORD")?,
        project_name: need(&env.os_project_name, "OS_PROJECT_NAME")?,
        user_domain_name: need(&env.os_user_domain_name, "OS_USER_DOMAIN_NAME")?,
        storage_url: env.os_storage_url.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch_solver() -> PathBuf {
        let path = std::env::temp_dir().join(format!("optibench-solver-{}", std::process::id()));
        File::create(&path).unwrap();
        path
    }

    fn options() -> CliOptions {
        CliOptions {
            runs: 1,
            benchmark_folder: Some("MINLP".to_string()),
            benchmark_type: Some("nl".to_string()),
            solver_executable: Some(touch_solver()),
            ..CliOptions::default()
        }
    }

    fn snapshot() -> EnvSnapshot {
        EnvSnapshot {
            current_dir: PathBuf::from("."),
            ..EnvSnapshot::default()
        }
    }

    #[test]
    fn test_minimal_configuration_resolves() {
        let cfg = HarnessConfig::resolve(options(), snapshot()).unwrap();
        assert_eq!(cfg.benchmark_folder, "MINLP");
        assert_eq!(cfg.selection, BenchmarkSelection::All);
        assert_eq!(cfg.runs, 1);
        assert_eq!(cfg.problems_repo_url, DEFAULT_PROBLEMS_REPO);
        assert!(cfg.ref_context.is_none());
        assert!(cfg.swift.is_none());
    }

    #[test]
    fn test_missing_required_input_is_fatal() {
        let mut opts = options();
        opts.benchmark_folder = None;
        assert!(matches!(
            HarnessConfig::resolve(opts, snapshot()),
            Err(ConfigError::MissingInput("INPUT_BENCHMARK_FOLDER"))
        ));
    }

    #[test]
    fn test_missing_solver_file_is_fatal() {
        let mut opts = options();
        opts.solver_executable = Some(PathBuf::from("/nonexistent/solver"));
        assert!(matches!(
            HarnessConfig::resolve(opts, snapshot()),
            Err(ConfigError::SolverMissing(_))
        ));
    }

    #[test]
    fn test_sha_without_compare_is_rejected() {
        let mut opts = options();
        opts.sha = Some("abc123".to_string());
        assert!(matches!(
            HarnessConfig::resolve(opts, snapshot()),
            Err(ConfigError::ShaWithoutCompare)
        ));
    }

    #[test]
    fn test_zero_runs_is_rejected() {
        let mut opts = options();
        opts.runs = 0;
        assert!(matches!(
            HarnessConfig::resolve(opts, snapshot()),
            Err(ConfigError::InvalidRunCount)
        ));
    }

    #[test]
    fn test_selection_parsing() {
        assert_eq!(parse_selection(None), BenchmarkSelection::All);
        assert_eq!(parse_selection(Some("")), BenchmarkSelection::All);
        assert_eq!(parse_selection(Some("all")), BenchmarkSelection::All);
        assert_eq!(
            parse_selection(Some("cost_min, cost_min_2")),
            BenchmarkSelection::Named(vec!["cost_min".to_string(), "cost_min_2".to_string()])
        );
    }

    #[test]
    fn test_store_mode_requires_ref_context_and_credentials() {
        let mut opts = options();
        opts.store_result = true;
        assert!(matches!(
            HarnessConfig::resolve(opts.clone(), snapshot()),
            Err(ConfigError::MissingRefContext("GITHUB_REF_TYPE"))
        ));

        let mut env = snapshot();
        env.ref_type = Some("branch".to_string());
        env.ref_name = Some("main".to_string());
        assert!(matches!(
            HarnessConfig::resolve(opts.clone(), env.clone()),
            Err(ConfigError::MissingCredential("OS_AUTH_URL"))
        ));

        env.os_auth_url = Some("https://identity.example.org/v3".to_string());
        env.os_username = Some("ci".to_string());
        env.os_password = Some("secret".to_string());
        env.os_project_name = Some("bench".to_string());
        env.os_user_domain_name = Some("Default".to_string());
        let cfg = HarnessConfig::resolve(opts, env).unwrap();
        assert_eq!(cfg.ref_context.as_ref().unwrap().kind, RefKind::Branch);
        assert!(cfg.swift.is_some());
    }

    #[test]
    fn test_unknown_ref_kind_is_rejected() {
        let mut opts = options();
        opts.compare = true;
        let mut env = snapshot();
        env.ref_type = Some("pull_request".to_string());
        env.ref_name = Some("merge".to_string());
        env.os_auth_url = Some("u".to_string());
        assert!(matches!(
            HarnessConfig::resolve(opts, env),
            Err(ConfigError::UnknownRefKind(_))
        ));
    }

    #[test]
    fn test_backend_labels() {
        let mut cfg = HarnessConfig::resolve(options(), snapshot()).unwrap();
        assert_eq!(cfg.backend_label(), "Ipopt/Cbc");
        cfg.is_gams = true;
        assert_eq!(cfg.backend_label(), "GAMS");
        cfg.is_gurobi = true;
        assert_eq!(cfg.backend_label(), "GAMS/Gurobi");
        cfg.is_gams = false;
        assert_eq!(cfg.backend_label(), "Gurobi");
    }
}
