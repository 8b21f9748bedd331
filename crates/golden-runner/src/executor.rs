//! Test execution: one runtime subprocess per test unit

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use crate::config::{HarnessConfig, SearchPathOverride};
use crate::discovery::TestUnit;

/// What running one test produced
#[derive(Debug)]
pub enum Execution {
    /// The runtime started and exited, whatever its exit status
    Completed {
        stdout: Vec<u8>,
        stderr: Vec<u8>,
        status: ExitStatus,
    },
    /// The runtime could not be started, or waiting on it failed
    LaunchFailed { reason: String },
}

impl Execution {
    /// Captured stdout, `None` for a launch failure.
    pub fn stdout(&self) -> Option<&[u8]> {
        match self {
            Execution::Completed { stdout, .. } => Some(stdout),
            Execution::LaunchFailed { .. } => None,
        }
    }
}

/// Runs scripts under the configured runtime
#[derive(Debug, Clone)]
pub struct Executor {
    /// Runtime program
    runtime: OsString,
    /// Search variable set on each subprocess
    search_path: Option<SearchPathOverride>,
    /// Subprocess working directory; `None` keeps the harness's own
    working_dir: Option<PathBuf>,
}

impl Executor {
    /// Create an executor with no environment override
    pub fn new(runtime: impl Into<OsString>) -> Self {
        Self {
            runtime: runtime.into(),
            search_path: None,
            working_dir: None,
        }
    }

    /// Executor for `config`, running `runtime` (usually the resolved path of
    /// `config.runtime`)
    pub fn from_config(config: &HarnessConfig, runtime: impl Into<OsString>) -> Self {
        Self::new(runtime)
            .with_search_path(config.search_path.clone())
            .with_working_dir(config.working_dir.clone())
    }

    /// Set the search path override
    pub fn with_search_path(mut self, search_path: Option<SearchPathOverride>) -> Self {
        self.search_path = search_path;
        self
    }

    /// Set the subprocess working directory
    pub fn with_working_dir(mut self, working_dir: Option<PathBuf>) -> Self {
        self.working_dir = working_dir;
        self
    }

    /// Build the command for `script` without running it.
    ///
    /// The override goes on the command only; the harness environment is
    /// left alone.
    pub fn command(&self, script: &Path) -> Command {
        let mut command = Command::new(&self.runtime);

        match &self.working_dir {
            Some(dir) => {
                // The script path is relative to where the harness was started.
                let script = std::path::absolute(script).unwrap_or_else(|_| script.to_path_buf());
                command.arg(script).current_dir(dir);
            }
            None => {
                command.arg(script);
                if let Ok(cwd) = std::env::current_dir() {
                    command.current_dir(cwd);
                }
            }
        }

        if let Some(search_path) = &self.search_path {
            command.env(&search_path.var, &search_path.value);
        }

        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }

    /// Run `unit` to completion. Never returns an error: failing to launch
    /// is reported as [`Execution::LaunchFailed`].
    pub fn run(&self, unit: &TestUnit) -> Execution {
        tracing::debug!("running {} ({})", unit.name, unit.script.display());

        match self.command(&unit.script).output() {
            Ok(output) => {
                if !output.stderr.is_empty() {
                    tracing::debug!(
                        "{} wrote {} bytes to stderr (exit: {})",
                        unit.name,
                        output.stderr.len(),
                        output.status
                    );
                }
                Execution::Completed {
                    stdout: output.stdout,
                    stderr: output.stderr,
                    status: output.status,
                }
            }
            Err(e) => {
                let reason = format!(
                    "Failed to run {:?} on {}: {}",
                    self.runtime,
                    unit.script.display(),
                    e
                );
                tracing::debug!("{}", reason);
                Execution::LaunchFailed { reason }
            }
        }
    }
}
