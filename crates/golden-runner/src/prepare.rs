//! Environment preparation, run once before any test

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::HarnessConfig;
use crate::error::{HarnessError, HarnessResult};

/// Make sure the log directory exists and is empty, then check the runtime
/// answers its probe.
///
/// Returns the runtime program to use for tests: its resolved PATH location
/// when found, the configured name otherwise.
pub fn prepare_environment(config: &HarnessConfig) -> HarnessResult<PathBuf> {
    ensure_log_dir(&config.log_dir)?;
    clear_log_dir(&config.log_dir)?;
    probe_runtime(&config.runtime, &config.probe_args)
}

/// Create the log directory (and parents) if it does not exist.
pub fn ensure_log_dir(log_dir: &Path) -> HarnessResult<()> {
    if log_dir.is_dir() {
        return Ok(());
    }

    tracing::info!("Creating directory {}...", log_dir.display());
    fs::create_dir_all(log_dir).map_err(|source| HarnessError::LogDirCreate {
        path: log_dir.to_path_buf(),
        source,
    })
}

/// Remove every entry of the log directory.
pub fn clear_log_dir(log_dir: &Path) -> HarnessResult<()> {
    let clear_err = |source: std::io::Error| HarnessError::LogDirClear {
        path: log_dir.to_path_buf(),
        source,
    };

    let mut removed = 0usize;
    for entry in fs::read_dir(log_dir).map_err(clear_err)? {
        let entry = entry.map_err(clear_err)?;
        let path = entry.path();
        let removal = if entry.file_type().map_err(clear_err)?.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removal.map_err(|source| HarnessError::LogDirClear { path, source })?;
        removed += 1;
    }

    if removed > 0 {
        tracing::debug!("removed {} stale entries from {}", removed, log_dir.display());
    }
    Ok(())
}

/// Invoke `runtime` with the no-op `probe_args`; any failure is fatal.
pub fn probe_runtime(runtime: &str, probe_args: &[String]) -> HarnessResult<PathBuf> {
    let program = match which::which(runtime) {
        Ok(path) => {
            tracing::debug!("Found {} at {:?}", runtime, path);
            path
        }
        Err(e) => {
            tracing::debug!("{} not resolved through PATH: {}", runtime, e);
            PathBuf::from(runtime)
        }
    };

    let unavailable = |reason: String| HarnessError::RuntimeUnavailable {
        runtime: runtime.to_string(),
        reason,
    };

    let status = Command::new(&program)
        .args(probe_args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|e| unavailable(e.to_string()))?;

    if !status.success() {
        return Err(unavailable(format!("probe {}", status)));
    }
    Ok(program)
}
