//! TOML configuration for the golden harness

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::discovery::DiscoveryRules;
use crate::error::{HarnessError, HarnessResult};

/// Config file picked up from the current directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "golden.toml";

/// Module search variable set on every test subprocess
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchPathOverride {
    /// Variable name, e.g. `LUA_PATH`
    pub var: String,
    /// Value handed to the runtime; relative entries resolve against the working directory
    pub value: String,
}

impl Default for SearchPathOverride {
    fn default() -> Self {
        Self {
            var: "LUA_PATH".to_string(),
            value: "./?.lua;;".to_string(),
        }
    }
}

/// Harness configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Directory tree searched for scripts
    pub test_root: PathBuf,

    /// Directory for `.output.diff` artifacts, emptied at the start of every run
    pub log_dir: PathBuf,

    /// Runtime executable, looked up in PATH unless it contains a separator
    pub runtime: String,

    /// Arguments for the no-op invocation that checks the runtime works
    pub probe_args: Vec<String>,

    /// Script extension, without the dot
    pub script_extension: String,

    /// Reference file extension, without the dot
    pub reference_extension: String,

    /// Search path override for test subprocesses (`None` inherits the environment as is)
    pub search_path: Option<SearchPathOverride>,

    /// Working directory for test subprocesses (defaults to the current directory)
    pub working_dir: Option<PathBuf>,

    /// Exit non-zero when any test needs attention
    pub strict: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            test_root: PathBuf::from("tests"),
            log_dir: PathBuf::from("tests/log"),
            runtime: "luajit".to_string(),
            probe_args: vec!["-e".to_string(), String::new()],
            script_extension: "lua".to_string(),
            reference_extension: "expect".to_string(),
            search_path: Some(SearchPathOverride::default()),
            working_dir: None,
            strict: false,
        }
    }
}

impl HarnessConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> HarnessResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| HarnessError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| HarnessError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path`, or from `golden.toml` in the current directory if it
    /// exists, or fall back to defaults.
    ///
    /// A file that exists but does not parse is an error in both cases.
    pub fn load_or_default(path: Option<&Path>) -> HarnessResult<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.is_file() {
            tracing::debug!("loading config from {}", default_path.display());
            Self::load(default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject values the discoverer cannot work with.
    pub fn validate(&self) -> HarnessResult<()> {
        for (field, ext) in [
            ("script_extension", &self.script_extension),
            ("reference_extension", &self.reference_extension),
        ] {
            if ext.is_empty() {
                return Err(HarnessError::InvalidConfig(format!("{field} must not be empty")));
            }
            if ext.contains('.') || ext.contains(std::path::MAIN_SEPARATOR) {
                return Err(HarnessError::InvalidConfig(format!(
                    "{field} must be a bare extension, got '{ext}'"
                )));
            }
        }
        if self.script_extension == self.reference_extension {
            return Err(HarnessError::InvalidConfig(
                "script_extension and reference_extension must differ".to_string(),
            ));
        }
        if self.runtime.is_empty() {
            return Err(HarnessError::InvalidConfig("runtime must not be empty".to_string()));
        }
        Ok(())
    }

    /// Inputs for [`crate::discovery::discover`].
    pub fn discovery_rules(&self) -> DiscoveryRules {
        DiscoveryRules {
            root: self.test_root.clone(),
            script_extension: self.script_extension.clone(),
            reference_extension: self.reference_extension.clone(),
        }
    }
}
