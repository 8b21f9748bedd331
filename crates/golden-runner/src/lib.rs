//! # Golden Runner
//!
//! Golden-output test harness for interpreter scripts.
//!
//! Every `<name>.<ext>` script under the test root is run by an external
//! runtime (LuaJIT by default). Its stdout is compared byte-for-byte with the
//! `<name>.expect` file next to it; one report line is printed per script and
//! a `<name>.output.diff` artifact is left in the log directory for every
//! mismatch.

#![warn(clippy::all)]

pub mod compare;
pub mod config;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod harness;
pub mod prepare;
pub mod report;

pub use compare::{Reference, Verdict};
pub use config::{HarnessConfig, SearchPathOverride};
pub use discovery::{DiscoveryRules, TestUnit};
pub use error::{HarnessError, HarnessResult};
pub use executor::{Execution, Executor};
pub use harness::Harness;
pub use report::{Reporter, RunSummary};
