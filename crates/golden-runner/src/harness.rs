//! Run driver: prepare, discover, execute, classify, report

use std::io::{self, Write};

use crate::compare::{self, Reference, Verdict};
use crate::config::HarnessConfig;
use crate::discovery::{self, DiscoveryRules, TestUnit};
use crate::error::{HarnessError, HarnessResult};
use crate::executor::{Execution, Executor};
use crate::prepare;
use crate::report::{Reporter, RunSummary};

/// Golden-output harness for one configuration
pub struct Harness {
    config: HarnessConfig,
    rules: DiscoveryRules,
}

impl Harness {
    /// Create a harness
    pub fn new(config: HarnessConfig) -> Self {
        let rules = config.discovery_rules();
        Self { config, rules }
    }

    /// Active configuration
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Discovered units, in report order
    pub fn units(&self) -> impl Iterator<Item = TestUnit> + '_ {
        discovery::discover(&self.rules)
    }

    /// Prepare the environment, then run every unit and report it to `out`.
    ///
    /// Only setup problems and a broken report stream are errors; test
    /// failures end up in the returned summary.
    pub fn run<W: Write>(&self, out: W, color: bool) -> HarnessResult<RunSummary> {
        let runtime = prepare::prepare_environment(&self.config)?;
        let executor = Executor::from_config(&self.config, runtime);
        let mut reporter = Reporter::new(out, &self.config.log_dir).with_color(color);

        let mut summary = RunSummary::new();
        for unit in self.units() {
            let verdict = self
                .run_unit(&executor, &mut reporter, &unit, &mut summary)
                .map_err(HarnessError::Report)?;
            summary.record(verdict);
        }
        Ok(summary)
    }

    /// Run one unit through executor, comparator and reporter.
    pub fn run_unit<W: Write>(
        &self,
        executor: &Executor,
        reporter: &mut Reporter<W>,
        unit: &TestUnit,
        summary: &mut RunSummary,
    ) -> io::Result<Verdict> {
        let execution = executor.run(unit);
        let reference = Reference::load(&unit.reference);
        let verdict = compare::classify(&execution, &reference);

        if let Execution::LaunchFailed { reason } = &execution {
            tracing::warn!("{}: {}", unit.name, reason);
        }

        if verdict == Verdict::Fail {
            if let (Some(expected), Some(actual)) = (reference.bytes(), execution.stdout()) {
                if let Err(e) = reporter.write_diff(unit, expected, actual) {
                    tracing::warn!("failed to write diff for {}: {}", unit.name, e);
                    summary.unwritten_diffs += 1;
                }
            }
        }

        reporter.report_line(unit, verdict)?;
        Ok(verdict)
    }
}
