//! Test result reporting
//!
//! One line per unit goes to the report stream. Failing units also leave a
//! `<name>.output.diff` artifact in the log directory.

use colored::*;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::compare::Verdict;
use crate::discovery::TestUnit;

/// Width of the name column
pub const NAME_WIDTH: usize = 24;

/// Suffix of diff artifacts
pub const DIFF_SUFFIX: &str = "output.diff";

/// Format one report line (without the trailing newline).
pub fn format_line(name: &str, verdict: Verdict) -> String {
    format!(
        "{} {:<width$} {}",
        verdict.marker(),
        name,
        verdict.message(),
        width = NAME_WIDTH
    )
}

/// Contents of a diff artifact
pub fn diff_artifact(expected: &[u8], actual: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(expected.len() + actual.len() + 48);
    out.extend_from_slice(b"*** reference ***\n");
    out.extend_from_slice(expected);
    out.extend_from_slice(b"\n*** test program ***\n");
    out.extend_from_slice(actual);
    out.push(b'\n');
    out
}

/// Writes report lines and diff artifacts
pub struct Reporter<W: Write> {
    out: W,
    log_dir: PathBuf,
    color: bool,
}

impl<W: Write> Reporter<W> {
    /// Create a reporter writing lines to `out` and artifacts to `log_dir`
    pub fn new(out: W, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            out,
            log_dir: log_dir.into(),
            color: false,
        }
    }

    /// Colour the message column
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Write the report line for `unit`.
    pub fn report_line(&mut self, unit: &TestUnit, verdict: Verdict) -> io::Result<()> {
        if self.color {
            let message = match verdict {
                Verdict::Pass => verdict.message().green(),
                Verdict::PassNoOutput => verdict.message().yellow(),
                Verdict::Fail => verdict.message().red().bold(),
                Verdict::MissingReference | Verdict::RunFailure => verdict.message().red(),
            };
            writeln!(
                self.out,
                "{} {:<width$} {}",
                verdict.marker(),
                unit.name,
                message,
                width = NAME_WIDTH
            )?;
        } else {
            writeln!(self.out, "{}", format_line(&unit.name, verdict))?;
        }
        self.out.flush()
    }

    /// Write the diff artifact for a failing `unit` and return its path.
    ///
    /// Never overwrites: a second unit with the same name in one run gets
    /// `<name>.2.output.diff`, and so on.
    pub fn write_diff(&self, unit: &TestUnit, expected: &[u8], actual: &[u8]) -> io::Result<PathBuf> {
        let (path, mut file) = self.create_artifact(&unit.name)?;
        file.write_all(&diff_artifact(expected, actual))?;
        tracing::debug!("wrote {}", path.display());
        Ok(path)
    }

    fn create_artifact(&self, name: &str) -> io::Result<(PathBuf, File)> {
        let mut attempt = 1usize;
        loop {
            let path = artifact_path(&self.log_dir, name, attempt);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(e),
            }
        }
    }
}

/// `<log_dir>/<name>.output.diff`, or `<name>.<n>.output.diff` for n > 1
pub fn artifact_path(log_dir: &Path, name: &str, attempt: usize) -> PathBuf {
    if attempt <= 1 {
        log_dir.join(format!("{}.{}", name, DIFF_SUFFIX))
    } else {
        log_dir.join(format!("{}.{}.{}", name, attempt, DIFF_SUFFIX))
    }
}

/// Verdict tally for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Units reported
    pub total: usize,
    /// Units per verdict
    pub by_verdict: BTreeMap<Verdict, usize>,
    /// Diff artifacts that could not be written
    pub unwritten_diffs: usize,
}

impl RunSummary {
    /// Create an empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one unit's verdict
    pub fn record(&mut self, verdict: Verdict) {
        self.total += 1;
        *self.by_verdict.entry(verdict).or_default() += 1;
    }

    /// Units with this verdict
    pub fn count(&self, verdict: Verdict) -> usize {
        self.by_verdict.get(&verdict).copied().unwrap_or(0)
    }

    /// Units whose verdict needs attention
    pub fn needs_attention(&self) -> usize {
        self.by_verdict
            .iter()
            .filter(|(verdict, _)| verdict.needs_attention())
            .map(|(_, count)| count)
            .sum()
    }

    /// One-line tally, e.g. `4 tests: 2 pass, 1 pass / no output, 1 fail`
    pub fn render(&self) -> String {
        let parts: Vec<String> = Verdict::ALL
            .iter()
            .filter(|verdict| self.count(**verdict) > 0)
            .map(|verdict| format!("{} {}", self.count(*verdict), verdict.message()))
            .collect();

        let noun = if self.total == 1 { "test" } else { "tests" };
        if parts.is_empty() {
            format!("{} {}", self.total, noun)
        } else {
            format!("{} {}: {}", self.total, noun, parts.join(", "))
        }
    }

    /// Print the tally to stderr, keeping stdout for report lines.
    ///
    /// `color` should be the same decision the report lines were made with.
    pub fn print_summary(&self, color: bool) {
        // Nothing left to report to if stderr is gone.
        let _ = self.write_summary(&mut io::stderr().lock(), color);
    }

    /// Write the tally to `out`
    pub fn write_summary<W: Write>(&self, out: &mut W, color: bool) -> io::Result<()> {
        let line = self.render();
        let unwritten = self.unwritten_diffs.to_string();

        if !color {
            writeln!(out, "{}", line)?;
        } else if self.needs_attention() > 0 {
            writeln!(out, "{}", line.red().bold())?;
        } else {
            writeln!(out, "{}", line.green().bold())?;
        }

        if self.unwritten_diffs > 0 {
            if color {
                writeln!(out, "{} diff artifact(s) could not be written", unwritten.yellow())?;
            } else {
                writeln!(out, "{} diff artifact(s) could not be written", unwritten)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn unit(name: &str) -> TestUnit {
        TestUnit {
            name: name.to_string(),
            script: PathBuf::from(format!("tests/{name}.lua")),
            reference: PathBuf::from(format!("tests/{name}.expect")),
        }
    }

    #[test]
    fn test_line_format() {
        assert_eq!(
            format_line("closure", Verdict::Pass),
            "  closure                  pass"
        );
        assert_eq!(
            format_line("empty", Verdict::PassNoOutput),
            "- empty                    pass / no output"
        );
        assert_eq!(
            format_line("broken", Verdict::Fail),
            "* broken                   fail"
        );
    }

    #[test]
    fn test_long_names_are_not_truncated() {
        let name = "a_really_long_test_name_over_24";
        assert_eq!(
            format_line(name, Verdict::MissingReference),
            format!("* {} missing expect file", name)
        );
    }

    #[test]
    fn test_report_lines_in_order() {
        let dir = tempdir().unwrap();
        let mut out = Vec::new();
        let mut reporter = Reporter::new(&mut out, dir.path());
        reporter.report_line(&unit("a"), Verdict::Pass).unwrap();
        reporter.report_line(&unit("b"), Verdict::RunFailure).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert_eq!(
            out,
            format!(
                "{}\n{}\n",
                format_line("a", Verdict::Pass),
                format_line("b", Verdict::RunFailure)
            )
        );
    }

    #[test]
    fn test_diff_artifact_layout() {
        let dir = tempdir().unwrap();
        let reporter = Reporter::new(io::sink(), dir.path());

        let path = reporter.write_diff(&unit("answer"), b"7\n", b"42\n").unwrap();
        assert_eq!(path, dir.path().join("answer.output.diff"));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "*** reference ***\n7\n\n*** test program ***\n42\n\n"
        );
    }

    #[test]
    fn test_diff_name_collision_gets_suffix() {
        let dir = tempdir().unwrap();
        let reporter = Reporter::new(io::sink(), dir.path());

        let first = reporter.write_diff(&unit("dup"), b"1", b"2").unwrap();
        let second = reporter.write_diff(&unit("dup"), b"3", b"4").unwrap();

        assert_eq!(first, dir.path().join("dup.output.diff"));
        assert_eq!(second, dir.path().join("dup.2.output.diff"));
        assert!(fs::read_to_string(&first).unwrap().contains("\n1\n"));
        assert!(fs::read_to_string(&second).unwrap().contains("\n3\n"));
    }

    #[test]
    fn test_diff_into_missing_log_dir_fails() {
        let dir = tempdir().unwrap();
        let reporter = Reporter::new(io::sink(), dir.path().join("gone"));
        assert!(reporter.write_diff(&unit("x"), b"", b"1").is_err());
    }

    #[test]
    fn test_summary_counts() {
        let mut summary = RunSummary::new();
        for verdict in [
            Verdict::Pass,
            Verdict::Pass,
            Verdict::PassNoOutput,
            Verdict::Fail,
            Verdict::MissingReference,
        ] {
            summary.record(verdict);
        }

        assert_eq!(summary.total, 5);
        assert_eq!(summary.count(Verdict::Pass), 2);
        assert_eq!(summary.count(Verdict::RunFailure), 0);
        assert_eq!(summary.needs_attention(), 2);
        assert_eq!(
            summary.render(),
            "5 tests: 2 pass, 1 pass / no output, 1 fail, 1 missing expect file"
        );
    }

    #[test]
    fn test_plain_summary_has_no_escapes() {
        colored::control::set_override(true);

        let mut summary = RunSummary::new();
        summary.record(Verdict::Fail);
        summary.unwritten_diffs = 1;

        let mut out = Vec::new();
        summary.write_summary(&mut out, false).unwrap();
        colored::control::unset_override();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "1 test: 1 fail\n1 diff artifact(s) could not be written\n"
        );
    }

    #[test]
    fn test_summary_empty() {
        let summary = RunSummary::new();
        assert_eq!(summary.render(), "0 tests");
        assert_eq!(summary.needs_attention(), 0);
    }
}
