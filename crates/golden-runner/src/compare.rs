//! Output comparison against reference text

use std::fmt;
use std::io;
use std::path::Path;

use crate::executor::Execution;

/// Blank outputs, reported as "no output" when they match
const NO_OUTPUT: [&[u8]; 3] = [b"", b"\n", b"\r\n"];

/// Reference text for a unit, read at execution time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// Raw bytes of the reference file
    Present(Vec<u8>),
    /// No reference file
    Missing,
    /// The file exists but could not be read
    Unreadable,
}

impl Reference {
    /// Read the reference file at `path`.
    pub fn load(path: &Path) -> Self {
        match std::fs::read(path) {
            Ok(bytes) => Reference::Present(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Reference::Missing,
            Err(e) => {
                tracing::warn!("cannot read reference {}: {}", path.display(), e);
                Reference::Unreadable
            }
        }
    }

    /// Reference bytes, if present
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Reference::Present(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Classified outcome of one test unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Verdict {
    /// The runtime could not be launched
    RunFailure,
    /// No usable reference file
    MissingReference,
    /// Output matched and was blank (empty, `\n` or `\r\n`)
    PassNoOutput,
    /// Output matched
    Pass,
    /// Output differed from the reference
    Fail,
}

impl Verdict {
    /// Every verdict, in summary order
    pub const ALL: [Verdict; 5] = [
        Verdict::Pass,
        Verdict::PassNoOutput,
        Verdict::Fail,
        Verdict::MissingReference,
        Verdict::RunFailure,
    ];

    /// Report message
    pub fn message(self) -> &'static str {
        match self {
            Verdict::RunFailure => "fail to run",
            Verdict::MissingReference => "missing expect file",
            Verdict::PassNoOutput => "pass / no output",
            Verdict::Pass => "pass",
            Verdict::Fail => "fail",
        }
    }

    /// Single-character report marker
    pub fn marker(self) -> char {
        match self {
            Verdict::Pass => ' ',
            Verdict::PassNoOutput => '-',
            Verdict::RunFailure | Verdict::MissingReference | Verdict::Fail => '*',
        }
    }

    /// Whether a human should look at this test
    pub fn needs_attention(self) -> bool {
        self.marker() == '*'
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Whether `bytes` is one of the blank outputs
pub fn is_no_output(bytes: &[u8]) -> bool {
    NO_OUTPUT.contains(&bytes)
}

/// Classify one execution against its reference.
///
/// A launch failure wins over a missing reference. Comparison is byte-exact.
/// The one allowance: a script that printed nothing at all matches any blank
/// reference.
pub fn classify(execution: &Execution, reference: &Reference) -> Verdict {
    let Some(actual) = execution.stdout() else {
        return Verdict::RunFailure;
    };
    let Some(expected) = reference.bytes() else {
        return Verdict::MissingReference;
    };

    if actual == expected {
        if is_no_output(actual) {
            Verdict::PassNoOutput
        } else {
            Verdict::Pass
        }
    } else if actual.is_empty() && is_no_output(expected) {
        Verdict::PassNoOutput
    } else {
        Verdict::Fail
    }
}
