use clap::{ArgAction, Parser};
use colored::*;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use tracing_subscriber::filter::EnvFilter;

use golden_runner::{Harness, HarnessConfig, HarnessResult};

#[derive(Parser, Debug)]
#[command(name = "golden")]
#[command(version)]
#[command(about = "Run interpreter scripts and compare their stdout with .expect files")]
struct Args {
    /// Path to config file (default: ./golden.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory tree searched for test scripts
    #[arg(short, long)]
    test_root: Option<PathBuf>,

    /// Directory for .output.diff files (emptied on every run)
    #[arg(short, long)]
    log_dir: Option<PathBuf>,

    /// Runtime executable used to run each script
    #[arg(short, long)]
    runtime: Option<String>,

    /// Script file extension (without the dot)
    #[arg(long = "ext")]
    script_extension: Option<String>,

    /// Working directory for test subprocesses
    #[arg(long)]
    working_dir: Option<PathBuf>,

    /// Do not set the module search path variable on test subprocesses
    #[arg(long)]
    no_search_path: bool,

    /// Exit with status 1 when any test needs attention
    #[arg(long)]
    strict: bool,

    /// Only list discovered tests without running them
    #[arg(long)]
    list: bool,

    /// Disable colored output (also honoured: NO_COLOR)
    #[arg(long)]
    no_color: bool,

    /// Verbosity level: -v info, -vv debug
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Command-line values win over the config file
    fn apply(&self, config: &mut HarnessConfig) {
        if let Some(ref test_root) = self.test_root {
            config.test_root = test_root.clone();
        }
        if let Some(ref log_dir) = self.log_dir {
            config.log_dir = log_dir.clone();
        }
        if let Some(ref runtime) = self.runtime {
            config.runtime = runtime.clone();
        }
        if let Some(ref ext) = self.script_extension {
            config.script_extension = ext.clone();
        }
        if let Some(ref working_dir) = self.working_dir {
            config.working_dir = Some(working_dir.clone());
        }
        if self.no_search_path {
            config.search_path = None;
        }
        if self.strict {
            config.strict = true;
        }
    }
}

fn main() {
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let no_color = args.no_color || std::env::var_os("NO_COLOR").is_some();
    if no_color {
        colored::control::set_override(false);
    }

    match run(&args, !no_color) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn run(args: &Args, color: bool) -> HarnessResult<i32> {
    let mut config = HarnessConfig::load_or_default(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    let harness = Harness::new(config);

    if args.list {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let mut total = 0usize;
        for unit in harness.units() {
            // A closed pipe (e.g. `| head`) just ends the listing.
            if writeln!(out, "{:<24} {}", unit.name, unit.script.display()).is_err() {
                return Ok(0);
            }
            total += 1;
        }
        eprintln!("Total: {} tests", total);
        return Ok(0);
    }

    let color = color && io::stdout().is_terminal();
    let summary = harness.run(io::stdout().lock(), color)?;
    summary.print_summary(color);

    if harness.config().strict && summary.needs_attention() > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}
