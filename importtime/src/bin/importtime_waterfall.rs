//! Show where a Python module spends its import time.
//!
//! This binary runs `python -X importtime` for a module (or reads a saved
//! trace) and prints the import tree as JSON or as a waterfall diagram.
//!
//! # Usage
//!
//! ```bash
//! importtime_waterfall json
//! importtime_waterfall requests --format waterfall --sort cumulative --depth 2
//! importtime_waterfall --input trace.txt --format waterfall --width 120
//! python3 -X importtime -c 'import asyncio' 2>&1 | importtime_waterfall --input -
//! ```

use clap::{Parser, ValueEnum};
use importtime::capture::{self, Capture, DEFAULT_INTERPRETER};
use importtime::config::{self, ConfigError, OutputFormat, ReportOptions};
use importtime::importtime_parse::TimeKey;
use importtime::{ReportError, render_report};
use log::info;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// Nested JSON array of imports
    Json,
    /// Text diagram with one bar per import
    Waterfall,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Json => OutputFormat::Json,
            Format::Waterfall => OutputFormat::Waterfall,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Time {
    /// Time spent in the module itself
    #[value(name = "self")]
    SelfTime,
    /// Time including nested imports
    Cumulative,
}

impl From<Time> for TimeKey {
    fn from(t: Time) -> Self {
        match t {
            Time::SelfTime => TimeKey::SelfTime,
            Time::Cumulative => TimeKey::Cumulative,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "importtime_waterfall")]
#[command(about = "Show Python -X importtime output as a JSON tree or a waterfall diagram")]
#[command(version)]
struct Args {
    /// Module to import
    #[arg(required_unless_present = "input")]
    module: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: Format,

    /// Sort imported modules by import time
    #[arg(long, value_enum)]
    sort: Option<Time>,

    /// Time to use in waterfall format (default: self)
    #[arg(long, value_enum)]
    time: Option<Time>,

    /// Width of waterfall entries (default: COLUMNS or the terminal width)
    #[arg(long)]
    width: Option<usize>,

    /// Limit the depth of the output (default: unlimited)
    #[arg(long)]
    depth: Option<usize>,

    /// Python interpreter to run
    #[arg(long, default_value = DEFAULT_INTERPRETER)]
    python: String,

    /// Read saved `-X importtime` output instead of running the interpreter
    /// (`-` for stdin)
    #[arg(short, long, conflicts_with = "module")]
    input: Option<PathBuf>,
}

fn run(args: Args) -> Result<(), ReportError> {
    let mut options = ReportOptions {
        format: args.format.into(),
        sort: args.sort.map(Into::into),
        time: args.time.map(Into::into),
        width: args.width,
        depth: args.depth,
    };

    // Reject option conflicts before paying for an interpreter start.
    options.validate()?;

    let raw = match (&args.input, &args.module) {
        (Some(path), _) => {
            info!("reading importtime output from {}", path.display());
            capture::read_capture(path)?
        }
        (None, Some(module)) => {
            info!("capturing import time of {module} with {}", args.python);
            Capture::new(&args.python).import_time(module)?
        }
        (None, None) => return Err(ConfigError::MissingTarget.into()),
    };

    if options.format == OutputFormat::Waterfall {
        options.width = Some(config::terminal_width(options.width));
    }

    let report = render_report(&raw, &options)?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(report.as_bytes())?;
    stdout.flush()?;

    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            match e {
                ReportError::Config(_) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}
