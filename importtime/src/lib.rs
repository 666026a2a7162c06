//! Tools for Python `-X importtime` traces.
//!
//! This crate turns the import timings printed by CPython into a JSON tree or
//! a waterfall report.
//!
//! # Modules
//!
//! - [`capture`] - Run the interpreter, or read a saved trace
//! - [`config`] - Report options and width detection
//! - [`waterfall`] - Waterfall text report
//!
//! # Example
//!
//! ```no_run
//! use importtime::capture::Capture;
//! use importtime::config::{OutputFormat, ReportOptions};
//!
//! let raw = Capture::default().import_time("json").unwrap();
//! let options = ReportOptions {
//!     format: OutputFormat::Waterfall,
//!     width: Some(100),
//!     ..Default::default()
//! };
//! print!("{}", importtime::render_report(&raw, &options).unwrap());
//! ```

pub mod capture;
pub mod config;
pub mod waterfall;

// Re-export importtime_parse for convenience
pub use importtime_parse;

use capture::CaptureError;
use config::{ConfigError, OutputFormat, ReportOptions};
use importtime_parse::{ImportTree, ParseError};
use log::info;
use thiserror::Error;
use waterfall::Waterfall;

/// Errors from any stage of producing a report.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;

/// Apply `options` to a tree: prune first, then sort.
pub fn transform(tree: &mut ImportTree, options: &ReportOptions) {
    tree.prune(options.depth);
    if let Some(key) = options.sort {
        tree.sort_by(key);
    }
}

/// Render raw `-X importtime` output according to `options`.
///
/// The returned text ends with a newline in both formats.
pub fn render_report(raw: &str, options: &ReportOptions) -> Result<String> {
    options.validate()?;

    let mut tree = ImportTree::parse(raw)?;
    info!("parsed {} imports", tree.len());
    transform(&mut tree, options);

    let report = match options.format {
        OutputFormat::Json => {
            let mut json = tree.to_json()?;
            json.push('\n');
            json
        }
        OutputFormat::Waterfall => {
            let key = options.waterfall_time();
            let width = options.waterfall_width();
            info!("rendering waterfall of {key} time at width {width}");
            Waterfall::new(key, width).render(&tree)
        }
    };

    Ok(report)
}
