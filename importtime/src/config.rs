//! Report options.
//!
//! [`ReportOptions`] carries the choices that shape a report. Conflicting
//! combinations are rejected by [`ReportOptions::validate`] before any
//! interpreter is started.

use importtime_parse::TimeKey;
use thiserror::Error;

/// Errors in the requested option set.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{option} requires format to be set to waterfall (--format waterfall)")]
    RequiresWaterfall { option: &'static str },

    #[error("either a module or an input file is required")]
    MissingTarget,
}

/// Width used when neither `COLUMNS` nor the terminal report one.
pub const DEFAULT_WIDTH: usize = 80;

/// Output format of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Nested JSON array of imports.
    #[default]
    Json,
    /// Text report with one proportional bar per import.
    Waterfall,
}

/// Options for one report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportOptions {
    pub format: OutputFormat,
    /// Sort every level by this metric; `None` keeps the interpreter's order.
    pub sort: Option<TimeKey>,
    /// Metric drawn by the waterfall. Waterfall only.
    pub time: Option<TimeKey>,
    /// Waterfall width in characters. Waterfall only.
    pub width: Option<usize>,
    /// Levels kept below each top-level import.
    pub depth: Option<usize>,
}

impl ReportOptions {
    /// Reject waterfall-only options combined with another format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.format == OutputFormat::Waterfall {
            return Ok(());
        }
        if self.time.is_some() {
            return Err(ConfigError::RequiresWaterfall { option: "--time" });
        }
        if self.width.is_some() {
            return Err(ConfigError::RequiresWaterfall { option: "--width" });
        }
        Ok(())
    }

    /// Metric for the waterfall bars, self time unless chosen otherwise.
    pub fn waterfall_time(&self) -> TimeKey {
        self.time.unwrap_or_default()
    }

    /// Waterfall width, falling back to [`DEFAULT_WIDTH`] when unset or zero.
    pub fn waterfall_width(&self) -> usize {
        self.width.filter(|&w| w > 0).unwrap_or(DEFAULT_WIDTH)
    }
}

/// Pick the report width: a positive explicit value, then a positive
/// `COLUMNS`, then the terminal, then [`DEFAULT_WIDTH`].
pub fn resolve_width(
    explicit: Option<usize>,
    columns: Option<&str>,
    terminal: Option<usize>,
) -> usize {
    explicit
        .filter(|&w| w > 0)
        .or_else(|| {
            columns
                .and_then(|c| c.trim().parse::<usize>().ok())
                .filter(|&w| w > 0)
        })
        .or(terminal)
        .unwrap_or(DEFAULT_WIDTH)
}

/// [`resolve_width`] against the real environment and terminal.
pub fn terminal_width(explicit: Option<usize>) -> usize {
    let columns = std::env::var("COLUMNS").ok();
    let terminal = terminal_size::terminal_size().map(|(terminal_size::Width(w), _)| w as usize);
    resolve_width(explicit, columns.as_deref(), terminal)
}
