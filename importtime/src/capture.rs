//! Capture `-X importtime` output.
//!
//! The interpreter writes its import timings to stderr. [`Capture`] runs
//! `python -X importtime -c "import <module>"` and returns that text;
//! [`read_capture`] loads a trace that was saved earlier.

use log::debug;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

/// Errors that can occur while obtaining importtime output.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("invalid input: could not import module \"{module}\"")]
    ModuleNotFound { module: String },

    #[error("failed to run interpreter '{interpreter}': {source}")]
    Spawn {
        interpreter: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read input file '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CaptureError>;

/// Interpreter used when none is configured.
pub const DEFAULT_INTERPRETER: &str = "python3";

/// Runs a Python interpreter with import timing enabled.
#[derive(Debug, Clone)]
pub struct Capture {
    interpreter: String,
}

impl Capture {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    /// The command that imports `module`; stdout is discarded and stderr is
    /// captured.
    pub fn command(&self, module: &str) -> Command {
        let mut cmd = Command::new(&self.interpreter);
        cmd.arg("-X")
            .arg("importtime")
            .arg("-c")
            .arg(format!("import {module}"))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd
    }

    /// Import `module` and return the interpreter's stderr.
    ///
    /// Any unsuccessful exit is reported as [`CaptureError::ModuleNotFound`];
    /// a module name is not something worth retrying.
    pub fn import_time(&self, module: &str) -> Result<String> {
        debug!("running {} -X importtime -c \"import {}\"", self.interpreter, module);
        let output = self
            .command(module)
            .output()
            .map_err(|source| CaptureError::Spawn {
                interpreter: self.interpreter.clone(),
                source,
            })?;

        if !output.status.success() {
            debug!("interpreter exited with {}", output.status);
            return Err(CaptureError::ModuleNotFound {
                module: module.to_string(),
            });
        }

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        debug!("captured {} bytes of importtime output", stderr.len());
        Ok(stderr)
    }
}

impl Default for Capture {
    fn default() -> Self {
        Self::new(DEFAULT_INTERPRETER)
    }
}

/// Read saved importtime output from `path`, or from stdin when `path` is `-`.
///
/// Invalid UTF-8 is replaced rather than rejected, as for captured stderr.
pub fn read_capture(path: &Path) -> Result<String> {
    let mut bytes = Vec::new();

    if path == Path::new("-") {
        std::io::stdin().read_to_end(&mut bytes)?;
    } else {
        let file = File::open(path).map_err(|source| CaptureError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        BufReader::new(file)
            .read_to_end(&mut bytes)
            .map_err(|source| CaptureError::Read {
                path: path.to_path_buf(),
                source,
            })?;
    }

    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
