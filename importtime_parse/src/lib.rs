//! Parser for CPython `-X importtime` output.
//!
//! This library turns the raw stderr of `python -X importtime` into an
//! [`ImportTree`] and provides the tree transforms and the JSON form used by
//! the `importtime` tools.
//!
//! # Example
//!
//! ```no_run
//! use importtime_parse::{ImportTree, TimeKey};
//!
//! let raw = std::fs::read_to_string("importtime.txt").unwrap();
//! let mut tree = ImportTree::parse(&raw).unwrap();
//!
//! tree.prune(Some(2));
//! tree.sort_by(TimeKey::Cumulative);
//! println!("{}", tree.to_json().unwrap());
//! ```

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::fmt;
use std::io::Write;
use std::sync::LazyLock;
use thiserror::Error;

/// Errors that can occur while parsing or serializing an import tree.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid input: could not parse any imports")]
    NoImports,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for import tree operations.
pub type Result<T> = std::result::Result<T, ParseError>;

// ============================================================================
// Records
// ============================================================================

/// Name of the synthetic record that owns every top-level import.
pub const ROOT_NAME: &str = "root";

/// Time metric used to order records and size waterfall bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeKey {
    /// Time spent in the module body itself.
    #[default]
    SelfTime,
    /// Time including every import the module triggered.
    Cumulative,
}

impl fmt::Display for TimeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeKey::SelfTime => f.write_str("self"),
            TimeKey::Cumulative => f.write_str("cumulative"),
        }
    }
}

/// A single module import and the imports it triggered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRecord {
    pub name: String,
    #[serde(rename = "t_self_us")]
    pub self_us: u64,
    #[serde(rename = "t_cumulative_us")]
    pub cumulative_us: u64,
    /// Nesting level. The synthetic root is 0, top-level imports are 1.
    #[serde(skip)]
    pub depth: usize,
    #[serde(rename = "nested_imports", default)]
    pub children: Vec<ImportRecord>,
}

impl ImportRecord {
    pub fn new(name: impl Into<String>, self_us: u64, cumulative_us: u64, depth: usize) -> Self {
        Self {
            name: name.into(),
            self_us,
            cumulative_us,
            depth,
            children: Vec::new(),
        }
    }

    fn root() -> Self {
        Self::new(ROOT_NAME, 0, 0, 0)
    }

    /// Value of the selected time metric, in microseconds.
    pub fn time(&self, key: TimeKey) -> u64 {
        match key {
            TimeKey::SelfTime => self.self_us,
            TimeKey::Cumulative => self.cumulative_us,
        }
    }

    /// Iterate over all descendants in depth-first pre-order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }
}

/// Pre-order iterator returned by [`ImportRecord::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a ImportRecord>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a ImportRecord;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.stack.pop()?;
        self.stack.extend(record.children.iter().rev());
        Some(record)
    }
}

// ============================================================================
// Line matching
// ============================================================================

static IMPORT_TIME_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^import time:\s+(\d+) \|\s+(\d+) \|(\s+.*)")
        .expect("import time pattern is valid")
});

/// One `import time:` record line, before it is placed in a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportLine<'a> {
    pub self_us: u64,
    pub cumulative_us: u64,
    pub name: &'a str,
    pub depth: usize,
}

/// Match a single line of `-X importtime` output.
///
/// Returns `None` for the column header, blank lines and anything else that is
/// not an import record.
pub fn match_line(line: &str) -> Option<ImportLine<'_>> {
    let caps = IMPORT_TIME_LINE.captures(line)?;
    let self_us = caps[1].parse().ok()?;
    let cumulative_us = caps[2].parse().ok()?;

    let field = caps.get(3)?.as_str();
    let name = field.trim();
    if name.is_empty() {
        return None;
    }
    let indent = field.chars().take_while(|c| c.is_whitespace()).count();

    Some(ImportLine {
        self_us,
        cumulative_us,
        name,
        depth: depth_for_indent(indent),
    })
}

/// The interpreter prints one separator space plus two spaces per level.
fn depth_for_indent(indent: usize) -> usize {
    indent.saturating_sub(1) / 2 + 1
}

// ============================================================================
// Import tree
// ============================================================================

/// Imports rooted at a synthetic `root` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTree {
    root: ImportRecord,
}

impl ImportTree {
    /// Build a tree from raw `-X importtime` output.
    ///
    /// The interpreter reports an import only after everything it pulled in,
    /// so lines are consumed last-to-first and every parent is seen before its
    /// children. `open` holds the chain of records that may still receive
    /// children; a record is attached to its parent when it is closed.
    pub fn parse(input: &str) -> Result<Self> {
        let mut open = vec![ImportRecord::root()];
        let mut matched = 0usize;

        for line in input.lines().rev() {
            let Some(import) = match_line(line) else {
                continue;
            };
            matched += 1;

            close_until(&mut open, import.depth);
            open.push(ImportRecord::new(
                import.name,
                import.self_us,
                import.cumulative_us,
                import.depth,
            ));
        }

        if matched == 0 {
            return Err(ParseError::NoImports);
        }

        close_until(&mut open, 1);
        let root = open.swap_remove(0);
        debug!("parsed {} import records, {} top-level", matched, root.children.len());

        Ok(Self { root })
    }

    /// Build a tree from top-level records, recomputing every depth from the
    /// nesting.
    pub fn from_records(records: Vec<ImportRecord>) -> Self {
        let mut root = ImportRecord::root();
        root.children = records;
        assign_depth(&mut root, 0);
        Self { root }
    }

    /// The synthetic root record.
    pub fn root(&self) -> &ImportRecord {
        &self.root
    }

    /// Top-level imports.
    pub fn imports(&self) -> &[ImportRecord] {
        &self.root.children
    }

    /// Every record except the root, in depth-first pre-order.
    pub fn iter(&self) -> Descendants<'_> {
        self.root.descendants()
    }

    /// Number of records, excluding the root.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// Drop every record more than `depth` levels below its top-level
    /// ancestor. `Some(0)` keeps only the top-level imports; `None` keeps
    /// everything.
    ///
    /// Times of the remaining records are left as reported; cumulative time
    /// already covers whatever was removed.
    pub fn prune(&mut self, depth: Option<usize>) {
        let Some(depth) = depth else {
            return;
        };
        for import in &mut self.root.children {
            prune_below(import, depth);
        }
    }

    /// Sort every level by `key`, largest first. Records with equal times keep
    /// their input order.
    pub fn sort_by(&mut self, key: TimeKey) {
        sort_children(&mut self.root, key);
    }

    /// Serialize the top-level imports as a pretty-printed JSON array.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.root.children)?)
    }

    /// Write the JSON form followed by a newline.
    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, &self.root.children)?;
        writeln!(writer)?;
        Ok(())
    }

    /// Read a tree back from the array produced by [`ImportTree::to_json`].
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<ImportRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(records))
    }
}

/// Close open records until `len` remain, attaching each to the record below
/// it. The root is never closed.
fn close_until(open: &mut Vec<ImportRecord>, len: usize) {
    while open.len() > len.max(1) {
        let Some(done) = open.pop() else {
            break;
        };
        let Some(parent) = open.last_mut() else {
            break;
        };
        parent.children.insert(0, done);
    }
}

fn assign_depth(record: &mut ImportRecord, depth: usize) {
    record.depth = depth;
    for child in &mut record.children {
        assign_depth(child, depth + 1);
    }
}

fn prune_below(record: &mut ImportRecord, levels: usize) {
    match levels.checked_sub(1) {
        None => record.children.clear(),
        Some(rest) => {
            for child in &mut record.children {
                prune_below(child, rest);
            }
        }
    }
}

fn sort_children(record: &mut ImportRecord, key: TimeKey) {
    record.children.sort_by_key(|child| Reverse(child.time(key)));
    for child in &mut record.children {
        sort_children(child, key);
    }
}
