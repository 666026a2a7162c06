//! Waterfall report for an import tree.
//!
//! Every import gets one line: its name indented by nesting level, then a bar
//! proportional to the selected time, then the time itself.
//!
//! ```text
//! module name | import time (us)
//! ----------------------------------------
//! a      ========(1)
//! .a0    ==============================(4)
//! ```

use importtime_parse::{ImportTree, TimeKey};
use log::warn;
use std::io::Write;

/// Appended to the report when the width leaves no room for the longest bar.
pub const WIDTH_WARNING: &str =
    "WARNING: The waterfall diagram may not be displayed correctly if the set width is too small!";

const HEADER_NAME: &str = "module name";
const HEADER_TIME: &str = "| import time (us)";
const INDENT: char = '.';
const BAR: char = '=';

/// Spaces between the longest name column and the bars.
const GUTTER: usize = 3;

/// The parentheses around each time label.
const PARENS: usize = 2;

/// Renders an [`ImportTree`] as a waterfall diagram.
#[derive(Debug, Clone, Copy)]
pub struct Waterfall {
    key: TimeKey,
    width: usize,
}

struct Row {
    label: String,
    time: u64,
}

impl Waterfall {
    /// Create a renderer drawing `key` times in lines of `width` characters.
    pub fn new(key: TimeKey, width: usize) -> Self {
        Self { key, width }
    }

    /// Render the tree in its current order, one line per import.
    ///
    /// Prune and sort before rendering; the waterfall follows the tree as-is.
    pub fn render(&self, tree: &ImportTree) -> String {
        let rows: Vec<Row> = tree
            .iter()
            .map(|record| Row {
                label: format!(
                    "{}{}",
                    INDENT.to_string().repeat(record.depth.saturating_sub(1)),
                    record.name
                ),
                time: record.time(self.key),
            })
            .collect();

        let max_time = rows.iter().map(|row| row.time).max().unwrap_or(0);
        let max_name_len = tree
            .iter()
            .map(|record| record.name.chars().count() + record.depth)
            .max()
            .unwrap_or(0);
        let bar_column = max_name_len + GUTTER;

        let mut lines = Vec::with_capacity(rows.len() + 3);
        let name_width = (max_name_len + 2).max(HEADER_NAME.len() + 1);
        lines.push(format!("{HEADER_NAME:<name_width$}{HEADER_TIME}"));
        lines.push("-".repeat(self.width));

        for row in &rows {
            let label_len = row.label.chars().count();
            let padding = bar_column.saturating_sub(label_len);
            let time_label = row.time.to_string();
            let available = self
                .width
                .saturating_sub(label_len + padding + time_label.len() + PARENS);
            let bar = bar_len(row.time, max_time, available);

            lines.push(format!(
                "{}{}{}({})",
                row.label,
                " ".repeat(padding),
                BAR.to_string().repeat(bar),
                time_label
            ));
        }

        if !rows.is_empty() && self.width < min_width(bar_column, max_time) {
            warn!(
                "waterfall width {} is below the {} columns needed for the longest bar",
                self.width,
                min_width(bar_column, max_time)
            );
            lines.push(WIDTH_WARNING.to_string());
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    /// Write the rendered report to `writer`.
    pub fn write<W: Write>(&self, tree: &ImportTree, mut writer: W) -> std::io::Result<()> {
        writer.write_all(self.render(tree).as_bytes())
    }
}

fn bar_len(time: u64, max_time: u64, available: usize) -> usize {
    if max_time == 0 {
        return 0;
    }
    (time as f64 / max_time as f64 * available as f64).round() as usize
}

/// Narrowest width at which an import with the maximum time still gets at
/// least one bar character.
fn min_width(bar_column: usize, max_time: u64) -> usize {
    bar_column + max_time.to_string().len() + PARENS + 1
}
