//! Typed command results.
//!
//! Replaces untyped response maps with an explicit tagged variant per
//! operation shape.

use serde::{Deserialize, Serialize};

/// Tabular result with a header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Column headers.
    pub columns: Vec<String>,
    /// Data rows; each row has one cell per column.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates a table from static column headers.
    #[must_use]
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|column| (*column).to_owned()).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a data row.
    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    /// Renders the table as tab-separated lines, header first.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = self.columns.join("\t");
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.join("\t"));
            out.push('\n');
        }
        out
    }
}

/// Result of a dispatched command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandOutput {
    /// Tabular listing.
    Table(Table),
    /// Free-form text (logs, describe summaries).
    Text(String),
}

impl CommandOutput {
    /// Renders the output as plain text for the HTTP response.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Table(table) => table.render(),
            Self::Text(text) => text.clone(),
        }
    }
}
