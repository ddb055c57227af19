//! Table formatting utilities for CLI list commands
//!
//! Commands build [`TableRow`]s of typed cells and hand them to a
//! [`TableFormatter`], which renders aligned terminal text, CSV or Markdown.

use console::style;

use crate::cli::helpers::{escape_csv, format_money, truncate_str};
use crate::cli::OutputFormat;
use crate::core::numeric::Currency;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Plain text, optionally truncated
    Text(String),
    /// Currency amount; `None` is an undefined value, shown blank
    Money(Option<f64>, Currency),
    /// Float value with precision; `None` is shown as "-"
    Float(Option<f64>, usize),
    /// Whole-number percentage
    Percent(f64),
    /// Join status of a stage against the rate table (matched=green, missing=yellow)
    Matched(bool),
    /// Empty/placeholder
    Empty,
}

impl CellValue {
    /// Format for terminal output (with colors if terminal)
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Text(s) => {
                let truncated = truncate_str(s, width.saturating_sub(2));
                format!("{:<width$}", truncated, width = width)
            }
            CellValue::Money(Some(v), currency) => {
                let s = format_money(*v, *currency);
                format!("{:>width$}", s, width = width)
            }
            CellValue::Money(None, _) | CellValue::Float(None, _) => {
                format!("{:>width$}", style("-").dim(), width = width)
            }
            CellValue::Float(Some(f), precision) => {
                format!("{:>width$.prec$}", f, width = width, prec = precision)
            }
            CellValue::Percent(p) => format!("{:>width$}", format!("{}%", p), width = width),
            CellValue::Matched(true) => format!("{:<width$}", style("✓").green(), width = width),
            CellValue::Matched(false) => {
                format!("{:<width$}", style("no rate").yellow(), width = width)
            }
            CellValue::Empty => format!("{:<width$}", "-", width = width),
        }
    }

    /// Format for CSV output (RFC 4180, no colors)
    pub fn format_csv(&self) -> String {
        match self {
            CellValue::Text(s) => escape_csv(s),
            CellValue::Money(v, _) | CellValue::Float(v, _) => {
                v.map(|v| v.to_string()).unwrap_or_default()
            }
            CellValue::Percent(p) => p.to_string(),
            CellValue::Matched(b) => {
                if *b {
                    "yes".to_string()
                } else {
                    "no".to_string()
                }
            }
            CellValue::Empty => String::new(),
        }
    }

    /// Format for Markdown output (no colors, escaped pipes)
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Money(Some(v), currency) => format_money(*v, *currency),
            CellValue::Float(Some(f), precision) => format!("{:.prec$}", f, prec = precision),
            CellValue::Money(None, _) | CellValue::Float(None, _) => "-".to_string(),
            CellValue::Percent(p) => format!("{}%", p),
            CellValue::Matched(b) => {
                if *b {
                    "✓".to_string()
                } else {
                    "no rate".to_string()
                }
            }
            CellValue::Empty => "-".to_string(),
        };
        // Escape pipe characters for markdown tables
        raw.replace('|', "\\|")
    }

    /// Get the display width of this cell's content (for dynamic column sizing)
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Text(s) => s.chars().count(),
            CellValue::Money(Some(v), _) => format!("{:.2}", v).len() + 1,
            CellValue::Float(Some(f), precision) => format!("{:.prec$}", f, prec = precision).len(),
            CellValue::Money(None, _) | CellValue::Float(None, _) => 1,
            CellValue::Percent(p) => format!("{}%", p).len(),
            CellValue::Matched(_) => 7, // "no rate"
            CellValue::Empty => 1,
        }
    }
}

/// Column definition with header label and width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
#[derive(Debug, Clone, Default)]
pub struct TableRow {
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    row_name: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], row_name: &'static str) -> Self {
        Self {
            columns,
            row_name,
            show_summary: true,
        }
    }

    /// Drop the trailing "N row(s)" line
    pub fn without_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    /// Render rows in the specified format
    pub fn render(&self, rows: &[TableRow], format: OutputFormat) -> String {
        match format {
            OutputFormat::Csv => self.render_csv(rows),
            OutputFormat::Md => self.render_md(rows),
            _ => self.render_tsv(rows),
        }
    }

    /// Output rows in the specified format
    pub fn output(&self, rows: &[TableRow], format: OutputFormat) {
        print!("{}", self.render(rows, format));
    }

    /// Calculate dynamic column widths based on actual content
    fn calculate_widths(&self, rows: &[TableRow]) -> Vec<usize> {
        self.columns
            .iter()
            .map(|col| {
                let max_content = rows
                    .iter()
                    .filter_map(|r| r.get(col.key))
                    .map(|v| v.display_width())
                    .max()
                    .unwrap_or(0);
                // Auto-size to header or content, capped at the defined width
                let natural_width = col.header.len().max(max_content.saturating_add(2));
                natural_width.min(col.width)
            })
            .collect()
    }

    fn render_tsv(&self, rows: &[TableRow]) -> String {
        let widths = self.calculate_widths(rows);
        let mut out = String::new();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<width$}", style(col.header).bold(), width = *w))
            .collect();
        out.push_str(&header.join(" "));
        out.push('\n');

        let total_width: usize = widths.iter().sum::<usize>() + widths.len().saturating_sub(1);
        out.push_str(&"-".repeat(total_width));
        out.push('\n');

        for row in rows {
            let parts: Vec<String> = self
                .columns
                .iter()
                .zip(&widths)
                .map(|(col, w)| match row.get(col.key) {
                    Some(value) => value.format_tsv(*w),
                    None => format!("{:<width$}", "-", width = *w),
                })
                .collect();
            out.push_str(&parts.join(" "));
            out.push('\n');
        }

        if self.show_summary {
            out.push('\n');
            out.push_str(&format!(
                "{} {}(s)\n",
                style(rows.len()).cyan(),
                self.row_name
            ));
        }
        out
    }

    fn render_csv(&self, rows: &[TableRow]) -> String {
        let mut out = String::new();
        let headers: Vec<String> = self.columns.iter().map(|c| escape_csv(c.header)).collect();
        out.push_str(&headers.join(","));
        out.push('\n');

        for row in rows {
            let values: Vec<String> = self
                .columns
                .iter()
                .map(|col| row.get(col.key).map(CellValue::format_csv).unwrap_or_default())
                .collect();
            out.push_str(&values.join(","));
            out.push('\n');
        }
        out
    }

    fn render_md(&self, rows: &[TableRow]) -> String {
        let mut out = String::new();
        let headers: Vec<&str> = self.columns.iter().map(|c| c.header).collect();
        out.push_str(&format!("| {} |\n", headers.join(" | ")));

        let separators: Vec<&str> = headers.iter().map(|_| "---").collect();
        out.push_str(&format!("|{}|\n", separators.join("|")));

        for row in rows {
            let values: Vec<String> = self
                .columns
                .iter()
                .map(|col| {
                    row.get(col.key)
                        .map(CellValue::format_md)
                        .unwrap_or_else(|| "-".to_string())
                })
                .collect();
            out.push_str(&format!("| {} |\n", values.join(" | ")));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[ColumnDef] = &[
        ColumnDef::new("item", "ITEM", 30),
        ColumnDef::new("price", "PRICE", 14),
    ];

    fn rows() -> Vec<TableRow> {
        vec![
            TableRow::new()
                .cell("item", CellValue::Text("Stencil".to_string()))
                .cell("price", CellValue::Money(Some(2400.0), Currency::Inr)),
            TableRow::new()
                .cell("item", CellValue::Text("Pallet, reflow".to_string()))
                .cell("price", CellValue::Money(None, Currency::Inr)),
        ]
    }

    #[test]
    fn test_cell_value_money_format() {
        let cell = CellValue::Money(Some(12.5), Currency::Usd);
        assert_eq!(cell.format_csv(), "12.5");
        assert_eq!(cell.format_md(), "$12.50");

        let undefined = CellValue::Money(None, Currency::Inr);
        assert_eq!(undefined.format_csv(), "");
        assert_eq!(undefined.format_md(), "-");
    }

    #[test]
    fn test_cell_value_md_escapes_pipes() {
        let cell = CellValue::Text("a|b|c".to_string());
        assert_eq!(cell.format_md(), "a\\|b\\|c");
    }

    #[test]
    fn test_render_csv_escapes_text() {
        let out = TableFormatter::new(COLUMNS, "line").render(&rows(), OutputFormat::Csv);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "ITEM,PRICE");
        assert_eq!(lines[1], "Stencil,2400");
        assert_eq!(lines[2], "\"Pallet, reflow\",");
    }

    #[test]
    fn test_render_md() {
        let out = TableFormatter::new(COLUMNS, "line").render(&rows(), OutputFormat::Md);
        assert!(out.starts_with("| ITEM | PRICE |\n|---|---|\n"));
        assert!(out.contains("| Stencil | ₹2400.00 |"));
    }

    #[test]
    fn test_render_tsv_summary() {
        let formatter = TableFormatter::new(COLUMNS, "line");
        assert!(formatter.render(&rows(), OutputFormat::Tsv).contains("line(s)"));
        let quiet = TableFormatter::new(COLUMNS, "line").without_summary();
        assert!(!quiet.render(&rows(), OutputFormat::Tsv).contains("line(s)"));
    }

    #[test]
    fn test_column_def() {
        let col = ColumnDef::new("item", "ITEM", 30);
        assert_eq!(col.key, "item");
        assert_eq!(col.header, "ITEM");
        assert_eq!(col.width, 30);
    }
}
