//! Tabular data sources and sinks
//!
//! A workbook is a set of named sheets, each a header row plus data rows of
//! text cells. [`CsvWorkbook`] maps a directory of `<sheet>.csv` files (or a
//! single CSV file) onto that model; [`MemoryWorkbook`] keeps sheets in memory.

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::CostError;
use crate::core::numeric::Numeric;

/// Sheet names of the rate workbook
pub mod sheets {
    pub const PROCESS_CT: &str = "Process_CT";
    pub const NRE: &str = "NRE";
    pub const MMR_EMS: &str = "MMR-EMS";
    pub const ASSUMPTIONS: &str = "Assumptions";
}

/// One named table of text cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    header_map: HashMap<String, usize>,
}

/// Normalize a header for lookup
fn header_key(h: &str) -> String {
    h.trim().to_lowercase()
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut header_map = HashMap::new();
        for (i, h) in headers.iter().enumerate() {
            // First occurrence of a header wins
            header_map.entry(header_key(h)).or_insert(i);
        }
        Self {
            name: name.into(),
            headers,
            rows,
            header_map,
        }
    }

    /// Build a sheet from string slices (handy for tests and templates)
    pub fn from_rows(name: &str, headers: &[&str], rows: &[&[&str]]) -> Self {
        Self::new(
            name,
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.header_map.contains_key(&header_key(column))
    }

    /// Index of a column, or a schema error naming it
    pub fn column(&self, column: &str) -> Result<usize, CostError> {
        self.header_map
            .get(&header_key(column))
            .copied()
            .ok_or_else(|| CostError::MissingColumn {
                sheet: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Check that every listed column is present; reports the first missing one
    pub fn require_columns(&self, columns: &[&str]) -> Result<(), CostError> {
        for column in columns {
            self.column(column)?;
        }
        Ok(())
    }

    /// Trimmed text of a cell; short rows read as blank
    pub fn text(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|s| s.trim())
            .unwrap_or("")
    }

    pub fn cell(&self, row: usize, col: usize) -> Numeric {
        Numeric::parse(self.text(row, col))
    }

    /// A numeric cell where blank is allowed and text is a schema error
    pub fn optional_number(&self, row: usize, col: usize) -> Result<Option<f64>, CostError> {
        match self.cell(row, col) {
            Numeric::Value(v) => Ok(Some(v)),
            Numeric::Blank => Ok(None),
            Numeric::Invalid(value) => Err(CostError::InvalidCell {
                sheet: self.name.clone(),
                // 1-based, counting the header line
                row: row + 2,
                column: self.headers.get(col).cloned().unwrap_or_default(),
                value,
            }),
        }
    }

    /// First-row constant of a named column; blank reads as 0.0
    pub fn first_row_number(&self, column: &str) -> Result<f64, CostError> {
        let col = self.column(column)?;
        if self.is_empty() {
            return Err(CostError::EmptySheet {
                sheet: self.name.clone(),
            });
        }
        Ok(self.optional_number(0, col)?.unwrap_or(0.0))
    }
}

/// A readable workbook
pub trait TabularSource {
    /// Human-readable name used in error messages
    fn source_name(&self) -> String;

    /// Sheet names in workbook order
    fn sheet_names(&self) -> Result<Vec<String>, CostError>;

    /// Load one sheet by name
    fn load_sheet(&self, sheet: &str) -> Result<Sheet, CostError>;
}

/// A writable workbook
pub trait TabularSink {
    fn write_sheet(&mut self, sheet: &Sheet) -> Result<(), CostError>;
}

/// Sheets kept in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    name: String,
    sheets: Vec<Sheet>,
}

impl MemoryWorkbook {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sheets: Vec::new(),
        }
    }

    pub fn with_sheet(mut self, sheet: Sheet) -> Self {
        self.insert(sheet);
        self
    }

    /// Add or replace a sheet, keeping the original position on replace
    pub fn insert(&mut self, sheet: Sheet) {
        if let Some(existing) = self.sheets.iter_mut().find(|s| s.name == sheet.name) {
            *existing = sheet;
        } else {
            self.sheets.push(sheet);
        }
    }
}

impl TabularSource for MemoryWorkbook {
    fn source_name(&self) -> String {
        self.name.clone()
    }

    fn sheet_names(&self) -> Result<Vec<String>, CostError> {
        Ok(self.sheets.iter().map(|s| s.name.clone()).collect())
    }

    fn load_sheet(&self, sheet: &str) -> Result<Sheet, CostError> {
        self.sheets
            .iter()
            .find(|s| s.name == sheet)
            .cloned()
            .ok_or_else(|| CostError::SheetNotFound {
                source_name: self.name.clone(),
                sheet: sheet.to_string(),
            })
    }
}

impl TabularSink for MemoryWorkbook {
    fn write_sheet(&mut self, sheet: &Sheet) -> Result<(), CostError> {
        self.insert(sheet.clone());
        Ok(())
    }
}

/// A workbook stored as CSV: a directory of `<sheet>.csv` files, or one file
#[derive(Debug, Clone)]
pub struct CsvWorkbook {
    path: PathBuf,
}

impl CsvWorkbook {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_single_file(&self) -> bool {
        self.path.is_file()
    }

    fn single_sheet_name(&self) -> String {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Sheet1")
            .to_string()
    }

    fn read_error(&self, message: impl ToString) -> CostError {
        CostError::SourceRead {
            source_name: self.path.display().to_string(),
            message: message.to_string(),
        }
    }

    fn read_csv(&self, file: &Path, sheet: &str) -> Result<Sheet, CostError> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(file)
            .map_err(|e| self.read_error(e))?;

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| self.read_error(e))?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record: StringRecord = result.map_err(|e| self.read_error(e))?;
            // Spreadsheet exports often carry fully blank trailing lines
            if record.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }

        tracing::debug!(sheet, rows = rows.len(), file = %file.display(), "loaded sheet");
        Ok(Sheet::new(sheet, headers, rows))
    }
}

/// A sheet name usable as a file name inside the workbook directory
fn check_sheet_name(sheet: &str) -> Result<(), CostError> {
    let trimmed = sheet.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." || sheet.contains(['/', '\\']) {
        return Err(CostError::InvalidSheetName {
            sheet: sheet.to_string(),
        });
    }
    Ok(())
}

impl TabularSource for CsvWorkbook {
    fn source_name(&self) -> String {
        self.path.display().to_string()
    }

    fn sheet_names(&self) -> Result<Vec<String>, CostError> {
        if self.is_single_file() {
            return Ok(vec![self.single_sheet_name()]);
        }
        if !self.path.is_dir() {
            return Err(self.read_error("no such file or directory"));
        }

        let mut names: Vec<String> = fs::read_dir(&self.path)
            .map_err(|e| self.read_error(e))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.extension().map_or(false, |e| e.eq_ignore_ascii_case("csv")))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        names.sort();
        Ok(names)
    }

    fn load_sheet(&self, sheet: &str) -> Result<Sheet, CostError> {
        if self.is_single_file() {
            // A lone CSV holds exactly one sheet, whatever it is called
            return self.read_csv(&self.path, sheet);
        }
        check_sheet_name(sheet)?;
        if !self.path.is_dir() {
            return Err(self.read_error("no such file or directory"));
        }

        let file = self.path.join(format!("{}.csv", sheet));
        if !file.is_file() {
            return Err(CostError::SheetNotFound {
                source_name: self.source_name(),
                sheet: sheet.to_string(),
            });
        }
        self.read_csv(&file, sheet)
    }
}

impl TabularSink for CsvWorkbook {
    fn write_sheet(&mut self, sheet: &Sheet) -> Result<(), CostError> {
        check_sheet_name(&sheet.name)?;
        fs::create_dir_all(&self.path).map_err(|e| self.read_error(e))?;
        let file = self.path.join(format!("{}.csv", sheet.name));

        let mut wtr = WriterBuilder::new()
            .flexible(true)
            .from_path(&file)
            .map_err(|e| self.read_error(e))?;
        wtr.write_record(&sheet.headers)
            .map_err(|e| self.read_error(e))?;
        for row in &sheet.rows {
            wtr.write_record(row).map_err(|e| self.read_error(e))?;
        }
        wtr.flush().map_err(|e| self.read_error(e))?;

        tracing::debug!(sheet = %sheet.name, file = %file.display(), "wrote sheet");
        Ok(())
    }
}
