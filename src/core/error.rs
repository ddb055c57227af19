//! Error and warning types shared by the cost engines
//!
//! Errors are fatal for the formula block that raised them; sibling blocks keep
//! computing. Warnings are recovered conditions that are reported alongside the
//! result and never abort a pass.

use miette::Diagnostic;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::core::numeric::Currency;

/// Errors raised while reading tables or evaluating a formula block
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum CostError {
    #[error("cannot read tabular source {source_name}: {message}")]
    #[diagnostic(
        code(pcbcost::source::read),
        help("check that the workbook path exists and holds readable CSV files")
    )]
    SourceRead {
        source_name: String,
        message: String,
    },

    #[error("sheet '{sheet}' not found in {source_name}")]
    #[diagnostic(
        code(pcbcost::source::sheet_not_found),
        help("a CSV workbook stores each sheet as <sheet>.csv; `pcbcost template` prints the expected layouts")
    )]
    SheetNotFound { source_name: String, sheet: String },

    #[error("'{sheet}' is not a valid sheet name")]
    #[diagnostic(
        code(pcbcost::source::invalid_sheet_name),
        help("sheet names become file names; leave out '/', '\\' and '..'")
    )]
    InvalidSheetName { sheet: String },

    #[error("sheet '{sheet}' has no data rows")]
    #[diagnostic(code(pcbcost::source::empty_sheet))]
    EmptySheet { sheet: String },

    #[error("'{column}' column not found in '{sheet}' sheet")]
    #[diagnostic(
        code(pcbcost::schema::missing_column),
        help("please check the input file; headers are matched case-insensitively")
    )]
    MissingColumn { sheet: String, column: String },

    #[error("'{value}' is not a number ({sheet} row {row}, column '{column}')")]
    #[diagnostic(code(pcbcost::schema::invalid_cell))]
    InvalidCell {
        sheet: String,
        row: usize,
        column: String,
        value: String,
    },

    #[error("invalid session: {0}")]
    #[diagnostic(code(pcbcost::session))]
    Session(String),
}

impl CostError {
    /// Whether the error comes from a required column being absent
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            CostError::MissingColumn { .. } | CostError::InvalidCell { .. }
        )
    }
}

/// Recovered conditions surfaced to the caller next to the computed values
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A user-entered field was not numeric and was replaced by 0.0
    InvalidNumber { field: String, raw: String },
    /// An NRE item was added twice; the selection was left unchanged
    DuplicateSelection { item: String },
    /// A persisted NRE item name no longer exists in the catalog
    UnknownNreItem { item: String },
    /// A total folded amounts carrying different currency tags
    CurrencyMix {
        total: String,
        currencies: Vec<Currency>,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::InvalidNumber { field, raw } => write!(
                f,
                "Invalid input for '{}' ('{}'). Please enter a number; using 0.0",
                field, raw
            ),
            Warning::DuplicateSelection { item } => {
                write!(f, "Record '{}' already exists in the NRE table", item)
            }
            Warning::UnknownNreItem { item } => {
                write!(f, "NRE item '{}' is not in the catalog; skipped", item)
            }
            Warning::CurrencyMix { total, currencies } => {
                let tags: Vec<String> = currencies.iter().map(|c| c.symbol().to_string()).collect();
                write!(f, "{} mixes currencies ({})", total, tags.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_classification() {
        let err = CostError::MissingColumn {
            sheet: "MMR-EMS".to_string(),
            column: "MMR".to_string(),
        };
        assert!(err.is_schema_error());
        assert_eq!(err.to_string(), "'MMR' column not found in 'MMR-EMS' sheet");

        let err = CostError::SheetNotFound {
            source_name: "db".to_string(),
            sheet: "NRE".to_string(),
        };
        assert!(!err.is_schema_error());
    }

    #[test]
    fn test_warning_display() {
        let w = Warning::CurrencyMix {
            total: "Material Cost".to_string(),
            currencies: vec![Currency::Usd, Currency::Inr],
        };
        assert_eq!(w.to_string(), "Material Cost mixes currencies ($, ₹)");

        let w = Warning::DuplicateSelection {
            item: "Stencil".to_string(),
        };
        assert!(w.to_string().contains("already exists"));
    }

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let w = Warning::InvalidNumber {
            field: "annual_volume".to_string(),
            raw: "abc".to_string(),
        };
        let json = serde_json::to_string(&w).unwrap();
        assert!(json.contains("\"kind\":\"invalid_number\""));
    }
}
