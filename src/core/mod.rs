//! Core module - inputs, numbers and errors shared by the engines

pub mod config;
pub mod error;
pub mod numeric;
pub mod params;
pub mod session;
pub mod source;

pub use config::{Config, CostConstants};
pub use error::{CostError, Warning};
pub use session::{compute_cost_summary, CostReport, SessionFile, SessionInputs};
pub use source::{CsvWorkbook, MemoryWorkbook, Sheet, TabularSink, TabularSource};
