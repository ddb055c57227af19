//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::error::{CostError, Warning};
use crate::core::numeric::Currency;
use crate::core::session::{compute_cost_summary, CostReport, SessionFile, SessionInputs};

/// Truncate a string to max_len, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Format an amount with its currency symbol
pub fn format_money(value: f64, currency: Currency) -> String {
    format!("{}{:.2}", currency.symbol(), value)
}

/// Format an optional value, "-" when undefined
pub fn format_optional(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.prec$}", v, prec = precision))
        .unwrap_or_else(|| "-".to_string())
}

/// Resolve `auto` against the configured default, then the command's default
pub fn effective_format(global: &GlobalOpts, command_default: OutputFormat) -> OutputFormat {
    if global.format != OutputFormat::Auto {
        return global.format;
    }
    Config::load()
        .default_format
        .and_then(|f| OutputFormat::from_str(&f, true).ok())
        .filter(|f| *f != OutputFormat::Auto)
        .unwrap_or(command_default)
}

/// `--set` overrides as a map; later flags win
pub fn overrides(global: &GlobalOpts) -> BTreeMap<String, String> {
    global.set.iter().cloned().collect()
}

/// Load the session file named by `--session`
pub fn load_session(global: &GlobalOpts) -> Result<(PathBuf, SessionFile)> {
    let path = global.session.clone();
    if !path.exists() {
        return Err(miette::miette!(
            help = "run `pcbcost init` to create one",
            "session file {} not found",
            path.display()
        ));
    }
    let session = SessionFile::load(&path)?;
    Ok((path, session))
}

/// Read all tables for a session and run the full recomputation pass
pub fn compute_report(global: &GlobalOpts, session: &SessionFile) -> (SessionInputs, CostReport) {
    let config = Config::load();
    let inputs = SessionInputs::load(session, &overrides(global), config.constants);
    let report = compute_cost_summary(&inputs);
    (inputs, report)
}

/// Turn a failed block into a diagnostic for commands that need that block
pub fn require_block<T>(block: &std::result::Result<T, CostError>) -> Result<&T> {
    block.as_ref().map_err(|e| miette::Report::new(e.clone()))
}

/// Print recovered warnings to stderr
pub fn print_warnings(warnings: &[Warning], global: &GlobalOpts) {
    if global.quiet {
        return;
    }
    for warning in warnings {
        eprintln!("{} {}", style("!").yellow(), warning);
    }
}

/// Print structured output as JSON or YAML
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).into_diagnostic()?;
            println!("{}", json);
            Ok(true)
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(value).into_diagnostic()?;
            print!("{}", yaml);
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Write to a file, or stdout when no path is given
pub fn write_output(content: &str, output_path: Option<&Path>) -> Result<()> {
    match output_path {
        Some(path) => {
            let file = File::create(path).into_diagnostic()?;
            let mut writer = BufWriter::new(file);
            writer.write_all(content.as_bytes()).into_diagnostic()?;
            writer.flush().into_diagnostic()?;
            eprintln!(
                "{} Report written to {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
