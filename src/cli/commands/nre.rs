//! `pcbcost nre` command - NRE catalog, selection and export

use clap::Subcommand;
use console::style;
use miette::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::helpers::{
    compute_report, effective_format, format_money, format_optional, load_session,
    print_structured, print_warnings, require_block,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::error::Warning;
use crate::core::source::{CsvWorkbook, TabularSink};
use crate::engine::nre::{
    NreCatalog, NreExport, NreSelection, NreSelector, NreSummary, SelectedNreLine, NRE_CURRENCY,
};
use crate::engine::volume::ProductVolumeParams;

#[derive(Subcommand, Debug)]
pub enum NreCommands {
    /// List the NRE catalog of the rate workbook
    Catalog,

    /// List the selected NRE lines with totals
    List,

    /// Apportion one catalog item against the product volume without saving it
    Preview(PreviewArgs),

    /// Add catalog items to the session's selection
    Add(AddArgs),

    /// Write the selected lines and summary to a CSV workbook
    Export(ExportArgs),
}

#[derive(clap::Args, Debug)]
pub struct PreviewArgs {
    /// Catalog item name
    pub item: String,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Catalog item names
    #[arg(required = true)]
    pub items: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Workbook directory to write to
    pub path: PathBuf,

    /// Sheet name (file name inside the workbook)
    #[arg(long, default_value = "NRE Export")]
    pub sheet: String,
}

pub fn run(cmd: NreCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        NreCommands::Catalog => run_catalog(global),
        NreCommands::List => run_list(global),
        NreCommands::Preview(args) => run_preview(args, global),
        NreCommands::Add(args) => run_add(args, global),
        NreCommands::Export(args) => run_export(args, global),
    }
}

const CATALOG_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("item", "ITEM", 32),
    ColumnDef::new("unit_price", "UNIT PRICE", 16),
    ColumnDef::new("life_cycle", "LIFE CYCLE (BOARDS)", 20),
    ColumnDef::new("selected", "SELECTED", 10),
];

const LINE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("item", "ITEM", 32),
    ColumnDef::new("unit_price", "UNIT PRICE", 16),
    ColumnDef::new("life_cycle", "LIFE CYCLE (BOARDS)", 20),
    ColumnDef::new("qty", "QTY FOR LCV", 12),
    ColumnDef::new("extended", "EXTENDED PRICE", 16),
];

fn line_row(line: &SelectedNreLine) -> TableRow {
    TableRow::new()
        .cell("item", CellValue::Text(line.item.clone()))
        .cell("unit_price", CellValue::Money(line.unit_price, NRE_CURRENCY))
        .cell("life_cycle", CellValue::Float(line.life_cycle_boards, 0))
        .cell("qty", CellValue::Float(line.qty_for_lcv, 3))
        .cell("extended", CellValue::Money(line.extended_price, NRE_CURRENCY))
}

fn run_catalog(global: &GlobalOpts) -> Result<()> {
    let (_, session) = load_session(global)?;
    let (inputs, _) = compute_report(global, &session);
    let catalog = inputs.catalog()?;

    let format = effective_format(global, OutputFormat::Tsv);
    if print_structured(&catalog.items(), format)? {
        return Ok(());
    }

    let rows: Vec<TableRow> = catalog
        .items()
        .iter()
        .map(|item| {
            TableRow::new()
                .cell("item", CellValue::Text(item.item.clone()))
                .cell("unit_price", CellValue::Money(item.unit_price, NRE_CURRENCY))
                .cell("life_cycle", CellValue::Float(item.life_cycle_boards, 0))
                .cell(
                    "selected",
                    if session.nre_items.contains(&item.item) {
                        CellValue::Text("yes".to_string())
                    } else {
                        CellValue::Empty
                    },
                )
        })
        .collect();
    TableFormatter::new(CATALOG_COLUMNS, "catalog item").output(&rows, format);
    Ok(())
}

#[derive(Serialize)]
struct NreListOutput<'a> {
    volume: &'a ProductVolumeParams,
    product_volume: f64,
    summary: &'a NreSummary,
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let (_, session) = load_session(global)?;
    let (_, report) = compute_report(global, &session);
    let summary = require_block(&report.nre)?;

    let nre_warnings: Vec<Warning> = report
        .warnings
        .iter()
        .filter(|w| {
            matches!(
                w,
                Warning::DuplicateSelection { .. } | Warning::UnknownNreItem { .. }
            )
        })
        .cloned()
        .collect();
    print_warnings(&nre_warnings, global);

    let format = effective_format(global, OutputFormat::Tsv);
    let output = NreListOutput {
        volume: &report.volume,
        product_volume: report.product_volume,
        summary,
    };
    if print_structured(&output, format)? {
        return Ok(());
    }

    let rows: Vec<TableRow> = summary.lines.iter().map(line_row).collect();
    let formatter = TableFormatter::new(LINE_COLUMNS, "line");
    if format != OutputFormat::Tsv {
        formatter.without_summary().output(&rows, format);
        return Ok(());
    }
    formatter.output(&rows, format);

    println!();
    println!(
        "{}: {}",
        style("Product Volume").bold(),
        report.product_volume
    );
    println!(
        "{}: {}",
        style("Total Cost").bold(),
        format_money(summary.total_cost, summary.currency)
    );
    println!(
        "{} ({}): {}",
        style("Tool Maintenance").bold(),
        summary.tool_maintenance_rate,
        format_money(summary.tool_maintenance_cost, summary.currency)
    );
    println!(
        "{}: {}",
        style("Total Extended Price").bold(),
        format_money(summary.total_extended_price, summary.currency)
    );
    println!(
        "{}: {}",
        style("NRE Per Unit").bold(),
        style(format_money(summary.nre_per_unit, summary.currency)).cyan()
    );
    Ok(())
}

fn unknown_item(catalog: &NreCatalog, item: &str) -> miette::Report {
    let names: Vec<&str> = catalog.items().iter().map(|i| i.item.as_str()).collect();
    miette::miette!(
        help = format!("catalog items: {}", names.join(", ")),
        "NRE item '{}' is not in the catalog",
        item
    )
}

fn run_preview(args: PreviewArgs, global: &GlobalOpts) -> Result<()> {
    let (_, session) = load_session(global)?;
    let (inputs, report) = compute_report(global, &session);
    let catalog = inputs.catalog()?;

    let mut selector = NreSelector::new();
    let line = selector
        .select(&catalog, &args.item, report.product_volume)
        .cloned()
        .ok_or_else(|| unknown_item(&catalog, &args.item))?;

    let format = effective_format(global, OutputFormat::Tsv);
    if print_structured(&line, format)? {
        return Ok(());
    }

    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("Item").bold(), style(&line.item).yellow());
    println!(
        "{}: {}",
        style("Unit Price").bold(),
        line.unit_price
            .map(|p| format_money(p, NRE_CURRENCY))
            .unwrap_or_else(|| "-".to_string())
    );
    println!(
        "{}: {}",
        style("Life Cycle (Boards)").bold(),
        format_optional(line.life_cycle_boards, 0)
    );
    println!("{}: {}", style("Product Volume").bold(), report.product_volume);
    println!(
        "{}: {}",
        style("Qty for LCV").bold(),
        format_optional(line.qty_for_lcv, 3)
    );
    println!(
        "{}: {}",
        style("Extended Price").bold(),
        line.extended_price
            .map(|p| format_money(p, NRE_CURRENCY))
            .unwrap_or_else(|| "-".to_string())
    );
    println!("{}", style("─".repeat(60)).dim());

    if session.nre_items.contains(&line.item) {
        println!("{} Already in the selection", style("!").yellow());
    } else if !global.quiet {
        println!(
            "Use {} to save it",
            style(format!("pcbcost nre add \"{}\"", line.item)).yellow()
        );
    }
    selector.clear();
    Ok(())
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let (path, mut session) = load_session(global)?;
    let (inputs, report) = compute_report(global, &session);
    let catalog = inputs.catalog()?;

    let (mut selection, warnings) =
        NreSelection::from_names(&catalog, session.nre_items.as_slice(), report.product_volume);
    print_warnings(&warnings, global);

    let mut selector = NreSelector::new();
    let mut added = Vec::new();
    for item in &args.items {
        if selector
            .select(&catalog, item, report.product_volume)
            .is_none()
        {
            return Err(unknown_item(&catalog, item));
        }
        match selector.save(&mut selection) {
            Ok(true) => added.push(item.clone()),
            Ok(false) => {}
            Err(dup) => print_warnings(&[Warning::from(dup)], global),
        }
        selector.clear();
    }

    if added.is_empty() {
        return Ok(());
    }

    // Names missing from the catalog stay in the file; only new items are appended
    session.nre_items.extend(added.iter().cloned());
    session.save(&path)?;
    for item in &added {
        println!(
            "{} Added {} to {}",
            style("✓").green(),
            style(item).cyan(),
            style(path.display()).dim()
        );
    }
    Ok(())
}

fn run_export(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let (_, session) = load_session(global)?;
    let (_, report) = compute_report(global, &session);
    let summary = require_block(&report.nre)?;

    let export = NreExport::new(report.volume, summary.clone());
    let sheet = export.to_sheet(&args.sheet);
    let mut workbook = CsvWorkbook::open(&args.path);
    workbook.write_sheet(&sheet)?;

    println!(
        "{} Exported {} NRE line(s) to {}",
        style("✓").green(),
        style(summary.lines.len()).cyan(),
        style(args.path.join(format!("{}.csv", args.sheet)).display()).cyan()
    );
    Ok(())
}
