//! `pcbcost process` command - Process cost per stage

use console::style;
use miette::Result;

use crate::cli::helpers::{
    compute_report, effective_format, format_money, load_session, print_structured,
    require_block,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::source::{CsvWorkbook, TabularSource};
use crate::engine::ohp::SUMMARY_CURRENCY;
use crate::engine::process::StageCost;

#[derive(clap::Args, Debug)]
pub struct ProcessArgs {
    /// List the sheets of the process-mapping workbook and exit
    #[arg(long)]
    pub sheets: bool,

    /// Cost this sheet instead of the session's process_sheet
    #[arg(long)]
    pub sheet: Option<String>,
}

const STAGE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("stage", "STAGE", 28),
    ColumnDef::new("cycle", "CYCLE (s)", 10),
    ColumnDef::new("mmr", "MMR", 10),
    ColumnDef::new("rate", "RATE", 9),
    ColumnDef::new("va_machine", "VA MACHINE", 12),
    ColumnDef::new("batch_setup", "BATCH SETUP", 12),
    ColumnDef::new("labor", "LABOR", 12),
];

fn stage_row(cost: &StageCost) -> TableRow {
    TableRow::new()
        .cell("stage", CellValue::Text(cost.stage.stage_name.clone()))
        .cell("cycle", CellValue::Float(cost.stage.process_cycle_time, 1))
        .cell("mmr", CellValue::Float(Some(cost.mmr), 4))
        .cell("rate", CellValue::Matched(cost.rate_matched))
        .cell(
            "va_machine",
            CellValue::Money(Some(cost.va_machine_cost), SUMMARY_CURRENCY),
        )
        .cell(
            "batch_setup",
            CellValue::Money(Some(cost.batch_setup_cost), SUMMARY_CURRENCY),
        )
        .cell("labor", CellValue::Money(Some(cost.labor_cost), SUMMARY_CURRENCY))
}

pub fn run(args: ProcessArgs, global: &GlobalOpts) -> Result<()> {
    let (_, mut session) = load_session(global)?;

    if args.sheets {
        let path = session
            .process_mapping_path()
            .ok_or_else(|| miette::miette!("no process_mapping set in the session"))?;
        for name in CsvWorkbook::open(path).sheet_names()? {
            println!("{}", name);
        }
        return Ok(());
    }

    if let Some(sheet) = args.sheet {
        session.process_sheet = Some(sheet);
    }
    let (_, report) = compute_report(global, &session);
    let costing = require_block(&report.process)?;

    let format = effective_format(global, OutputFormat::Tsv);
    if print_structured(costing, format)? {
        return Ok(());
    }

    let rows: Vec<TableRow> = costing.stages.iter().map(stage_row).collect();
    let formatter = TableFormatter::new(STAGE_COLUMNS, "stage");
    if format != OutputFormat::Tsv {
        formatter.without_summary().output(&rows, format);
        return Ok(());
    }

    if let Some(stage) = report.stage {
        println!(
            "{} {} ({})",
            style("Process mapping").bold(),
            style(&costing.sheet).cyan(),
            stage
        );
    } else {
        println!("{} {}", style("Process mapping").bold(), style(&costing.sheet).cyan());
    }
    println!();
    formatter.output(&rows, format);

    let totals = &costing.totals;
    println!();
    println!("{}: {}", style("Batch Qty").bold(), costing.batch_qty);
    println!(
        "{}: {}",
        style("VA Machine Cost").bold(),
        format_money(totals.va_machine, SUMMARY_CURRENCY)
    );
    println!(
        "{}: {}",
        style("Batch Setup Cost").bold(),
        format_money(totals.batch_setup, SUMMARY_CURRENCY)
    );
    println!(
        "{}: {}",
        style("Labor Cost").bold(),
        format_money(totals.labor, SUMMARY_CURRENCY)
    );
    println!(
        "{}: {}",
        style("Manufacturing Cost").bold(),
        style(format_money(totals.total(), SUMMARY_CURRENCY)).cyan()
    );
    Ok(())
}
