//! `pcbcost rates` command - Shift pattern, labor rates and machine rates

use console::style;
use miette::Result;
use serde::Serialize;

use crate::cli::helpers::{
    compute_report, effective_format, load_session, print_structured, require_block,
};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::engine::rates::{load_machine_rates, MachineRate, RateContext};

#[derive(clap::Args, Debug)]
pub struct RatesArgs {
    /// Only list machine minute rates
    #[arg(long)]
    pub mmr: bool,
}

const MMR_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("process", "PROCESS", 32),
    ColumnDef::new("mmr", "MMR", 12),
];

#[derive(Serialize)]
struct RatesOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a RateContext>,
    machine_rates: &'a [MachineRate],
}

pub fn run(args: RatesArgs, global: &GlobalOpts) -> Result<()> {
    let (_, session) = load_session(global)?;
    let (inputs, report) = compute_report(global, &session);

    let machine_rates = load_machine_rates(require_block(&inputs.mmr)?)?;
    let context = if args.mmr {
        None
    } else {
        Some(require_block(&report.rates)?)
    };

    let format = effective_format(global, OutputFormat::Tsv);
    let output = RatesOutput {
        context,
        machine_rates: &machine_rates,
    };
    if print_structured(&output, format)? {
        return Ok(());
    }

    if let Some(ctx) = context {
        if format == OutputFormat::Tsv {
            print_context(ctx);
            println!();
        }
    }

    let rows: Vec<TableRow> = machine_rates
        .iter()
        .map(|r| {
            TableRow::new()
                .cell("process", CellValue::Text(r.process_name.clone()))
                .cell("mmr", CellValue::Float(Some(r.mmr), 4))
        })
        .collect();
    let formatter = TableFormatter::new(MMR_COLUMNS, "machine rate");
    if global.quiet {
        formatter.without_summary().output(&rows, format);
    } else {
        formatter.output(&rows, format);
    }
    Ok(())
}

fn print_context(ctx: &RateContext) {
    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("Shift Hr/day").bold(), ctx.shift_hours_per_day);
    println!("{}: {}", style("Days/Week").bold(), ctx.days_per_week);
    println!("{}: {}", style("Weeks/Year").bold(), ctx.weeks_per_year);
    println!(
        "{}: {}",
        style("Hours/Year (1 shift)").bold(),
        style(ctx.hours_per_year_per_shift()).cyan()
    );
    println!(
        "{}: {}",
        style("Overall Labor Efficiency").bold(),
        ctx.overall_labor_efficiency
    );
    println!("{}: {}", style("Labour cost/Hr").bold(), ctx.labor_cost_per_hour);
    println!("{}: {}", style("Idl Cost/Hr").bold(), ctx.idle_cost_per_hour);
    println!("{}", style("─".repeat(60)).dim());
}
