//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, consumables::ConsumablesArgs, estimate::EstimateArgs,
    init::InitArgs, nre::NreCommands, process::ProcessArgs, rates::RatesArgs,
    template::TemplateArgs,
};
use crate::core::params::parse_override;
use crate::core::session::SESSION_FILE;

#[derive(Parser)]
#[command(name = "pcbcost")]
#[command(author, version, about = "PCBA cost estimator")]
#[command(long_about = "Estimates the per-board cost of a printed circuit board assembly: NRE apportionment, process cost, consumables and overhead & profit, from CSV rate workbooks and a YAML session file.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Session file
    #[arg(long, short = 's', global = true, default_value = SESSION_FILE, env = "PCBCOST_SESSION")]
    pub session: PathBuf,

    /// Override a session parameter for this run (e.g. --set annual_volume=5000)
    #[arg(long = "set", global = true, value_name = "KEY=VALUE", value_parser = parse_override)]
    pub set: Vec<(String, String)>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new session file
    Init(InitArgs),

    /// Print the CSV layout of a workbook sheet
    Template(TemplateArgs),

    /// Show shift pattern, labor rates and machine rates
    Rates(RatesArgs),

    /// NRE catalog and selected line items
    #[command(subcommand)]
    Nre(NreCommands),

    /// Process cost per stage of the process mapping
    Process(ProcessArgs),

    /// Consumable cost per board (glue, solder paste, flux)
    Consumables(ConsumablesArgs),

    /// Full cost estimate with overhead & profit roll-up
    Estimate(EstimateArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (text report or aligned table)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-aligned text (for terminals)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
}
