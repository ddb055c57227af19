//! Process cost engine - value-added machine, batch setup and labor cost per stage

use serde::{Deserialize, Serialize};

use crate::core::error::CostError;
use crate::core::source::Sheet;
use crate::engine::rates::{MachineRate, RateContext};

/// Column names of a process-mapping sheet
pub mod columns {
    pub const STAGE: &str = "Stage";
    /// Accepted in place of `Stage`
    pub const PROCESS_NAME: &str = "Process Name";
    pub const PROCESS_CYCLE_TIME: &str = "Process Cycle Time";
    pub const BATCH_SETUP_TIME: &str = "Batch Set up Time";
    pub const DL_FTE: &str = "DL FTE";
    pub const IDL_FTE: &str = "IDL FTE";
    pub const FTE_FOR_BATCH_SETUP: &str = "FTE for Batch Set up";

    pub const NUMERIC: &[&str] = &[
        PROCESS_CYCLE_TIME,
        BATCH_SETUP_TIME,
        DL_FTE,
        IDL_FTE,
        FTE_FOR_BATCH_SETUP,
    ];
}

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Product development stage the mapping is costed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DevelopmentStage {
    #[serde(rename = "MK0")]
    Mk0,
    #[serde(rename = "MK1")]
    Mk1,
    #[serde(rename = "MK2")]
    Mk2,
    #[serde(rename = "MK3")]
    Mk3,
    #[serde(rename = "X1")]
    X1,
    #[serde(rename = "X1.1")]
    X1_1,
    #[serde(rename = "X1.2")]
    X1_2,
}

impl DevelopmentStage {
    pub const ALL: [DevelopmentStage; 7] = [
        DevelopmentStage::Mk0,
        DevelopmentStage::Mk1,
        DevelopmentStage::Mk2,
        DevelopmentStage::Mk3,
        DevelopmentStage::X1,
        DevelopmentStage::X1_1,
        DevelopmentStage::X1_2,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DevelopmentStage::Mk0 => "MK0",
            DevelopmentStage::Mk1 => "MK1",
            DevelopmentStage::Mk2 => "MK2",
            DevelopmentStage::Mk3 => "MK3",
            DevelopmentStage::X1 => "X1",
            DevelopmentStage::X1_1 => "X1.1",
            DevelopmentStage::X1_2 => "X1.2",
        }
    }
}

impl std::fmt::Display for DevelopmentStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DevelopmentStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DevelopmentStage::ALL
            .iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| {
                format!(
                    "Invalid development stage: {}. Use MK0, MK1, MK2, MK3, X1, X1.1 or X1.2",
                    s
                )
            })
    }
}

/// One row of the process mapping; blank numeric cells are `None`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessStage {
    pub stage_name: String,
    /// Seconds per board
    pub process_cycle_time: Option<f64>,
    /// Seconds per batch
    pub batch_setup_time: Option<f64>,
    pub dl_fte: Option<f64>,
    pub idl_fte: Option<f64>,
    pub fte_for_batch_setup: Option<f64>,
}

impl ProcessStage {
    pub fn new(stage_name: impl Into<String>) -> Self {
        Self {
            stage_name: stage_name.into(),
            process_cycle_time: None,
            batch_setup_time: None,
            dl_fte: None,
            idl_fte: None,
            fte_for_batch_setup: None,
        }
    }
}

/// Read a process-mapping sheet
pub fn load_process_stages(sheet: &Sheet) -> Result<Vec<ProcessStage>, CostError> {
    let stage_col = if sheet.has_column(columns::STAGE) {
        sheet.column(columns::STAGE)?
    } else {
        sheet.column(columns::PROCESS_NAME).map_err(|_| CostError::MissingColumn {
            sheet: sheet.name.clone(),
            column: columns::STAGE.to_string(),
        })?
    };
    sheet.require_columns(columns::NUMERIC)?;

    let ct = sheet.column(columns::PROCESS_CYCLE_TIME)?;
    let bst = sheet.column(columns::BATCH_SETUP_TIME)?;
    let dl = sheet.column(columns::DL_FTE)?;
    let idl = sheet.column(columns::IDL_FTE)?;
    let setup_fte = sheet.column(columns::FTE_FOR_BATCH_SETUP)?;

    (0..sheet.row_count())
        .map(|row| {
            Ok(ProcessStage {
                stage_name: sheet.text(row, stage_col).to_string(),
                process_cycle_time: sheet.optional_number(row, ct)?,
                batch_setup_time: sheet.optional_number(row, bst)?,
                dl_fte: sheet.optional_number(row, dl)?,
                idl_fte: sheet.optional_number(row, idl)?,
                fte_for_batch_setup: sheet.optional_number(row, setup_fte)?,
            })
        })
        .collect()
}

/// Rates and factors the per-stage formulas need
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessCostFactors {
    pub labor_cost_per_hour: f64,
    pub idle_cost_per_hour: f64,
    pub labor_burden: f64,
    /// Never zero; see `ProductVolumeParams::batch_qty`
    pub batch_qty: f64,
}

impl ProcessCostFactors {
    pub fn new(rates: &RateContext, labor_burden: f64, batch_qty: f64) -> Self {
        Self {
            labor_cost_per_hour: rates.labor_cost_per_hour,
            idle_cost_per_hour: rates.idle_cost_per_hour,
            labor_burden,
            batch_qty,
        }
    }

    /// Burdened cost of `seconds` at an hourly rate
    fn burdened(&self, seconds: f64, rate_per_hour: f64) -> f64 {
        ((seconds * rate_per_hour) / SECONDS_PER_HOUR) * self.labor_burden
    }

    pub fn va_machine_cost(&self, stage: &ProcessStage, mmr: f64) -> f64 {
        stage.process_cycle_time.map_or(0.0, |ct| ct * mmr)
    }

    pub fn batch_setup_cost(&self, stage: &ProcessStage) -> f64 {
        match (stage.batch_setup_time, stage.fte_for_batch_setup) {
            (Some(bst), Some(fte)) => {
                (self.burdened(bst, self.labor_cost_per_hour) / self.batch_qty) * fte
            }
            _ => 0.0,
        }
    }

    /// Direct plus indirect labor; 0 if any operand is blank
    pub fn labor_cost(&self, stage: &ProcessStage) -> f64 {
        match (stage.process_cycle_time, stage.dl_fte, stage.idl_fte) {
            (Some(ct), Some(dl), Some(idl)) => {
                self.burdened(ct, self.labor_cost_per_hour) * dl
                    + self.burdened(ct, self.idle_cost_per_hour) * idl
            }
            _ => 0.0,
        }
    }
}

/// Costs of one stage after the machine-rate join
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageCost {
    pub stage: ProcessStage,
    /// Joined machine minute rate; 0 when the stage has no rate row
    pub mmr: f64,
    pub rate_matched: bool,
    pub va_machine_cost: f64,
    pub batch_setup_cost: f64,
    pub labor_cost: f64,
}

/// Column sums across all stages
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ManufacturingTotals {
    pub va_machine: f64,
    pub batch_setup: f64,
    pub labor: f64,
}

impl ManufacturingTotals {
    pub fn total(&self) -> f64 {
        self.batch_setup + self.va_machine + self.labor
    }
}

/// Per-stage costs and their totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessCosting {
    pub sheet: String,
    pub batch_qty: f64,
    pub stages: Vec<StageCost>,
    pub totals: ManufacturingTotals,
}

/// Left-join stages against machine rates by exact name; first rate row wins
fn find_rate<'a>(rates: &'a [MachineRate], stage_name: &str) -> Option<&'a MachineRate> {
    rates.iter().find(|r| r.process_name == stage_name)
}

pub fn compute_process_costs(
    sheet: &str,
    stages: &[ProcessStage],
    machine_rates: &[MachineRate],
    factors: &ProcessCostFactors,
) -> ProcessCosting {
    let mut totals = ManufacturingTotals::default();

    let stages: Vec<StageCost> = stages
        .iter()
        .map(|stage| {
            let rate = find_rate(machine_rates, &stage.stage_name);
            let mmr = rate.map_or(0.0, |r| r.mmr);
            let cost = StageCost {
                stage: stage.clone(),
                mmr,
                rate_matched: rate.is_some(),
                va_machine_cost: factors.va_machine_cost(stage, mmr),
                batch_setup_cost: factors.batch_setup_cost(stage),
                labor_cost: factors.labor_cost(stage),
            };
            totals.va_machine += cost.va_machine_cost;
            totals.batch_setup += cost.batch_setup_cost;
            totals.labor += cost.labor_cost;
            cost
        })
        .collect();

    let unmatched = stages.iter().filter(|s| !s.rate_matched).count();
    if unmatched > 0 {
        tracing::debug!(unmatched, "stages without a machine rate costed at MMR 0");
    }
    tracing::debug!(
        sheet,
        stages = stages.len(),
        va_machine = totals.va_machine,
        batch_setup = totals.batch_setup,
        labor = totals.labor,
        "process costs computed"
    );

    ProcessCosting {
        sheet: sheet.to_string(),
        batch_qty: factors.batch_qty,
        stages,
        totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn factors(batch_qty: f64) -> ProcessCostFactors {
        ProcessCostFactors {
            labor_cost_per_hour: 360.0,
            idle_cost_per_hour: 180.0,
            labor_burden: 1.15,
            batch_qty,
        }
    }

    fn smt() -> ProcessStage {
        ProcessStage {
            stage_name: "SMT".to_string(),
            process_cycle_time: Some(60.0),
            batch_setup_time: Some(1800.0),
            dl_fte: Some(1.0),
            idl_fte: Some(0.5),
            fte_for_batch_setup: Some(2.0),
        }
    }

    fn rates() -> Vec<MachineRate> {
        vec![
            MachineRate {
                process_name: "SMT".to_string(),
                mmr: 0.25,
            },
            MachineRate {
                process_name: "SMT".to_string(),
                mmr: 99.0,
            },
        ]
    }

    #[test]
    fn test_stage_formulas() {
        let f = factors(100.0);
        let stage = smt();
        assert!(close(f.va_machine_cost(&stage, 0.25), 15.0));
        // ((1800 * 360 / 3600) * 1.15 / 100) * 2 = 4.14
        assert!(close(f.batch_setup_cost(&stage), 4.14));
        // (60*360/3600)*1.15*1 + (60*180/3600)*1.15*0.5 = 6.9 + 1.725
        assert!(close(f.labor_cost(&stage), 8.625));
    }

    #[test]
    fn test_blank_operands_give_zero() {
        let f = factors(100.0);
        let mut stage = ProcessStage::new("Manual");
        assert_eq!(f.va_machine_cost(&stage, 2.0), 0.0);
        assert_eq!(f.batch_setup_cost(&stage), 0.0);
        stage.process_cycle_time = Some(60.0);
        stage.dl_fte = Some(1.0);
        // IDL FTE still blank
        assert_eq!(f.labor_cost(&stage), 0.0);
    }

    #[test]
    fn test_left_join_keeps_unmatched_stage() {
        let stages = vec![
            smt(),
            ProcessStage {
                stage_name: "Conformal Coat".to_string(),
                ..smt()
            },
        ];
        let costing = compute_process_costs("Line A", &stages, &rates(), &factors(100.0));

        assert_eq!(costing.stages.len(), 2);
        // First rate row wins
        assert_eq!(costing.stages[0].mmr, 0.25);
        assert!(costing.stages[0].rate_matched);
        assert_eq!(costing.stages[1].mmr, 0.0);
        assert!(!costing.stages[1].rate_matched);
        assert_eq!(costing.stages[1].va_machine_cost, 0.0);

        assert!(close(costing.totals.va_machine, 15.0));
        assert!(close(costing.totals.batch_setup, 8.28));
        assert!(close(costing.totals.labor, 17.25));
        assert!(close(costing.totals.total(), 40.53));
    }

    #[test]
    fn test_batch_qty_of_one() {
        let f = factors(1.0);
        assert!(close(f.batch_setup_cost(&smt()), 414.0));
    }

    #[test]
    fn test_load_stages_with_process_name_key() {
        let sheet = Sheet::from_rows(
            "Line A",
            &[
                "Process Name",
                "Process Cycle Time",
                "Batch Set up Time",
                "DL FTE",
                "IDL FTE",
                "FTE for Batch Set up",
            ],
            &[&["SMT", "60", "1800", "1", "0.5", "2"], &["AOI", "20", "", "1", "", ""]],
        );
        let stages = load_process_stages(&sheet).unwrap();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0], smt());
        assert_eq!(stages[1].batch_setup_time, None);
    }

    #[test]
    fn test_load_stages_requires_key_column() {
        let sheet = Sheet::from_rows("Line A", &["Process Cycle Time"], &[]);
        let err = load_process_stages(&sheet).unwrap_err();
        assert_eq!(
            err,
            CostError::MissingColumn {
                sheet: "Line A".to_string(),
                column: "Stage".to_string()
            }
        );
    }

    #[test]
    fn test_development_stage_parse() {
        assert_eq!("mk1".parse::<DevelopmentStage>().unwrap(), DevelopmentStage::Mk1);
        assert_eq!("X1.2".parse::<DevelopmentStage>().unwrap(), DevelopmentStage::X1_2);
        assert!("MK9".parse::<DevelopmentStage>().is_err());
        assert_eq!(DevelopmentStage::X1_1.to_string(), "X1.1");
    }
}
