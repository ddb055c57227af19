//! Rate tables: shift pattern, labor rates and machine minute rates

use serde::Serialize;

use crate::core::error::CostError;
use crate::core::source::Sheet;

/// Column names of the rate workbook sheets
pub mod columns {
    pub const SHIFT_HOURS_PER_DAY: &str = "Shift Hr/day";
    pub const DAYS_PER_WEEK: &str = "Days/Week";
    pub const WEEKS_PER_YEAR: &str = "Weeks/Year";
    pub const OVERALL_LABOR_EFFICIENCY: &str = "Overall Labor Efficiency";

    pub const LABOUR_COST_PER_HOUR: &str = "Labour cost/Hr";
    pub const IDLE_COST_PER_HOUR: &str = "Idl Cost/Hr";

    pub const PROCESS_NAME: &str = "Process Name";
    pub const MMR: &str = "MMR";

    pub const PROCESS_CT: &[&str] = &[
        SHIFT_HOURS_PER_DAY,
        DAYS_PER_WEEK,
        WEEKS_PER_YEAR,
        OVERALL_LABOR_EFFICIENCY,
    ];
    pub const ASSUMPTIONS: &[&str] = &[LABOUR_COST_PER_HOUR, IDLE_COST_PER_HOUR];
    pub const MMR_EMS: &[&str] = &[PROCESS_NAME, MMR];
}

/// Shift and labor constants, read once per session
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RateContext {
    pub shift_hours_per_day: f64,
    pub days_per_week: f64,
    pub weeks_per_year: f64,
    pub overall_labor_efficiency: f64,
    pub labor_cost_per_hour: f64,
    pub idle_cost_per_hour: f64,
}

impl RateContext {
    /// Read the first row of `Process_CT` and `Assumptions`
    pub fn from_sheets(process_ct: &Sheet, assumptions: &Sheet) -> Result<Self, CostError> {
        process_ct.require_columns(columns::PROCESS_CT)?;
        assumptions.require_columns(columns::ASSUMPTIONS)?;

        let ctx = Self {
            shift_hours_per_day: process_ct.first_row_number(columns::SHIFT_HOURS_PER_DAY)?,
            days_per_week: process_ct.first_row_number(columns::DAYS_PER_WEEK)?,
            weeks_per_year: process_ct.first_row_number(columns::WEEKS_PER_YEAR)?,
            overall_labor_efficiency: process_ct
                .first_row_number(columns::OVERALL_LABOR_EFFICIENCY)?,
            labor_cost_per_hour: assumptions.first_row_number(columns::LABOUR_COST_PER_HOUR)?,
            idle_cost_per_hour: assumptions.first_row_number(columns::IDLE_COST_PER_HOUR)?,
        };

        tracing::debug!(
            hours_per_year = ctx.hours_per_year_per_shift(),
            labor = ctx.labor_cost_per_hour,
            idle = ctx.idle_cost_per_hour,
            "rate context loaded"
        );
        Ok(ctx)
    }

    /// Working hours per year for one shift
    pub fn hours_per_year_per_shift(&self) -> f64 {
        self.shift_hours_per_day * self.days_per_week * self.weeks_per_year
    }
}

/// Machine minute rate of one process
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineRate {
    pub process_name: String,
    pub mmr: f64,
}

/// Read the `MMR-EMS` sheet; a blank MMR cell is 0
pub fn load_machine_rates(sheet: &Sheet) -> Result<Vec<MachineRate>, CostError> {
    sheet.require_columns(columns::MMR_EMS)?;
    let name_col = sheet.column(columns::PROCESS_NAME)?;
    let mmr_col = sheet.column(columns::MMR)?;

    let mut rates = Vec::with_capacity(sheet.row_count());
    for row in 0..sheet.row_count() {
        let process_name = sheet.text(row, name_col);
        if process_name.is_empty() {
            continue;
        }
        rates.push(MachineRate {
            process_name: process_name.to_string(),
            mmr: sheet.optional_number(row, mmr_col)?.unwrap_or(0.0),
        });
    }
    Ok(rates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::source::sheets;

    fn process_ct(shift: &str, days: &str, weeks: &str) -> Sheet {
        Sheet::from_rows(
            sheets::PROCESS_CT,
            columns::PROCESS_CT,
            &[&[shift, days, weeks, "0.85"]],
        )
    }

    fn assumptions() -> Sheet {
        Sheet::from_rows(sheets::ASSUMPTIONS, columns::ASSUMPTIONS, &[&["360", "180"]])
    }

    #[test]
    fn test_hours_per_year() {
        let ctx = RateContext::from_sheets(&process_ct("8", "5", "50"), &assumptions()).unwrap();
        assert_eq!(ctx.hours_per_year_per_shift(), 2000.0);
        assert_eq!(ctx.overall_labor_efficiency, 0.85);
        assert_eq!(ctx.labor_cost_per_hour, 360.0);
        assert_eq!(ctx.idle_cost_per_hour, 180.0);
    }

    #[test]
    fn test_missing_assumption_column() {
        let assumptions = Sheet::from_rows(sheets::ASSUMPTIONS, &["Labour cost/Hr"], &[&["360"]]);
        let err = RateContext::from_sheets(&process_ct("8", "5", "50"), &assumptions).unwrap_err();
        assert_eq!(
            err,
            CostError::MissingColumn {
                sheet: "Assumptions".to_string(),
                column: "Idl Cost/Hr".to_string()
            }
        );
    }

    #[test]
    fn test_blank_constant_reads_as_zero() {
        let ctx = RateContext::from_sheets(&process_ct("8", "", "50"), &assumptions()).unwrap();
        assert_eq!(ctx.hours_per_year_per_shift(), 0.0);
    }

    #[test]
    fn test_machine_rates() {
        let sheet = Sheet::from_rows(
            sheets::MMR_EMS,
            &["Process Name", "MMR"],
            &[&["SMT", "0.75"], &["Wave", ""], &["", "9"]],
        );
        let rates = load_machine_rates(&sheet).unwrap();
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].mmr, 0.75);
        assert_eq!(rates[1].mmr, 0.0);
    }

    #[test]
    fn test_machine_rates_without_mmr_column() {
        let sheet = Sheet::from_rows(sheets::MMR_EMS, &["Process Name"], &[&["SMT"]]);
        assert!(load_machine_rates(&sheet).unwrap_err().is_schema_error());
    }
}
