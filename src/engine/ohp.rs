//! Overhead and profit roll-up into the final per-board cost summary

use serde::Serialize;

use crate::core::error::Warning;
use crate::core::numeric::{sum_amounts, Amount, Currency, Percent};
use crate::engine::process::ManufacturingTotals;

/// The summary is reported in dollars
pub const SUMMARY_CURRENCY: Currency = Currency::Usd;

/// Bought-in material per board ($)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MaterialCosts {
    pub pcb: f64,
    pub electronics: f64,
    pub mechanical: f64,
    pub direct_consumables: f64,
}

impl MaterialCosts {
    pub fn pcb_comp_mech(&self) -> f64 {
        self.pcb + self.electronics + self.mechanical
    }
}

/// The seven overhead and margin rates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OverheadRates {
    pub moh: Percent,
    pub foh: Percent,
    pub profit_on_rm: Percent,
    pub profit_on_va: Percent,
    pub rnd: Percent,
    pub warranty: Percent,
    pub sga: Percent,
}

/// Everything the roll-up consumes
///
/// Absent upstream blocks are passed as zero: `ManufacturingTotals::default()`
/// when the process table could not be costed, a zero NRE amount when no NRE
/// block was computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollupInputs {
    pub materials: MaterialCosts,
    pub nre_per_unit: Amount,
    pub consumables_per_board: Amount,
    pub manufacturing: ManufacturingTotals,
    pub rates: OverheadRates,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostSummary {
    pub pcb_comp_mech_cost: f64,
    pub nre_cost: f64,
    /// Direct consumables plus the consumable engine total
    pub consumables_cost: f64,
    pub material_cost: f64,
    pub manufacturing_cost: f64,
    pub moh_cost: f64,
    pub foh_cost: f64,
    pub profit_on_rm: f64,
    pub profit_on_va: f64,
    pub ohp_cost: f64,
    pub rnd_cost: f64,
    pub warranty_cost: f64,
    pub sga_cost: f64,
    pub grand_total: f64,
    pub rm_cost: f64,
    pub conversion_cost: f64,
    pub currency: Currency,
    pub warnings: Vec<Warning>,
}

impl CostSummary {
    pub fn compute(inputs: &RollupInputs) -> Self {
        let rates = &inputs.rates;
        let mut warnings = Vec::new();

        let pcb_comp_mech_cost = inputs.materials.pcb_comp_mech();
        let manufacturing_cost = inputs.manufacturing.total();

        let moh_cost = pcb_comp_mech_cost * rates.moh.fraction();
        let foh_cost = manufacturing_cost * rates.foh.fraction();
        let profit_on_rm = pcb_comp_mech_cost * rates.profit_on_rm.fraction();
        let profit_on_va = manufacturing_cost * rates.profit_on_va.fraction();

        // Entered direct consumables plus glue, solder paste and flux per board
        let consumables_cost =
            inputs.materials.direct_consumables + inputs.consumables_per_board.value;
        let (material, mix) = sum_amounts(
            "Material Cost",
            SUMMARY_CURRENCY,
            &[
                Amount::usd(pcb_comp_mech_cost),
                inputs.nre_per_unit,
                Amount::new(consumables_cost, inputs.consumables_per_board.currency),
            ],
        );
        if let Some(w) = mix {
            tracing::warn!(warning = %w, "currency tags mixed in roll-up");
            warnings.push(w);
        }
        let material_cost = material.value;

        let ohp_cost = moh_cost + foh_cost + profit_on_rm + profit_on_va;

        let base = material_cost + manufacturing_cost;
        let rnd_cost = base * rates.rnd.fraction();
        let warranty_cost = base * rates.warranty.fraction();
        let sga_cost = base * rates.sga.fraction();

        let grand_total =
            material_cost + manufacturing_cost + ohp_cost + rnd_cost + warranty_cost + sga_cost;

        tracing::debug!(
            material_cost,
            manufacturing_cost,
            ohp_cost,
            grand_total,
            "cost summary rolled up"
        );

        Self {
            pcb_comp_mech_cost,
            nre_cost: inputs.nre_per_unit.value,
            consumables_cost,
            material_cost,
            manufacturing_cost,
            moh_cost,
            foh_cost,
            profit_on_rm,
            profit_on_va,
            ohp_cost,
            rnd_cost,
            warranty_cost,
            sga_cost,
            grand_total,
            rm_cost: material_cost,
            conversion_cost: grand_total - material_cost,
            currency: SUMMARY_CURRENCY,
            warnings,
        }
    }
}
