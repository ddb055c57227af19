//! Consumable cost engine: RTV glue, solder paste and wave solder flux
//!
//! Each family is an independent chain of closed-form formulas. Wastage and
//! weight-estimate inputs are whole-number [`Percent`]s; they are scaled once,
//! inside [`Percent::fraction`] or [`Percent::growth_factor`].

use serde::Serialize;

use crate::core::config::CostConstants;
use crate::core::numeric::{Currency, Percent};

/// Consumables are costed in dollars
pub const CONSUMABLES_CURRENCY: Currency = Currency::Usd;

/// RTV glue inputs
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GlueParams {
    /// Glue volume per board (ml)
    pub glue_weight: f64,
    /// g/cc
    pub specific_gravity: f64,
    pub wastage: Percent,
    /// $/g
    pub unit_cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlueCost {
    pub weight_per_board: f64,
    pub cost_per_board: f64,
}

impl GlueParams {
    pub fn compute(&self) -> GlueCost {
        let weight_per_board =
            self.glue_weight * self.specific_gravity * self.wastage.growth_factor();
        GlueCost {
            weight_per_board,
            cost_per_board: weight_per_board * self.unit_cost,
        }
    }
}

/// Board outline shared by solder paste and flux (mm)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BoardGeometry {
    pub length: f64,
    pub width: f64,
}

impl BoardGeometry {
    /// mm²
    pub fn area(&self) -> f64 {
        self.length * self.width
    }
}

/// Paste coverage of one board side
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PasteSide {
    /// Share of the full-coverage weight actually printed
    pub weight_estimate: Percent,
    pub wastage: Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PasteSideCost {
    pub weight: f64,
    pub cost: f64,
}

/// Solder paste inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SolderPasteParams {
    pub board: BoardGeometry,
    /// Stencil thickness (mm)
    pub thickness: f64,
    pub specific_gravity: f64,
    /// $/g
    pub solder_bar_cost: f64,
    pub top: PasteSide,
    pub bottom: PasteSide,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SolderPasteCost {
    /// Paste weight at 100% coverage (g)
    pub weight_100: f64,
    pub top: PasteSideCost,
    pub bottom: PasteSideCost,
}

impl SolderPasteCost {
    pub fn cost_per_board(&self) -> f64 {
        self.top.cost + self.bottom.cost
    }
}

impl SolderPasteParams {
    pub fn weight_100(&self) -> f64 {
        (self.board.length * self.board.width * self.thickness * self.specific_gravity) / 1000.0
    }

    fn side(&self, weight_100: f64, side: &PasteSide) -> PasteSideCost {
        let weight = weight_100 * side.weight_estimate.fraction() * side.wastage.growth_factor();
        PasteSideCost {
            weight,
            cost: weight * self.solder_bar_cost,
        }
    }

    pub fn compute(&self) -> SolderPasteCost {
        let weight_100 = self.weight_100();
        SolderPasteCost {
            weight_100,
            top: self.side(weight_100, &self.top),
            bottom: self.side(weight_100, &self.bottom),
        }
    }
}

/// Wave solder flux inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FluxParams {
    pub board: BoardGeometry,
    /// ml per 100 mm²
    pub spread_factor: f64,
    pub wastage: Percent,
    /// $/ml
    pub unit_cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FluxCost {
    pub board_area: f64,
    pub spread_area: f64,
    pub cost_per_board: f64,
}

impl FluxParams {
    pub fn compute(&self) -> FluxCost {
        let board_area = self.board.area();
        let spread_area = (board_area / 100.0) * self.spread_factor * self.wastage.growth_factor();
        FluxCost {
            board_area,
            spread_area,
            cost_per_board: spread_area * self.unit_cost,
        }
    }
}

/// All consumable inputs of a session
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConsumableParams {
    pub glue: GlueParams,
    pub paste: SolderPasteParams,
    pub flux: FluxParams,
}

/// User-entered consumable fields, before the fixed constants are applied
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConsumableInputs {
    pub glue: GlueParams,
    pub board: BoardGeometry,
    pub paste_thickness: f64,
    pub top: PasteSide,
    pub bottom: PasteSide,
    pub flux_wastage: Percent,
}

impl ConsumableParams {
    pub fn new(inputs: &ConsumableInputs, constants: &CostConstants) -> Self {
        Self {
            glue: inputs.glue,
            paste: SolderPasteParams {
                board: inputs.board,
                thickness: inputs.paste_thickness,
                specific_gravity: constants.paste_specific_gravity,
                solder_bar_cost: constants.solder_bar_cost_per_gram,
                top: inputs.top,
                bottom: inputs.bottom,
            },
            flux: FluxParams {
                board: inputs.board,
                spread_factor: constants.flux_spread_factor,
                wastage: inputs.flux_wastage,
                unit_cost: constants.flux_cost_per_ml,
            },
        }
    }

    pub fn compute(&self) -> ConsumableCosts {
        let costs = ConsumableCosts {
            glue: self.glue.compute(),
            paste: self.paste.compute(),
            flux: self.flux.compute(),
            currency: CONSUMABLES_CURRENCY,
        };
        tracing::debug!(
            glue = costs.glue.cost_per_board,
            paste = costs.paste.cost_per_board(),
            flux = costs.flux.cost_per_board,
            "consumables costed"
        );
        costs
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConsumableCosts {
    pub glue: GlueCost,
    pub paste: SolderPasteCost,
    pub flux: FluxCost,
    pub currency: Currency,
}

impl ConsumableCosts {
    /// Glue, both paste sides and flux, per board
    pub fn total_per_board(&self) -> f64 {
        self.glue.cost_per_board + self.paste.cost_per_board() + self.flux.cost_per_board
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn board() -> BoardGeometry {
        BoardGeometry {
            length: 100.0,
            width: 50.0,
        }
    }

    #[test]
    fn test_glue_weight_with_wastage() {
        let glue = GlueParams {
            glue_weight: 0.5,
            specific_gravity: 8.9,
            wastage: Percent::new(10.0),
            unit_cost: 2.0,
        };
        let cost = glue.compute();
        assert!(close(cost.weight_per_board, 4.895));
        assert!(close(cost.cost_per_board, 9.79));
    }

    #[test]
    fn test_paste_sides_share_full_coverage_weight() {
        let paste = SolderPasteParams {
            board: board(),
            thickness: 0.12,
            specific_gravity: 7.31,
            solder_bar_cost: 0.065,
            top: PasteSide {
                weight_estimate: Percent::new(50.0),
                wastage: Percent::new(10.0),
            },
            bottom: PasteSide {
                weight_estimate: Percent::new(20.0),
                wastage: Percent::ZERO,
            },
        };
        let cost = paste.compute();
        // 100 * 50 * 0.12 * 7.31 / 1000
        assert!(close(cost.weight_100, 4.386));
        assert!(close(cost.top.weight, 4.386 * 0.5 * 1.1));
        assert!(close(cost.bottom.weight, 4.386 * 0.2));
        assert!(close(cost.bottom.cost, 4.386 * 0.2 * 0.065));
    }

    #[test]
    fn test_flux_spread() {
        let flux = FluxParams {
            board: board(),
            spread_factor: 0.1,
            wastage: Percent::new(20.0),
            unit_cost: 0.0055,
        };
        let cost = flux.compute();
        assert_eq!(cost.board_area, 5000.0);
        assert!(close(cost.spread_area, 6.0));
        assert!(close(cost.cost_per_board, 0.033));
    }

    #[test]
    fn test_total_uses_configured_constants() {
        let inputs = ConsumableInputs {
            glue: GlueParams {
                glue_weight: 1.0,
                specific_gravity: 1.0,
                wastage: Percent::ZERO,
                unit_cost: 1.0,
            },
            board: board(),
            paste_thickness: 0.12,
            top: PasteSide {
                weight_estimate: Percent::new(100.0),
                wastage: Percent::ZERO,
            },
            bottom: PasteSide::default(),
            flux_wastage: Percent::ZERO,
        };
        let costs = ConsumableParams::new(&inputs, &CostConstants::default()).compute();

        let expected = 1.0 + 4.386 * 0.065 + 5.0 * 0.0055;
        assert!(close(costs.total_per_board(), expected));
        assert_eq!(costs.currency, Currency::Usd);
    }

    #[test]
    fn test_blank_inputs_cost_nothing() {
        let params = ConsumableParams::new(&ConsumableInputs::default(), &CostConstants::default());
        let costs = params.compute();
        assert_eq!(costs.total_per_board(), 0.0);
    }
}
