//! Product volume parameters

use serde::Serialize;

/// Annual demand and product life entered for the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProductVolumeParams {
    pub annual_volume: f64,
    /// Product life in years
    pub product_life: f64,
}

impl ProductVolumeParams {
    pub fn new(annual_volume: f64, product_life: f64) -> Self {
        Self {
            annual_volume,
            product_life,
        }
    }

    /// Boards built over the product life
    pub fn product_volume(&self) -> f64 {
        self.annual_volume * self.product_life
    }

    /// Boards per batch; falls back to 1 when there is no annual volume
    pub fn batch_qty(&self, batches_per_year: f64) -> f64 {
        if self.annual_volume > 0.0 && batches_per_year > 0.0 {
            self.annual_volume / batches_per_year
        } else {
            1.0
        }
    }
}
