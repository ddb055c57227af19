//! User-entered parameters
//!
//! Every numeric field accepts a blank (read as 0.0). Text that does not parse
//! is also read as 0.0, with a [`Warning::InvalidNumber`] so the caller can
//! show it next to the field.

use std::collections::BTreeMap;

use crate::core::error::Warning;
use crate::core::numeric::{Numeric, Percent};

/// Canonical parameter names
pub mod fields {
    pub const ANNUAL_VOLUME: &str = "annual_volume";
    pub const PRODUCT_LIFE: &str = "product_life";
    pub const TOOL_MAINTENANCE_RATE: &str = "tool_maintenance_rate";

    pub const GLUE_WEIGHT: &str = "glue_weight";
    pub const GLUE_SPECIFIC_GRAVITY: &str = "glue_specific_gravity";
    pub const GLUE_WASTAGE: &str = "glue_wastage";
    pub const GLUE_UNIT_COST: &str = "glue_unit_cost";

    pub const BOARD_LENGTH: &str = "board_length";
    pub const BOARD_WIDTH: &str = "board_width";
    pub const PASTE_THICKNESS: &str = "paste_thickness";
    pub const TOP_WEIGHT_ESTIMATE: &str = "top_weight_estimate";
    pub const TOP_PASTE_WASTAGE: &str = "top_paste_wastage";
    pub const BOTTOM_WEIGHT_ESTIMATE: &str = "bottom_weight_estimate";
    pub const BOTTOM_PASTE_WASTAGE: &str = "bottom_paste_wastage";
    pub const FLUX_WASTAGE: &str = "flux_wastage";

    pub const PCB_COST: &str = "pcb_cost";
    pub const ELECTRONICS_COST: &str = "electronics_cost";
    pub const MECHANICAL_COST: &str = "mechanical_cost";
    pub const DIRECT_CONSUMABLES: &str = "direct_consumables";

    pub const MOH: &str = "moh";
    pub const FOH: &str = "foh";
    pub const PROFIT_ON_RM: &str = "profit_on_rm";
    pub const PROFIT_ON_VA: &str = "profit_on_va";
    pub const RND: &str = "rnd";
    pub const WARRANTY: &str = "warranty";
    pub const SGA: &str = "sga";

    /// All fields in the order a session template lists them
    pub const ALL: &[&str] = &[
        ANNUAL_VOLUME,
        PRODUCT_LIFE,
        TOOL_MAINTENANCE_RATE,
        GLUE_WEIGHT,
        GLUE_SPECIFIC_GRAVITY,
        GLUE_WASTAGE,
        GLUE_UNIT_COST,
        BOARD_LENGTH,
        BOARD_WIDTH,
        PASTE_THICKNESS,
        TOP_WEIGHT_ESTIMATE,
        TOP_PASTE_WASTAGE,
        BOTTOM_WEIGHT_ESTIMATE,
        BOTTOM_PASTE_WASTAGE,
        FLUX_WASTAGE,
        PCB_COST,
        ELECTRONICS_COST,
        MECHANICAL_COST,
        DIRECT_CONSUMABLES,
        MOH,
        FOH,
        PROFIT_ON_RM,
        PROFIT_ON_VA,
        RND,
        WARRANTY,
        SGA,
    ];
}

/// A source of named user-entered values
pub trait ParameterInput {
    /// Raw text of a field, `None` when the field was never supplied
    fn raw(&self, name: &str) -> Option<String>;
}

impl ParameterInput for BTreeMap<String, String> {
    fn raw(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Parse a `key=value` override
pub fn parse_override(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing parameter name in '{}'", s));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

/// Resolves fields to numbers, collecting warnings for invalid text
pub struct ParameterReader<'a> {
    input: &'a dyn ParameterInput,
    warnings: Vec<Warning>,
}

impl<'a> ParameterReader<'a> {
    pub fn new(input: &'a dyn ParameterInput) -> Self {
        Self {
            input,
            warnings: Vec::new(),
        }
    }

    /// The tagged value of a field; a missing field is blank
    pub fn numeric(&self, name: &str) -> Numeric {
        match self.input.raw(name) {
            Some(raw) => Numeric::parse(&raw),
            None => Numeric::Blank,
        }
    }

    /// Resolve a field to a number: blank is 0.0, invalid is 0.0 plus a warning
    pub fn number(&mut self, name: &str) -> f64 {
        match self.numeric(name) {
            Numeric::Value(v) => v,
            Numeric::Blank => 0.0,
            Numeric::Invalid(raw) => {
                tracing::warn!(field = name, raw = %raw, "non-numeric input replaced by 0.0");
                self.warnings.push(Warning::InvalidNumber {
                    field: name.to_string(),
                    raw,
                });
                0.0
            }
        }
    }

    /// Resolve a whole-number percentage field
    pub fn percent(&mut self, name: &str) -> Percent {
        Percent::new(self.number(name))
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_blank_and_missing_are_zero_without_warning() {
        let p = params(&[(fields::ANNUAL_VOLUME, "")]);
        let mut reader = ParameterReader::new(&p);
        assert_eq!(reader.number(fields::ANNUAL_VOLUME), 0.0);
        assert_eq!(reader.number(fields::PRODUCT_LIFE), 0.0);
        assert!(reader.warnings().is_empty());
    }

    #[test]
    fn test_invalid_is_zero_with_warning() {
        let p = params(&[(fields::ANNUAL_VOLUME, "lots")]);
        let mut reader = ParameterReader::new(&p);
        assert_eq!(reader.number(fields::ANNUAL_VOLUME), 0.0);
        assert_eq!(
            reader.warnings(),
            &[Warning::InvalidNumber {
                field: fields::ANNUAL_VOLUME.to_string(),
                raw: "lots".to_string()
            }]
        );
    }

    #[test]
    fn test_percent_field() {
        let p = params(&[(fields::MOH, "12.5")]);
        let mut reader = ParameterReader::new(&p);
        assert!((reader.percent(fields::MOH).fraction() - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(
            parse_override("moh = 5").unwrap(),
            ("moh".to_string(), "5".to_string())
        );
        assert_eq!(
            parse_override("pcb_cost=").unwrap(),
            ("pcb_cost".to_string(), String::new())
        );
        assert!(parse_override("novalue").is_err());
        assert!(parse_override("=5").is_err());
    }
}
