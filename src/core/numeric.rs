//! Numeric values at the input boundary
//!
//! Spreadsheet cells and form fields arrive as text. [`Numeric`] keeps the
//! distinction between a real number, a blank and unparseable text until a
//! formula decides what each case means.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::error::Warning;

/// A parsed cell or field value
#[derive(Debug, Clone, PartialEq)]
pub enum Numeric {
    Value(f64),
    Blank,
    Invalid(String),
}

impl Numeric {
    /// Parse raw text; surrounding whitespace is ignored
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Numeric::Blank;
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Numeric::Value(v),
            _ => Numeric::Invalid(trimmed.to_string()),
        }
    }

    /// The number, if there is one
    pub fn value(&self) -> Option<f64> {
        match self {
            Numeric::Value(v) => Some(*v),
            _ => None,
        }
    }

    /// Blank and invalid both become 0.0
    pub fn or_zero(&self) -> f64 {
        self.value().unwrap_or(0.0)
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Numeric::Blank)
    }
}

impl From<f64> for Numeric {
    fn from(v: f64) -> Self {
        Numeric::Value(v)
    }
}

/// A whole-number percentage as entered by the user (10 means 10%)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Percent(f64);

impl Percent {
    pub const ZERO: Percent = Percent(0.0);

    pub fn new(whole: f64) -> Self {
        Percent(whole)
    }

    /// The value as entered
    pub fn whole(self) -> f64 {
        self.0
    }

    /// The value divided by 100
    pub fn fraction(self) -> f64 {
        self.0 / 100.0
    }

    /// `1 + pct/100`, the wastage multiplier used by the consumable formulas
    pub fn growth_factor(self) -> f64 {
        1.0 + self.fraction()
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Currency denomination of an amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    /// Indian rupee, used by the NRE catalog
    Inr,
    /// US dollar, used by consumables and the OH&P roll-up
    Usd,
}

impl Currency {
    pub fn symbol(self) -> &'static str {
        match self {
            Currency::Inr => "₹",
            Currency::Usd => "$",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A value tagged with the currency it was denominated in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    pub value: f64,
    pub currency: Currency,
}

impl Amount {
    pub fn new(value: f64, currency: Currency) -> Self {
        Self { value, currency }
    }

    pub fn usd(value: f64) -> Self {
        Self::new(value, Currency::Usd)
    }

    pub fn inr(value: f64) -> Self {
        Self::new(value, Currency::Inr)
    }
}

/// Sum tagged amounts into a total reported in `report_in`
///
/// The numeric sum is returned as-is; no conversion is applied. When nonzero
/// terms carry more than one tag a [`Warning::CurrencyMix`] names the total.
pub fn sum_amounts(
    total_name: &str,
    report_in: Currency,
    terms: &[Amount],
) -> (Amount, Option<Warning>) {
    let value = terms.iter().map(|a| a.value).sum();

    let mut currencies: Vec<Currency> = terms
        .iter()
        .filter(|a| a.value != 0.0)
        .map(|a| a.currency)
        .collect();
    currencies.sort();
    currencies.dedup();

    let warning = if currencies.len() > 1 {
        Some(Warning::CurrencyMix {
            total: total_name.to_string(),
            currencies,
        })
    } else {
        None
    };

    (Amount::new(value, report_in), warning)
}
