//! pcbcost: PCBA cost estimator
//!
//! Apportions tooling NRE over the product volume, costs each process stage
//! of a mapping sheet against machine and labor rates, prices the solder
//! consumables and rolls everything up with overheads and profit.

pub mod cli;
pub mod core;
pub mod engine;
