//! Cost engines
//!
//! Each engine is a pure function of already-parsed inputs. Loading sheets
//! and reading parameters happens in [`crate::core`].

pub mod consumables;
pub mod nre;
pub mod ohp;
pub mod process;
pub mod rates;
pub mod volume;
