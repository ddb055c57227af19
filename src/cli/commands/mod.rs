//! CLI command implementations

pub mod completions;
pub mod consumables;
pub mod estimate;
pub mod init;
pub mod nre;
pub mod process;
pub mod rates;
pub mod template;
