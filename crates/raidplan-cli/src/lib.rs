//! Library side of the `raidplan` command: logging setup, configuration and
//! the catalog/progress session shared by every subcommand.

pub mod config;
pub mod logging;
pub mod owned;
pub mod session;
