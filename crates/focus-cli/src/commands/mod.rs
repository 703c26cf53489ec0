//! CLI subcommand implementations.

pub mod control;
pub mod history;
pub mod lock;
pub mod run;
pub mod stats;
pub mod status;
pub mod tags;
pub mod theme;
pub mod util;
