//! CLI subcommand implementations.

pub mod cleanup;
pub mod dates;
pub mod edit;
pub mod event;
pub mod history;
pub mod status;
pub mod stopwatch;
mod util;
