//! markbook CLI library.
//!
//! This crate provides the CLI interface for markbook.

mod app;
mod cli;
pub mod commands;
mod config;

pub use app::{App, LiveArchiver};
pub use cli::{Cli, Commands};
pub use config::Config;
