//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use mb_core::SessionKind;

use crate::commands::history::HistoryArgs;

/// Stopwatch and event marker with a day-bucketed history.
///
/// Marks are archived into logical days; old history is swept according to
/// the configured retention.
#[derive(Debug, Parser)]
#[command(name = "mb", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show configuration in effect and store counts.
    Status,

    /// Run an interactive stopwatch reading commands from stdin.
    Stopwatch,

    /// Record one event mark now.
    Event {
        /// Note attached to the mark.
        #[arg(long, default_value = "")]
        note: String,
    },

    /// Show the sessions of a logical day.
    History(HistoryArgs),

    /// List logical dates that have sessions.
    Dates {
        /// Session kind: event or stopwatch.
        #[arg(long, default_value = "stopwatch")]
        kind: SessionKind,
    },

    /// Rename a stopwatch session.
    Rename {
        session_id: String,
        title: String,
    },

    /// Replace the note of an archived record.
    Note { record_id: String, text: String },

    /// Delete a session and its records.
    DeleteSession { session_id: String },

    /// Delete one archived record.
    DeleteRecord { record_id: String },

    /// Sweep expired sessions and empty event sessions.
    Cleanup,
}
