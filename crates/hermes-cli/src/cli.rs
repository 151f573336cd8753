//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::record::TaggingArgs;
use crate::commands::show::ShowArgs;

/// Hermes time accounts.
///
/// Records tags over intervals of time and queries the resulting timeline
/// by time range, instant or position.
#[derive(Debug, Parser)]
#[command(name = "hermes", version, about, long_about = None)]
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
    /// Record a tag over an interval (or an instant).
    Record(TaggingArgs),

    /// Append JSONL log records read from stdin.
    ///
    /// Each line is `{"interval":{"start":..,"end":..},"tags":[{"name":..}]}`.
    Import,

    /// Remove a previously recorded tagging.
    Remove(TaggingArgs),

    /// Show the recorded timeline, optionally sliced.
    Show(ShowArgs),

    /// Show database location and totals.
    Status,
}
