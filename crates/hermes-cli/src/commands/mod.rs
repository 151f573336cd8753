//! CLI subcommand implementations.

pub mod import;
pub mod record;
pub mod remove;
pub mod show;
pub mod status;
pub mod util;
