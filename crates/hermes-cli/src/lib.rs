//! Hermes CLI library.
//!
//! This crate provides the command-line interface for recording taggings and
//! querying time accounts.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
