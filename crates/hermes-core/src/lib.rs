//! Core domain logic for Hermes time accounts.
//!
//! This crate contains the fundamental types and logic for:
//! - Tags and categories: the labels placed on the timeline
//! - Time accounts: ordered collections of tagged intervals that can be
//!   indexed, sliced by position or by time, reversed and compared
//! - Log replay: rebuilding an account from an append-only record log
//!
//! Storage and the command-line front end live in `hermes-db` and
//! `hermes-cli`.

pub mod account;
mod category;
pub mod error;
mod interval;
mod replay;
mod slice;
pub mod strategy;
mod tag;

pub use account::{Entry, Iter, Scope, Tagging, Taggings, TimeAccount, TimeAccountBuilder};
pub use category::{CATEGORY_NAME_PATTERN, Category, CategoryPool};
pub use error::{AccountError, ValidationError};
pub use interval::{Subintervals, TimeInterval};
pub use replay::{LogRecord, replay, replay_onto};
pub use slice::{OrdinalSlice, SliceKey};
pub use strategy::{Clipped, Intersecting, SliceStrategy};
pub use tag::{Tag, TagBuilder};
