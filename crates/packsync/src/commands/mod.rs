//! Command handlers for the packsync CLI.
//!
//! This module contains handlers for the various CLI subcommands,
//! split into logical groups.

pub mod config;
pub mod context;
pub mod logging;
pub mod member;
pub mod output;
pub mod project;

pub use config::*;
pub use context::Context;
pub use logging::*;
pub use member::*;
pub use project::*;
