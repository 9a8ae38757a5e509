//! Shared utilities for packsync.
//!
//! This crate provides common utilities used across the packsync workspace:
//! - ULID-based identifier generation
//! - Logging setup with tracing
//! - Data/config directory and relative path helpers
//! - RAII-based timing for scan, copy and merge operations

pub mod id;
pub mod log;
pub mod path;
pub mod timing;

pub use id::{IdPrefix, Identifier};
pub use log::{LogConfig, LogLevel, LogTarget};
pub use timing::{Operation, TimingGuard};
