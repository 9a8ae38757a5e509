//! Testing utilities and fixtures for packsync.
//!
//! This crate provides common testing infrastructure used across the packsync workspace:
//!
//! - **Fixtures**: On-disk packages and a temp-dir workspace
//! - **Mocks**: Recording test doubles for core collaborators
//! - **Assertions**: File and tree assertions with diffs on failure
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use packsync_test_utils::{assertions::assert_tree, TestPackage, TestWorkspace};
//!
//! #[tokio::test]
//! async fn test_import() {
//!     let package = TestPackage::new("Song").with_file("a.txt", "1").build();
//!     let workspace = TestWorkspace::new();
//!     let mut history = workspace.history().await.unwrap();
//!     // ...
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mocks;

pub use fixtures::{BuiltTestPackage, TestPackage, TestWorkspace};
pub use mocks::RecordingEditor;
