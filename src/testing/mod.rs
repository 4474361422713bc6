//! Testing infrastructure for the task board.
//!
//! - **Mocks**: an in-memory [`TaskStore`](crate::store::TaskStore) with
//!   failure injection
//! - **Fixtures**: sample documents and a temporary file-backed board
//!   (test-only)
//! - **Assertions**: span and defaulting checks for document edits
//!
//! # Example
//!
//! ```rust,ignore
//! use taskboard::testing::MockTaskStore;
//!
//! let store = MockTaskStore::new()
//!     .with_document("weekly", "# 任务清单: 周报\n")
//!     .with_write_error("disk full");
//! ```

pub mod assertions;
#[cfg(test)]
pub mod fixtures;
pub mod mocks;

pub use assertions::*;
#[cfg(test)]
pub use fixtures::*;
pub use mocks::*;
