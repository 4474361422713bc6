//! Taskboard - a kanban board over plain-text checklist documents
//!
//! Each task is a loosely formatted markdown checklist on disk. The board
//! reads whatever a human or an agent wrote, fills in what it cannot find,
//! and edits documents by rewriting only the span it changes.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`document`] - Vocabulary, field grammar, parser, mutator and renderer
//! - [`archive`] - Archive header wrapping and unwrapping
//! - [`store`] - Task shelves on disk and the job record file
//! - [`board`] - Board operations and the views they return
//! - [`config`] - Settings loading and validation
//! - [`error`] - Custom error types and handling
//! - [`testing`] - Testing infrastructure (mocks, fixtures, assertions)
//!
//! # Example
//!
//! ```rust,ignore
//! use taskboard::{BoardConfig, NewTask, TaskBoard, TaskPatch};
//!
//! let config = BoardConfig::load(".".as_ref())?;
//! let mut board = TaskBoard::open(&config, ".".as_ref())?;
//!
//! board.create(NewTask::new("weekly", "周报整理"))?;
//! board.update("weekly", &TaskPatch::from_assignments(&["owner=alice".into()])?)?;
//!
//! for card in &board.list()?.in_progress {
//!     println!("{} {}", card.id, card.progress);
//! }
//! ```

pub mod archive;
pub mod board;
pub mod config;
pub mod document;
pub mod error;
pub mod store;
pub mod testing;

// Re-export commonly used types
pub use error::{Result, TaskboardError};

pub use board::{BoardView, NewPhase, NewTask, TaskBoard, TaskDetail, TaskSummary};
pub use config::{BoardConfig, ConfigValidator};
pub use document::{
    render, AgentTable, Clock, Grammar, Mutator, Parser, Status, SystemClock, TaskPatch,
    TaskRecord, TransitionTarget,
};
pub use store::{FsTaskStore, JobStore, Shelf, TaskStore};
