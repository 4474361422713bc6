//! Checklist documents: grammar, parsing, and span-preserving edits.
//!
//! # Module Structure
//!
//! - [`vocab`] - Status glyphs, agent table, labels and defaults
//! - [`clock`] - Injected current time
//! - [`grammar`] - Ordered extraction rules with value spans
//! - [`parser`] - Text to [`TaskRecord`]
//! - [`mutator`] - Field edits as span splices
//! - [`render`] - Canonical layout for new documents

pub mod clock;
pub mod grammar;
pub mod mutator;
pub mod parser;
pub mod record;
pub mod render;
pub mod vocab;

pub use clock::{format_timestamp, parse_timestamp, Clock, FixedClock, SystemClock};
pub use grammar::{Grammar, Located, RuleChain, Span};
pub use mutator::{splice, validate_owner, CheckItem, Mutator, TaskPatch};
pub use parser::{
    count_progress, extract_execution_records, extract_phases, loose_items, Parser,
};
pub use record::{current_phase, ExecutionRecord, Field, Phase, PhaseItem, Progress, TaskRecord};
pub use render::{render, DocumentDraft};
pub use vocab::{builtin_agents, Agent, AgentTable, Status, TransitionTarget};
