//! Peoplesync reconciliation engine
//!
//! This module keeps a local contact store and a remote directory in step:
//! - Identity indices over full snapshots of both sides
//! - Field mapping with null-field protection on push
//! - Equivalence checks for linking same-name contacts
//! - A persistent link set carried between runs
//! - Retry strategy with exponential backoff for directory calls

pub mod engine;
pub mod equivalence;
pub mod index;
pub mod links;
pub mod mapper;
pub mod report;
pub mod retry;

// Re-export main types
pub use engine::{SyncConfig, SyncEngine, SYNCHRONISED};
pub use equivalence::equivalent;
pub use index::{LocalIndex, RemoteIndex};
pub use links::{LinkSet, LinkStore};
pub use mapper::{backfill_from, pull_into, to_local, to_remote, FieldValue, RemoteFields};
pub use report::SyncReport;
pub use retry::{RetryConfig, RetryExecutor};
