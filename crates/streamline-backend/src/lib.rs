//! Depot access for Streamline
//!
//! This crate defines the `VcsBackend` trait the visualization core talks
//! to, the `p4` and fixture implementations of it, and the aggregation of
//! multi-stream history on top of those queries.

pub mod backend;
pub mod history;
pub mod providers;
pub mod schema;


pub use backend::{BackendError, BackendResult, VcsBackend};
pub use history::{history_layout, merge_commits, HistoryAggregator, HistoryError, HistoryResult};
pub use providers::{create_backend, Fixture, FixtureBackend, P4Backend};
pub use schema::DecodeError;
