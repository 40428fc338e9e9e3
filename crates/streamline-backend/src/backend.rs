//! Version-control backend abstraction

use std::time::Duration;

use streamline_core::{AnnotateResult, ChangeNumber, ChangelistDescription, Commit, StreamNode};

use crate::schema::DecodeError;

/// Failure of a single backend query.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The backend ran but reported an error.
    #[error("{command} failed: {message}")]
    Command { command: String, message: String },
    #[error("{command} timed out after {elapsed:?}")]
    Timeout { command: String, elapsed: Duration },
    #[error("failed to run backend: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed backend output: {0}")]
    Json(#[from] serde_json::Error),
    /// Nothing is known about the requested object.
    #[error("{0} not found")]
    NotFound(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// The four queries the visualization core needs from a depot.
#[async_trait::async_trait]
pub trait VcsBackend: Send + Sync {
    /// Metadata, file list and raw diff text of a submitted changelist.
    async fn describe_changelist(&self, number: ChangeNumber) -> BackendResult<ChangelistDescription>;

    /// Per-line origin of the head revision of `depot_path`.
    async fn annotate_file(&self, depot_path: &str) -> BackendResult<AnnotateResult>;

    /// Most recent submitted changes under `branch_path`, newest first.
    async fn list_submitted_changes(&self, branch_path: &str, limit: usize) -> BackendResult<Vec<Commit>>;

    /// Every stream of `depot` (`//depot`).
    async fn list_streams(&self, depot: &str) -> BackendResult<Vec<StreamNode>>;

    /// Get backend name
    fn name(&self) -> &str;
}
