//! Multi-branch history aggregation
//!
//! Collects the focus stream's submitted changes together with a bounded set
//! of related streams (parent, siblings, children) so the history graph can
//! show where work flowed between them.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use streamline_core::{assign_lanes, Commit, HistoryConfig, LaneConfig, LaneLayout, StreamNode, StreamTree};
use tracing::{debug, info, warn};

use crate::backend::VcsBackend;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// The focus stream itself could not be listed.
    #[error("failed to fetch history of {path}: {message}")]
    FocusFetch { path: String, message: String },
}

/// Merged history of a focus stream and its relatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryResult {
    pub focus_path: String,
    /// Newest first, deduplicated by change number.
    pub commits: Vec<Commit>,
    /// Stream records of the focus depot. Empty when unavailable.
    pub streams: Vec<StreamNode>,
    /// Related streams that were queried, in query order.
    pub related_branches: Vec<String>,
    /// Related streams whose listing failed.
    pub failed_branches: Vec<String>,
    /// Lanes should be inferred from authorship.
    pub virtual_eligible: bool,
}

pub struct HistoryAggregator {
    backend: Arc<dyn VcsBackend>,
    config: HistoryConfig,
}

impl HistoryAggregator {
    pub fn new(backend: Arc<dyn VcsBackend>, config: HistoryConfig) -> Self {
        Self { backend, config }
    }

    pub async fn aggregate(&self, focus_path: &str) -> Result<HistoryResult, HistoryError> {
        let depot = depot_of(focus_path);
        let (focus, streams) = tokio::join!(
            self.backend
                .list_submitted_changes(focus_path, self.config.focus_commit_limit),
            self.backend.list_streams(&depot),
        );

        let focus: Vec<Commit> = focus
            .map_err(|err| HistoryError::FocusFetch {
                path: focus_path.to_string(),
                message: err.to_string(),
            })?
            .into_iter()
            .map(|commit| commit.with_branch(focus_path))
            .collect();

        let streams = match streams {
            Ok(streams) => streams,
            Err(err) => {
                warn!("Stream listing for {} failed, showing {} alone: {}", depot, focus_path, err);
                return Ok(HistoryResult {
                    focus_path: focus_path.to_string(),
                    commits: merge_commits(focus, self.config.result_limit),
                    streams: Vec::new(),
                    related_branches: Vec::new(),
                    failed_branches: Vec::new(),
                    virtual_eligible: true,
                });
            }
        };

        let tree = StreamTree::from_streams(streams.iter().cloned());
        let related = related_branches(&tree, focus_path, self.config.related_branch_limit);
        debug!(?related, "related streams of {}", focus_path);

        let backend = self.backend.as_ref();
        let limit = self.config.related_commit_limit;
        let fetched: Vec<_> = stream::iter(related.iter().cloned())
            .map(move |path| async move {
                let result = backend.list_submitted_changes(&path, limit).await;
                (path, result)
            })
            .buffered(self.config.max_in_flight.max(1))
            .collect()
            .await;

        let mut all = focus;
        let mut failed_branches = Vec::new();
        let mut contributed = false;
        for (path, result) in fetched {
            match result {
                Ok(commits) => {
                    contributed |= !commits.is_empty();
                    all.extend(commits.into_iter().map(|commit| commit.with_branch(path.as_str())));
                }
                Err(err) => {
                    warn!("Skipping related stream {}: {}", path, err);
                    failed_branches.push(path);
                }
            }
        }

        let commits = merge_commits(all, self.config.result_limit);
        info!(
            "Aggregated {} commits for {} ({} related, {} failed)",
            commits.len(),
            focus_path,
            related.len(),
            failed_branches.len()
        );

        Ok(HistoryResult {
            focus_path: focus_path.to_string(),
            commits,
            streams,
            related_branches: related,
            failed_branches,
            virtual_eligible: !contributed,
        })
    }
}

/// `//depot/main/sub` -> `//depot`.
pub fn depot_of(path: &str) -> String {
    let name = path.trim_start_matches('/').split('/').next().unwrap_or_default();
    format!("//{name}")
}

/// Parent, then siblings, then children of `focus`, capped at `limit`.
pub fn related_branches(tree: &StreamTree, focus: &str, limit: usize) -> Vec<String> {
    let parent = tree.parent(focus);
    let candidates = parent
        .into_iter()
        .chain(tree.siblings(focus))
        .chain(tree.children(focus));

    let mut seen = HashSet::new();
    candidates
        .map(|stream| stream.path.clone())
        .filter(|path| path != focus && seen.insert(path.clone()))
        .take(limit)
        .collect()
}

/// Drop repeated change numbers (first copy wins), order newest first with
/// undated commits last, and cap the length.
pub fn merge_commits(commits: Vec<Commit>, limit: usize) -> Vec<Commit> {
    let mut seen = HashSet::new();
    let mut merged: Vec<Commit> = commits
        .into_iter()
        .filter(|commit| seen.insert(commit.number))
        .collect();
    merged.sort_by_key(|commit| Reverse(commit.timestamp));
    merged.truncate(limit);
    merged
}

/// Lane layout for an aggregated history.
pub fn history_layout(result: &HistoryResult, force_virtual: bool, config: &LaneConfig) -> LaneLayout {
    let tree = StreamTree::from_streams(result.streams.iter().cloned());
    let force_virtual = force_virtual || (result.virtual_eligible && tree.is_empty());
    assign_lanes(&result.commits, Some(&tree), &result.focus_path, force_virtual, config)
}
