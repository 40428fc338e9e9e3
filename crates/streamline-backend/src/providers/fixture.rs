//! In-memory backend serving canned depot data

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use streamline_core::{AnnotateResult, ChangeNumber, ChangelistDescription, Commit, StreamNode};

use crate::backend::{BackendError, BackendResult, VcsBackend};

/// On-disk fixture layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    /// Keyed by changelist number.
    pub changes: BTreeMap<ChangeNumber, ChangelistDescription>,
    /// Keyed by depot file path.
    pub annotations: BTreeMap<String, AnnotateResult>,
    /// Submitted changes per branch path, newest first.
    pub branches: BTreeMap<String, Vec<Commit>>,
    /// Stream records per depot (`//depot`).
    pub streams: BTreeMap<String, Vec<StreamNode>>,
    /// Branch paths whose change listing fails.
    pub failing_branches: Vec<String>,
}

/// Offline backend for tests and demos. Branches can be marked as failing
/// to exercise partial-failure handling.
#[derive(Debug, Clone, Default)]
pub struct FixtureBackend {
    fixture: Fixture,
    failing: HashSet<String>,
    streams_unavailable: bool,
}

impl FixtureBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: Fixture) -> Self {
        let failing = fixture.failing_branches.iter().cloned().collect();
        Self {
            fixture,
            failing,
            streams_unavailable: false,
        }
    }

    /// Load a JSON fixture file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let fixture: Fixture = serde_json::from_str(&text)?;
        tracing::info!(
            "Loaded fixture {} ({} changes, {} branches)",
            path.display(),
            fixture.changes.len(),
            fixture.branches.len()
        );
        Ok(Self::from_fixture(fixture))
    }

    pub fn with_change(mut self, description: ChangelistDescription) -> Self {
        self.fixture.changes.insert(description.info.number, description);
        self
    }

    pub fn with_annotation(mut self, depot_path: &str, result: AnnotateResult) -> Self {
        self.fixture.annotations.insert(depot_path.to_string(), result);
        self
    }

    pub fn with_branch(mut self, path: &str, commits: Vec<Commit>) -> Self {
        self.fixture.branches.insert(path.to_string(), commits);
        self
    }

    pub fn with_streams(mut self, depot: &str, streams: Vec<StreamNode>) -> Self {
        self.fixture.streams.insert(depot.to_string(), streams);
        self
    }

    /// Make every change listing of `path` fail.
    pub fn fail_branch(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    /// Make stream listing fail for every depot.
    pub fn without_streams(mut self) -> Self {
        self.streams_unavailable = true;
        self
    }
}

#[async_trait::async_trait]
impl VcsBackend for FixtureBackend {
    async fn describe_changelist(&self, number: ChangeNumber) -> BackendResult<ChangelistDescription> {
        self.fixture
            .changes
            .get(&number)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("change {number}")))
    }

    async fn annotate_file(&self, depot_path: &str) -> BackendResult<AnnotateResult> {
        Ok(self
            .fixture
            .annotations
            .get(depot_path)
            .cloned()
            .unwrap_or_else(|| AnnotateResult::failed(format!("{depot_path} - no such file(s)."))))
    }

    async fn list_submitted_changes(&self, branch_path: &str, limit: usize) -> BackendResult<Vec<Commit>> {
        if self.failing.contains(branch_path) {
            return Err(BackendError::Unavailable(format!("{branch_path} is marked as failing")));
        }
        Ok(self
            .fixture
            .branches
            .get(branch_path)
            .map(|commits| commits.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn list_streams(&self, depot: &str) -> BackendResult<Vec<StreamNode>> {
        if self.streams_unavailable {
            return Err(BackendError::Unavailable("stream listing disabled".to_string()));
        }
        Ok(self.fixture.streams.get(depot).cloned().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "fixture"
    }
}
