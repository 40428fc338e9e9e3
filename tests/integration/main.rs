//! Integration tests for Streamline
//!
//! These tests run the config, fixture backend, aggregation, lane layout and
//! server state together.

use std::sync::Arc;

use streamline_backend::{create_backend, history_layout, Fixture, HistoryAggregator, VcsBackend};
use streamline_core::{
    connectors, reconcile, BackendKind, ChangelistDescription, Commit, DiffLineKind, StreamKind, StreamNode,
    StreamlineConfig,
};
use tempfile::TempDir;

fn sample_fixture() -> Fixture {
    let streams = vec![
        StreamNode::new("//depot/main", None, StreamKind::Mainline),
        StreamNode::new("//depot/dev", Some("//depot/main"), StreamKind::Development),
        StreamNode::new("//depot/rel1", Some("//depot/main"), StreamKind::Release),
    ];
    let description = ChangelistDescription {
        info: Commit::new(42, "alice")
            .with_timestamp(1_700_000_400)
            .with_description("Reindent parser"),
        files: Vec::new(),
        diff_text: "Differences ...\n\n==== //depot/dev/parse.c#5 (text) ====\n\n@@ -1,3 +1,3 @@\n int parse() {\n-    return 0;   \n+    return 0;\n-}\n+}\n"
            .to_string(),
    };

    Fixture {
        changes: [(42, description)].into(),
        branches: [
            (
                "//depot/dev".to_string(),
                vec![
                    Commit::new(42, "alice").with_timestamp(1_700_000_400),
                    Commit::new(40, "bob").with_timestamp(1_700_000_200),
                ],
            ),
            (
                "//depot/main".to_string(),
                vec![
                    Commit::new(42, "alice").with_timestamp(1_700_000_400),
                    Commit::new(41, "carol").with_timestamp(1_700_000_300),
                ],
            ),
        ]
        .into(),
        streams: [("//depot".to_string(), streams)].into(),
        failing_branches: vec!["//depot/rel1".to_string()],
        ..Fixture::default()
    }
}

/// Write a fixture plus a config pointing at it and load both back.
fn write_workspace(dir: &TempDir) -> StreamlineConfig {
    let fixture_path = dir.path().join("fixture.json");
    std::fs::write(&fixture_path, serde_json::to_string_pretty(&sample_fixture()).unwrap()).unwrap();

    let config_text = format!(
        "[backend]\nkind = \"fixture\"\nfixture = {:?}\n\n[history]\nrelated_commit_limit = 5\n",
        fixture_path.display().to_string()
    );
    std::fs::write(dir.path().join("streamline.toml"), config_text).unwrap();

    StreamlineConfig::discover(None, dir.path()).unwrap()
}

#[test]
fn test_config_discovery() {
    let dir = TempDir::new().unwrap();
    let config = write_workspace(&dir);
    assert_eq!(config.backend.kind, BackendKind::Fixture);
    assert_eq!(config.history.related_commit_limit, 5);
    assert_eq!(config.history.focus_commit_limit, 100);
    assert_eq!(config.server.port, 7890);
}

#[test]
fn test_cosmetic_changelist_has_no_real_changes() {
    let dir = TempDir::new().unwrap();
    let config = write_workspace(&dir);
    let backend = create_backend(&config.backend).unwrap();

    let description = tokio_test::block_on(backend.describe_changelist(42)).unwrap();
    let lines = reconcile(&description.diff_text);

    assert!(
        lines
            .iter()
            .all(|line| !matches!(line.kind, DiffLineKind::Add | DiffLineKind::Delete))
    );
    assert_eq!(lines.iter().filter(|line| line.kind == DiffLineKind::Context).count(), 3);
}

#[tokio::test]
async fn test_history_graph_end_to_end() {
    let dir = TempDir::new().unwrap();
    let config = write_workspace(&dir);
    let backend: Arc<dyn VcsBackend> = Arc::from(create_backend(&config.backend).unwrap());

    let history = HistoryAggregator::new(backend, config.history)
        .aggregate("//depot/dev")
        .await
        .unwrap();

    let numbers: Vec<u64> = history.commits.iter().map(|c| c.number).collect();
    assert_eq!(numbers, vec![42, 41, 40]);
    assert_eq!(history.commits[0].branch.as_deref(), Some("//depot/dev"));
    assert_eq!(history.failed_branches, vec!["//depot/rel1"]);

    let layout = history_layout(&history, false, &config.lanes);
    assert!(!layout.is_virtual);
    let lanes: Vec<usize> = layout.nodes.iter().map(|n| n.lane).collect();
    assert_eq!(lanes, vec![1, 0, 1]);
    assert_eq!(connectors(&layout.nodes).len(), 2);
}

#[tokio::test]
async fn test_server_state() {
    use streamline_server::StreamlineServer;

    let dir = TempDir::new().unwrap();
    let mut config = write_workspace(&dir);
    config.server.port = 0;
    let backend: Arc<dyn VcsBackend> = Arc::from(create_backend(&config.backend).unwrap());

    let server = StreamlineServer::new(backend, config);
    let state = server.state();
    assert_eq!(state.backend.name(), "fixture");
    assert_eq!(state.config.server.port, 0);
}
