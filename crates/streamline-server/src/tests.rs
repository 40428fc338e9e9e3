//! Handler tests for streamline-server

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use streamline_backend::FixtureBackend;
use streamline_core::{
    AnnotateResult, AnnotatedLine, ChangelistDescription, Commit, ConnectorKind, DiffLineKind, StreamKind,
    StreamNode, StreamlineConfig,
};

use crate::handlers::*;
use crate::ServerState;

fn fixture() -> FixtureBackend {
    let annotated = |line_number, commit_number, author: &str| AnnotatedLine {
        line_number,
        commit_number,
        author: author.to_string(),
        date: "2024/05/01".to_string(),
        content: format!("line {line_number}"),
    };

    FixtureBackend::new()
        .with_change(ChangelistDescription {
            info: Commit::new(120, "alice").with_timestamp(1_714_000_000),
            files: Vec::new(),
            diff_text: "Differences ...\n\n==== //depot/main/a.c#3 (text) ====\n\n@@ -1,3 +1,3 @@\n int f() {\n-  return 1;\n+  return 2;\n-  }\n+  }\n"
                .to_string(),
        })
        .with_annotation(
            "//depot/main/a.c",
            AnnotateResult {
                success: true,
                lines: vec![annotated(1, 100, "alice"), annotated(2, 100, "alice"), annotated(3, 120, "bob")],
                message: None,
            },
        )
        .with_streams(
            "//depot",
            vec![
                StreamNode::new("//depot/main", None, StreamKind::Mainline),
                StreamNode::new("//depot/dev", Some("//depot/main"), StreamKind::Development),
            ],
        )
        .with_branch("//depot/dev", vec![Commit::new(131, "carol").with_timestamp(300)])
        .with_branch("//depot/main", vec![Commit::new(130, "dan").with_timestamp(200)])
}

fn state() -> State<Arc<ServerState>> {
    State(Arc::new(ServerState::new(Arc::new(fixture()), StreamlineConfig::default())))
}

#[tokio::test]
async fn test_diff_endpoint_reconciles() {
    let Ok(axum::Json(response)) = get_diff(state(), Path(120)).await else {
        panic!("diff request failed");
    };

    assert_eq!(response.description.info.number, 120);
    assert_eq!(response.files.len(), 1);
    assert_eq!(response.stats.additions, 1);
    assert_eq!(response.stats.deletions, 1);
    assert_eq!(response.stats.suppressed, 2);
    let kinds: Vec<DiffLineKind> = response.lines.iter().map(|l| l.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DiffLineKind::FileHeader,
            DiffLineKind::Hunk,
            DiffLineKind::Context,
            DiffLineKind::Delete,
            DiffLineKind::Add,
            DiffLineKind::Context,
        ]
    );
}

#[tokio::test]
async fn test_unknown_change_is_not_found() {
    let err = get_diff(state(), Path(999)).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);

    let response = err.into_response();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    insta::assert_json_snapshot!(json, @r#"
    {
      "error": "change 999 not found"
    }
    "#);
}

#[tokio::test]
async fn test_history_endpoint_builds_layout() {
    let query = HistoryQuery {
        stream: "//depot/dev".to_string(),
        force_virtual: false,
    };
    let Ok(axum::Json(response)) = get_history(state(), Query(query)).await else {
        panic!("history request failed");
    };

    assert_eq!(response.history.commits.len(), 2);
    assert!(!response.layout.is_virtual);
    assert_eq!(response.layout.lanes[0].source_key, "//depot/main");
    assert_eq!(response.connectors.len(), 1);
    assert_eq!(response.connectors[0].kind, ConnectorKind::CurveLeft);
}

#[tokio::test]
async fn test_history_can_force_virtual_lanes() {
    let query = HistoryQuery {
        stream: "//depot/dev".to_string(),
        force_virtual: true,
    };
    let Ok(axum::Json(response)) = get_history(state(), Query(query)).await else {
        panic!("history request failed");
    };
    assert!(response.layout.is_virtual);
    assert_eq!(response.layout.lanes[0].label, "carol");
}

#[tokio::test]
async fn test_history_rejects_relative_stream() {
    let query = HistoryQuery {
        stream: "main".to_string(),
        force_virtual: false,
    };
    let err = get_history(state(), Query(query)).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_history_focus_failure_is_bad_gateway() {
    let backend = fixture().fail_branch("//depot/dev");
    let state = State(Arc::new(ServerState::new(Arc::new(backend), StreamlineConfig::default())));
    let query = HistoryQuery {
        stream: "//depot/dev".to_string(),
        force_virtual: false,
    };
    let err = get_history(state, Query(query)).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_annotate_endpoint_groups_blocks() {
    let query = AnnotateQuery {
        path: "//depot/main/a.c".to_string(),
    };
    let Ok(axum::Json(response)) = get_annotate(state(), Query(query)).await else {
        panic!("annotate request failed");
    };
    assert!(response.result.success);
    assert_eq!(response.blocks.len(), 2);
    assert_eq!(response.blocks[0].line_count(), 2);
}

#[tokio::test]
async fn test_annotate_requires_path() {
    let query = AnnotateQuery { path: " ".to_string() };
    let err = get_annotate(state(), Query(query)).await.unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_check() {
    let response = health_check(state()).await.into_response();
    assert_eq!(response.status(), StatusCode::OK);
}
