//! REST API handlers for the Streamline server

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use streamline_backend::{history_layout, BackendError, HistoryError, HistoryResult};
use streamline_core::{
    connectors, group_annotations, split_files, AnnotateResult, AnnotationBlock, ChangeNumber,
    ChangelistDescription, Connector, DiffLine, DiffStats, FileSection, LaneLayout,
};

use crate::ServerState;

/// Error body returned with every non-2xx status.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Backend(BackendError),
    History(HistoryError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Backend(BackendError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Backend(_) | ApiError::History(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(message) => message.clone(),
            ApiError::Backend(err) => err.to_string(),
            ApiError::History(err) => err.to_string(),
        }
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        ApiError::Backend(err)
    }
}

impl From<HistoryError> for ApiError {
    fn from(err: HistoryError) -> Self {
        ApiError::History(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!("Request failed: {}", self.message());
        }
        (status, Json(ErrorResponse { error: self.message() })).into_response()
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backend: String,
}

#[derive(Debug, Serialize)]
pub struct DiffResponse {
    pub description: ChangelistDescription,
    pub lines: Vec<DiffLine>,
    pub files: Vec<FileSection>,
    pub stats: DiffStats,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub stream: String,
    #[serde(rename = "virtual", default)]
    pub force_virtual: bool,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: HistoryResult,
    pub layout: LaneLayout,
    pub connectors: Vec<Connector>,
}

#[derive(Debug, Deserialize)]
pub struct AnnotateQuery {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct AnnotateResponse {
    pub result: AnnotateResult,
    pub blocks: Vec<AnnotationBlock>,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.backend.name().to_string(),
    })
}

/// Reconciled diff of a submitted changelist
pub async fn get_diff(
    State(state): State<Arc<ServerState>>,
    Path(number): Path<ChangeNumber>,
) -> Result<Json<DiffResponse>, ApiError> {
    let description = state.backend.describe_changelist(number).await?;
    let reconciled = state.reconciler().reconcile_detailed(&description.diff_text);

    Ok(Json(DiffResponse {
        files: split_files(&reconciled.lines),
        lines: reconciled.lines,
        stats: reconciled.stats,
        description,
    }))
}

/// Aggregated history of a stream with its lane layout
pub async fn get_history(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let stream = query.stream.trim();
    if !stream.starts_with("//") {
        return Err(ApiError::BadRequest(format!(
            "stream must be a depot path like //depot/main, got {stream:?}"
        )));
    }

    let history = state.aggregator().aggregate(stream).await?;
    let layout = history_layout(&history, query.force_virtual, &state.config.lanes);
    let connectors = connectors(&layout.nodes);

    Ok(Json(HistoryResponse {
        history,
        layout,
        connectors,
    }))
}

/// Annotated head revision of a file
pub async fn get_annotate(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<AnnotateQuery>,
) -> Result<Json<AnnotateResponse>, ApiError> {
    if query.path.trim().is_empty() {
        return Err(ApiError::BadRequest("path must not be empty".to_string()));
    }

    let result = state.backend.annotate_file(query.path.trim()).await?;
    let blocks = group_annotations(&result.lines);
    Ok(Json(AnnotateResponse { result, blocks }))
}
