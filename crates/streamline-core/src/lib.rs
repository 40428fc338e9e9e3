//! Streamline Core: diff reconciliation, stream hierarchy and history lanes

pub mod annotate;
pub mod config;
pub mod diff;
pub mod graph;
pub mod lanes;
pub mod model;
pub mod pairing;
pub mod streams;


#[cfg(test)]
pub mod test_utils;

pub use annotate::{group_annotations, AnnotationBlock};
pub use config::{
    BackendConfig, BackendKind, ConfigError, DiffConfig, HistoryConfig, LaneConfig, ServerConfig,
    StreamlineConfig,
};
pub use diff::{
    reconcile, split_files, DiffReconciler, DiffStats, FileHeaderInfo, FileSection, HunkCounters,
    HunkRange, ReconciledDiff,
};
pub use graph::{build_graph_nodes, connectors, Connector, ConnectorKind};
pub use lanes::{assign_lanes, select_mode, LaneAssignment, LaneMode};
pub use model::{
    AnnotateResult, AnnotatedLine, ChangeNumber, ChangedFile, ChangelistDescription, Commit, DiffLine,
    DiffLineKind, GraphNode, Lane, LaneLayout, StreamKind, StreamNode,
};
pub use pairing::{LinePairing, PairedLines};
pub use streams::StreamTree;
