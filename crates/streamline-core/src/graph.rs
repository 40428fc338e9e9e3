//! Row-to-row lane transitions for the history graph

use serde::{Deserialize, Serialize};

use crate::model::{Commit, GraphNode, Lane};

const FALLBACK_COLOR: &str = "#8a8f98";

/// Wrap each commit with its lane and the lanes of its neighbouring rows.
///
/// `commit_lanes[i]` is the lane of `commits[i]`. `previous_lane` and
/// `next_lane` are only set when the neighbour sits in a different lane, and
/// the first and last rows never set the field facing outward.
pub fn build_graph_nodes(commits: &[Commit], commit_lanes: &[usize], lanes: &[Lane]) -> Vec<GraphNode> {
    commits
        .iter()
        .zip(commit_lanes)
        .enumerate()
        .map(|(row, (commit, &lane))| {
            let previous_lane = row
                .checked_sub(1)
                .and_then(|prev| commit_lanes.get(prev))
                .copied()
                .filter(|&prev| prev != lane);
            let next_lane = commit_lanes.get(row + 1).copied().filter(|&next| next != lane);
            let color = lanes
                .get(lane)
                .map_or_else(|| FALLBACK_COLOR.to_string(), |l| l.color.clone());

            GraphNode {
                commit: commit.clone(),
                lane,
                color,
                previous_lane,
                next_lane,
            }
        })
        .collect()
}

/// Shape of the connector between two adjacent rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorKind {
    /// Same lane, vertical line.
    Straight,
    /// The lower row sits in a lane further left.
    CurveLeft,
    /// The lower row sits in a lane further right.
    CurveRight,
}

/// Edge drawn between row `from_row` and row `from_row + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connector {
    pub from_row: usize,
    pub to_row: usize,
    pub from_lane: usize,
    pub to_lane: usize,
    pub kind: ConnectorKind,
    /// Color of the upper row's lane.
    pub color: String,
}

/// One connector per adjacent row pair.
pub fn connectors(nodes: &[GraphNode]) -> Vec<Connector> {
    nodes
        .windows(2)
        .enumerate()
        .map(|(row, pair)| {
            let (upper, lower) = (&pair[0], &pair[1]);
            let kind = match lower.lane.cmp(&upper.lane) {
                std::cmp::Ordering::Equal => ConnectorKind::Straight,
                std::cmp::Ordering::Less => ConnectorKind::CurveLeft,
                std::cmp::Ordering::Greater => ConnectorKind::CurveRight,
            };
            Connector {
                from_row: row,
                to_row: row + 1,
                from_lane: upper.lane,
                to_lane: lower.lane,
                kind,
                color: upper.color.clone(),
            }
        })
        .collect()
}

/// Rows that need a curved connector on either side.
pub fn transition_rows(nodes: &[GraphNode]) -> impl Iterator<Item = usize> + '_ {
    nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.previous_lane.is_some() || node.next_lane.is_some())
        .map(|(row, _)| row)
}
