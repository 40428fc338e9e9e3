//! Lane assignment for the history graph
//!
//! Commits are grouped into lanes either by the stream they were fetched
//! from (topology mode) or, when stream lineage is missing or carries no
//! information, by author (virtual mode).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LaneConfig;
use crate::graph::build_graph_nodes;
use crate::model::{Commit, Lane, LaneLayout, StreamKind};
use crate::streams::StreamTree;

/// Fixed palette for author lanes, indexed by lane.
const AUTHOR_PALETTE: &[&str] = &[
    "#4c8bf5", "#e8833a", "#3fb27f", "#b65fd6", "#8a8f98", "#d6a93f", "#3aa8c1", "#e05d6f",
];

/// How lanes were derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneMode {
    Topology,
    Virtual,
}

/// Per-commit lane indices plus the lanes they refer to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LaneAssignment {
    pub lanes: Vec<Lane>,
    /// Lane of `commits[i]`.
    pub commit_lanes: Vec<usize>,
}

/// Choose between topology and virtual lanes.
pub fn select_mode(commits: &[Commit], streams: Option<&StreamTree>, force_virtual: bool) -> LaneMode {
    if force_virtual {
        debug!("virtual lanes: forced by caller");
        return LaneMode::Virtual;
    }
    if streams.is_none_or(StreamTree::is_empty) {
        debug!("virtual lanes: no stream hierarchy");
        return LaneMode::Virtual;
    }
    let branches: HashSet<&str> = commits.iter().filter_map(|c| c.branch.as_deref()).collect();
    if branches.len() <= 1 {
        debug!(branches = branches.len(), "virtual lanes: single branch result");
        return LaneMode::Virtual;
    }
    LaneMode::Topology
}

/// Assign every commit to a lane and compute its neighbour transitions.
///
/// `commits` keep the caller's order; rows are never re-sorted.
pub fn assign_lanes(
    commits: &[Commit],
    streams: Option<&StreamTree>,
    focus_path: &str,
    force_virtual: bool,
    config: &LaneConfig,
) -> LaneLayout {
    let mode = select_mode(commits, streams, force_virtual);
    let is_virtual = mode == LaneMode::Virtual;
    if commits.is_empty() {
        return LaneLayout {
            is_virtual,
            ..LaneLayout::default()
        };
    }

    let assignment = match (mode, streams) {
        (LaneMode::Topology, Some(tree)) => topology_lanes(commits, tree, focus_path),
        _ => virtual_lanes(commits, config.max_author_lanes),
    };

    let nodes = build_graph_nodes(commits, &assignment.commit_lanes, &assignment.lanes);
    let max_lane_index = assignment.lanes.iter().map(|lane| lane.index).max().unwrap_or(0);
    debug!(
        lanes = assignment.lanes.len(),
        commits = commits.len(),
        is_virtual,
        "assigned lanes"
    );

    LaneLayout {
        nodes,
        lanes: assignment.lanes,
        max_lane_index,
        is_virtual,
    }
}

/// Lane 0 goes to the focus stream's mainline ancestor; every other branch
/// tag gets the next index in first-seen order.
pub fn topology_lanes(commits: &[Commit], tree: &StreamTree, focus_path: &str) -> LaneAssignment {
    let root = tree
        .mainline_ancestor(focus_path)
        .map_or(focus_path, |stream| stream.path.as_str());

    let mut registry = StreamLanes::new(tree);
    registry.lane_for(root);

    let commit_lanes = commits
        .iter()
        .map(|commit| {
            let key = commit.branch.as_deref().unwrap_or(focus_path);
            let lane = registry.lane_for(key);
            registry.lanes[lane].commit_count += 1;
            lane
        })
        .collect();

    LaneAssignment {
        lanes: registry.lanes,
        commit_lanes,
    }
}

struct StreamLanes<'a> {
    tree: &'a StreamTree,
    lanes: Vec<Lane>,
    by_key: HashMap<String, usize>,
}

impl<'a> StreamLanes<'a> {
    fn new(tree: &'a StreamTree) -> Self {
        Self {
            tree,
            lanes: Vec::new(),
            by_key: HashMap::new(),
        }
    }

    fn lane_for(&mut self, path: &str) -> usize {
        if let Some(&index) = self.by_key.get(path) {
            return index;
        }
        let index = self.lanes.len();
        let (label, kind) = match self.tree.get(path) {
            Some(stream) => (stream.display_name.clone(), stream.kind),
            None => (last_component(path).to_string(), StreamKind::Other),
        };
        self.lanes.push(Lane {
            index,
            color: stream_color(kind, path),
            label,
            source_key: path.to_string(),
            commit_count: 0,
        });
        self.by_key.insert(path.to_string(), index);
        index
    }
}

/// Top authors by commit count get their own lane; everyone else shares
/// the lane right after them.
pub fn virtual_lanes(commits: &[Commit], max_author_lanes: usize) -> LaneAssignment {
    // (author, commit count) in first-appearance order
    let mut authors: Vec<(&str, usize)> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();
    for commit in commits {
        let slot = *position.entry(commit.author.as_str()).or_insert_with(|| {
            authors.push((commit.author.as_str(), 0));
            authors.len() - 1
        });
        authors[slot].1 += 1;
    }

    // stable sort keeps first-appearance order among equal counts
    authors.sort_by(|a, b| b.1.cmp(&a.1));

    let mut lane_of: HashMap<&str, usize> = HashMap::new();
    let mut lanes: Vec<Lane> = Vec::new();
    for (rank, (author, count)) in authors.iter().enumerate() {
        if rank < max_author_lanes {
            lane_of.insert(*author, rank);
            lanes.push(Lane {
                index: rank,
                color: author_color(rank),
                label: (*author).to_string(),
                source_key: (*author).to_string(),
                commit_count: *count,
            });
        } else {
            lane_of.insert(*author, max_author_lanes);
        }
    }

    let overflow = authors.get(max_author_lanes..).unwrap_or_default();
    if let Some((first, _)) = overflow.first() {
        let label = match overflow.len() {
            1 => (*first).to_string(),
            n => format!("{} +{}", first, n - 1),
        };
        lanes.push(Lane {
            index: max_author_lanes,
            color: author_color(max_author_lanes),
            label,
            source_key: (*first).to_string(),
            commit_count: overflow.iter().map(|(_, count)| count).sum(),
        });
    }

    let commit_lanes = commits
        .iter()
        .map(|commit| lane_of.get(commit.author.as_str()).copied().unwrap_or(max_author_lanes))
        .collect();

    LaneAssignment { lanes, commit_lanes }
}

fn last_component(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

pub fn author_color(lane: usize) -> String {
    AUTHOR_PALETTE[lane % AUTHOR_PALETTE.len()].to_string()
}

/// Color for a stream lane: the kind picks the hue family, a stable hash of
/// the path picks the shade.
pub fn stream_color(kind: StreamKind, path: &str) -> String {
    let shades: &[&str] = match kind {
        StreamKind::Mainline => &["#2f6fde", "#3b7ff0", "#245bb8"],
        StreamKind::Development => &["#2e9e6a", "#3fb27f", "#23805a"],
        StreamKind::Release => &["#d9822b", "#e8943f", "#b86a1c"],
        StreamKind::Feature => &["#9b51e0", "#b06cf0", "#7d3bc0"],
        StreamKind::Task => &["#2aa3b8", "#3cbad0", "#1f8699"],
        StreamKind::Hotfix => &["#d64545", "#e85d5d", "#b33535"],
        StreamKind::Virtual => &["#8a8f98", "#a0a5ad", "#6f747c"],
        StreamKind::Other => &["#b8a13a", "#ccb54c", "#968428"],
    };
    shades[(fnv1a(path) % shades.len() as u64) as usize].to_string()
}

/// FNV-1a, stable across platforms and compiler versions.
fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_colors_are_stable() {
        assert_eq!(stream_color(StreamKind::Feature, "//depot/a"), stream_color(StreamKind::Feature, "//depot/a"));
        assert!(stream_color(StreamKind::Hotfix, "//depot/x").starts_with('#'));
        assert_eq!(fnv1a(""), 0xcbf2_9ce4_8422_2325);
    }

    #[test]
    fn author_palette_wraps() {
        assert_eq!(author_color(0), author_color(AUTHOR_PALETTE.len()));
    }

    #[test]
    fn last_component_of_paths() {
        assert_eq!(last_component("//depot/dev/"), "dev");
        assert_eq!(last_component("main"), "main");
    }
}
