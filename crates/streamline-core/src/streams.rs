//! Stream hierarchy backed by petgraph::StableDiGraph

use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use tracing::warn;

use crate::model::{StreamKind, StreamNode};

/// The depot's stream forest. Edges point from parent to child.
pub struct StreamTree {
    inner: StableDiGraph<StreamNode, ()>,
    by_path: HashMap<String, NodeIndex>,
}

impl std::fmt::Debug for StreamTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamTree")
            .field("stream_count", &self.inner.node_count())
            .field("link_count", &self.inner.edge_count())
            .finish()
    }
}

impl StreamTree {
    pub fn new() -> Self {
        StreamTree {
            inner: StableDiGraph::new(),
            by_path: HashMap::new(),
        }
    }

    /// Build the tree from backend records. Duplicate paths keep the first
    /// record; parents missing from the list leave the child as a root.
    pub fn from_streams(streams: impl IntoIterator<Item = StreamNode>) -> Self {
        let mut tree = StreamTree::new();
        for stream in streams {
            if tree.by_path.contains_key(&stream.path) {
                warn!("duplicate stream record ignored: {}", stream.path);
                continue;
            }
            let path = stream.path.clone();
            let idx = tree.inner.add_node(stream);
            tree.by_path.insert(path, idx);
        }

        let links: Vec<(NodeIndex, NodeIndex)> = tree
            .inner
            .node_indices()
            .filter_map(|child| {
                let parent_path = tree.inner[child].parent_path.as_ref()?;
                let parent = tree.by_path.get(parent_path)?;
                Some((*parent, child))
            })
            .collect();
        for (parent, child) in links {
            tree.inner.add_edge(parent, child, ());
        }

        tree
    }

    /// Number of streams.
    pub fn len(&self) -> usize {
        self.inner.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    pub fn get(&self, path: &str) -> Option<&StreamNode> {
        self.by_path.get(path).map(|idx| &self.inner[*idx])
    }

    pub fn contains(&self, path: &str) -> bool {
        self.by_path.contains_key(path)
    }

    /// Kind of the stream at `path`, `Other` when unknown.
    pub fn kind_of(&self, path: &str) -> StreamKind {
        self.get(path).map_or(StreamKind::Other, |s| s.kind)
    }

    /// Iterate over all streams in insertion order.
    pub fn all_streams(&self) -> impl Iterator<Item = &StreamNode> {
        self.inner
            .node_indices()
            .filter_map(move |idx| self.inner.node_weight(idx))
    }

    pub fn parent(&self, path: &str) -> Option<&StreamNode> {
        let idx = *self.by_path.get(path)?;
        self.inner
            .edges_directed(idx, Direction::Incoming)
            .next()
            .map(|edge| &self.inner[edge.source()])
    }

    /// Direct children in insertion order.
    pub fn children(&self, path: &str) -> Vec<&StreamNode> {
        let Some(&idx) = self.by_path.get(path) else {
            return Vec::new();
        };
        let mut children: Vec<NodeIndex> = self
            .inner
            .edges_directed(idx, Direction::Outgoing)
            .map(|edge| edge.target())
            .collect();
        children.sort();
        children.into_iter().map(|child| &self.inner[child]).collect()
    }

    /// Streams sharing `path`'s parent, excluding `path` itself. Roots have
    /// no siblings.
    pub fn siblings(&self, path: &str) -> Vec<&StreamNode> {
        let Some(parent) = self.parent(path) else {
            return Vec::new();
        };
        self.children(&parent.path)
            .into_iter()
            .filter(|stream| stream.path != path)
            .collect()
    }

    /// Walk up from `path` to the first mainline stream or the first stream
    /// without a parent. Returns `None` when `path` is unknown or the walk
    /// runs into a cycle.
    pub fn mainline_ancestor(&self, path: &str) -> Option<&StreamNode> {
        let mut current = self.get(path)?;
        for _ in 0..=self.len() {
            if current.kind == StreamKind::Mainline {
                return Some(current);
            }
            match self.parent(&current.path) {
                Some(parent) => current = parent,
                None => return Some(current),
            }
        }
        warn!("cycle in stream hierarchy above {}", path);
        None
    }
}

impl Default for StreamTree {
    fn default() -> Self {
        Self::new()
    }
}
