//! Test utilities for Streamline

use crate::model::{Commit, DiffLine, DiffLineKind, StreamKind, StreamNode};
use crate::streams::StreamTree;

/// Commit with an author and nothing else.
pub fn commit(number: u64, author: &str) -> Commit {
    Commit::new(number, author)
}

/// Commit fetched from `branch` at `timestamp`.
pub fn tagged(number: u64, author: &str, branch: &str, timestamp: i64) -> Commit {
    Commit::new(number, author)
        .with_branch(branch)
        .with_timestamp(timestamp)
}

/// main ─┬─ dev ─┬─ feat-a
///       │       └─ feat-b
///       └─ rel1
pub fn sample_streams() -> Vec<StreamNode> {
    vec![
        StreamNode::new("//depot/main", None, StreamKind::Mainline),
        StreamNode::new("//depot/dev", Some("//depot/main"), StreamKind::Development),
        StreamNode::new("//depot/rel1", Some("//depot/main"), StreamKind::Release),
        StreamNode::new("//depot/feat-a", Some("//depot/dev"), StreamKind::Feature),
        StreamNode::new("//depot/feat-b", Some("//depot/dev"), StreamKind::Feature),
    ]
}

pub fn sample_tree() -> StreamTree {
    StreamTree::from_streams(sample_streams())
}

/// One row per line: `kind old/new content`, `-` for absent numbers.
pub fn render(lines: &[DiffLine]) -> String {
    lines
        .iter()
        .map(|line| {
            let kind = match line.kind {
                DiffLineKind::FileHeader => "file",
                DiffLineKind::Hunk => "hunk",
                DiffLineKind::Context => "ctx",
                DiffLineKind::Add => "add",
                DiffLineKind::Delete => "del",
            };
            let number = |n: Option<u32>| n.map_or_else(|| "-".to_string(), |n| n.to_string());
            format!(
                "{kind} {}/{} {}",
                number(line.old_line_number),
                number(line.new_line_number),
                line.content
            )
            .trim_end()
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
