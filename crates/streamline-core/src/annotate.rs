//! Blame gutter grouping for annotate output

use serde::{Deserialize, Serialize};

use crate::model::{AnnotatedLine, ChangeNumber};

/// A run of consecutive lines last changed by the same changelist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationBlock {
    pub commit_number: ChangeNumber,
    pub author: String,
    pub date: String,
    pub start_line: u32,
    /// Inclusive.
    pub end_line: u32,
}

impl AnnotationBlock {
    pub fn line_count(&self) -> u32 {
        self.end_line - self.start_line + 1
    }
}

/// Collapse annotate lines into blocks. A gap in line numbers starts a new
/// block even when the changelist repeats.
pub fn group_annotations(lines: &[AnnotatedLine]) -> Vec<AnnotationBlock> {
    let mut blocks: Vec<AnnotationBlock> = Vec::new();

    for line in lines {
        if let Some(block) = blocks.last_mut() {
            if block.commit_number == line.commit_number && block.end_line + 1 == line.line_number {
                block.end_line = line.line_number;
                continue;
            }
        }
        blocks.push(AnnotationBlock {
            commit_number: line.commit_number,
            author: line.author.clone(),
            date: line.date.clone(),
            start_line: line.line_number,
            end_line: line.line_number,
        });
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(line_number: u32, commit_number: ChangeNumber) -> AnnotatedLine {
        AnnotatedLine {
            line_number,
            commit_number,
            author: format!("user{commit_number}"),
            date: "2024/03/01".to_string(),
            content: format!("line {line_number}"),
        }
    }

    #[test]
    fn consecutive_lines_merge() {
        let blocks = group_annotations(&[line(1, 10), line(2, 10), line(3, 12), line(4, 10)]);
        assert_eq!(blocks.len(), 3);
        assert_eq!((blocks[0].start_line, blocks[0].end_line), (1, 2));
        assert_eq!(blocks[0].line_count(), 2);
        assert_eq!(blocks[1].author, "user12");
        assert_eq!(blocks[2].commit_number, 10);
    }

    #[test]
    fn gaps_split_blocks() {
        let blocks = group_annotations(&[line(1, 7), line(5, 7)]);
        assert_eq!(blocks.len(), 2);
        assert!(group_annotations(&[]).is_empty());
    }
}
