//! Core data structures shared by the diff and history views

use serde::{Deserialize, Serialize};

/// Changelist number assigned by the backend.
pub type ChangeNumber = u64;

/// Discriminates what a rendered diff row represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffLineKind {
    /// `==== //depot/path#rev (type) ====` separator, kept verbatim.
    FileHeader,
    /// `@@ -a,b +c,d @@` header, kept verbatim.
    Hunk,
    /// Unchanged line, or a cosmetic edit demoted to context.
    Context,
    Add,
    Delete,
}

/// One visual row of a reconciled diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub kind: DiffLineKind,
    /// Line text with the leading directive character stripped.
    pub content: String,
    /// Old-side line number (Context and Delete only).
    #[serde(default)]
    pub old_line_number: Option<u32>,
    /// New-side line number (Context and Add only).
    #[serde(default)]
    pub new_line_number: Option<u32>,
}

impl DiffLine {
    pub fn file_header(content: impl Into<String>) -> Self {
        Self {
            kind: DiffLineKind::FileHeader,
            content: content.into(),
            old_line_number: None,
            new_line_number: None,
        }
    }

    pub fn hunk(content: impl Into<String>) -> Self {
        Self {
            kind: DiffLineKind::Hunk,
            content: content.into(),
            old_line_number: None,
            new_line_number: None,
        }
    }

    pub fn context(content: impl Into<String>, old: u32, new: u32) -> Self {
        Self {
            kind: DiffLineKind::Context,
            content: content.into(),
            old_line_number: Some(old),
            new_line_number: Some(new),
        }
    }

    pub fn add(content: impl Into<String>, new: u32) -> Self {
        Self {
            kind: DiffLineKind::Add,
            content: content.into(),
            old_line_number: None,
            new_line_number: Some(new),
        }
    }

    pub fn delete(content: impl Into<String>, old: u32) -> Self {
        Self {
            kind: DiffLineKind::Delete,
            content: content.into(),
            old_line_number: Some(old),
            new_line_number: None,
        }
    }
}

/// A submitted changelist as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub number: ChangeNumber,
    pub description: String,
    pub author: String,
    /// Submit time in Unix seconds. Commits without one sort last.
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Stream path this commit was fetched from.
    #[serde(default)]
    pub branch: Option<String>,
}

impl Commit {
    pub fn new(number: ChangeNumber, author: impl Into<String>) -> Self {
        Self {
            number,
            description: String::new(),
            author: author.into(),
            timestamp: None,
            branch: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// First line of the description, for one-line listings.
    pub fn summary(&self) -> &str {
        self.description.lines().next().unwrap_or("").trim()
    }
}

/// Categorical stream type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Mainline,
    Development,
    Release,
    Feature,
    Task,
    Hotfix,
    Virtual,
    Other,
}

impl StreamKind {
    /// Map the backend's stream type string. Unknown types become `Other`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mainline" => StreamKind::Mainline,
            "development" => StreamKind::Development,
            "release" => StreamKind::Release,
            "feature" => StreamKind::Feature,
            "task" => StreamKind::Task,
            "hotfix" => StreamKind::Hotfix,
            "virtual" => StreamKind::Virtual,
            _ => StreamKind::Other,
        }
    }
}

/// One stream in the depot hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamNode {
    pub path: String,
    pub display_name: String,
    /// `None` for root streams.
    #[serde(default)]
    pub parent_path: Option<String>,
    pub kind: StreamKind,
}

impl StreamNode {
    pub fn new(path: impl Into<String>, parent_path: Option<&str>, kind: StreamKind) -> Self {
        let path = path.into();
        let display_name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self {
            path,
            display_name,
            parent_path: parent_path.map(str::to_string),
            kind,
        }
    }
}

/// A visual column in the history graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lane {
    pub index: usize,
    /// `#rrggbb`.
    pub color: String,
    pub label: String,
    /// Stream path in topology mode, author in virtual mode.
    pub source_key: String,
    pub commit_count: usize,
}

/// Render-ready layout record for one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub commit: Commit,
    pub lane: usize,
    pub color: String,
    /// Lane of the row above, when it differs from `lane`.
    #[serde(default)]
    pub previous_lane: Option<usize>,
    /// Lane of the row below, when it differs from `lane`.
    #[serde(default)]
    pub next_lane: Option<usize>,
}

/// Result of lane assignment for one history snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LaneLayout {
    pub nodes: Vec<GraphNode>,
    pub lanes: Vec<Lane>,
    pub max_lane_index: usize,
    /// True when lanes group commits by author rather than by stream.
    pub is_virtual: bool,
}

/// A file touched by a changelist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub depot_path: String,
    pub action: String,
    pub revision: u32,
}

/// Output of `describe` for one changelist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelistDescription {
    pub info: Commit,
    #[serde(default)]
    pub files: Vec<ChangedFile>,
    /// Raw unified diff text; empty when no textual diff exists.
    #[serde(default)]
    pub diff_text: String,
}

/// One line of annotate output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedLine {
    pub line_number: u32,
    pub commit_number: ChangeNumber,
    pub author: String,
    pub date: String,
    pub content: String,
}

/// Output of `annotate` for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AnnotateResult {
    pub success: bool,
    #[serde(default)]
    pub lines: Vec<AnnotatedLine>,
    /// Failure reason when `success` is false.
    #[serde(default)]
    pub message: Option<String>,
}

impl AnnotateResult {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            lines: Vec::new(),
            message: Some(message.into()),
        }
    }
}
