//! Reconciliation of raw backend diff text into render-ready rows

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DiffConfig;
use crate::model::{DiffLine, DiffLineKind};
use crate::pairing::{classify, is_brace_only, LineClass, LinePairing};

static HUNK_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").expect("hunk header pattern")
});

static FILE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^==== (\S+?)#(\d+)(?: \(([^)]*)\))?").expect("file header pattern")
});

/// Line ranges declared by a hunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HunkRange {
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
}

impl HunkRange {
    /// Parse `@@ -a[,b] +c[,d] @@`. Omitted counts default to 1.
    pub fn parse(line: &str) -> Option<Self> {
        let caps = HUNK_HEADER.captures(line)?;
        let number = |idx: usize, default: u32| -> Option<u32> {
            match caps.get(idx) {
                Some(m) => m.as_str().parse().ok(),
                None => Some(default),
            }
        };
        Some(HunkRange {
            old_start: number(1, 0)?,
            old_count: number(2, 1)?,
            new_start: number(3, 0)?,
            new_count: number(4, 1)?,
        })
    }
}

/// Counts over one reconciled diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DiffStats {
    pub files: u32,
    pub hunks: u32,
    pub additions: u32,
    pub deletions: u32,
    /// Removed/added lines hidden as cosmetic churn.
    pub suppressed: u32,
}

/// Line counters of one hunk once all of its rows were consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HunkCounters {
    /// `None` when the header did not parse and the counters carried over.
    pub range: Option<HunkRange>,
    /// Old-side number the next old line would get.
    pub next_old: u32,
    /// New-side number the next new line would get.
    pub next_new: u32,
}

/// Reconciled rows plus their statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ReconciledDiff {
    pub lines: Vec<DiffLine>,
    pub stats: DiffStats,
    pub hunks: Vec<HunkCounters>,
}

/// Turns raw diff text into classified rows, demoting cosmetic edits.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffReconciler {
    pairing: LinePairing,
}

impl DiffReconciler {
    pub fn new(config: &DiffConfig) -> Self {
        DiffReconciler {
            pairing: LinePairing::new(config.pairing_window),
        }
    }

    /// Classify every row of `text`. Empty input yields no rows.
    pub fn reconcile(&self, text: &str) -> Vec<DiffLine> {
        self.reconcile_detailed(text).lines
    }

    pub fn reconcile_detailed(&self, text: &str) -> ReconciledDiff {
        let mut result = ReconciledDiff::default();
        if text.trim().is_empty() {
            return result;
        }

        let raw: Vec<&str> = text.lines().collect();
        let classes: Vec<LineClass<'_>> = raw.iter().map(|line| classify(line)).collect();
        let paired = self.pairing.pair_classified(&classes);

        let lines = &mut result.lines;
        let stats = &mut result.stats;
        let hunks = &mut result.hunks;
        let mut old = 0u32;
        let mut new = 0u32;
        let mut in_hunk = false;

        for (index, class) in classes.iter().enumerate() {
            match *class {
                LineClass::Banner | LineClass::Other => {}
                LineClass::FileHeader => {
                    lines.push(DiffLine::file_header(raw[index]));
                    stats.files += 1;
                    in_hunk = false;
                }
                LineClass::HunkHeader => {
                    let range = HunkRange::parse(raw[index]);
                    match range {
                        Some(range) => {
                            old = range.old_start;
                            new = range.new_start;
                        }
                        None => debug!("keeping counters across malformed hunk header: {}", raw[index]),
                    }
                    hunks.push(HunkCounters {
                        range,
                        next_old: old,
                        next_new: new,
                    });
                    lines.push(DiffLine::hunk(raw[index]));
                    stats.hunks += 1;
                    in_hunk = true;
                }
                _ if !in_hunk => {}
                LineClass::Context(content) => {
                    lines.push(DiffLine::context(content, old, new));
                    old = old.saturating_add(1);
                    new = new.saturating_add(1);
                    sync_counters(hunks, old, new);
                }
                LineClass::Removed(content) => {
                    if paired.partner(index).is_some() {
                        // The partner's new-side line is counted here.
                        lines.push(DiffLine::context(content, old, new));
                        new = new.saturating_add(1);
                        stats.suppressed += 1;
                    } else if is_brace_only(content) {
                        stats.suppressed += 1;
                    } else {
                        lines.push(DiffLine::delete(content, old));
                        stats.deletions += 1;
                    }
                    old = old.saturating_add(1);
                    sync_counters(hunks, old, new);
                }
                LineClass::Added(content) => {
                    if paired.is_paired_plus(index) {
                        stats.suppressed += 1;
                        continue;
                    }
                    if is_brace_only(content) {
                        stats.suppressed += 1;
                    } else {
                        lines.push(DiffLine::add(content, new));
                        stats.additions += 1;
                    }
                    new = new.saturating_add(1);
                    sync_counters(hunks, old, new);
                }
            }
        }

        debug!(
            rows = result.lines.len(),
            pairs = paired.len(),
            suppressed = result.stats.suppressed,
            "reconciled diff"
        );
        result
    }
}

/// Reconcile with the default pairing window.
pub fn reconcile(text: &str) -> Vec<DiffLine> {
    DiffReconciler::default().reconcile(text)
}

fn sync_counters(hunks: &mut [HunkCounters], old: u32, new: u32) {
    if let Some(hunk) = hunks.last_mut() {
        hunk.next_old = old;
        hunk.next_new = new;
    }
}

/// Parsed `==== //depot/path#rev (type) ====` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHeaderInfo {
    pub depot_path: String,
    pub revision: u32,
    #[serde(default)]
    pub file_type: Option<String>,
}

impl FileHeaderInfo {
    pub fn parse(line: &str) -> Option<Self> {
        let caps = FILE_HEADER.captures(line)?;
        Some(FileHeaderInfo {
            depot_path: caps.get(1)?.as_str().to_string(),
            revision: caps.get(2)?.as_str().parse().ok()?,
            file_type: caps.get(3).map(|m| m.as_str().to_string()),
        })
    }
}

/// The rows belonging to one file of a multi-file diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSection {
    /// `None` for rows before the first file header or when the header is
    /// not in the expected shape.
    pub header: Option<FileHeaderInfo>,
    pub lines: Vec<DiffLine>,
}

/// Split reconciled rows at file headers.
pub fn split_files(lines: &[DiffLine]) -> Vec<FileSection> {
    let mut sections: Vec<FileSection> = Vec::new();

    for line in lines {
        if line.kind == DiffLineKind::FileHeader {
            sections.push(FileSection {
                header: FileHeaderInfo::parse(&line.content),
                lines: vec![line.clone()],
            });
            continue;
        }
        match sections.last_mut() {
            Some(section) => section.lines.push(line.clone()),
            None => sections.push(FileSection {
                header: None,
                lines: vec![line.clone()],
            }),
        }
    }

    sections
}
