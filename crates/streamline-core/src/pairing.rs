//! Detection of cosmetic removed/added line pairs inside a hunk
//!
//! Two heuristics decide that a `-` line and a `+` line carry the same
//! content and should be rendered as context:
//!
//! - brace-only lines (`}`, `)]`, `{`) removed and re-added anywhere later
//!   in the same hunk, matched FIFO by trimmed text
//! - a removed line whose text reappears, modulo trailing whitespace, in the
//!   same contiguous `+`/`-` run within a bounded lookahead window
//!
//! All pairing state is dropped at hunk headers, file headers and the
//! `Differences ...` banner, so a pair never spans two hunks or two files.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

/// Default lookahead for equivalent-content pairing.
pub const DEFAULT_PAIRING_WINDOW: usize = 12;

pub(crate) const HUNK_PREFIX: &str = "@@";
pub(crate) const FILE_HEADER_PREFIX: &str = "====";
pub(crate) const BANNER_PREFIX: &str = "Differences";

const BRACES: &[char] = &['{', '}', '(', ')', '[', ']'];

/// Structural role of one raw diff line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineClass<'a> {
    Banner,
    FileHeader,
    HunkHeader,
    Context(&'a str),
    Removed(&'a str),
    Added(&'a str),
    Other,
}

impl LineClass<'_> {
    fn is_boundary(&self) -> bool {
        matches!(
            self,
            LineClass::Banner | LineClass::FileHeader | LineClass::HunkHeader
        )
    }
}

pub(crate) fn classify(line: &str) -> LineClass<'_> {
    if line.starts_with(BANNER_PREFIX) {
        LineClass::Banner
    } else if line.starts_with(FILE_HEADER_PREFIX) {
        LineClass::FileHeader
    } else if line.starts_with(HUNK_PREFIX) {
        LineClass::HunkHeader
    } else if let Some(rest) = line.strip_prefix(' ') {
        LineClass::Context(rest)
    } else if let Some(rest) = line.strip_prefix('-') {
        LineClass::Removed(rest)
    } else if let Some(rest) = line.strip_prefix('+') {
        LineClass::Added(rest)
    } else {
        LineClass::Other
    }
}

/// True when the line holds at least one brace and nothing but braces and
/// whitespace.
pub fn is_brace_only(content: &str) -> bool {
    let trimmed = content.trim();
    !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_whitespace() || BRACES.contains(&c))
}

/// Removed and added text that differ only in trailing whitespace, or
/// brace-only lines that differ only in indentation.
pub fn is_equivalent(removed: &str, added: &str) -> bool {
    removed.trim_end() == added.trim_end()
        || (is_brace_only(removed) && is_brace_only(added) && removed.trim() == added.trim())
}

/// Indices of paired lines, keyed by their position in the raw diff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairedLines {
    minus_to_plus: BTreeMap<usize, usize>,
    plus: HashSet<usize>,
}

impl PairedLines {
    fn insert(&mut self, minus: usize, plus: usize) {
        self.minus_to_plus.insert(minus, plus);
        self.plus.insert(plus);
    }

    pub fn is_paired_minus(&self, index: usize) -> bool {
        self.minus_to_plus.contains_key(&index)
    }

    pub fn is_paired_plus(&self, index: usize) -> bool {
        self.plus.contains(&index)
    }

    /// The added line paired with the removed line at `minus`.
    pub fn partner(&self, minus: usize) -> Option<usize> {
        self.minus_to_plus.get(&minus).copied()
    }

    /// Paired removed-line indices in ascending order.
    pub fn paired_minus(&self) -> impl Iterator<Item = usize> + '_ {
        self.minus_to_plus.keys().copied()
    }

    /// Paired added-line indices in ascending order.
    pub fn paired_plus(&self) -> Vec<usize> {
        let mut plus: Vec<usize> = self.plus.iter().copied().collect();
        plus.sort_unstable();
        plus
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.minus_to_plus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.minus_to_plus.is_empty()
    }
}

/// Finds cosmetic pairs in raw diff text.
#[derive(Debug, Clone, Copy)]
pub struct LinePairing {
    window: usize,
}

impl LinePairing {
    pub fn new(window: usize) -> Self {
        LinePairing { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Pair the raw lines of a diff. Indices refer to positions in `lines`.
    pub fn pair(&self, lines: &[&str]) -> PairedLines {
        let classes: Vec<LineClass<'_>> = lines.iter().map(|line| classify(line)).collect();
        self.pair_classified(&classes)
    }

    pub(crate) fn pair_classified(&self, classes: &[LineClass<'_>]) -> PairedLines {
        let mut paired = PairedLines::default();
        pair_braces(classes, &mut paired);
        self.pair_equivalent(classes, &mut paired);
        paired
    }

    fn pair_equivalent(&self, classes: &[LineClass<'_>], paired: &mut PairedLines) {
        for (index, class) in classes.iter().enumerate() {
            let LineClass::Removed(removed) = *class else {
                continue;
            };
            if removed.trim().is_empty() || paired.is_paired_minus(index) {
                continue;
            }

            let end = (index + self.window).min(classes.len().saturating_sub(1));
            for candidate in index + 1..=end {
                match classes[candidate] {
                    LineClass::Removed(_) => {}
                    LineClass::Added(added) => {
                        if !paired.is_paired_plus(candidate) && is_equivalent(removed, added) {
                            paired.insert(index, candidate);
                            break;
                        }
                    }
                    // context or a boundary ends the change run
                    _ => break,
                }
            }
        }
    }
}

impl Default for LinePairing {
    fn default() -> Self {
        Self::new(DEFAULT_PAIRING_WINDOW)
    }
}

fn pair_braces<'a>(classes: &[LineClass<'a>], paired: &mut PairedLines) {
    let mut pending: HashMap<&'a str, VecDeque<usize>> = HashMap::new();

    for (index, class) in classes.iter().enumerate() {
        match *class {
            class if class.is_boundary() => pending.clear(),
            LineClass::Removed(content) if is_brace_only(content) => {
                pending.entry(content.trim()).or_default().push_back(index);
            }
            LineClass::Added(content) if is_brace_only(content) => {
                if let Some(minus) = pending
                    .get_mut(content.trim())
                    .and_then(VecDeque::pop_front)
                {
                    paired.insert(minus, index);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(text: &str) -> PairedLines {
        let lines: Vec<&str> = text.lines().collect();
        LinePairing::default().pair(&lines)
    }

    #[test]
    fn brace_detection() {
        assert!(is_brace_only("  }"));
        assert!(is_brace_only("\t})\r"));
        assert!(is_brace_only("] }"));
        assert!(!is_brace_only(""));
        assert!(!is_brace_only("   "));
        assert!(!is_brace_only("};"));
        assert!(!is_brace_only("} else {"));
    }

    #[test]
    fn moved_closing_brace_is_paired() {
        let paired = pair("@@ -1,4 +1,4 @@\n-  }\n foo();\n bar();\n+  }\n");
        assert_eq!(paired.partner(1), Some(4));
        assert!(paired.is_paired_plus(4));
    }

    #[test]
    fn brace_pairs_match_in_fifo_order() {
        let paired = pair("@@ -1,4 +1,4 @@\n-}\n-  }\n x\n+}\n+}\n");
        // both removed lines trim to "}"; the first removed pairs first
        assert_eq!(paired.partner(1), Some(4));
        assert_eq!(paired.partner(2), Some(5));
    }

    #[test]
    fn reindented_brace_is_paired() {
        let paired = pair("@@ -1,2 +1,2 @@\n-    }\n+}\n");
        assert_eq!(paired.partner(1), Some(2));
    }

    #[test]
    fn trailing_whitespace_edit_is_paired() {
        let paired = pair("@@ -3,2 +3,2 @@\n-let x = 1;   \r\n-old\n+let x = 1;\n+new\n");
        assert_eq!(paired.partner(1), Some(3));
        assert!(!paired.is_paired_minus(2));
        assert!(!paired.is_paired_plus(4));
    }

    #[test]
    fn leading_whitespace_change_is_a_real_change() {
        let paired = pair("@@ -1,1 +1,1 @@\n-foo()\n+    foo()\n");
        assert!(paired.is_empty());
    }

    #[test]
    fn equivalent_scan_stops_at_context() {
        let paired = pair("@@ -1,3 +1,3 @@\n-value\n ctx\n+value\n");
        assert!(paired.is_empty());
    }

    #[test]
    fn equivalent_scan_respects_window() {
        let mut text = String::from("@@ -1,20 +1,20 @@\n-target\n");
        for n in 0..12 {
            text.push_str(&format!("-filler {n}\n"));
        }
        text.push_str("+target\n");

        assert!(pair(&text).is_empty());

        let lines: Vec<&str> = text.lines().collect();
        let wide = LinePairing::new(13).pair(&lines);
        assert_eq!(wide.partner(1), Some(14));
    }

    #[test]
    fn added_line_pairs_only_once() {
        let paired = pair("@@ -1,2 +1,1 @@\n-same\n-same\n+same\n");
        assert_eq!(paired.len(), 1);
        assert_eq!(paired.partner(1), Some(3));
        assert!(!paired.is_paired_minus(2));
    }

    #[test]
    fn pairing_never_crosses_hunks() {
        let paired = pair("@@ -1,1 +1,0 @@\n-  }\n@@ -9,0 +8,1 @@\n+  }\n");
        assert!(paired.is_empty());
    }

    #[test]
    fn pairing_never_crosses_files() {
        let text = "==== //depot/a.c#2 (text) ====\n@@ -1,1 +1,0 @@\n-}\n==== //depot/b.c#4 (text) ====\n@@ -1,0 +1,1 @@\n+}\n";
        assert!(pair(text).is_empty());
    }

    #[test]
    fn blank_removed_lines_are_not_paired() {
        let paired = pair("@@ -1,2 +1,2 @@\n-   \n+\n");
        assert!(paired.is_empty());
    }
}
