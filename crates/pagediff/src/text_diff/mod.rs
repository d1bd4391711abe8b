//! Line-based text comparison and the views derived from it.
//!
//! All views work on the *tagged* lines only: removed, added and hint lines,
//! in diff order, with unchanged lines dropped. "Preceding" and "following"
//! always refer to neighbours in that tagged list.

pub mod differ;
pub mod matcher;

use serde::{Deserialize, Serialize};

pub use differ::{compare_lines, DiffLine, LineTag};
pub use matcher::SequenceMatcher;

use crate::types::TextDiffEntry;

/// Tagged lines split by kind, order preserved within each bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedDiff {
    pub removals: Vec<String>,
    pub additions: Vec<String>,
    /// Caret strings from hint lines.
    pub changes: Vec<String>,
}

impl DetailedDiff {
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.additions.is_empty() && self.changes.is_empty()
    }
}

/// Every view of a text comparison, ready to serialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextDiffReport {
    pub detailed: DetailedDiff,
    pub edits: Vec<TextDiffEntry>,
    pub additions: Vec<TextDiffEntry>,
    pub removals: Vec<TextDiffEntry>,
}

/// Result of diffing two text bodies.
#[derive(Debug, Clone)]
pub struct TextDiff {
    tagged: Vec<DiffLine>,
}

impl TextDiff {
    pub fn new<S: AsRef<str>>(base: &[S], test: &[S]) -> Self {
        let tagged: Vec<DiffLine> = compare_lines(base, test)
            .into_iter()
            .filter(|l| l.tag != LineTag::Equal)
            .collect();
        tracing::debug!("Text diff produced {} tagged lines", tagged.len());
        Self { tagged }
    }

    /// Diff two whole text bodies line by line.
    pub fn from_text(base: &str, test: &str) -> Self {
        Self::new(&split_lines(base), &split_lines(test))
    }

    pub fn is_identical(&self) -> bool {
        self.tagged.is_empty()
    }

    pub fn detailed(&self) -> DetailedDiff {
        let mut out = DetailedDiff::default();
        for line in &self.tagged {
            let bucket = match line.tag {
                LineTag::Removed => &mut out.removals,
                LineTag::Added => &mut out.additions,
                LineTag::Hint => &mut out.changes,
                LineTag::Equal => continue,
            };
            bucket.push(line.text.clone());
        }
        out
    }

    /// In-place edits: every hint line whose preceding tagged line is an
    /// addition yields that added text with the hint's carets.
    ///
    /// Hints that follow a removed line are not reported, so an edit whose
    /// only hint sits on the removed side (pure deletions within a line)
    /// surfaces in neither this view nor [`pure_additions`](Self::pure_additions).
    pub fn exact_edits(&self) -> Vec<TextDiffEntry> {
        self.tagged
            .iter()
            .enumerate()
            .filter(|(_, line)| line.tag == LineTag::Hint)
            .filter_map(|(i, hint)| {
                let prev = self.prev(i)?;
                (prev.tag == LineTag::Added).then(|| TextDiffEntry::Modification {
                    text: strip_newline(&prev.text).to_string(),
                    diff_markers: strip_newline(&hint.text).to_string(),
                })
            })
            .collect()
    }

    /// Added lines with no hint line on either side, marked `+` per character.
    pub fn pure_additions(&self) -> Vec<TextDiffEntry> {
        self.unhinted(LineTag::Added)
            .map(|text| TextDiffEntry::Addition {
                diff_markers: "+".repeat(text.chars().count()),
                text,
            })
            .collect()
    }

    /// Removed lines with no hint line on either side, marked `-` per character.
    pub fn pure_removals(&self) -> Vec<TextDiffEntry> {
        self.unhinted(LineTag::Removed)
            .map(|text| TextDiffEntry::Removal {
                diff_markers: "-".repeat(text.chars().count()),
                text,
            })
            .collect()
    }

    pub fn report(&self) -> TextDiffReport {
        TextDiffReport {
            detailed: self.detailed(),
            edits: self.exact_edits(),
            additions: self.pure_additions(),
            removals: self.pure_removals(),
        }
    }

    fn prev(&self, i: usize) -> Option<&DiffLine> {
        i.checked_sub(1).and_then(|p| self.tagged.get(p))
    }

    fn next(&self, i: usize) -> Option<&DiffLine> {
        self.tagged.get(i + 1)
    }

    fn is_hint(line: Option<&DiffLine>) -> bool {
        line.is_some_and(|l| l.tag == LineTag::Hint)
    }

    fn unhinted(&self, tag: LineTag) -> impl Iterator<Item = String> + '_ {
        self.tagged
            .iter()
            .enumerate()
            .filter(move |(i, line)| {
                line.tag == tag && !Self::is_hint(self.prev(*i)) && !Self::is_hint(self.next(*i))
            })
            .map(|(_, line)| strip_newline(&line.text).to_string())
    }
}

/// Split a text body into lines, accepting `\n` and `\r\n` endings.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

fn strip_newline(s: &str) -> &str {
    s.strip_suffix('\n')
        .map(|s| s.strip_suffix('\r').unwrap_or(s))
        .unwrap_or(s)
}
