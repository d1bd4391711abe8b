//! Line diff with intra-line change hints.
//!
//! Lines are aligned with [`SequenceMatcher`]. Inside a replaced block the
//! most similar pair of lines (character ratio at least 0.75) is treated as
//! an in-place edit and followed by `?` hint lines whose carets point at the
//! changed characters. Everything else in the block is a plain delete or
//! insert.

use serde::{Deserialize, Serialize};

use super::matcher::{OpTag, SequenceMatcher};

/// Best ratio must beat this to count as an edit.
const EDIT_CUTOFF: f64 = 0.75;
/// Search starts just below the cutoff.
const EDIT_SEARCH_FLOOR: f64 = 0.74;

/// How a line of diff output relates to the two inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineTag {
    Equal,
    Removed,
    Added,
    /// Caret line describing the line just above it.
    Hint,
}

impl LineTag {
    pub fn prefix(self) -> &'static str {
        match self {
            LineTag::Equal => "  ",
            LineTag::Removed => "- ",
            LineTag::Added => "+ ",
            LineTag::Hint => "? ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub tag: LineTag,
    pub text: String,
}

impl DiffLine {
    fn new(tag: LineTag, text: impl Into<String>) -> Self {
        Self {
            tag,
            text: text.into(),
        }
    }
}

impl std::fmt::Display for DiffLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.tag.prefix(), self.text)
    }
}

/// Diff two line sequences.
pub fn compare_lines<S: AsRef<str>>(a: &[S], b: &[S]) -> Vec<DiffLine> {
    let a: Vec<&str> = a.iter().map(AsRef::as_ref).collect();
    let b: Vec<&str> = b.iter().map(AsRef::as_ref).collect();
    let mut differ = Differ::new(&a, &b);

    let opcodes = SequenceMatcher::new(&a, &b).opcodes();
    for op in opcodes {
        match op.tag {
            OpTag::Replace => differ.fancy_replace(op.a_start, op.a_end, op.b_start, op.b_end),
            OpTag::Delete => differ.dump_a(LineTag::Removed, op.a_start, op.a_end),
            OpTag::Insert => differ.dump_b(LineTag::Added, op.b_start, op.b_end),
            OpTag::Equal => differ.dump_a(LineTag::Equal, op.a_start, op.a_end),
        }
    }
    differ.out
}

struct Differ<'s> {
    a: &'s [&'s str],
    b: &'s [&'s str],
    a_chars: Vec<Vec<char>>,
    b_chars: Vec<Vec<char>>,
    out: Vec<DiffLine>,
}

impl<'s> Differ<'s> {
    fn new(a: &'s [&'s str], b: &'s [&'s str]) -> Self {
        Self {
            a,
            b,
            a_chars: a.iter().map(|l| l.chars().collect()).collect(),
            b_chars: b.iter().map(|l| l.chars().collect()).collect(),
            out: Vec::new(),
        }
    }

    fn dump_a(&mut self, tag: LineTag, lo: usize, hi: usize) {
        for line in &self.a[lo..hi] {
            self.out.push(DiffLine::new(tag, *line));
        }
    }

    fn dump_b(&mut self, tag: LineTag, lo: usize, hi: usize) {
        for line in &self.b[lo..hi] {
            self.out.push(DiffLine::new(tag, *line));
        }
    }

    fn plain_replace(&mut self, alo: usize, ahi: usize, blo: usize, bhi: usize) {
        if bhi - blo < ahi - alo {
            self.dump_b(LineTag::Added, blo, bhi);
            self.dump_a(LineTag::Removed, alo, ahi);
        } else {
            self.dump_a(LineTag::Removed, alo, ahi);
            self.dump_b(LineTag::Added, blo, bhi);
        }
    }

    fn fancy_replace(&mut self, alo: usize, ahi: usize, blo: usize, bhi: usize) {
        let mut best_ratio = EDIT_SEARCH_FLOOR;
        let (mut best_i, mut best_j) = (alo, blo);
        let mut identical: Option<(usize, usize)> = None;

        for j in blo..bhi {
            let b_line: &[char] = &self.b_chars[j];
            let mut cruncher = SequenceMatcher::new(&[], b_line);
            for i in alo..ahi {
                if self.a[i] == self.b[j] {
                    identical.get_or_insert((i, j));
                    continue;
                }
                cruncher.set_seq1(&self.a_chars[i]);
                if cruncher.real_quick_ratio() > best_ratio
                    && cruncher.quick_ratio() > best_ratio
                    && cruncher.ratio() > best_ratio
                {
                    best_ratio = cruncher.ratio();
                    best_i = i;
                    best_j = j;
                }
            }
        }

        let edited = if best_ratio < EDIT_CUTOFF {
            match identical {
                Some((i, j)) => {
                    best_i = i;
                    best_j = j;
                    false
                }
                None => {
                    self.plain_replace(alo, ahi, blo, bhi);
                    return;
                }
            }
        } else {
            true
        };

        self.fancy_helper(alo, best_i, blo, best_j);

        if edited {
            let (atags, btags) = self.caret_tags(best_i, best_j);
            self.qformat(best_i, best_j, &atags, &btags);
        } else {
            self.out.push(DiffLine::new(LineTag::Equal, self.a[best_i]));
        }

        self.fancy_helper(best_i + 1, ahi, best_j + 1, bhi);
    }

    fn fancy_helper(&mut self, alo: usize, ahi: usize, blo: usize, bhi: usize) {
        if alo < ahi {
            if blo < bhi {
                self.fancy_replace(alo, ahi, blo, bhi);
            } else {
                self.dump_a(LineTag::Removed, alo, ahi);
            }
        } else if blo < bhi {
            self.dump_b(LineTag::Added, blo, bhi);
        }
    }

    /// Per-character markers for an edited pair of lines.
    fn caret_tags(&self, i: usize, j: usize) -> (String, String) {
        let mut cruncher = SequenceMatcher::new(&self.a_chars[i], &self.b_chars[j]);
        let mut atags = String::new();
        let mut btags = String::new();
        for op in cruncher.opcodes() {
            let la = op.a_end - op.a_start;
            let lb = op.b_end - op.b_start;
            match op.tag {
                OpTag::Replace => {
                    atags.extend(std::iter::repeat('^').take(la));
                    btags.extend(std::iter::repeat('^').take(lb));
                }
                OpTag::Delete => atags.extend(std::iter::repeat('-').take(la)),
                OpTag::Insert => btags.extend(std::iter::repeat('+').take(lb)),
                OpTag::Equal => {
                    atags.extend(std::iter::repeat(' ').take(la));
                    btags.extend(std::iter::repeat(' ').take(lb));
                }
            }
        }
        (atags, btags)
    }

    fn qformat(&mut self, i: usize, j: usize, atags: &str, btags: &str) {
        let atags = keep_original_ws(&self.a_chars[i], atags);
        let btags = keep_original_ws(&self.b_chars[j], btags);

        self.out.push(DiffLine::new(LineTag::Removed, self.a[i]));
        if !atags.is_empty() {
            self.out.push(DiffLine::new(LineTag::Hint, atags));
        }
        self.out.push(DiffLine::new(LineTag::Added, self.b[j]));
        if !btags.is_empty() {
            self.out.push(DiffLine::new(LineTag::Hint, btags));
        }
    }
}

/// Copy whitespace from the line into unchanged marker positions so tabs
/// keep carets aligned, then trim trailing blanks.
fn keep_original_ws(line: &[char], tags: &str) -> String {
    let merged: String = line
        .iter()
        .zip(tags.chars())
        .map(|(&c, t)| if t == ' ' && c.is_whitespace() { c } else { t })
        .collect();
    merged.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(lines: &[DiffLine]) -> Vec<String> {
        lines.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_identical_inputs_are_all_equal() {
        let a = ["one", "two", "three"];
        let out = compare_lines(&a, &a);
        assert!(out.iter().all(|l| l.tag == LineTag::Equal));
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_unrelated_replacement_is_plain() {
        let out = compare_lines(&["a", "b", "c"], &["a", "x", "c"]);
        assert_eq!(render(&out), vec!["  a", "- b", "+ x", "  c"]);
    }

    #[test]
    fn test_similar_line_gets_caret_hints() {
        let out = compare_lines(&["hello world"], &["hello worle"]);
        assert_eq!(
            render(&out),
            vec![
                "- hello world",
                "?           ^",
                "+ hello worle",
                "?           ^",
            ]
        );
    }

    #[test]
    fn test_insertion_hint_only_on_added_side() {
        let out = compare_lines(&["the cat sat"], &["the fat cat sat"]);
        let tags: Vec<LineTag> = out.iter().map(|l| l.tag).collect();
        assert_eq!(tags, vec![LineTag::Removed, LineTag::Added, LineTag::Hint]);
        assert_eq!(out[2].text, "    ++++");
    }

    #[test]
    fn test_deletion_hint_only_on_removed_side() {
        let out = compare_lines(&["abcdefgh"], &["abcdgh"]);
        let tags: Vec<LineTag> = out.iter().map(|l| l.tag).collect();
        assert_eq!(tags, vec![LineTag::Removed, LineTag::Hint, LineTag::Added]);
        assert_eq!(out[1].text, "    --");
    }

    #[test]
    fn test_pure_insert_and_delete() {
        let out = compare_lines(&["a", "b"], &["a", "b", "c"]);
        assert_eq!(render(&out), vec!["  a", "  b", "+ c"]);
        let out = compare_lines(&["a", "b", "c"], &["a", "c"]);
        assert_eq!(render(&out), vec!["  a", "- b", "  c"]);
    }

    #[test]
    fn test_word_swap_is_an_edit() {
        // Spaces are ordinary characters, so the shared " cat sat" tail anchors the match.
        let out = compare_lines(&["the fat cat sat"], &["the cat cat sat"]);
        assert_eq!(
            render(&out),
            vec![
                "- the fat cat sat",
                "?     ^",
                "+ the cat cat sat",
                "?     ^",
            ]
        );
    }

    #[test]
    fn test_shorter_side_first_in_plain_replace() {
        let out = compare_lines(&["p", "q", "r"], &["zzz"]);
        assert_eq!(render(&out), vec!["+ zzz", "- p", "- q", "- r"]);
    }
}
