//! Ratcliff-Obershelp ("gestalt") sequence matching.
//!
//! Finds the longest contiguous matching block, then recurses on the pieces
//! to either side. Elements flagged as junk never seed a match but may extend
//! one at its edges. When the second sequence has 200 or more elements, any
//! element occurring in more than 1% of it is treated as popular and is also
//! excluded from seeding.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Sequences at least this long get popular-element pruning.
const AUTOJUNK_MIN_LEN: usize = 200;

/// A matching block: `a[a..a+size] == b[b..b+size]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Match {
    pub a: usize,
    pub b: usize,
    pub size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpTag {
    Equal,
    Replace,
    Delete,
    Insert,
}

/// Instruction turning `a[a_start..a_end]` into `b[b_start..b_end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub tag: OpTag,
    pub a_start: usize,
    pub a_end: usize,
    pub b_start: usize,
    pub b_end: usize,
}

pub struct SequenceMatcher<'a, T: Eq + Hash> {
    a: &'a [T],
    b: &'a [T],
    is_junk: Option<fn(&T) -> bool>,
    b2j: HashMap<&'a T, Vec<usize>>,
    bjunk: HashSet<&'a T>,
    matching_blocks: Option<Vec<Match>>,
}

impl<'a, T: Eq + Hash> SequenceMatcher<'a, T> {
    pub fn new(a: &'a [T], b: &'a [T]) -> Self {
        Self::with_junk(None, a, b)
    }

    pub fn with_junk(is_junk: Option<fn(&T) -> bool>, a: &'a [T], b: &'a [T]) -> Self {
        let mut matcher = Self {
            a,
            b: &[],
            is_junk,
            b2j: HashMap::new(),
            bjunk: HashSet::new(),
            matching_blocks: None,
        };
        matcher.set_seq2(b);
        matcher
    }

    pub fn set_seq1(&mut self, a: &'a [T]) {
        self.a = a;
        self.matching_blocks = None;
    }

    pub fn set_seq2(&mut self, b: &'a [T]) {
        self.b = b;
        self.matching_blocks = None;
        self.chain_b();
    }

    fn chain_b(&mut self) {
        let b: &'a [T] = self.b;
        let mut b2j: HashMap<&'a T, Vec<usize>> = HashMap::new();
        for (j, elt) in b.iter().enumerate() {
            b2j.entry(elt).or_default().push(j);
        }

        let mut bjunk = HashSet::new();
        if let Some(is_junk) = self.is_junk {
            bjunk.extend(b2j.keys().copied().filter(|elt| is_junk(elt)));
            for elt in &bjunk {
                b2j.remove(elt);
            }
        }

        let n = b.len();
        if n >= AUTOJUNK_MIN_LEN {
            let ntest = n / 100 + 1;
            b2j.retain(|_, idxs| idxs.len() <= ntest);
        }

        self.b2j = b2j;
        self.bjunk = bjunk;
    }

    fn is_bjunk(&self, elt: &T) -> bool {
        self.bjunk.contains(elt)
    }

    /// Longest matching block in `a[alo..ahi]` and `b[blo..bhi]`.
    ///
    /// Ties go to the block starting earliest in `a`, then earliest in `b`.
    pub fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Match {
        let (a, b) = (self.a, self.b);
        let (mut besti, mut bestj, mut bestsize) = (alo, blo, 0usize);

        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for (i, elt) in a.iter().enumerate().take(ahi).skip(alo) {
            let mut new_j2len = HashMap::new();
            if let Some(indices) = self.b2j.get(elt) {
                for &j in indices {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    new_j2len.insert(j, k);
                    if k > bestsize {
                        besti = i + 1 - k;
                        bestj = j + 1 - k;
                        bestsize = k;
                    }
                }
            }
            j2len = new_j2len;
        }

        // Extend with equal non-junk elements, then soak up equal junk on both ends.
        while besti > alo
            && bestj > blo
            && !self.is_bjunk(&b[bestj - 1])
            && a[besti - 1] == b[bestj - 1]
        {
            besti -= 1;
            bestj -= 1;
            bestsize += 1;
        }
        while besti + bestsize < ahi
            && bestj + bestsize < bhi
            && !self.is_bjunk(&b[bestj + bestsize])
            && a[besti + bestsize] == b[bestj + bestsize]
        {
            bestsize += 1;
        }
        while besti > alo
            && bestj > blo
            && self.is_bjunk(&b[bestj - 1])
            && a[besti - 1] == b[bestj - 1]
        {
            besti -= 1;
            bestj -= 1;
            bestsize += 1;
        }
        while besti + bestsize < ahi
            && bestj + bestsize < bhi
            && self.is_bjunk(&b[bestj + bestsize])
            && a[besti + bestsize] == b[bestj + bestsize]
        {
            bestsize += 1;
        }

        Match {
            a: besti,
            b: bestj,
            size: bestsize,
        }
    }

    /// Non-adjacent matching blocks in increasing order, terminated by a
    /// zero-size sentinel at `(len(a), len(b))`.
    pub fn matching_blocks(&mut self) -> Vec<Match> {
        if let Some(blocks) = &self.matching_blocks {
            return blocks.clone();
        }

        let (la, lb) = (self.a.len(), self.b.len());
        let mut queue = vec![(0, la, 0, lb)];
        let mut blocks = Vec::new();
        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let m = self.find_longest_match(alo, ahi, blo, bhi);
            if m.size > 0 {
                blocks.push(m);
                if alo < m.a && blo < m.b {
                    queue.push((alo, m.a, blo, m.b));
                }
                if m.a + m.size < ahi && m.b + m.size < bhi {
                    queue.push((m.a + m.size, ahi, m.b + m.size, bhi));
                }
            }
        }
        blocks.sort();

        let mut collapsed = Vec::with_capacity(blocks.len() + 1);
        let mut current = Match { a: 0, b: 0, size: 0 };
        for m in blocks {
            if current.a + current.size == m.a && current.b + current.size == m.b {
                current.size += m.size;
            } else {
                if current.size > 0 {
                    collapsed.push(current);
                }
                current = m;
            }
        }
        if current.size > 0 {
            collapsed.push(current);
        }
        collapsed.push(Match { a: la, b: lb, size: 0 });

        self.matching_blocks = Some(collapsed.clone());
        collapsed
    }

    pub fn opcodes(&mut self) -> Vec<Opcode> {
        let (mut i, mut j) = (0, 0);
        let mut out = Vec::new();
        for m in self.matching_blocks() {
            let tag = if i < m.a && j < m.b {
                Some(OpTag::Replace)
            } else if i < m.a {
                Some(OpTag::Delete)
            } else if j < m.b {
                Some(OpTag::Insert)
            } else {
                None
            };
            if let Some(tag) = tag {
                out.push(Opcode {
                    tag,
                    a_start: i,
                    a_end: m.a,
                    b_start: j,
                    b_end: m.b,
                });
            }
            i = m.a + m.size;
            j = m.b + m.size;
            if m.size > 0 {
                out.push(Opcode {
                    tag: OpTag::Equal,
                    a_start: m.a,
                    a_end: i,
                    b_start: m.b,
                    b_end: j,
                });
            }
        }
        out
    }

    /// Similarity in `[0, 1]`: twice the matched elements over the total.
    pub fn ratio(&mut self) -> f64 {
        let matches: usize = self.matching_blocks().iter().map(|m| m.size).sum();
        calculate_ratio(matches, self.a.len() + self.b.len())
    }

    /// Upper bound on [`ratio`](Self::ratio) from element multisets.
    pub fn quick_ratio(&self) -> f64 {
        let mut full_b: HashMap<&T, isize> = HashMap::new();
        for elt in self.b {
            *full_b.entry(elt).or_insert(0) += 1;
        }
        let mut matches = 0;
        for elt in self.a {
            if let Some(avail) = full_b.get_mut(elt) {
                if *avail > 0 {
                    matches += 1;
                }
                *avail -= 1;
            }
        }
        calculate_ratio(matches, self.a.len() + self.b.len())
    }

    /// Cheapest upper bound on [`ratio`](Self::ratio), from lengths alone.
    pub fn real_quick_ratio(&self) -> f64 {
        let (la, lb) = (self.a.len(), self.b.len());
        calculate_ratio(la.min(lb), la + lb)
    }
}

fn calculate_ratio(matches: usize, length: usize) -> f64 {
    if length == 0 {
        1.0
    } else {
        2.0 * matches as f64 / length as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_longest_match_prefers_earliest() {
        let a = chars(" abcd");
        let b = chars("abcd abcd");
        let m = SequenceMatcher::new(&a, &b).find_longest_match(0, 5, 0, 9);
        assert_eq!(m, Match { a: 0, b: 4, size: 5 });
    }

    #[test]
    fn test_junk_does_not_seed_match() {
        let a = chars(" abcd");
        let b = chars("abcd abcd");
        let is_space: fn(&char) -> bool = |c| *c == ' ';
        let m = SequenceMatcher::with_junk(Some(is_space), &a, &b).find_longest_match(0, 5, 0, 9);
        assert_eq!(m, Match { a: 1, b: 0, size: 4 });
    }

    #[test]
    fn test_matching_blocks_with_sentinel() {
        let a = chars("abxcd");
        let b = chars("abcd");
        let blocks = SequenceMatcher::new(&a, &b).matching_blocks();
        assert_eq!(
            blocks,
            vec![
                Match { a: 0, b: 0, size: 2 },
                Match { a: 3, b: 2, size: 2 },
                Match { a: 5, b: 4, size: 0 },
            ]
        );
    }

    #[test]
    fn test_opcodes() {
        let a = chars("qabxcd");
        let b = chars("abycdf");
        let tags: Vec<OpTag> = SequenceMatcher::new(&a, &b)
            .opcodes()
            .iter()
            .map(|o| o.tag)
            .collect();
        assert_eq!(
            tags,
            vec![
                OpTag::Delete,
                OpTag::Equal,
                OpTag::Replace,
                OpTag::Equal,
                OpTag::Insert
            ]
        );
    }

    #[test]
    fn test_ratios() {
        let a = chars("abcd");
        let b = chars("bcde");
        let mut m = SequenceMatcher::new(&a, &b);
        assert!((m.ratio() - 0.75).abs() < 1e-9);
        assert!((m.quick_ratio() - 0.75).abs() < 1e-9);
        assert!((m.real_quick_ratio() - 1.0).abs() < 1e-9);

        let empty: Vec<char> = Vec::new();
        assert_eq!(SequenceMatcher::new(&empty, &empty).ratio(), 1.0);
    }

    #[test]
    fn test_popular_elements_pruned_for_long_sequences() {
        let b: Vec<u8> = std::iter::repeat(7).take(250).collect();
        let a = vec![1u8, 7, 7];
        let m = SequenceMatcher::new(&a, &b);
        // 7 appears in more than 1% of b, so it cannot seed a match.
        assert_eq!(m.find_longest_match(0, 3, 0, 250), Match { a: 0, b: 0, size: 0 });

        let short_b = vec![7u8; 10];
        let m = SequenceMatcher::new(&a, &short_b);
        assert_eq!(m.find_longest_match(0, 3, 0, 10), Match { a: 1, b: 0, size: 2 });
    }
}
