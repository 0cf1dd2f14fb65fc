//! Approximate substring matching between request-derived parameters and
//! content a document is about to execute or load.
//!
//! Matching runs in two stages: a near-linear character-frequency prefilter
//! ([`fast_match`]'s sliding window) proposes short candidate regions, and a
//! full dynamic-programming aligner ([`align`]) computes minimum-cost
//! alignments and their edit scripts inside each region. The prefilter is a
//! lower bound, not an exact test; regions it rejects are skipped without
//! running the quadratic alignment, and its rare false negatives are an
//! accepted trade for speed.

pub mod cost;

mod align;

use std::collections::HashMap;

use tracing::debug;

use crate::matcher::align::align;
use crate::matcher::cost::{deletion_cost, insertion_cost, normalize_char, MAX_DIST};

/// A single edit operation in the alignment script.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOp {
    /// Characters match (case-insensitive ASCII equality).
    Keep,
    /// Pattern character replaced by a text character.
    Subst,
    /// Pattern character absent from the text.
    Delete,
    /// Text character absent from the pattern.
    Insert,
}

/// One accepted match: its edit cost, the matched `[beg, end)` span, and the
/// edit script that produced it.
#[derive(Clone, Debug)]
pub struct MatchElem {
    pub dist: i32,
    pub beg: usize,
    pub end: usize,
    pub ops: Vec<EditOp>,
}

impl PartialEq for MatchElem {
    // The edit script is a byproduct; two matches covering the same span at
    // the same cost are the same match.
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist && self.beg == other.beg && self.end == other.end
    }
}

/// The set of matches accepted across all windows of one matcher invocation.
#[derive(Clone, Debug)]
pub struct MatchResult {
    /// Absolute cost ceiling, fixed lazily from the pattern's total deletion
    /// cost on the first alignment. Negative until then.
    pub(crate) cost_thresh: i32,
    /// Best cost observed so far, shared across windows so later windows can
    /// evict earlier, worse matches.
    pub(crate) best_dist: i32,
    pub(crate) elems: Vec<MatchElem>,
}

impl MatchResult {
    pub fn new() -> MatchResult {
        MatchResult {
            cost_thresh: -1,
            best_dist: MAX_DIST,
            elems: Vec::new(),
        }
    }

    pub fn has_matches(&self) -> bool {
        !self.elems.is_empty()
    }

    pub fn elems(&self) -> &[MatchElem] {
        &self.elems
    }

    pub fn best_dist(&self) -> i32 {
        self.best_dist
    }

    /// Drop matches over the cost ceiling or shorter than `min_len`.
    pub fn clear_invalid(&mut self, min_len: usize) {
        let cost_thresh = self.cost_thresh;
        self.elems
            .retain(|m| m.dist <= cost_thresh && m.end - m.beg >= min_len);
    }
}

impl Default for MatchResult {
    fn default() -> Self {
        MatchResult::new()
    }
}

/// Signed per-character count difference between the pattern and the current
/// text window. ASCII characters take the array fast path; everything else
/// goes through the map.
struct DiffVector {
    ascii: [i32; 128],
    other: HashMap<char, i32>,
}

impl DiffVector {
    fn new() -> DiffVector {
        DiffVector {
            ascii: [0; 128],
            other: HashMap::new(),
        }
    }

    fn get(&self, c: char) -> i32 {
        if c.is_ascii() {
            self.ascii[c as usize]
        } else {
            self.other.get(&c).copied().unwrap_or(0)
        }
    }

    fn set(&mut self, c: char, val: i32) {
        if c.is_ascii() {
            self.ascii[c as usize] = val;
        } else {
            self.other.insert(c, val);
        }
    }
}

/// Account for `c` entering the window on the text side.
#[inline]
fn adjust_diff_ins(c: char, vec: &mut DiffVector, idiff: &mut i32, ddiff: &mut i32) {
    if vec.get(c) > 0 {
        // an excess of c on the pattern side, now reduced
        *ddiff -= deletion_cost(c);
    } else {
        // an excess of c on the text side, now increased
        *idiff += insertion_cost(c);
    }
    vec.set(c, vec.get(c) - 1);
}

/// Account for `c` leaving the window (or being counted for the pattern).
#[inline]
fn adjust_diff_del(c: char, vec: &mut DiffVector, idiff: &mut i32, ddiff: &mut i32) {
    if vec.get(c) >= 0 {
        *ddiff += deletion_cost(c);
    } else {
        *idiff -= insertion_cost(c);
    }
    vec.set(c, vec.get(c) + 1);
}

/// Find approximate occurrences of `p` inside `s`; match spans are reported
/// in `s`'s (character) coordinates.
///
/// A |p|-sized window slides over `s` maintaining per-character excess
/// counts; the cheaper of the insertion-side and deletion-side excess costs
/// is a lower bound on the window's edit cost, and only windows under the
/// relative threshold (widened by one character on each side) are handed to
/// the aligner. An empty pattern, or a pattern longer than the text, yields
/// no matches.
pub fn fast_match(p: &str, s: &str, dist_threshold: f64) -> MatchResult {
    let p: Vec<char> = p.chars().collect();
    let s: Vec<char> = s.chars().collect();
    let plen = p.len();
    let slen = s.len();

    let mut mres = MatchResult::new();
    if plen == 0 {
        return mres;
    }
    if plen > slen {
        debug!(
            pattern_len = plen,
            text_len = slen,
            "pattern longer than text, skipping match"
        );
        return mres;
    }

    let mut vec = DiffVector::new();
    let mut idiff: i32 = 0;
    let mut ddiff: i32 = 0;

    for &c in &p {
        adjust_diff_del(normalize_char(c), &mut vec, &mut idiff, &mut ddiff);
    }
    // At this point ddiff is the full deletion cost of p.
    let diff_thresh = (f64::from(ddiff) * dist_threshold).floor() as i32;

    for &c in &s[..plen] {
        adjust_diff_ins(normalize_char(c), &mut vec, &mut idiff, &mut ddiff);
    }

    let mut start: Option<usize> = None;
    if idiff.min(ddiff) <= diff_thresh {
        start = Some(0);
    }

    for j in plen..slen {
        let out = normalize_char(s[j - plen]);
        let inc = normalize_char(s[j]);
        adjust_diff_del(out, &mut vec, &mut idiff, &mut ddiff);
        adjust_diff_ins(inc, &mut vec, &mut idiff, &mut ddiff);
        let diff = idiff.min(ddiff);

        match start {
            None => {
                if diff <= diff_thresh {
                    start = Some(j - plen + 1);
                }
            }
            Some(beg) => {
                if diff > diff_thresh {
                    // Candidate region closed; widen it by one character on
                    // each side, clipped to the string, and align.
                    let w_beg = beg.saturating_sub(1);
                    let w_end = (j + 2).min(slen);
                    align(&p, &s[w_beg..w_end], w_beg, dist_threshold, &mut mres);
                    start = None;
                }
            }
        }
    }

    // A region still open at the end of the text runs to the last character.
    if let Some(beg) = start {
        align(&p, &s[beg..], beg, dist_threshold, &mut mres);
    }

    mres
}

/// Like [`fast_match`] with the roles flipped: `s` is the request-derived
/// text being searched and `p` is the content being executed or loaded.
/// Match spans are reported in `p`'s coordinates, trimmed to the sub-range
/// of `p` that actually aligned against `s` (leading and trailing
/// substitutions and deletions fall outside it).
pub fn fast_match_reverse(s: &str, p: &str, dist_threshold: f64) -> MatchResult {
    let mut mres = fast_match(p, s, dist_threshold);

    for m in &mut mres.elems {
        let len = m.ops.len();
        let mut beg = 0;
        while beg < len && matches!(m.ops[beg], EditOp::Subst | EditOp::Delete) {
            beg += 1;
        }
        let mut end = len;
        while end > 0 && matches!(m.ops[end - 1], EditOp::Subst | EditOp::Delete) {
            end -= 1;
        }
        m.beg = beg;
        m.end = end.max(beg);
    }
    mres
}

#[cfg(test)]
#[path = "../../tests/unit/matcher.rs"]
mod unit_tests;
