//! Best-fit (semi-global) alignment of a pattern against a window of text.
//!
//! The pattern must match in full, but may start and end anywhere inside the
//! text at no cost: row zero of the distance matrix is all zeros, while
//! column zero accumulates the cost of deleting the unmatched pattern prefix.

use tracing::warn;

use crate::matcher::cost::{deletion_cost, insertion_cost, substitution_cost, MAX_DIST};
use crate::matcher::{EditOp, MatchElem, MatchResult};

/// Align `p` against `s` (a window of the full text starting at `s_offset`)
/// and record the best match found into `mres`.
///
/// The first invocation on a fresh [`MatchResult`] fixes the absolute cost
/// threshold from the pattern's total deletion cost. Matches are accepted
/// only when they fall within half a threshold of the best cost observed so
/// far across windows; a strictly better match evicts previously accepted
/// matches that no longer make the band.
pub(super) fn align(p: &[char], s: &[char], s_offset: usize, threshold: f64, mres: &mut MatchResult) {
    let plen = p.len();
    let slen = s.len();
    if plen == 0 || slen == 0 {
        return;
    }

    let prev_best = if mres.cost_thresh < 0 {
        let max_cost: i32 = p.iter().map(|&c| deletion_cost(c)).sum();
        mres.cost_thresh = (threshold * f64::from(max_cost)).floor() as i32;
        MAX_DIST
    } else {
        mres.best_dist
    };
    let cost_thresh = mres.cost_thresh;

    // The matrix is sized from attacker-influenced lengths; degrade to "no
    // match" instead of aborting the document load if it cannot be allocated.
    let cells = (plen + 1) * (slen + 1);
    let mut dist: Vec<i32> = Vec::new();
    if dist.try_reserve_exact(cells).is_err() {
        warn!(
            pattern_len = plen,
            window_len = slen,
            "alignment matrix allocation failed, treating window as unmatched"
        );
        return;
    }
    dist.resize(cells, 0);
    let idx = |i: usize, j: usize| i * (slen + 1) + j;

    // Row 0 stays zero: the match may begin anywhere in s for free.
    for i in 1..=plen {
        dist[idx(i, 0)] = dist[idx(i - 1, 0)] + deletion_cost(p[i - 1]);
    }

    for i in 1..=plen {
        for j in 1..=slen {
            let pc = p[i - 1];
            let sc = s[j - 1];
            let down = dist[idx(i - 1, j)] + deletion_cost(pc);
            let right = dist[idx(i, j - 1)] + insertion_cost(sc);
            let diag = dist[idx(i - 1, j - 1)] + substitution_cost(pc, sc);
            dist[idx(i, j)] = down.min(right).min(diag);
        }
    }

    // The cheapest cell of the last row marks where the best match ends.
    let mut best_dist = MAX_DIST;
    let mut s_end = 1;
    for j in 1..=slen {
        if dist[idx(plen, j)] < best_dist {
            best_dist = dist[idx(plen, j)];
            s_end = j;
        }
    }

    if best_dist <= prev_best + cost_thresh / 2 {
        mres.best_dist = best_dist.min(prev_best);

        if best_dist < prev_best {
            mres.elems
                .retain(|m| m.dist <= cost_thresh || m.dist <= best_dist + cost_thresh / 2);
        }

        let (s_beg, ops) = backtrack(&dist, p, s, s_end);
        mres.elems.push(MatchElem {
            dist: best_dist,
            beg: s_beg + s_offset,
            end: s_end + s_offset,
            ops,
        });
    }
}

/// Walk the distance matrix back from `(plen, s_end)` to recover the match
/// start and the edit script, preferring deletion, then insertion, then the
/// diagonal on cost ties.
fn backtrack(dist: &[i32], p: &[char], s: &[char], s_end: usize) -> (usize, Vec<EditOp>) {
    let slen = s.len();
    let idx = |i: usize, j: usize| i * (slen + 1) + j;

    let mut i = p.len();
    let mut j = s_end;
    let mut ops = Vec::with_capacity(i + s_end);

    while i > 0 && j > 0 {
        let pc = p[i - 1];
        let sc = s[j - 1];
        let cur = dist[idx(i, j)];
        if cur == dist[idx(i - 1, j)] + deletion_cost(pc) {
            ops.push(EditOp::Delete);
            i -= 1;
        } else if cur == dist[idx(i, j - 1)] + insertion_cost(sc) {
            ops.push(EditOp::Insert);
            j -= 1;
        } else {
            if substitution_cost(pc, sc) == 0 {
                ops.push(EditOp::Keep);
            } else {
                ops.push(EditOp::Subst);
            }
            i -= 1;
            j -= 1;
        }
    }

    ops.reverse();
    (j, ops)
}
