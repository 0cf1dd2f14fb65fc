//! Edit-operation cost model used by the approximate matcher.
//!
//! Insertions and deletions carry a flat per-character cost. Substitutions
//! are free for case-insensitively equal ASCII characters and otherwise cost
//! three quarters of an insert-plus-delete, so that substituting is always
//! preferred over an insert/delete pair but never over an exact match.

/// Flat per-character cost for insertions and deletions.
pub const UNIT_COST: i32 = 20;

/// Sentinel larger than any reachable alignment cost.
pub const MAX_DIST: i32 = 100_000_000;

#[inline]
pub fn insertion_cost(_sc: char) -> i32 {
    UNIT_COST
}

#[inline]
pub fn deletion_cost(_pc: char) -> i32 {
    UNIT_COST
}

#[inline]
pub fn substitution_cost(pc: char, sc: char) -> i32 {
    if normalize_char(pc) == normalize_char(sc) {
        0
    } else {
        ((insertion_cost(sc) + deletion_cost(pc)) * 3) / 4
    }
}

/// Case normalization for comparison: ASCII letters are lowercased,
/// everything else is left alone.
#[inline]
pub fn normalize_char(c: char) -> char {
    c.to_ascii_lowercase()
}
