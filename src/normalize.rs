//! Iterative decoding of request-derived and document-derived text.
//!
//! Attackers layer encodings (`%2520` is a percent-encoded `%20`), so both
//! sides of a comparison are decoded to a fixpoint before matching.

use percent_encoding::percent_decode_str;

/// HTML entity decoding needs a live document context, so it is supplied by
/// the host rather than implemented here. Implementations must be pure with
/// respect to their input.
pub trait EntityDecoder {
    fn decode_entities(&self, input: &str) -> String;
}

/// Upper bound on decode passes. Percent-decoding never grows the string,
/// so on its own the fixpoint is reached quickly; an [`EntityDecoder`] is
/// host code and may grow its output or oscillate, hence the cap.
const MAX_PASSES: usize = 16;

/// Repeatedly percent-decode (and entity-decode, when a decoder is
/// available) until a full pass leaves the string unchanged. If the pass cap
/// is hit, the last computed value is returned rather than an error.
pub fn unescape_loop(input: &str, decoder: Option<&dyn EntityDecoder>) -> String {
    let mut current = input.to_owned();
    for _ in 0..MAX_PASSES {
        let mut next = match decoder {
            Some(d) => d.decode_entities(&current),
            None => current.clone(),
        };
        next = percent_decode_str(&next).decode_utf8_lossy().into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
    current
}
