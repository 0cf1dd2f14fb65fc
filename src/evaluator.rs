//! Turns raw matcher output into per-check attack verdicts.
//!
//! A match only counts as an attack when it sits where an injection has to
//! sit: at the very start of inline content (the injected text closed a
//! preceding context and opened the script), or inside the authority
//! component of an external URL (the attacker controls the host, not merely
//! a path segment).

use tracing::debug;
use url::Url;

use crate::domains::{host_limit, registrable_domain};
use crate::matcher::{fast_match, fast_match_reverse, MatchResult};
use crate::parameters::{trim_to_suspicious, ParameterName, ParameterSet, MATCH_CHARS};

/// Relative edit-distance threshold for accepting a match.
pub const DISTANCE_THRESHOLD: f64 = 0.2;

/// Parameters shorter than this are never matched against inline content.
pub const MIN_INLINE_PARAM_LEN: usize = 10;
/// Parameters shorter than this are never matched against external URLs.
pub const MIN_EXTERNAL_PARAM_LEN: usize = 5;
/// Inline matches shorter than this are discarded.
pub const MIN_INLINE_MATCH_LEN: usize = 10;
/// External matches shorter than this are discarded.
pub const MIN_EXTERNAL_MATCH_LEN: usize = 5;

/// The verdict for one parameter in one check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Verdict {
    pub name: ParameterName,
    pub attack: bool,
}

/// The outcome of evaluating one piece of candidate content against a
/// document's parameters. A fresh value per check; parameters themselves are
/// never mutated, so concurrent or repeated checks cannot observe each
/// other's verdicts.
#[derive(Clone, Debug, Default)]
pub struct Evaluation {
    verdicts: Vec<Verdict>,
}

impl Evaluation {
    pub fn has_attack(&self) -> bool {
        self.verdicts.iter().any(|v| v.attack)
    }

    /// The first parameter that flagged this check, for reporting.
    pub fn attacking_parameter(&self) -> Option<ParameterName> {
        self.verdicts.iter().find(|v| v.attack).map(|v| v.name)
    }

    pub fn verdicts(&self) -> &[Verdict] {
        &self.verdicts
    }
}

/// Does `param` look like the source of `content`?
///
/// When the parameter is at least as long as the content, the whole injected
/// parameter may literally be the content (tags and quotes are stripped by
/// the parser, so the executed script comes out shorter) and matching runs
/// in reverse, reporting spans in `content`'s coordinates. Content slightly
/// longer than the parameter can still match forward: sanitization such as
/// added slashes grows a script, but only within the distance threshold.
pub fn find_inline_xss(param: &str, content: &str) -> bool {
    let param_len = param.chars().count();
    let content_len = content.chars().count();

    let mut mres = MatchResult::new();
    if param_len >= content_len {
        mres = fast_match_reverse(param, content, DISTANCE_THRESHOLD);
    } else if param_len as f64 >= content_len as f64 * (1.0 - DISTANCE_THRESHOLD) {
        mres = fast_match(param, content, DISTANCE_THRESHOLD);
    }
    mres.clear_invalid(MIN_INLINE_MATCH_LEN);

    let content_chars: Vec<char> = content.chars().collect();
    for m in mres.elems() {
        let take_end = (m.end + 1).min(content_chars.len());
        if m.beg >= take_end {
            continue;
        }
        let matched: String = content_chars[m.beg..take_end].iter().collect();
        if trim_to_suspicious(&matched, MATCH_CHARS, 0).is_empty() {
            // nothing but word characters and hyphens; harmless
            continue;
        }
        debug!(beg = m.beg, end = m.end, matched = %matched, "inline match");
        if m.beg == 0 {
            return true;
        }
    }
    false
}

/// Does `param` control the origin of `target`?
pub fn find_external_xss(param: &str, target: &Url) -> bool {
    let url = target.as_str();
    let param_len = param.chars().count();
    let url_len = url.chars().count();

    let mut mres = MatchResult::new();
    if param_len >= url_len {
        mres = fast_match_reverse(param, url, DISTANCE_THRESHOLD);
    } else if param_len as f64 >= url_len as f64 * (1.0 - DISTANCE_THRESHOLD) {
        mres = fast_match(param, url, DISTANCE_THRESHOLD);
    }
    mres.clear_invalid(MIN_EXTERNAL_MATCH_LEN);

    let safe_index = host_limit(target);
    for m in mres.elems() {
        debug!(beg = m.beg, end = m.end, "external match");
        if m.beg < safe_index {
            return true;
        }
    }
    false
}

/// Evaluate inline content (scripts, handlers, `javascript:`/`data:`
/// payloads, eval arguments) against every eligible parameter.
pub fn check_inline(content: &str, params: &ParameterSet) -> Evaluation {
    if params.is_empty() {
        return Evaluation::default();
    }
    let mut eval = Evaluation::default();
    for param in params {
        if !param.dangerous {
            continue;
        }
        if param.value.chars().count() < MIN_INLINE_PARAM_LEN {
            continue;
        }
        eval.verdicts.push(Verdict {
            name: param.name,
            attack: find_inline_xss(&param.value, content),
        });
    }
    eval
}

/// Evaluate an external load target against every eligible parameter.
/// Targets on the page's own registrable domain are never flagged.
pub fn check_external(target: &Url, page: &Url, params: &ParameterSet) -> Evaluation {
    if params.is_empty() {
        return Evaluation::default();
    }
    if registrable_domain(target) == registrable_domain(page) {
        return Evaluation::default();
    }
    let mut eval = Evaluation::default();
    for param in params {
        if !param.dangerous {
            continue;
        }
        if param.value.chars().count() < MIN_EXTERNAL_PARAM_LEN {
            continue;
        }
        eval.verdicts.push(Verdict {
            name: param.name,
            attack: find_external_xss(&param.value, target),
        });
    }
    eval
}
