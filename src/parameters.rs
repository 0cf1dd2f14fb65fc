//! Extraction of attacker-controllable request parameters.
//!
//! Each document contributes at most two parameters: one for the URL's
//! path/query/fragment and one for a POST body. Earlier designs split the
//! query into individual key/value parameters; the conservative policy of
//! one combined parameter per source survives because injected payloads
//! routinely span separators.

use tracing::debug;
use url::Url;

use crate::normalize::{unescape_loop, EntityDecoder};

/// Characters considered safe inside a URL path, besides `[a-zA-Z0-9_]`.
const PATH_CHARS: &str = " -/.;";
/// Safe characters for a query string (also applied to urlencoded bodies).
const QUERY_CHARS: &str = " &=-";
/// Safe characters for a fragment.
const FRAGMENT_CHARS: &str = "-";
/// Safe characters when trimming a raw match region.
pub(crate) const MATCH_CHARS: &str = "-";

pub(crate) const LEAVE_BEG: u8 = 1;
pub(crate) const LEAVE_END: u8 = 2;

/// The request source a parameter was derived from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParameterName {
    Url,
    Post,
    MultipartPost,
}

impl std::fmt::Display for ParameterName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterName::Url => write!(f, "URL"),
            ParameterName::Post => write!(f, "POST"),
            ParameterName::MultipartPost => write!(f, "MIMEPOST"),
        }
    }
}

/// One normalized slice of request data to match candidate content against.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub name: ParameterName,
    pub value: String,
    /// Whether this source can carry an injection at all. Always true for
    /// the sources currently extracted; kept so finer-grained extraction can
    /// mark benign parameters.
    pub dangerous: bool,
    /// Marks whole-request parameters as opposed to individual fields.
    pub special: bool,
}

/// The ordered, immutable set of parameters for one document. Built lazily
/// exactly once; per-check verdicts live in
/// [`crate::evaluator::Evaluation`], never here.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterSet {
    params: Vec<Parameter>,
}

impl ParameterSet {
    pub fn new() -> ParameterSet {
        ParameterSet::default()
    }

    pub fn from_parts(
        url: &Url,
        post_body: Option<&PostBody>,
        decoder: Option<&dyn EntityDecoder>,
    ) -> ParameterSet {
        let mut set = ParameterSet::new();
        if let Some(param) = from_url(url, decoder) {
            set.push(param);
        }
        if let Some(body) = post_body {
            if let Some(param) = from_post_body(&body.body, &body.content_type, decoder) {
                set.push(param);
            }
        }
        set
    }

    pub fn push(&mut self, param: Parameter) {
        self.params.push(param);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.params.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }
}

impl<'a> IntoIterator for &'a ParameterSet {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;
    fn into_iter(self) -> Self::IntoIter {
        self.params.iter()
    }
}

/// The body of a POST request, already read out of the upload stream by the
/// host (which owns the rewind-to-start semantics).
#[derive(Clone, Debug, PartialEq)]
pub struct PostBody {
    pub content_type: String,
    pub body: String,
}

fn is_safe_char(c: char, extra: &str) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || extra.contains(c)
}

/// Trim `input` to the largest substring whose boundaries are suspicious
/// characters: characters outside `[a-zA-Z0-9_]` and `safe_extra`. Interior
/// safe characters are kept. Returns an empty string when nothing suspicious
/// is present, so this doubles as a "has suspicious chars" test. The
/// `LEAVE_BEG`/`LEAVE_END` flags disable trimming on one side.
pub(crate) fn trim_to_suspicious(input: &str, safe_extra: &str, flags: u8) -> String {
    if input.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = input.chars().collect();
    let len = chars.len();

    let mut start = len;
    for (i, &c) in chars.iter().enumerate() {
        if !is_safe_char(c, safe_extra) {
            start = i;
            break;
        }
    }
    let mut end = len - 1;
    while end > start {
        if !is_safe_char(chars[end], safe_extra) {
            break;
        }
        end -= 1;
    }
    if start > end {
        return String::new();
    }

    if flags & LEAVE_BEG != 0 {
        start = 0;
    }
    if flags & LEAVE_END != 0 {
        end = len;
    }
    chars[start..(end + 1).min(len)].iter().collect()
}

/// Derive the URL parameter for a document, if its path, query or fragment
/// carries anything suspicious after normalization. The parameter value is
/// the normalized (not trimmed) reassembly of the three components.
pub fn from_url(url: &Url, decoder: Option<&dyn EntityDecoder>) -> Option<Parameter> {
    let path = unescape_loop(url.path(), decoder);
    let query = unescape_loop(url.query().unwrap_or(""), decoder);
    let fragment = unescape_loop(url.fragment().unwrap_or(""), decoder);

    let t_path = trim_to_suspicious(&path, PATH_CHARS, 0);
    let t_query = trim_to_suspicious(&query, QUERY_CHARS, 0);
    let t_fragment = trim_to_suspicious(&fragment, FRAGMENT_CHARS, 0);

    if t_path.is_empty() && t_query.is_empty() && t_fragment.is_empty() {
        return None;
    }

    let mut value = String::new();
    value.push_str(path.strip_prefix('/').unwrap_or(&path));
    if !value.is_empty() && !query.is_empty() {
        value.push('?');
    }
    value.push_str(&query);
    if !value.is_empty() && !fragment.is_empty() {
        value.push('#');
    }
    value.push_str(&fragment);

    Some(Parameter {
        name: ParameterName::Url,
        value,
        dangerous: true,
        special: true,
    })
}

/// Derive the POST parameter for a document, if any. Unsupported or
/// malformed content types produce no parameter; extraction failures never
/// block a load.
pub fn from_post_body(
    body: &str,
    content_type: &str,
    decoder: Option<&dyn EntityDecoder>,
) -> Option<Parameter> {
    let content_type = content_type.to_ascii_lowercase();

    if content_type.contains("application/x-www-form-urlencoded") {
        let spaced: String = body.chars().map(|c| if c == '+' { ' ' } else { c }).collect();
        let normalized = unescape_loop(&spaced, decoder);
        let trimmed = trim_to_suspicious(&normalized, QUERY_CHARS, 0);
        debug!(payload = %trimmed, "POST payload");
        if trimmed.is_empty() {
            return None;
        }
        return Some(Parameter {
            name: ParameterName::Post,
            value: trimmed,
            dangerous: true,
            special: true,
        });
    }

    if content_type.contains("multipart/form-data") {
        // The whole body, boundaries included, is matched as-is. Isolating
        // the individual fields would avoid spending matcher time on MIME
        // noise the attacker does not control; the boundary text is accepted
        // as a precision cost instead.
        if body.is_empty() {
            return None;
        }
        return Some(Parameter {
            name: ParameterName::MultipartPost,
            value: body.to_owned(),
            dangerous: true,
            special: true,
        });
    }

    debug!(content_type = %content_type, "unsupported or invalid POST request");
    None
}

#[cfg(test)]
#[path = "../tests/unit/parameters.rs"]
mod unit_tests;
