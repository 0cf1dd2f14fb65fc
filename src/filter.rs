//! The per-document policy engine.
//!
//! Every document that can execute script owns one [`XssFilter`]. Hooks in
//! the host call back into the `permits_*` operations before running inline
//! scripts, fetching external scripts and objects, honoring `<base>`
//! changes, or executing `javascript:`/`data:` URLs and eval-style strings.
//! Each call either permits the action or reports a violation and denies it
//! (permitting anyway in report-only mode).

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::FilterConfig;
use crate::domains::registrable_domain;
use crate::evaluator;
use crate::normalize::{unescape_loop, EntityDecoder};
use crate::parameters::{ParameterSet, PostBody};
use crate::report::{ViolationReport, ViolationSink};

/// Failure building a [`DocumentRequest`] from raw host data.
#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("document URL parsing failed")]
    UrlParse(#[from] url::ParseError),
}

/// What the filter needs to know about the request that produced its
/// document. The host reads the response header and the upload stream
/// (rewinding it to the start) and hands over plain values; the filter never
/// touches the channel itself.
#[derive(Clone, Debug)]
pub struct DocumentRequest {
    pub url: Url,
    /// Raw value of the `X-Xss-Protection` response header, if present.
    pub xss_protection: Option<String>,
    /// Body of the request when the document was fetched via POST.
    pub post_body: Option<PostBody>,
}

impl DocumentRequest {
    /// A plain GET request with no filter header.
    pub fn get(url: Url) -> DocumentRequest {
        DocumentRequest {
            url,
            xss_protection: None,
            post_body: None,
        }
    }

    pub fn parse(url: &str) -> Result<DocumentRequest, RequestError> {
        Ok(DocumentRequest::get(Url::parse(url)?))
    }

    pub fn with_header(mut self, value: &str) -> DocumentRequest {
        self.xss_protection = Some(value.to_owned());
        self
    }

    pub fn with_post_body(mut self, content_type: &str, body: &str) -> DocumentRequest {
        self.post_body = Some(PostBody {
            content_type: content_type.to_owned(),
            body: body.to_owned(),
        });
        self
    }
}

/// Parsed `X-Xss-Protection` directive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HeaderDirective {
    Enabled,
    Disabled,
    EnabledBlock,
}

fn skip_whitespace(bytes: &[u8], pos: &mut usize) {
    while *pos != bytes.len() && (bytes[*pos] == b' ' || bytes[*pos] == b'\t') {
        *pos += 1;
    }
}

/// Case-insensitive token match; advances `pos` past the token on success.
fn skip_token(bytes: &[u8], pos: &mut usize, token: &[u8]) -> bool {
    for &expected in token {
        if *pos == bytes.len() || bytes[*pos].to_ascii_lowercase() != expected {
            return false;
        }
        *pos += 1;
    }
    true
}

/// Parse a header value per the de facto grammar
/// `"0" | "1" (";" "mode" "=" "block")?` with whitespace tolerated around
/// every token and tokens matched case-insensitively. Anything unparseable
/// fails open to [`HeaderDirective::Enabled`]: silently disabling the filter
/// on a malformed header would remove protection.
pub(crate) fn parse_protection_header(value: &str) -> HeaderDirective {
    let bytes = value.as_bytes();
    let mut pos = 0;

    skip_whitespace(bytes, &mut pos);
    if pos == bytes.len() {
        return HeaderDirective::Enabled;
    }
    if bytes[pos] == b'0' {
        return HeaderDirective::Disabled;
    }
    if bytes[pos] != b'1' {
        return HeaderDirective::Enabled;
    }
    pos += 1;
    skip_whitespace(bytes, &mut pos);
    if pos == bytes.len() {
        // bare "1"
        return HeaderDirective::Enabled;
    }
    if bytes[pos] != b';' {
        return HeaderDirective::Enabled;
    }
    pos += 1;
    skip_whitespace(bytes, &mut pos);
    if !skip_token(bytes, &mut pos, b"mode") {
        return HeaderDirective::Enabled;
    }
    skip_whitespace(bytes, &mut pos);
    if pos == bytes.len() || bytes[pos] != b'=' {
        return HeaderDirective::Enabled;
    }
    pos += 1;
    skip_whitespace(bytes, &mut pos);
    if !skip_token(bytes, &mut pos, b"block") {
        return HeaderDirective::Enabled;
    }
    skip_whitespace(bytes, &mut pos);
    if pos != bytes.len() {
        return HeaderDirective::Enabled;
    }
    HeaderDirective::EnabledBlock
}

/// Per-document reflected-XSS filter.
///
/// Owned by exactly one document and driven from that document's thread; the
/// parameter list and domain cache are private to it. Process-wide settings
/// arrive as [`FilterConfig`] snapshots and are refreshed with
/// [`XssFilter::set_config`] when the host's settings change; header-derived
/// state and caches survive such refreshes.
pub struct XssFilter {
    request: DocumentRequest,
    config: Arc<FilterConfig>,
    sink: Option<Arc<dyn ViolationSink>>,
    decoder: Option<Arc<dyn EntityDecoder>>,

    /// The response header is scanned once, on the first policy call.
    header_scanned: bool,
    header_enabled: bool,
    header_block_mode: bool,

    /// Parameters extracted from the request, built on first use.
    params: Option<ParameterSet>,
    /// Verdicts for external targets, keyed by registrable domain. Entries
    /// are never invalidated for the document's lifetime.
    domain_cache: HashMap<String, bool>,
}

impl XssFilter {
    pub fn new(request: DocumentRequest, config: Arc<FilterConfig>) -> XssFilter {
        XssFilter {
            request,
            config,
            sink: None,
            decoder: None,
            header_scanned: false,
            header_enabled: true,
            header_block_mode: false,
            params: None,
            domain_cache: HashMap::new(),
        }
    }

    /// Register the observer notified on violations.
    pub fn with_sink(mut self, sink: Arc<dyn ViolationSink>) -> XssFilter {
        self.sink = Some(sink);
        self
    }

    /// Register the document-backed HTML entity decoder used during
    /// normalization. Without one, only percent-decoding applies.
    pub fn with_entity_decoder(mut self, decoder: Arc<dyn EntityDecoder>) -> XssFilter {
        self.decoder = Some(decoder);
        self
    }

    /// Adopt a new process-wide settings snapshot. Header-derived state, the
    /// parameter list and the domain cache are deliberately kept.
    pub fn set_config(&mut self, config: Arc<FilterConfig>) {
        self.config = config;
    }

    /// The parameters extracted from this document's request, built on
    /// first use. Exposed so hosts can show which request data was matched.
    pub fn parameters(&mut self) -> &ParameterSet {
        let XssFilter {
            params,
            request,
            decoder,
            ..
        } = self;
        params.get_or_insert_with(|| {
            ParameterSet::from_parts(&request.url, request.post_body.as_ref(), decoder.as_deref())
        })
    }

    /// The cached verdict for a registrable domain, if any. `true` means the
    /// domain was checked and found safe.
    pub fn cached_domain_verdict(&self, domain: &str) -> Option<bool> {
        self.domain_cache.get(domain).copied()
    }

    /// Whether an inline `<script>...</script>` element may execute.
    pub fn permits_inline_script(&mut self, script: &str) -> bool {
        self.ensure_header_scanned();
        debug!(script = %snippet(script), "inline script check");
        if !self.is_enabled() {
            return true;
        }
        let eval = evaluator::check_inline(script, self.parameters());
        if eval.has_attack() {
            self.notify_violation("Inline Script", script, "");
            return self.is_report_only();
        }
        true
    }

    /// Whether an external `<script src=...>` may be fetched and executed.
    /// `is_dynamic` marks script elements inserted by script rather than by
    /// markup; those are exempt unless the configuration blocks them.
    pub fn permits_external_script(&mut self, target: &Url, is_dynamic: bool) -> bool {
        self.ensure_header_scanned();
        debug!(url = %target, is_dynamic, "external script check");
        if !self.is_enabled() {
            return true;
        }
        if is_dynamic && !self.is_block_dynamic() {
            return true;
        }
        self.permits_domain_target(target, "External Script")
    }

    /// Whether a `javascript:` URL may run. The URL is normalized before
    /// checking since it reaches execution percent-encoded.
    pub fn permits_js_url(&mut self, js_url: &str) -> bool {
        self.ensure_header_scanned();
        debug!(url = %snippet(js_url), "javascript url check");
        if !self.is_enabled() {
            return true;
        }
        let unescaped = unescape_loop(js_url, self.decoder.as_deref());
        let eval = evaluator::check_inline(&unescaped, self.parameters());
        if eval.has_attack() {
            self.notify_violation("JS URL", js_url, "");
            return self.is_report_only();
        }
        true
    }

    /// Whether an event handler body may run.
    pub fn permits_event_listener(&mut self, script: &str) -> bool {
        self.ensure_header_scanned();
        debug!(script = %snippet(script), "event listener check");
        if !self.is_enabled() {
            return true;
        }
        let eval = evaluator::check_inline(script, self.parameters());
        if eval.has_attack() {
            self.notify_violation("Event Listener", script, "");
            return self.is_report_only();
        }
        true
    }

    /// Whether a `<base href=...>` element may change the document's base
    /// URL. Moves within the same registrable domain are always permitted.
    pub fn permits_base_element(&mut self, old_url: &Url, new_url: &Url) -> bool {
        self.ensure_header_scanned();
        debug!(url = %new_url, "base element check");
        if !self.is_enabled() {
            return true;
        }
        if registrable_domain(old_url) == registrable_domain(new_url) {
            return true;
        }
        self.permits_domain_target(new_url, "Base Element")
    }

    /// Whether an `<object>`/`<embed>` resource may be fetched and loaded.
    pub fn permits_external_object(&mut self, target: &Url) -> bool {
        self.ensure_header_scanned();
        debug!(url = %target, "embedded object check");
        if !self.is_enabled() {
            return true;
        }
        self.permits_domain_target(target, "Embedded Object")
    }

    /// Whether a script-bearing `data:` URL may execute.
    pub fn permits_data_url(&mut self, target: &Url) -> bool {
        self.ensure_header_scanned();
        debug!(url = %snippet(target.as_str()), "data url check");
        if !self.is_enabled() {
            return true;
        }
        let eval = evaluator::check_inline(target.as_str(), self.parameters());
        if eval.has_attack() {
            self.notify_violation("Data URL", target.as_str(), "");
            return self.is_report_only();
        }
        true
    }

    /// Whether a string argument to eval, setTimeout or setInterval may run.
    pub fn permits_js_action(&mut self, code: &str) -> bool {
        self.ensure_header_scanned();
        debug!(code = %snippet(code), "js action check");
        if !self.is_enabled() {
            return true;
        }
        let eval = evaluator::check_inline(code, self.parameters());
        if eval.has_attack() {
            self.notify_violation("JS Action", code, "");
            return self.is_report_only();
        }
        true
    }

    /// Shared tail of the domain-keyed checks: cache, whitelist, then the
    /// matcher. The cache answers first, so a domain checked once keeps its
    /// verdict for the document's lifetime; whitelist hits are never cached,
    /// so pulling a domain off the whitelist takes effect on the next
    /// document. Cached attack verdicts still answer through report-only so
    /// that flipping report-only on cannot leave stale denials behind.
    fn permits_domain_target(&mut self, target: &Url, policy: &'static str) -> bool {
        let domain = registrable_domain(target).unwrap_or_default();
        if let Some(&safe) = self.domain_cache.get(&domain) {
            return safe || self.is_report_only();
        }
        if self.config.whitelist.contains(&domain) {
            return true;
        }

        let page = self.request.url.clone();
        let eval = evaluator::check_external(target, &page, self.parameters());
        if eval.has_attack() {
            self.notify_violation(policy, target.as_str(), &domain);
            self.domain_cache.insert(domain, false);
            return self.is_report_only();
        }
        self.domain_cache.insert(domain, true);
        true
    }

    fn ensure_header_scanned(&mut self) {
        if self.header_scanned {
            return;
        }
        self.header_scanned = true;
        let directive = match &self.request.xss_protection {
            None => HeaderDirective::Enabled,
            Some(value) => parse_protection_header(value),
        };
        debug!(?directive, "scanned X-Xss-Protection header");
        match directive {
            HeaderDirective::Enabled => self.header_enabled = true,
            HeaderDirective::Disabled => self.header_enabled = false,
            HeaderDirective::EnabledBlock => {
                self.header_enabled = true;
                self.header_block_mode = true;
            }
        }
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && self.header_enabled
    }

    fn is_report_only(&self) -> bool {
        self.config.report_only
    }

    fn is_block_mode(&self) -> bool {
        self.config.block_mode || self.header_block_mode
    }

    fn is_block_dynamic(&self) -> bool {
        self.config.block_dynamic
    }

    fn notify_violation(&self, policy: &str, content: &str, domain: &str) {
        let document_url = self.request.url.to_string();
        warn!("XSS violation at URL: {} - Type: {}", document_url, policy);
        if let Some(sink) = &self.sink {
            sink.report(ViolationReport {
                policy: policy.to_owned(),
                content: content.to_owned(),
                domain: domain.to_owned(),
                document_url,
                block_mode: self.is_block_mode(),
            });
        }
    }
}

fn snippet(text: &str) -> String {
    text.chars().take(70).collect()
}

#[cfg(test)]
#[path = "../tests/unit/filter.rs"]
mod unit_tests;
