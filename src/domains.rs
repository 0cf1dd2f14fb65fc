//! Registrable-domain and authority-boundary helpers for origin checks.

use url::{Position, Url};

/// The registrable (eTLD+1) domain of a URL's host, handling multi-label
/// public suffixes such as `co.uk`. IP addresses and hosts the public suffix
/// list cannot classify fall back to the raw host string. `None` only for
/// URLs without a host.
pub fn registrable_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let domain = match addr::parse_domain_name(host) {
        Ok(name) => name.root().unwrap_or(host),
        Err(_) => host,
    };
    Some(domain.to_owned())
}

/// The last position in a URL's serialization where an attacker-controlled
/// match still controls the host: everything up to and including the slash
/// that ends the authority component.
pub fn host_limit(url: &Url) -> usize {
    let prepath = url[..Position::BeforePath].len();
    if url.path().is_empty() {
        prepath
    } else {
        prepath + 1
    }
}
