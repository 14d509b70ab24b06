//! Public Suffix List (PSL) helpers for cookie domains and jar keys.
//!
//! Uses Mozilla's Public Suffix List via the `psl` crate.

use psl::{List, Psl};
use std::net::IpAddr;

/// Check if a domain is a public suffix (e.g., "com", "co.uk").
pub fn is_public_suffix(domain: &str) -> bool {
    let domain_lower = domain.to_lowercase();
    let domain_bytes = domain_lower.as_bytes();

    match List.suffix(domain_bytes) {
        Some(suffix) => suffix.as_bytes() == domain_bytes,
        None => false,
    }
}

/// Registrable domain (eTLD+1), or `None` for a bare public suffix.
pub fn registrable_domain(domain: &str) -> Option<String> {
    let domain_lower = domain.to_lowercase();
    psl::domain(domain_lower.as_bytes())
        .and_then(|d| std::str::from_utf8(d.as_bytes()).ok())
        .map(|s| s.to_string())
}

/// Check that a `Domain` attribute may be set from `url_host`: it must not
/// be a public suffix and `url_host` must equal it or be a subdomain of it.
pub fn is_valid_cookie_domain(cookie_domain: &str, url_host: &str) -> bool {
    let cookie_domain = cookie_domain.strip_prefix('.').unwrap_or(cookie_domain).to_lowercase();
    let url_host = url_host.to_lowercase();

    if is_public_suffix(&cookie_domain) {
        return false;
    }

    url_host == cookie_domain || url_host.ends_with(&format!(".{}", cookie_domain))
}

/// Host key under which a cookie for `host` is stored in the jar.
///
/// IP addresses and public suffixes key on themselves. Otherwise the key
/// is the registrable domain when `use_psl` is set, or the last two labels
/// when it is not.
pub fn jar_key(host: &str, use_psl: bool) -> String {
    let host = host.trim_start_matches('[').trim_end_matches(']').to_lowercase();

    if host.parse::<IpAddr>().is_ok() {
        return host;
    }

    if use_psl {
        return registrable_domain(&host).unwrap_or(host);
    }

    let mut labels = host.rsplitn(3, '.');
    match (labels.next(), labels.next()) {
        (Some(tld), Some(sld)) if !tld.is_empty() && !sld.is_empty() => format!("{}.{}", sld, tld),
        _ => host,
    }
}
