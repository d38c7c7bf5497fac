//! Candidate URL generation for one discovered image.
//!
//! A discovered URL is often a thumbnail rendition, carries stale signing
//! parameters, or sits behind a broken variant. This module derives a
//! prioritized list of alternatives to try: the URL itself, resolution
//! upgrades, query-stripped versions, and an https upgrade as the last
//! resort. Pure and deterministic; the downloader owns all I/O.

use crate::cdn;
use url::Url;

/// Builds the ordered, deduplicated candidate list for a raw image URL.
///
/// Generation order is priority order: the normalized original first, then
/// `_1000x` and `_750x` upgrades, then query-stripped versions of each when
/// the original had a query, and finally a protocol upgrade for plain-http
/// URLs.
pub fn build_candidates(raw_url: &str) -> Vec<String> {
    let normalized = normalize_url(raw_url);

    let mut candidates: Vec<String> = Vec::new();
    let mut push = |candidate: String| {
        if !candidate.is_empty() && !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    };

    push(normalized.clone());

    if let Ok(parsed) = Url::parse(&normalized) {
        let origin = parsed.origin().ascii_serialization();
        let path = parsed.path().to_string();
        let search = parsed.query().map(|q| format!("?{}", q)).unwrap_or_default();

        // Higher resolutions first
        push(format!("{}{}{}", origin, cdn::upgrade_size(&path, "1000x"), search));
        push(format!("{}{}{}", origin, cdn::upgrade_size(&path, "750x"), search));

        // Also try without query (if originally had one)
        if parsed.query().is_some() {
            push(format!("{}{}", origin, path));
            push(format!("{}{}", origin, cdn::upgrade_size(&path, "1000x")));
            push(format!("{}{}", origin, cdn::upgrade_size(&path, "750x")));
        }

        // Ensure protocol is https
        if parsed.scheme() == "http" {
            if let Some(host) = parsed.host_str() {
                let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();
                push(format!("https://{}{}{}{}", host, port, path, search));
            }
        }
    }

    candidates
}

/// Normalizes scheme-relative URLs and applies the query policy: CDN hosts
/// keep their query (sizing/signature parameters), everyone else loses it.
fn normalize_url(raw_url: &str) -> String {
    let with_scheme = cdn::normalize_scheme(raw_url);
    match Url::parse(&with_scheme) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default();
            if cdn::is_cdn_host(host) {
                parsed.to_string()
            } else {
                format!("{}{}", parsed.origin().ascii_serialization(), parsed.path())
            }
        }
        Err(_) => with_scheme,
    }
}
