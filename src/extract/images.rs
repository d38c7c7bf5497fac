//! Image signal collection and fusion.
//!
//! A rendered product page yields image URLs through four independent
//! channels: the DOM gallery, network responses observed during load,
//! social meta tags, and CDN URLs embedded in inline JSON or scripts.
//! Each channel is harvested separately; [`merge_image_sources`] fuses
//! them through one pure pipeline so the filtering and upgrade rules
//! apply uniformly.

use crate::cdn;
use crate::product::dedup_capped;
use regex_lite::Regex;
use scraper::Html;
use std::sync::LazyLock;

use super::selectors;

/// CDN image URLs buried in inline JSON, script bodies, or attributes.
static EMBEDDED_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^"' )]+?(?:ltwebstatic|shein)[^"' )]+?\.(?:jpe?g|png|webp|gif)"#)
        .unwrap()
});

/// Image URLs gathered per source channel, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct ImageSignals {
    /// From `<img>` elements in gallery containers (or the whole page).
    pub dom: Vec<String>,
    /// From image-type network responses captured by the browser session.
    pub network: Vec<String>,
    /// From `og:image` / `twitter:image` meta tags.
    pub meta: Vec<String>,
    /// From the regex scan of the raw serialized HTML.
    pub embedded: Vec<String>,
}

/// Fuses all signal channels into the final gallery list.
///
/// Source priority is dom, network, meta, embedded. Every URL passes the
/// same pipeline: scheme normalization, CDN host filter, asset and tiny
/// thumbnail exclusion, then a `_750x` size upgrade. Output is
/// deduplicated in first-seen order and capped.
pub fn merge_image_sources(signals: &ImageSignals, cap: usize) -> Vec<String> {
    let all = signals
        .dom
        .iter()
        .chain(signals.network.iter())
        .chain(signals.meta.iter())
        .chain(signals.embedded.iter());

    let cleaned: Vec<String> = all
        .map(|u| cdn::normalize_scheme(u))
        .filter(|u| cdn::is_cdn_url(u))
        .filter(|u| !cdn::looks_like_asset(u))
        .filter(|u| !cdn::is_tiny_thumbnail(u))
        .map(|u| cdn::upgrade_image_url(&u, "750x"))
        .collect();

    dedup_capped(cleaned, cap)
}

/// Harvests `<img>` sources from gallery containers, falling back to every
/// image on the page when no container matches.
pub fn harvest_dom_images(doc: &Html) -> Vec<String> {
    let containers: Vec<_> = doc.select(&selectors::dom::GALLERY_CONTAINERS).collect();

    let imgs: Vec<_> = if containers.is_empty() {
        doc.select(&selectors::dom::IMG).collect()
    } else {
        containers.iter().flat_map(|c| c.select(&selectors::dom::IMG)).collect()
    };

    imgs.iter()
        .filter_map(|img| {
            let el = img.value();
            el.attr("src").or_else(|| el.attr("data-src")).or_else(|| el.attr("data-original"))
        })
        .map(|src| src.to_string())
        .collect()
}

/// Harvests social preview images from meta tags.
pub fn harvest_meta_images(doc: &Html) -> Vec<String> {
    doc.select(&selectors::meta::SOCIAL_IMAGE)
        .filter_map(|el| el.value().attr("content"))
        .map(|u| u.to_string())
        .collect()
}

/// Scans raw HTML for CDN image URLs that never surface in the DOM.
pub fn embedded_cdn_urls(html: &str) -> Vec<String> {
    EMBEDDED_IMAGE_RE.find_iter(html).map(|m| m.as_str().to_string()).collect()
}

/// Walks inline JSON payloads collecting CDN URL strings.
pub fn embedded_json_images(doc: &Html) -> Vec<String> {
    let mut found = Vec::new();
    for script in doc.select(&selectors::meta::JSON_SCRIPTS) {
        let body: String = script.text().collect();
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) {
            collect_json_urls(&value, &mut found);
        }
    }
    found
}

fn collect_json_urls(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => {
            if cdn::is_cdn_url(s) {
                let normalized = cdn::normalize_scheme(s);
                if !out.contains(&normalized) {
                    out.push(normalized);
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_json_urls(item, out);
            }
        }
        serde_json::Value::Object(map) => {
            for item in map.values() {
                collect_json_urls(item, out);
            }
        }
        _ => {}
    }
}
