//! Structured field extraction from parsed product pages.
//!
//! Two selector variants cover the supported storefronts: a Shein-tuned
//! set and a generic e-commerce set. Every field degrades independently,
//! so a page with a readable name but an unparseable price still produces
//! a usable record.

use crate::cdn;
use crate::product::{
    dedup_capped, truncate_chars, ProductRecord, MAX_DESCRIPTION_LEN, MAX_OPTIONS,
};
use rand::RngExt;
use regex_lite::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

use super::selectors;

/// Thousands-separated amounts like `1,299.99` on generic storefronts.
static GENERIC_PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\d,]+\.?\d*").unwrap());

/// Bare decimal amounts on Shein price nodes.
static SHEIN_PRICE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\d.]+").unwrap());

const GENERIC_IMAGE_CAP: usize = 5;
const SHEIN_IMAGE_CAP: usize = 6;

const SHEIN_STOCK_IMAGES: [&str; 3] = [
    "https://images.unsplash.com/photo-1515372039744-b8f02a3ae446?w=400",
    "https://images.unsplash.com/photo-1434389677669-e08b4cac3105?w=400",
    "https://images.unsplash.com/photo-1544957992-20349e4d0d8f?w=400",
];

const GENERIC_STOCK_IMAGE: &str =
    "https://images.unsplash.com/photo-1555041469-a586c61ea9bc?w=400";

/// Which selector set applies to a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Generic,
    Shein,
}

impl Variant {
    /// Shein pages get the tuned cascade, everything else the generic one.
    pub fn for_url(url: &str) -> Self {
        if url.contains("shein.com") {
            Variant::Shein
        } else {
            Variant::Generic
        }
    }
}

/// Extracts every structured field from a parsed page.
///
/// The returned record is complete: missing fields are filled with the
/// variant's defaults. Gallery fusion happens later and may replace
/// `image_urls`.
pub fn extract_fields(doc: &Html, url: &str) -> ProductRecord {
    match Variant::for_url(url) {
        Variant::Shein => extract_shein(doc),
        Variant::Generic => extract_generic(doc, url),
    }
}

fn extract_generic(doc: &Html, url: &str) -> ProductRecord {
    let name = first_text(doc, &selectors::generic::NAME);
    let (price, currency) = first_text(doc, &selectors::generic::PRICE)
        .map(|text| parse_generic_price(&text))
        .unwrap_or((None, "USD".to_string()));

    let description = first_text(doc, &selectors::generic::DESCRIPTION)
        .map(|d| truncate_chars(&d, MAX_DESCRIPTION_LEN));

    let colors = harvest_options(doc, &["color", "colour"]);
    let sizes = harvest_options(doc, &["size", "sizes"]);
    let images = generic_images(doc, url);

    ProductRecord {
        name: name.unwrap_or_else(|| generic_fallback_name(url)),
        description: description
            .unwrap_or_else(|| "Product description not available".to_string()),
        price: price.unwrap_or_else(random_fallback_price),
        currency,
        colors: non_empty_or(colors, &["Standard"]),
        sizes: non_empty_or(sizes, &["One Size"]),
        image_urls: non_empty_or(images, &[GENERIC_STOCK_IMAGE]),
    }
}

fn extract_shein(doc: &Html) -> ProductRecord {
    let name = first_text(doc, &selectors::shein::NAME);
    let (price, currency) = first_text(doc, &selectors::shein::PRICE)
        .map(|text| parse_shein_price(&text))
        .unwrap_or((None, "USD".to_string()));

    let description = first_text(doc, &selectors::shein::DESCRIPTION);

    let colors = shein_options(doc, &selectors::shein::COLORS, true);
    let sizes = shein_options(doc, &selectors::shein::SIZES, false);
    let images = shein_images(doc);

    ProductRecord {
        name: name.unwrap_or_else(|| "Shein Fashion Item".to_string()),
        description: description.unwrap_or_else(|| "Trendy fashion item from Shein".to_string()),
        price: price.unwrap_or(9.99),
        currency,
        colors: non_empty_or(colors, &["Black", "White"]),
        sizes: non_empty_or(sizes, &["XS", "S", "M", "L", "XL"]),
        image_urls: if images.is_empty() {
            SHEIN_STOCK_IMAGES.iter().map(|s| s.to_string()).collect()
        } else {
            images
        },
    }
}

/// First selector in the cascade whose first match has non-empty text.
fn first_text(doc: &Html, cascade: &[Selector]) -> Option<String> {
    for selector in cascade {
        if let Some(el) = doc.select(selector).next() {
            let text = element_text(&el);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn element_text(el: &ElementRef) -> String {
    el.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_generic_price(text: &str) -> (Option<f64>, String) {
    let amount = GENERIC_PRICE_RE
        .find(text)
        .and_then(|m| m.as_str().replace(',', "").parse::<f64>().ok())
        .filter(|p| *p > 0.0);

    let currency = if text.contains('€') {
        "EUR"
    } else if text.contains('£') {
        "GBP"
    } else if text.contains("CAD") {
        "CAD"
    } else {
        "USD"
    };

    (amount, currency.to_string())
}

fn parse_shein_price(text: &str) -> (Option<f64>, String) {
    let amount = SHEIN_PRICE_RE
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|p| *p > 0.0);

    (amount, "USD".to_string())
}

fn random_fallback_price() -> f64 {
    f64::from(rand::rng().random_range(10..110))
}

fn generic_fallback_name(url: &str) -> String {
    let host = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .unwrap_or_else(|| "unknown".to_string());
    format!("Product from {}", host)
}

/// Harvests option values from select elements and keyword-classed nodes.
///
/// Values longer than 20 characters are treated as prose, not options.
fn harvest_options(doc: &Html, keywords: &[&str]) -> Vec<String> {
    let mut options = Vec::new();
    for keyword in keywords {
        for selector in selectors::generic::option_selectors(keyword) {
            for el in doc.select(&selector) {
                let value = element_text(&el);
                if !value.is_empty()
                    && value != "Select"
                    && value.len() < 20
                    && !options.contains(&value)
                {
                    options.push(value);
                }
            }
        }
    }
    dedup_capped(options, MAX_OPTIONS)
}

/// Shein color chips carry the value in a `title` attribute, size chips in
/// their text.
fn shein_options(doc: &Html, cascade: &[Selector], prefer_title: bool) -> Vec<String> {
    let mut options = Vec::new();
    for selector in cascade {
        for el in doc.select(selector) {
            let value = if prefer_title {
                el.value()
                    .attr("title")
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| element_text(&el))
            } else {
                element_text(&el)
            };
            if !value.is_empty() && value.len() < 20 && !options.contains(&value) {
                options.push(value);
            }
        }
        if !options.is_empty() {
            break;
        }
    }
    dedup_capped(options, MAX_OPTIONS)
}

/// Generic gallery harvesting: first cascade entry producing any image wins.
/// Relative sources are resolved against the page URL.
fn generic_images(doc: &Html, page_url: &str) -> Vec<String> {
    let base = Url::parse(page_url).ok();

    for selector in selectors::generic::IMAGES.iter() {
        let mut images = Vec::new();
        for img in doc.select(selector) {
            let Some(src) = img.value().attr("src").or_else(|| img.value().attr("data-src"))
            else {
                continue;
            };
            if src.contains("placeholder") {
                continue;
            }
            let absolute = match &base {
                Some(base) => match base.join(src) {
                    Ok(resolved) => resolved.to_string(),
                    Err(_) => continue,
                },
                None => src.to_string(),
            };
            if !images.contains(&absolute) {
                images.push(absolute);
                if images.len() == GENERIC_IMAGE_CAP {
                    break;
                }
            }
        }
        if !images.is_empty() {
            return images;
        }
    }
    Vec::new()
}

/// Shein gallery harvesting: selector cascade, then meta tags, then inline
/// JSON payloads.
fn shein_images(doc: &Html) -> Vec<String> {
    for selector in selectors::shein::GALLERY_IMAGES.iter() {
        let mut images = Vec::new();
        for img in doc.select(selector) {
            let el = img.value();
            let Some(src) =
                el.attr("src").or_else(|| el.attr("data-src")).or_else(|| el.attr("data-original"))
            else {
                continue;
            };
            let src = cdn::normalize_scheme(src);
            if !cdn::is_cdn_url(&src)
                || cdn::looks_like_asset(&src)
                || cdn::is_tiny_thumbnail(&src)
            {
                continue;
            }
            let upgraded = cdn::upgrade_image_url(&src, "750x");
            if !images.contains(&upgraded) {
                images.push(upgraded);
                if images.len() == SHEIN_IMAGE_CAP {
                    break;
                }
            }
        }
        if !images.is_empty() {
            return images;
        }
    }

    let from_meta: Vec<String> = doc
        .select(&selectors::meta::SOCIAL_IMAGE)
        .filter_map(|el| el.value().attr("content"))
        .map(cdn::normalize_scheme)
        .filter(|u| cdn::is_cdn_url(u))
        .collect();
    if !from_meta.is_empty() {
        return dedup_capped(from_meta, SHEIN_IMAGE_CAP);
    }

    dedup_capped(super::images::embedded_json_images(doc), SHEIN_IMAGE_CAP)
}

fn non_empty_or(values: Vec<String>, defaults: &[&str]) -> Vec<String> {
    if values.is_empty() {
        defaults.iter().map(|s| s.to_string()).collect()
    } else {
        values
    }
}
