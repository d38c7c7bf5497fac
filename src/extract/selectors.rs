//! CSS selectors for product page parsing.
//!
//! Selectors are grouped in cascades tried in priority order: the first
//! selector whose first match yields non-empty text wins. Update this file
//! when a storefront changes its HTML structure.

use scraper::Selector;
use std::sync::LazyLock;

fn cascade(selectors: &[&str]) -> Vec<Selector> {
    selectors.iter().map(|s| Selector::parse(s).unwrap()).collect()
}

/// Cascades for generic e-commerce storefronts.
pub mod generic {
    use super::*;

    pub static NAME: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        cascade(&[
            "h1[data-testid='product-title']",
            "h1.product-title",
            "h1#product-title",
            ".product-name h1",
            ".product-title h1",
            "[data-automation-id='product-title']",
            ".pdp-product-name",
            ".product-name",
            "h1",
        ])
    });

    pub static PRICE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        cascade(&[
            "[data-testid='price']",
            ".price-current",
            ".product-price",
            ".price",
            "[data-automation-id='product-price']",
            ".pdp-price",
            ".current-price",
            ".sale-price",
        ])
    });

    pub static DESCRIPTION: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        cascade(&[
            "[data-testid='product-description']",
            ".product-description",
            ".product-details",
            ".product-info",
            ".description",
            ".pdp-description",
        ])
    });

    pub static IMAGES: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        cascade(&[
            ".product-images img",
            ".product-gallery img",
            "[data-testid='product-image']",
            ".pdp-images img",
            ".gallery img",
        ])
    });

    /// Option-harvesting selectors, parameterized over the keyword.
    pub fn option_selectors(keyword: &str) -> Vec<Selector> {
        [
            format!("select[name*='{}'] option", keyword),
            format!("select[id*='{}'] option", keyword),
            format!("[class*='{}']", keyword),
        ]
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
    }
}

/// Cascades tuned to the Shein storefront markup.
pub mod shein {
    use super::*;

    pub static NAME: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        cascade(&[
            "[data-testid='product-title']",
            ".product-intro__head-name",
            ".sui-atom-cropped-text",
            "h1",
        ])
    });

    pub static PRICE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        cascade(&[
            ".original-price",
            ".product-intro__head-mainprice",
            "[class*='price-current']",
            "[data-testid='price']",
        ])
    });

    pub static DESCRIPTION: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        cascade(&[
            ".product-intro__head-detail",
            ".product-detail",
            "[data-testid='product-description']",
        ])
    });

    pub static COLORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        cascade(&["[data-testid='color-option']", ".color-item", "[class*='color']"])
    });

    pub static SIZES: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        cascade(&["[data-testid='size-option']", ".size-item", "[class*='size']"])
    });

    pub static GALLERY_IMAGES: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        cascade(&[
            "[class*='product-intro'] img",
            "[class*='product-gallery'] img",
            "[data-testid*='gallery'] img",
            ".product-intro__head-gallery img",
            ".sui-image img",
            "img[src*='ltwebstatic.com']",
            "img[src*='shein']",
        ])
    });
}

/// Meta-tag and structured-data selectors shared across storefronts.
pub mod meta {
    use super::*;

    /// Open Graph and Twitter card image tags.
    pub static SOCIAL_IMAGE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "meta[property='og:image'], \
             meta[name='og:image'], \
             meta[property='twitter:image']",
        )
        .unwrap()
    });

    /// Inline JSON payloads that sometimes embed gallery URLs.
    pub static JSON_SCRIPTS: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "script[type='application/json'], \
             script[type='application/ld+json']",
        )
        .unwrap()
    });
}

/// Raw DOM harvesting selectors used by the image signal collector.
pub mod dom {
    use super::*;

    /// Gallery containers searched before falling back to the whole page.
    pub static GALLERY_CONTAINERS: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "[class*='product-intro'], \
             [class*='product-gallery'], \
             [data-testid*='gallery']",
        )
        .unwrap()
    });

    pub static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());
}
