//! Data models for extracted products and the mock fallback set.

use rand::RngExt;
use serde::{Deserialize, Serialize};

/// Maximum number of image URLs returned per product.
pub const MAX_IMAGE_URLS: usize = 8;

/// Maximum number of color/size options returned per product.
pub const MAX_OPTIONS: usize = 10;

/// Generic-site descriptions are truncated to this many characters.
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// The structured result of one product page extraction.
///
/// Constructed fresh per scrape request and never persisted beyond the
/// HTTP response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Product display name
    pub name: String,
    /// Product description text
    pub description: String,
    /// Price amount
    pub price: f64,
    /// ISO-4217-like currency code
    pub currency: String,
    /// Available colors, deduplicated
    pub colors: Vec<String>,
    /// Available sizes, deduplicated
    pub sizes: Vec<String>,
    /// Absolute image URLs, deduplicated and capped
    pub image_urls: Vec<String>,
}

/// Tagged extraction result so callers can tell real data from the
/// synthetic fallback set.
#[derive(Debug, Clone)]
pub enum Extraction {
    /// Data extracted from the live page.
    Extracted(ProductRecord),
    /// Extraction failed; a canned record was substituted.
    Fallback {
        record: ProductRecord,
        reason: String,
    },
}

impl Extraction {
    /// Returns the record regardless of provenance.
    pub fn record(&self) -> &ProductRecord {
        match self {
            Extraction::Extracted(record) => record,
            Extraction::Fallback { record, .. } => record,
        }
    }

    /// Consumes the extraction, returning the record.
    pub fn into_record(self) -> ProductRecord {
        match self {
            Extraction::Extracted(record) => record,
            Extraction::Fallback { record, .. } => record,
        }
    }

    /// True when the record came from the mock set.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Extraction::Fallback { .. })
    }
}

/// Deduplicates while preserving first-seen order, then caps the list.
pub fn dedup_capped(values: Vec<String>, cap: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        if !out.contains(&value) {
            out.push(value);
            if out.len() == cap {
                break;
            }
        }
    }
    out
}

/// Truncates text on a character boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Returns one of the canned mock records, chosen at random.
pub fn mock_record() -> ProductRecord {
    let mocks = mock_records();
    let idx = rand::rng().random_range(0..mocks.len());
    mocks.into_iter().nth(idx).unwrap_or_else(placeholder_record)
}

fn placeholder_record() -> ProductRecord {
    ProductRecord {
        name: "Product".to_string(),
        description: "Product description not available".to_string(),
        price: 9.99,
        currency: "USD".to_string(),
        colors: vec!["Standard".to_string()],
        sizes: vec!["One Size".to_string()],
        image_urls: Vec::new(),
    }
}

fn mock_records() -> Vec<ProductRecord> {
    vec![
        ProductRecord {
            name: "Premium Wireless Headphones".to_string(),
            description: "High-quality wireless headphones with noise cancellation and \
                          premium sound quality. Perfect for music lovers and professionals."
                .to_string(),
            price: 199.99,
            currency: "USD".to_string(),
            colors: vec!["Black".to_string(), "White".to_string(), "Silver".to_string()],
            sizes: vec!["One Size".to_string()],
            image_urls: vec![
                "https://images.unsplash.com/photo-1505740420928-5e560c06d30e?w=400".to_string(),
                "https://images.unsplash.com/photo-1484704849700-f032a568e944?w=400".to_string(),
            ],
        },
        ProductRecord {
            name: "Smart Fitness Watch".to_string(),
            description: "Advanced fitness tracking watch with heart rate monitoring, GPS, \
                          and smartphone integration."
                .to_string(),
            price: 299.99,
            currency: "USD".to_string(),
            colors: vec!["Black".to_string(), "White".to_string(), "Rose Gold".to_string()],
            sizes: vec!["38mm".to_string(), "42mm".to_string(), "46mm".to_string()],
            image_urls: vec![
                "https://images.unsplash.com/photo-1523275335684-37898b6baf30?w=400".to_string(),
            ],
        },
        ProductRecord {
            name: "Comfortable Running Shoes".to_string(),
            description: "Lightweight running shoes designed for maximum comfort and \
                          performance during your workout sessions."
                .to_string(),
            price: 89.99,
            currency: "USD".to_string(),
            colors: vec![
                "White".to_string(),
                "Black".to_string(),
                "Blue".to_string(),
                "Red".to_string(),
            ],
            sizes: vec!["7", "8", "9", "10", "11", "12"].into_iter().map(String::from).collect(),
            image_urls: vec![
                "https://images.unsplash.com/photo-1542291026-7eec264c27ff?w=400".to_string(),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serde_shape() {
        let record = mock_records().remove(0);
        let json = serde_json::to_value(&record).unwrap();

        assert!(json.get("name").is_some());
        assert!(json.get("description").is_some());
        assert!(json.get("price").is_some());
        assert!(json.get("currency").is_some());
        assert!(json.get("colors").is_some());
        assert!(json.get("sizes").is_some());
        // Wire shape uses snake_case image_urls.
        assert!(json.get("image_urls").is_some());
        assert!(json.get("imageUrls").is_none());

        let parsed: ProductRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.name, record.name);
        assert_eq!(parsed.image_urls, record.image_urls);
    }

    #[test]
    fn test_mock_record_is_well_formed() {
        for _ in 0..20 {
            let record = mock_record();
            assert!(!record.name.is_empty());
            assert!(!record.description.is_empty());
            assert!(record.price > 0.0);
            assert_eq!(record.currency, "USD");
            assert!(!record.colors.is_empty());
            assert!(!record.sizes.is_empty());
            assert!(!record.image_urls.is_empty());
        }
    }

    #[test]
    fn test_mock_record_comes_from_fixed_set() {
        let names: Vec<String> = mock_records().into_iter().map(|m| m.name).collect();
        for _ in 0..20 {
            assert!(names.contains(&mock_record().name));
        }
    }

    #[test]
    fn test_extraction_accessors() {
        let record = mock_records().remove(1);
        let extracted = Extraction::Extracted(record.clone());
        assert!(!extracted.is_fallback());
        assert_eq!(extracted.record().name, record.name);

        let fallback = Extraction::Fallback {
            record: record.clone(),
            reason: "navigation failed".to_string(),
        };
        assert!(fallback.is_fallback());
        assert_eq!(fallback.into_record().name, record.name);
    }

    #[test]
    fn test_dedup_capped() {
        let input = vec!["a", "b", "a", "c", "b", "d"].into_iter().map(String::from).collect();
        assert_eq!(dedup_capped(input, 3), vec!["a", "b", "c"]);

        let empty: Vec<String> = Vec::new();
        assert!(dedup_capped(empty, 5).is_empty());
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("hi", 10), "hi");
        // Multi-byte safety.
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }
}
