//! Product page extraction pipeline.
//!
//! The extractor drives a [`PageSession`] to capture a rendered page,
//! parses the structured fields, fuses the four image signal channels,
//! and never fails: any error on the way is absorbed into a tagged mock
//! fallback record so the API stays responsive while a storefront is
//! blocking us.

pub mod fields;
pub mod images;
pub mod selectors;

use crate::product::{mock_record, Extraction, ProductRecord};
use crate::session::{PageCapture, PageSession};
use anyhow::Result;
use scraper::Html;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use fields::Variant;
pub use images::{merge_image_sources, ImageSignals};

pub struct Extractor {
    session: Arc<dyn PageSession>,
    max_images: usize,
}

impl Extractor {
    pub fn new(session: Arc<dyn PageSession>, max_images: usize) -> Self {
        Self { session, max_images }
    }

    /// Extracts a product record from a live page.
    ///
    /// Never errors: extraction failures are logged and substituted with a
    /// canned record tagged as [`Extraction::Fallback`].
    pub async fn extract(&self, url: &str) -> Extraction {
        match self.try_extract(url).await {
            Ok(record) => {
                info!("Extracted '{}' with {} images", record.name, record.image_urls.len());
                Extraction::Extracted(record)
            }
            Err(e) => {
                warn!("Extraction failed for {}: {}", url, e);
                Extraction::Fallback { record: mock_record(), reason: e.to_string() }
            }
        }
    }

    async fn try_extract(&self, url: &str) -> Result<ProductRecord> {
        let capture = self.session.capture(url).await?;
        Ok(self.build_record(url, &capture))
    }

    /// Pure assembly over a finished capture. Parsed HTML never crosses an
    /// await point.
    fn build_record(&self, url: &str, capture: &PageCapture) -> ProductRecord {
        let doc = Html::parse_document(&capture.html);
        let mut record = fields::extract_fields(&doc, url);

        let signals = ImageSignals {
            dom: images::harvest_dom_images(&doc),
            network: capture.network_images.clone(),
            meta: images::harvest_meta_images(&doc),
            embedded: images::embedded_cdn_urls(&capture.html),
        };
        debug!(
            dom = signals.dom.len(),
            network = signals.network.len(),
            meta = signals.meta.len(),
            embedded = signals.embedded.len(),
            "Image signals collected"
        );

        let fused = merge_image_sources(&signals, self.max_images);
        if !fused.is_empty() {
            record.image_urls = fused;
        }

        record
    }
}
