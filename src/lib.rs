//! product-scraper - Product page scraping and image re-hosting service
//!
//! Extracts structured product data (name, price, images, variants) from
//! e-commerce product pages and persists verified copies of the discovered
//! images locally, with TLS fingerprint emulation for reliable scraping
//! without detection.

pub mod cdn;
pub mod config;
pub mod error;
pub mod extract;
pub mod images;
pub mod product;
pub mod server;
pub mod session;

pub use config::Config;
pub use extract::Extractor;
pub use images::ImageDownloader;
pub use product::{Extraction, ProductRecord};
pub use session::{ChromeSession, PageCapture, PageSession};
