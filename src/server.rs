//! HTTP surface: scrape endpoint, image passthrough proxy, health check,
//! and static serving of downloaded images.

use crate::config::Config;
use crate::extract::Extractor;
use crate::images::ImageDownloader;
use crate::product::ProductRecord;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{info, warn};
use url::Url;

#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<Extractor>,
    pub downloader: Arc<ImageDownloader>,
    pub config: Arc<Config>,
    /// Client for the passthrough proxy; follows redirects, unlike the
    /// downloader's.
    pub proxy_client: wreq::Client,
}

impl AppState {
    pub fn new(
        extractor: Arc<Extractor>,
        downloader: Arc<ImageDownloader>,
        config: Arc<Config>,
    ) -> anyhow::Result<Self> {
        let proxy_client = wreq::Client::builder()
            .timeout(Duration::from_secs(config.proxy_timeout_secs))
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self { extractor, downloader, config, proxy_client })
    }
}

/// Request and response errors surfaced as JSON.
#[derive(Debug)]
pub enum ApiError {
    MissingUrl,
    InvalidUrl,
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::MissingUrl => (StatusCode::BAD_REQUEST, "URL is required".to_string()),
            ApiError::InvalidUrl => (StatusCode::BAD_REQUEST, "Invalid URL format".to_string()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        let body = Json(serde_json::json!({ "success": false, "error": message }));
        (status, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    pub success: bool,
    pub data: ProductRecord,
}

#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub url: Option<String>,
}

/// Builds the application router over shared state.
pub fn build_app(state: AppState) -> Router {
    let images_dir = state.downloader.download_dir().to_path_buf();

    Router::new()
        .route("/health", get(health))
        .route("/api/scrape", post(scrape))
        .route("/proxy-image", get(proxy_image))
        .nest_service("/api/images", ServeDir::new(images_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "OK",
        "message": "Product Scraper Service is running"
    }))
}

async fn scrape(
    State(state): State<AppState>,
    Json(request): Json<ScrapeRequest>,
) -> Result<Json<ScrapeResponse>, ApiError> {
    let url = request.url.filter(|u| !u.trim().is_empty()).ok_or(ApiError::MissingUrl)?;
    let parsed = Url::parse(&url).map_err(|_| ApiError::InvalidUrl)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::InvalidUrl);
    }

    info!("Scraping product page: {}", url);
    let extraction = state.extractor.extract(&url).await;
    if extraction.is_fallback() {
        warn!("Serving fallback data for {}", url);
    }
    let mut record = extraction.into_record();

    let product_id = product_id();
    let referer = referer_for(&parsed);
    let local_paths = state
        .downloader
        .download_all(&record.image_urls, &product_id, referer.as_deref())
        .await;

    // Keep the remote URLs when nothing could be localized, so the client
    // still has something to render.
    if !local_paths.is_empty() {
        record.image_urls = local_paths;
    }

    Ok(Json(ScrapeResponse { success: true, data: record }))
}

async fn proxy_image(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
) -> Response {
    let Some(url) = query.url.filter(|u| !u.trim().is_empty()) else {
        return ApiError::MissingUrl.into_response();
    };
    if Url::parse(&url).is_err() {
        return ApiError::InvalidUrl.into_response();
    }

    let result = state
        .proxy_client
        .get(&url)
        .header("Referer", &state.config.referer)
        .header("Accept", "image/avif,image/webp,image/apng,image/*,*/*;q=0.8")
        .send()
        .await;

    let response = match result {
        Ok(response) => response,
        Err(e) if e.is_timeout() => {
            return (
                StatusCode::REQUEST_TIMEOUT,
                Json(serde_json::json!({ "success": false, "error": "Image fetch timed out" })),
            )
                .into_response();
        }
        Err(e) => {
            warn!("Proxy fetch failed for {}: {}", url, e);
            return ApiError::Internal("Failed to fetch image".to_string()).into_response();
        }
    };

    if response.status().as_u16() != 200 {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "success": false, "error": "Image not found" })),
        )
            .into_response();
    }

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("image/jpeg")
        .to_string();

    match response.bytes().await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type),
                (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
            ],
            bytes.to_vec(),
        )
            .into_response(),
        Err(e) => {
            warn!("Proxy body read failed for {}: {}", url, e);
            ApiError::Internal("Failed to fetch image".to_string()).into_response()
        }
    }
}

/// Millisecond timestamp used to group one scrape's files on disk.
fn product_id() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

/// Shein CDNs check the Referer against the storefront, so downloads for
/// Shein pages present the page's own origin. Everything else uses the
/// configured default.
fn referer_for(page_url: &Url) -> Option<String> {
    let host = page_url.host_str()?;
    if host.contains("shein.com") {
        Some(format!("{}/", page_url.origin().ascii_serialization()))
    } else {
        None
    }
}
