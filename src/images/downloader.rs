//! Verified image downloads with multi-candidate fallback.
//!
//! Each download walks the candidate list as an explicit work queue:
//! redirects are followed by prepending the target (capped per chain),
//! non-200 statuses and non-image payloads advance to the next candidate,
//! and only a fully written file counts as success. Batch downloads degrade
//! per image and never fail as a whole.

use crate::config::Config;
use crate::error::{CandidateFailure, DownloadError};
use crate::images::build_candidates;
use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;
use wreq::Client;
use wreq_util::Emulation;

/// Extensions recognized for the skip-if-exists check.
const KNOWN_EXTENSIONS: [&str; 6] = [".jpg", ".jpeg", ".png", ".webp", ".avif", ".gif"];

/// URL path prefix under which downloaded files are served.
const PUBLIC_PREFIX: &str = "/api/images";

enum CandidateOutcome {
    Saved(String),
    Redirect(String),
}

/// Downloads product images to local storage, trying CDN variants in
/// priority order.
pub struct ImageDownloader {
    client: Client,
    download_dir: PathBuf,
    default_referer: String,
    max_redirects: usize,
}

impl ImageDownloader {
    /// Creates a downloader, ensuring the download directory exists.
    pub fn new(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.download_dir).with_context(|| {
            format!("Failed to create download directory: {}", config.download_dir.display())
        })?;

        // Redirects are followed manually so the target can be enqueued as
        // the next candidate with its own hop budget.
        let mut builder = Client::builder()
            .redirect(wreq::redirect::Policy::none())
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(config.download_timeout_secs))
            .connect_timeout(Duration::from_secs(10));

        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            download_dir: config.download_dir.clone(),
            default_referer: config.referer.clone(),
            max_redirects: config.max_redirects,
        })
    }

    /// Returns the directory downloads are written to.
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Downloads one image, returning its public local path.
    ///
    /// Tries every candidate derived from `image_url` before giving up.
    /// A file already on disk under the same `{product_id}_{index}` basename
    /// short-circuits to success without network I/O.
    pub async fn download(
        &self,
        image_url: &str,
        product_id: &str,
        index: usize,
        referer: Option<&str>,
    ) -> Result<String, DownloadError> {
        let base = format!("{}_{}", product_id, index);

        if let Some(existing) = self.existing_file(&base) {
            debug!("Reusing existing file {}", existing);
            return Ok(format!("{}/{}", PUBLIC_PREFIX, existing));
        }

        let candidates = build_candidates(image_url);
        let attempts = candidates.len();

        let mut queue: VecDeque<(String, usize)> =
            candidates.into_iter().map(|c| (c, self.max_redirects)).collect();

        while let Some((candidate, redirects_left)) = queue.pop_front() {
            match self.try_candidate(&candidate, &base, referer).await {
                Ok(CandidateOutcome::Saved(filename)) => {
                    debug!("Saved {} from {}", filename, candidate);
                    return Ok(format!("{}/{}", PUBLIC_PREFIX, filename));
                }
                Ok(CandidateOutcome::Redirect(location)) => {
                    if redirects_left == 0 {
                        debug!(url = %candidate, "Redirect cap reached, advancing");
                        continue;
                    }
                    queue.push_front((location, redirects_left - 1));
                }
                Err(failure) => {
                    debug!(url = %candidate, error = %failure, "Candidate failed, advancing");
                }
            }
        }

        Err(DownloadError::Exhausted { attempts })
    }

    /// Downloads all images for one product concurrently.
    ///
    /// Results follow input order; failed images are dropped rather than
    /// failing the batch.
    pub async fn download_all(
        &self,
        image_urls: &[String],
        product_id: &str,
        referer: Option<&str>,
    ) -> Vec<String> {
        let downloads = image_urls.iter().enumerate().map(|(index, url)| async move {
            match self.download(url, product_id, index, referer).await {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(index, product_id, error = %e, "Image download failed");
                    None
                }
            }
        });

        let local_paths: Vec<String> =
            futures::future::join_all(downloads).await.into_iter().flatten().collect();

        info!("Downloaded {}/{} images for product {}", local_paths.len(), image_urls.len(), product_id);
        local_paths
    }

    async fn try_candidate(
        &self,
        candidate: &str,
        base: &str,
        referer: Option<&str>,
    ) -> Result<CandidateOutcome, CandidateFailure> {
        let url =
            Url::parse(candidate).map_err(|e| CandidateFailure::InvalidUrl(e.to_string()))?;

        let response = self
            .client
            .get(url.as_str())
            .emulation(Emulation::Chrome131)
            .header("Accept", "image/avif,image/webp,image/apng,image/*,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Referer", referer.unwrap_or(&self.default_referer))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CandidateFailure::Timeout
                } else {
                    CandidateFailure::Network(e.to_string())
                }
            })?;

        let status = response.status();

        if status.is_redirection() {
            let location = response
                .headers()
                .get("location")
                .and_then(|v| v.to_str().ok())
                .ok_or(CandidateFailure::MissingLocation)?;

            let target = if location.starts_with("http") {
                location.to_string()
            } else {
                url.join(location)
                    .map_err(|e| CandidateFailure::InvalidUrl(e.to_string()))?
                    .to_string()
            };
            return Ok(CandidateOutcome::Redirect(target));
        }

        if status.as_u16() != 200 {
            return Err(CandidateFailure::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_lowercase();

        if !content_type.starts_with("image/") {
            return Err(CandidateFailure::ContentType(content_type));
        }

        let extension = choose_extension(url.path(), &content_type);
        let filename = format!("{}{}", base, extension);
        let file_path = self.download_dir.join(&filename);

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                CandidateFailure::Timeout
            } else {
                CandidateFailure::Network(e.to_string())
            }
        })?;

        if let Err(e) = tokio::fs::write(&file_path, &bytes).await {
            // Drop the partial file so a later candidate can claim the name.
            let _ = tokio::fs::remove_file(&file_path).await;
            return Err(CandidateFailure::Write(e.to_string()));
        }

        Ok(CandidateOutcome::Saved(filename))
    }

    /// Looks for an already-downloaded file under any recognized extension.
    fn existing_file(&self, base: &str) -> Option<String> {
        KNOWN_EXTENSIONS.iter().map(|ext| format!("{}{}", base, ext)).find(|name| {
            self.download_dir.join(name).exists()
        })
    }
}

/// Picks the file extension: the URL's own when recognized, else the
/// content-type mapping, else `.jpg`. `.jpeg` normalizes to `.jpg`.
fn choose_extension(url_path: &str, content_type: &str) -> String {
    if let Some(ext) = url_extension(url_path) {
        return ext;
    }
    ext_from_content_type(content_type).unwrap_or(".jpg").to_string()
}

fn url_extension(url_path: &str) -> Option<String> {
    let ext = Path::new(url_path).extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some(".jpg".to_string()),
        "png" | "webp" | "avif" | "gif" => Some(format!(".{}", ext)),
        _ => None,
    }
}

fn ext_from_content_type(content_type: &str) -> Option<&'static str> {
    if content_type.contains("image/jpeg") {
        Some(".jpg")
    } else if content_type.contains("image/png") {
        Some(".png")
    } else if content_type.contains("image/webp") {
        Some(".webp")
    } else if content_type.contains("image/avif") {
        Some(".avif")
    } else if content_type.contains("image/gif") {
        Some(".gif")
    } else {
        None
    }
}
