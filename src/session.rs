//! Headless browser page sessions.
//!
//! A session captures everything the extractor needs from one rendered
//! page: the settled DOM and the CDN image URLs observed on the network.
//! The capture boundary keeps browser I/O out of the extraction logic, so
//! tests drive the extractor with canned captures instead of a Chrome
//! process.

use crate::cdn;
use crate::config::Config;
use crate::error::SessionError;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventResponseReceived, Headers, ResourceType, SetExtraHttpHeadersParams,
};
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Everything harvested from one rendered page.
#[derive(Debug, Clone, Default)]
pub struct PageCapture {
    /// Serialized DOM after navigation, scrolling, and settling.
    pub html: String,
    /// CDN image URLs observed as network responses while the page loaded.
    pub network_images: Vec<String>,
}

/// Renders a product page and captures its DOM plus network traffic.
#[async_trait]
pub trait PageSession: Send + Sync {
    async fn capture(&self, url: &str) -> Result<PageCapture, SessionError>;
}

/// [`PageSession`] backed by a headless Chrome process.
///
/// Each capture launches a fresh browser and tears it down before
/// returning, on success and failure alike. Scrape traffic is low enough
/// that a clean profile per request beats keeping a shared instance warm.
pub struct ChromeSession {
    navigation_timeout: Duration,
    scroll_settle: Duration,
    referer: String,
}

impl ChromeSession {
    pub fn new(config: &Config) -> Self {
        Self {
            navigation_timeout: Duration::from_secs(config.navigation_timeout_secs),
            scroll_settle: Duration::from_millis(config.scroll_settle_ms),
            referer: config.referer.clone(),
        }
    }

    async fn launch(&self) -> Result<(Browser, JoinHandle<()>), SessionError> {
        let browser_config = BrowserConfig::builder()
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu")
            .arg(format!("--user-agent={}", USER_AGENT))
            .window_size(1280, 720)
            .build()
            .map_err(SessionError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while handler.next().await.is_some() {}
        });

        Ok((browser, handler_task))
    }

    async fn capture_inner(&self, browser: &Browser, url: &str) -> Result<PageCapture, SessionError> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Navigation(e.to_string()))?;

        let headers = serde_json::json!({
            "Accept-Language": "en-US,en;q=0.9",
            "Referer": self.referer,
        });
        if let Err(e) = page.execute(SetExtraHttpHeadersParams::new(Headers::new(headers))).await {
            warn!("Failed to set extra headers: {}", e);
        }

        if let Err(e) = page.execute(EnableParams::default()).await {
            warn!("Failed to enable network events: {}", e);
        }

        // Collect CDN image responses for as long as the page keeps loading.
        let network_images: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let collector = match page.event_listener::<EventResponseReceived>().await {
            Ok(mut events) => {
                let sink = Arc::clone(&network_images);
                Some(tokio::spawn(async move {
                    while let Some(event) = events.next().await {
                        if event.r#type == ResourceType::Image
                            && cdn::is_cdn_url(&event.response.url)
                        {
                            if let Ok(mut urls) = sink.lock() {
                                urls.push(event.response.url.clone());
                            }
                        }
                    }
                }))
            }
            Err(e) => {
                warn!("Failed to subscribe to network events: {}", e);
                None
            }
        };

        let navigation = async {
            page.goto(url).await.map_err(|e| SessionError::Navigation(e.to_string()))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| SessionError::Navigation(e.to_string()))?;
            Ok::<(), SessionError>(())
        };

        let result = tokio::time::timeout(self.navigation_timeout, navigation)
            .await
            .map_err(|_| SessionError::Timeout(self.navigation_timeout.as_secs()))
            .and_then(|r| r);

        if let Err(e) = result {
            if let Some(task) = collector {
                task.abort();
            }
            return Err(e);
        }

        // Scroll down in two steps so lazy-loaded gallery images enter the
        // viewport, letting each one settle.
        for fraction in ["/ 3", "* 2 / 3"] {
            let script = format!("window.scrollTo(0, document.body.scrollHeight {})", fraction);
            if let Err(e) = page.evaluate(script).await {
                debug!("Scroll step failed: {}", e);
            }
            tokio::time::sleep(self.scroll_settle).await;
        }

        let html = tokio::time::timeout(self.navigation_timeout, page.content())
            .await
            .map_err(|_| SessionError::Timeout(self.navigation_timeout.as_secs()))?
            .map_err(|e| SessionError::Content(e.to_string()))?;

        if let Some(task) = collector {
            task.abort();
        }

        let network_images = network_images.lock().map(|urls| urls.clone()).unwrap_or_default();
        debug!("Captured {} bytes of HTML, {} network images", html.len(), network_images.len());

        Ok(PageCapture { html, network_images })
    }
}

#[async_trait]
impl PageSession for ChromeSession {
    async fn capture(&self, url: &str) -> Result<PageCapture, SessionError> {
        let (mut browser, handler_task) = self.launch().await?;

        let result = self.capture_inner(&browser, url).await;

        // The browser comes down on every path, including capture failure.
        if let Err(e) = browser.close().await {
            warn!("Browser close error: {}", e);
        }
        handler_task.abort();

        result
    }
}
