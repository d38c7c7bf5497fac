//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Listen port for the HTTP service
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory where downloaded images are persisted
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Default Referer header sent to image CDNs
    #[serde(default = "default_referer")]
    pub referer: String,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Page navigation timeout in seconds
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,

    /// Per-image download timeout in seconds
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    /// Passthrough image proxy timeout in seconds
    #[serde(default = "default_proxy_timeout_secs")]
    pub proxy_timeout_secs: u64,

    /// Delay after each lazy-load scroll, in milliseconds
    #[serde(default = "default_scroll_settle_ms")]
    pub scroll_settle_ms: u64,

    /// Maximum images kept per product
    #[serde(default = "default_max_images")]
    pub max_images: usize,

    /// Maximum redirect hops per download candidate
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_port() -> u16 {
    3001
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads/images")
}

fn default_referer() -> String {
    "https://us.shein.com/".to_string()
}

fn default_navigation_timeout_secs() -> u64 {
    30
}

fn default_download_timeout_secs() -> u64 {
    20
}

fn default_proxy_timeout_secs() -> u64 {
    10
}

fn default_scroll_settle_ms() -> u64 {
    2000
}

fn default_max_images() -> usize {
    8
}

fn default_max_redirects() -> usize {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            download_dir: default_download_dir(),
            referer: default_referer(),
            proxy: None,
            navigation_timeout_secs: default_navigation_timeout_secs(),
            download_timeout_secs: default_download_timeout_secs(),
            proxy_timeout_secs: default_proxy_timeout_secs(),
            scroll_settle_ms: default_scroll_settle_ms(),
            max_images: default_max_images(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("product-scraper").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(port) = std::env::var("SCRAPER_PORT") {
            if let Ok(p) = port.parse() {
                self.port = p;
            }
        }

        if let Ok(dir) = std::env::var("SCRAPER_DOWNLOAD_DIR") {
            self.download_dir = PathBuf::from(dir);
        }

        if let Ok(referer) = std::env::var("SCRAPER_REFERER") {
            self.referer = referer;
        }

        if let Ok(proxy) = std::env::var("SCRAPER_PROXY") {
            self.proxy = Some(proxy);
        }

        self
    }
}
