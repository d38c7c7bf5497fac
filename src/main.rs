//! product-scraper - Product page scraping service with image localization
//!
//! Renders product pages in headless Chrome, extracts structured data, and
//! mirrors gallery images to local storage behind a small HTTP API.

use anyhow::Result;
use clap::Parser;
use product_scraper::extract::Extractor;
use product_scraper::images::ImageDownloader;
use product_scraper::server::{build_app, AppState};
use product_scraper::session::ChromeSession;
use product_scraper::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "product-scraper",
    version,
    about = "Product page scraping service with image localization",
    long_about = "Renders product pages in headless Chrome, extracts structured product data, \
                  and downloads gallery images for local serving."
)]
struct Cli {
    /// Listen port
    #[arg(short, long, env = "SCRAPER_PORT")]
    port: Option<u16>,

    /// Directory for downloaded images
    #[arg(long, env = "SCRAPER_DOWNLOAD_DIR")]
    download_dir: Option<PathBuf>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, env = "SCRAPER_PROXY")]
    proxy: Option<String>,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(dir) = cli.download_dir {
        config.download_dir = dir;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }

    let config = Arc::new(config);
    let session = Arc::new(ChromeSession::new(&config));
    let extractor = Arc::new(Extractor::new(session, config.max_images));
    let downloader = Arc::new(ImageDownloader::new(&config)?);

    let state = AppState::new(extractor, downloader, Arc::clone(&config))?;
    let app = build_app(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Product scraper service listening on {}", addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
