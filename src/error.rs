//! Error taxonomy for the scrape and download pipelines.
//!
//! Failures are contained at the smallest possible scope: a candidate
//! failure never escalates past its image, an image failure never escalates
//! past its batch, and extraction failures are absorbed into mock fallback
//! data before they reach the HTTP layer.

use thiserror::Error;

/// Failure of a single candidate URL within one image download.
///
/// Always recovered by advancing to the next candidate in the work queue.
#[derive(Debug, Error)]
pub enum CandidateFailure {
    #[error("bad status {0}")]
    Status(u16),

    #[error("unexpected content-type '{0}'")]
    ContentType(String),

    #[error("redirect without a location header")]
    MissingLocation,

    #[error("invalid candidate url: {0}")]
    InvalidUrl(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("file write failed: {0}")]
    Write(String),
}

/// Failure of one image download after every candidate has been tried.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("exhausted all {attempts} candidate URLs")]
    Exhausted { attempts: usize },
}

/// Failure of the headless browser session.
///
/// Absorbed by the extractor, which substitutes a tagged mock record.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("browser launch failed: {0}")]
    Launch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("navigation timed out after {0}s")]
    Timeout(u64),

    #[error("page content unavailable: {0}")]
    Content(String),
}
