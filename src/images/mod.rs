//! Image acquisition: candidate URL generation and verified local downloads.

pub mod candidates;
pub mod downloader;

pub use candidates::build_candidates;
pub use downloader::ImageDownloader;
