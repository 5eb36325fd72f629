//! Remote subtitle catalog access.

pub mod opensubtitles;

use std::future::Future;
use thiserror::Error;

use crate::media::{SearchParams, Subtitle};

pub use opensubtitles::OpenSubtitlesClient;

/// Errors returned by catalog clients
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("authentication expired, please retry")]
    Unauthorized,

    #[error("catalog request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("download limit exceeded: {0}")]
    DownloadLimit(String),

    #[error("subtitle {0} has no downloadable file")]
    MissingFileId(String),

    #[error("no download link provided")]
    MissingLink,
}

/// A searchable source of subtitles
pub trait SubtitleCatalog: Send {
    /// Search for subtitle candidates matching the parameters
    fn search(
        &mut self,
        params: &SearchParams,
    ) -> impl Future<Output = Result<Vec<Subtitle>, CatalogError>> + Send;

    /// Fetch the subtitle file contents
    fn download(
        &mut self,
        subtitle: &Subtitle,
    ) -> impl Future<Output = Result<Vec<u8>, CatalogError>> + Send;
}
