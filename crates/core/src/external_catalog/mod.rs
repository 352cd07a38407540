//! External catalog integration for Spotify.
//!
//! The resolver only talks to the [`ExternalCatalog`] trait: artist search,
//! paged album listing and bulk album-to-tracks lookup. Authentication is the
//! concern of the concrete client.

mod spotify;
mod types;

pub use spotify::{SpotifyClient, SpotifyConfig};
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Largest `limit` accepted by the artist search endpoint.
pub const MAX_ARTIST_SEARCH_LIMIT: u32 = 50;

/// Largest page size accepted by the artist albums endpoint.
pub const MAX_ALBUM_PAGE_SIZE: u32 = 50;

/// Largest number of album ids accepted by one bulk album lookup.
pub const MAX_ALBUM_BATCH_SIZE: usize = 20;

/// Errors that can occur when interacting with external catalogs.
#[derive(Debug, Error)]
pub enum ExternalCatalogError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimitExceeded,

    /// Resource not found (404).
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Client not configured (missing credentials, etc.).
    #[error("Client not configured: {0}")]
    NotConfigured(String),

    /// Credentials or access token were rejected.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// The request could not be built (e.g. too many ids in one batch).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Trait for music catalog clients.
#[async_trait]
pub trait ExternalCatalog: Send + Sync {
    /// Search for artists by name. Returns at most `limit` entries, in the
    /// catalog's relevance order; names are not filtered.
    async fn search_artists(
        &self,
        name: &str,
        limit: u32,
    ) -> Result<Vec<CatalogArtist>, ExternalCatalogError>;

    /// List one page of an artist's albums.
    async fn artist_albums(
        &self,
        artist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<CatalogAlbum>, ExternalCatalogError>;

    /// Look up several albums at once, with their full track lists.
    ///
    /// Unknown ids are skipped, so the result may be shorter than `album_ids`.
    async fn album_tracks(
        &self,
        album_ids: &[String],
    ) -> Result<Vec<CatalogAlbumTracks>, ExternalCatalogError>;
}
