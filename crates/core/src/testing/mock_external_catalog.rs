//! Mock external catalog for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::external_catalog::{
    CatalogAlbum, CatalogAlbumTracks, CatalogArtist, ExternalCatalog, ExternalCatalogError,
    MAX_ALBUM_BATCH_SIZE, MAX_ALBUM_PAGE_SIZE, MAX_ARTIST_SEARCH_LIMIT,
};

/// A recorded catalog query for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCatalogQuery {
    SearchArtists { name: String, limit: u32 },
    ArtistAlbums { artist_id: String, limit: u32, offset: u32 },
    AlbumTracks { album_ids: Vec<String> },
}

/// Mock implementation of the ExternalCatalog trait.
///
/// Provides controllable behavior for testing:
/// - Artists with their albums and tracks
/// - Track queries for assertions
/// - Simulate failures, once, per artist listing or per album lookup
///
/// Artist search is a case-insensitive substring match, in insertion order,
/// so near-miss names come back the way a real relevance search returns them.
///
/// Request limits behave like Spotify's: `limit` is capped at 50 and a bulk
/// lookup of more than 20 albums is rejected.
///
/// # Example
///
/// ```rust,ignore
/// use trackresolver_core::testing::{fixtures, MockExternalCatalog};
///
/// let catalog = MockExternalCatalog::new();
/// catalog
///     .add_artist(
///         fixtures::artist("Radiohead", "ar1"),
///         vec![fixtures::album("al1", "OK Computer", &[("Airbag", "t1")])],
///     )
///     .await;
///
/// let artists = catalog.search_artists("radio", 50).await?;
/// assert_eq!(artists.len(), 1);
/// ```
#[derive(Debug)]
pub struct MockExternalCatalog {
    /// Artists with their albums, in insertion order.
    artists: Arc<RwLock<Vec<(CatalogArtist, Vec<CatalogAlbumTracks>)>>>,
    /// Artist ids whose album listing fails.
    failing_listings: Arc<RwLock<HashSet<String>>>,
    /// Album ids whose bulk lookup fails.
    failing_lookups: Arc<RwLock<HashSet<String>>>,
    /// Recorded queries.
    queries: Arc<RwLock<Vec<RecordedCatalogQuery>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<ExternalCatalogError>>>,
}

impl Default for MockExternalCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExternalCatalog {
    /// Create a new empty mock external catalog.
    pub fn new() -> Self {
        Self {
            artists: Arc::new(RwLock::new(Vec::new())),
            failing_listings: Arc::new(RwLock::new(HashSet::new())),
            failing_lookups: Arc::new(RwLock::new(HashSet::new())),
            queries: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Add an artist with its albums (listing order = vector order).
    pub async fn add_artist(&self, artist: CatalogArtist, albums: Vec<CatalogAlbumTracks>) {
        self.artists.write().await.push((artist, albums));
    }

    /// Make every album listing for this artist id fail.
    pub async fn fail_album_listing(&self, artist_id: &str) {
        self.failing_listings
            .write()
            .await
            .insert(artist_id.to_string());
    }

    /// Make every bulk lookup that includes this album id fail.
    pub async fn fail_album_lookup(&self, album_id: &str) {
        self.failing_lookups
            .write()
            .await
            .insert(album_id.to_string());
    }

    // =========================================================================
    // Query Recording
    // =========================================================================

    /// Get all recorded queries.
    pub async fn recorded_queries(&self) -> Vec<RecordedCatalogQuery> {
        self.queries.read().await.clone()
    }

    /// Clear recorded queries.
    pub async fn clear_recorded(&self) {
        self.queries.write().await.clear();
    }

    /// Get the number of queries performed.
    pub async fn query_count(&self) -> usize {
        self.queries.read().await.len()
    }

    /// Number of album listing calls.
    pub async fn album_listing_count(&self) -> usize {
        self.queries
            .read()
            .await
            .iter()
            .filter(|q| matches!(q, RecordedCatalogQuery::ArtistAlbums { .. }))
            .count()
    }

    /// Number of bulk album lookups.
    pub async fn album_lookup_count(&self) -> usize {
        self.queries
            .read()
            .await
            .iter()
            .filter(|q| matches!(q, RecordedCatalogQuery::AlbumTracks { .. }))
            .count()
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: ExternalCatalogError) {
        *self.next_error.write().await = Some(error);
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<ExternalCatalogError> {
        self.next_error.write().await.take()
    }

    /// Record a query.
    async fn record(&self, query: RecordedCatalogQuery) {
        self.queries.write().await.push(query);
    }
}

#[async_trait]
impl ExternalCatalog for MockExternalCatalog {
    async fn search_artists(
        &self,
        name: &str,
        limit: u32,
    ) -> Result<Vec<CatalogArtist>, ExternalCatalogError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.record(RecordedCatalogQuery::SearchArtists {
            name: name.to_string(),
            limit,
        })
        .await;

        let artists = self.artists.read().await;
        let query_lower = name.to_lowercase();

        Ok(artists
            .iter()
            .map(|(artist, _)| artist)
            .filter(|a| a.name.to_lowercase().contains(&query_lower))
            .take(limit.min(MAX_ARTIST_SEARCH_LIMIT) as usize)
            .cloned()
            .collect())
    }

    async fn artist_albums(
        &self,
        artist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<CatalogAlbum>, ExternalCatalogError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.record(RecordedCatalogQuery::ArtistAlbums {
            artist_id: artist_id.to_string(),
            limit,
            offset,
        })
        .await;

        if self.failing_listings.read().await.contains(artist_id) {
            return Err(ExternalCatalogError::ApiError {
                status: 500,
                message: format!("album listing for {} failed", artist_id),
            });
        }

        let artists = self.artists.read().await;
        let albums = artists
            .iter()
            .find(|(artist, _)| artist.id == artist_id)
            .map(|(_, albums)| albums)
            .ok_or_else(|| ExternalCatalogError::NotFound(format!("Artist {} not found", artist_id)))?;

        Ok(albums
            .iter()
            .skip(offset as usize)
            .take(limit.min(MAX_ALBUM_PAGE_SIZE) as usize)
            .map(|album| CatalogAlbum {
                id: album.album_id.clone(),
                name: album.album_name.clone(),
            })
            .collect())
    }

    async fn album_tracks(
        &self,
        album_ids: &[String],
    ) -> Result<Vec<CatalogAlbumTracks>, ExternalCatalogError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.record(RecordedCatalogQuery::AlbumTracks {
            album_ids: album_ids.to_vec(),
        })
        .await;

        if album_ids.len() > MAX_ALBUM_BATCH_SIZE {
            return Err(ExternalCatalogError::InvalidRequest(format!(
                "at most {} albums per lookup, got {}",
                MAX_ALBUM_BATCH_SIZE,
                album_ids.len()
            )));
        }

        let failing = self.failing_lookups.read().await;
        if let Some(id) = album_ids.iter().find(|id| failing.contains(*id)) {
            return Err(ExternalCatalogError::ApiError {
                status: 500,
                message: format!("album lookup for {} failed", id),
            });
        }

        let artists = self.artists.read().await;
        Ok(album_ids
            .iter()
            .filter_map(|id| {
                artists
                    .iter()
                    .flat_map(|(_, albums)| albums.iter())
                    .find(|album| &album.album_id == id)
                    .cloned()
            })
            .collect())
    }
}
