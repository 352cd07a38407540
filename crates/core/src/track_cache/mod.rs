//! Track cache - resolved and known-missing (artist, track) pairs.
//!
//! The resolver consults the cache before hitting the external catalog.
//! Both tables are append-only: rows are never updated or deleted.

mod sqlite;
mod types;

pub use sqlite::SqliteTrackCache;
pub use types::*;

/// Trait for track cache storage.
pub trait TrackCache: Send + Sync {
    /// Check whether the pair was previously searched and not found.
    fn is_known_missing(&self, artist_name: &str, track_name: &str) -> Result<bool, CacheError>;

    /// Check whether the pair has a cached track id.
    fn contains_track(&self, artist_name: &str, track_name: &str) -> Result<bool, CacheError>;

    /// Get the cached track id for the pair.
    ///
    /// When several ids are cached for the same names, the first one stored wins.
    fn lookup_track_id(
        &self,
        artist_name: &str,
        track_name: &str,
    ) -> Result<Option<String>, CacheError>;

    /// Store track records in one transaction.
    ///
    /// Identical records already present are skipped. Returns the number of
    /// rows actually inserted.
    fn store_tracks(&self, records: &[TrackRecord]) -> Result<u32, CacheError>;

    /// Record the pair as absent from the catalog.
    ///
    /// Returns `true` if the pair was not already recorded.
    fn mark_missing(&self, artist_name: &str, track_name: &str) -> Result<bool, CacheError>;

    /// Get cache statistics.
    fn stats(&self) -> Result<CacheStats, CacheError>;
}
