//! Types for the track cache (positive and negative lookups).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A resolved (artist, track) pair with its catalog identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    /// Artist name as reported by the catalog.
    pub artist_name: String,
    /// Catalog artist ID.
    pub artist_id: String,
    /// Track name as reported by the catalog.
    pub track_name: String,
    /// Catalog track ID.
    pub track_id: String,
}

impl TrackRecord {
    pub fn new(
        artist_name: impl Into<String>,
        artist_id: impl Into<String>,
        track_name: impl Into<String>,
        track_id: impl Into<String>,
    ) -> Self {
        Self {
            artist_name: artist_name.into(),
            artist_id: artist_id.into(),
            track_name: track_name.into(),
            track_id: track_id.into(),
        }
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    /// Rows in the positive cache.
    pub total_tracks: u64,
    /// Distinct artist ids in the positive cache.
    pub unique_artists: u64,
    /// Rows in the negative cache.
    pub total_missing: u64,
    /// Most recent positive entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_track: Option<DateTime<Utc>>,
    /// Most recent negative entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest_missing: Option<DateTime<Utc>>,
}

/// Errors for track cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
