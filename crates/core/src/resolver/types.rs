//! Resolver types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::external_catalog::ExternalCatalogError;
use crate::track_cache::CacheError;

/// An (artist, track) pair to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackQuery {
    pub artist_name: String,
    pub track_name: String,
}

impl TrackQuery {
    pub fn new(artist_name: impl Into<String>, track_name: impl Into<String>) -> Self {
        Self {
            artist_name: artist_name.into(),
            track_name: track_name.into(),
        }
    }
}

/// Outcome of a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "track_id", rename_all = "snake_case")]
pub enum Resolution {
    /// Found in the positive cache, no catalog call made.
    Cached(String),
    /// Found by scanning the catalog.
    Resolved(String),
    /// Found in the negative cache, no catalog call made.
    KnownMissing,
    /// Catalog scanned without a match; now negative-cached.
    Missing,
}

impl Resolution {
    /// The track id, if the pair was found.
    pub fn track_id(&self) -> Option<&str> {
        match self {
            Resolution::Cached(id) | Resolution::Resolved(id) => Some(id),
            Resolution::KnownMissing | Resolution::Missing => None,
        }
    }

    pub(crate) fn outcome_label(&self) -> &'static str {
        match self {
            Resolution::Cached(_) => "cached",
            Resolution::Resolved(_) => "resolved",
            Resolution::KnownMissing => "known_missing",
            Resolution::Missing => "missing",
        }
    }
}

/// Errors that abort a resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] ExternalCatalogError),
}
