//! Resolver configuration.

use serde::{Deserialize, Serialize};

use crate::pacing::PacingConfig;

/// Configuration for the catalog resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// How many artists to request from the catalog search (max 50).
    /// Only entries whose name equals the query exactly are scanned.
    #[serde(default = "default_artist_search_limit")]
    pub artist_search_limit: u32,

    /// Albums per listing page (max 50).
    /// A page shorter than this ends the artist's album listing.
    #[serde(default = "default_album_page_size")]
    pub album_page_size: u32,

    /// Albums per bulk track lookup (max 20).
    #[serde(default = "default_album_batch_size")]
    pub album_batch_size: usize,

    /// Pacing applied after each artist's album listing.
    #[serde(default)]
    pub pacing: PacingConfig,
}

fn default_artist_search_limit() -> u32 {
    50
}

fn default_album_page_size() -> u32 {
    50
}

fn default_album_batch_size() -> usize {
    20
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            artist_search_limit: default_artist_search_limit(),
            album_page_size: default_album_page_size(),
            album_batch_size: default_album_batch_size(),
            pacing: PacingConfig::default(),
        }
    }
}
