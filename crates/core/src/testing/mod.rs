//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the resolver's
//! collaborators, allowing resolution to be tested without network access
//! or real delays.
//!
//! # Example
//!
//! ```rust,ignore
//! use trackresolver_core::testing::{fixtures, MockExternalCatalog, RecordingPacer};
//!
//! let catalog = MockExternalCatalog::new();
//! let pacer = RecordingPacer::new();
//!
//! // Configure mock responses
//! catalog
//!     .add_artist(fixtures::artist("A", "A_id"), fixtures::numbered_albums("al", 60))
//!     .await;
//!
//! // Build a CatalogResolver around them...
//! ```

mod mock_external_catalog;
mod mock_pacer;

pub use mock_external_catalog::{MockExternalCatalog, RecordedCatalogQuery};
pub use mock_pacer::RecordingPacer;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::external_catalog::{CatalogAlbumTracks, CatalogArtist, CatalogTrack};

    /// Create a test artist.
    pub fn artist(name: &str, id: &str) -> CatalogArtist {
        CatalogArtist {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    /// Create a test album from (track name, track id) pairs.
    pub fn album(id: &str, name: &str, tracks: &[(&str, &str)]) -> CatalogAlbumTracks {
        CatalogAlbumTracks {
            album_id: id.to_string(),
            album_name: name.to_string(),
            tracks: tracks
                .iter()
                .map(|(track_name, track_id)| CatalogTrack {
                    id: track_id.to_string(),
                    name: track_name.to_string(),
                })
                .collect(),
        }
    }

    /// Create `count` albums `{prefix}-0..`, each with one uniquely named track.
    pub fn numbered_albums(prefix: &str, count: usize) -> Vec<CatalogAlbumTracks> {
        (0..count)
            .map(|i| {
                let album_id = format!("{}-{}", prefix, i);
                let track_name = format!("Track {} of {}", i, prefix);
                let track_id = format!("{}-t", album_id);
                album(
                    &album_id,
                    &format!("Album {}", i),
                    &[(track_name.as_str(), track_id.as_str())],
                )
            })
            .collect()
    }
}
