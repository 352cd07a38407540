//! Types for external catalog API responses.

use serde::{Deserialize, Serialize};

/// An artist returned by a catalog artist search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogArtist {
    /// Catalog artist ID.
    pub id: String,
    /// Artist name as reported by the catalog.
    pub name: String,
}

/// An album from an artist's album listing (no tracks).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogAlbum {
    pub id: String,
    pub name: String,
}

/// An album together with its track list, from a bulk album lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogAlbumTracks {
    /// Catalog album ID.
    pub album_id: String,
    /// Album title.
    pub album_name: String,
    /// Tracks on this album.
    #[serde(default)]
    pub tracks: Vec<CatalogTrack>,
}

impl CatalogAlbumTracks {
    /// Find a track whose name is exactly `name` (case-sensitive).
    pub fn find_track(&self, name: &str) -> Option<&CatalogTrack> {
        self.tracks.iter().find(|t| t.name == name)
    }
}

/// A track from an album.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogTrack {
    /// Catalog track ID.
    pub id: String,
    /// Track title.
    pub name: String,
}
