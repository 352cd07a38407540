//! Streaming history import.
//!
//! Reads Spotify streaming-history exports and turns them into the unique
//! (artist, track) pairs to resolve. Two layouts are accepted:
//! - account data export: `artistName` / `trackName`
//! - extended history: `master_metadata_album_artist_name` /
//!   `master_metadata_track_name` (null for podcast episodes)

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::resolver::TrackQuery;

/// Errors for history import.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct HistoryEntry {
    #[serde(
        rename = "artistName",
        alias = "master_metadata_album_artist_name",
        default
    )]
    artist_name: Option<String>,
    #[serde(rename = "trackName", alias = "master_metadata_track_name", default)]
    track_name: Option<String>,
}

impl HistoryEntry {
    fn into_query(self) -> Option<TrackQuery> {
        let artist = self.artist_name.filter(|a| !a.trim().is_empty())?;
        let track = self.track_name.filter(|t| !t.trim().is_empty())?;
        Some(TrackQuery::new(artist, track))
    }
}

/// Collects unique pairs across one or more history files.
#[derive(Debug, Default)]
pub struct HistoryCollector {
    seen: HashSet<TrackQuery>,
    queries: Vec<TrackQuery>,
    entries: usize,
    skipped: usize,
}

impl HistoryCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the entries of one JSON document.
    pub fn add_json(&mut self, json: &str) -> Result<(), serde_json::Error> {
        let entries: Vec<HistoryEntry> = serde_json::from_str(json)?;
        for entry in entries {
            self.entries += 1;
            match entry.into_query() {
                Some(query) => {
                    if self.seen.insert(query.clone()) {
                        self.queries.push(query);
                    }
                }
                None => self.skipped += 1,
            }
        }
        Ok(())
    }

    /// Read and add one history file.
    pub fn add_file(&mut self, path: &Path) -> Result<(), HistoryError> {
        let json = std::fs::read_to_string(path).map_err(|source| HistoryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.add_json(&json).map_err(|source| HistoryError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            "Read {:?}: {} entries so far, {} unique pairs",
            path,
            self.entries,
            self.queries.len()
        );
        Ok(())
    }

    /// Total entries read.
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Entries without both an artist and a track name.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Unique pairs in first-seen order.
    pub fn into_queries(self) -> Vec<TrackQuery> {
        self.queries
    }
}

/// Load unique pairs from history files, in first-seen order.
pub fn load_history(paths: &[PathBuf]) -> Result<Vec<TrackQuery>, HistoryError> {
    let mut collector = HistoryCollector::new();
    for path in paths {
        collector.add_file(path)?;
    }
    Ok(collector.into_queries())
}
