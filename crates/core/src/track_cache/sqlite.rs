//! SQLite-backed track cache implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{CacheError, CacheStats, TrackCache, TrackRecord};

/// SQLite-backed track cache.
pub struct SqliteTrackCache {
    conn: Mutex<Connection>,
}

impl SqliteTrackCache {
    /// Open the cache, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, CacheError> {
        let conn = Connection::open(path).map_err(|e| CacheError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory() -> Result<Self, CacheError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CacheError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CacheError> {
        conn.execute_batch(
            r#"
            -- Resolved tracks, one row per distinct (artist, track) identity
            CREATE TABLE IF NOT EXISTS tracks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                artist_name TEXT NOT NULL,
                artist_id TEXT NOT NULL,
                track_name TEXT NOT NULL,
                track_id TEXT NOT NULL,
                cached_at TEXT NOT NULL,
                UNIQUE(artist_name, artist_id, track_name, track_id)
            );

            CREATE INDEX IF NOT EXISTS idx_tracks_names ON tracks(artist_name, track_name);

            -- Pairs searched for and not found
            CREATE TABLE IF NOT EXISTS missing_tracks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                artist_name TEXT NOT NULL,
                track_name TEXT NOT NULL,
                checked_at TEXT NOT NULL,
                UNIQUE(artist_name, track_name)
            );
            "#,
        )
        .map_err(|e| CacheError::Database(e.to_string()))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.conn
            .lock()
            .map_err(|_| CacheError::Internal("connection mutex poisoned".to_string()))
    }

    fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
        value
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl TrackCache for SqliteTrackCache {
    fn is_known_missing(&self, artist_name: &str, track_name: &str) -> Result<bool, CacheError> {
        let conn = self.conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM missing_tracks WHERE artist_name = ? AND track_name = ? LIMIT 1",
                params![artist_name, track_name],
                |_| Ok(()),
            )
            .optional()
            .map_err(|e| CacheError::Database(e.to_string()))?;
        Ok(found.is_some())
    }

    fn contains_track(&self, artist_name: &str, track_name: &str) -> Result<bool, CacheError> {
        let conn = self.conn()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM tracks WHERE artist_name = ? AND track_name = ? LIMIT 1",
                params![artist_name, track_name],
                |_| Ok(()),
            )
            .optional()
            .map_err(|e| CacheError::Database(e.to_string()))?;
        Ok(found.is_some())
    }

    fn lookup_track_id(
        &self,
        artist_name: &str,
        track_name: &str,
    ) -> Result<Option<String>, CacheError> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT track_id FROM tracks WHERE artist_name = ? AND track_name = ?
             ORDER BY id ASC LIMIT 1",
            params![artist_name, track_name],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| CacheError::Database(e.to_string()))
    }

    fn store_tracks(&self, records: &[TrackRecord]) -> Result<u32, CacheError> {
        if records.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn()?;
        let now_str = Utc::now().to_rfc3339();
        let mut inserted = 0u32;

        let tx = conn
            .transaction()
            .map_err(|e| CacheError::Database(e.to_string()))?;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT OR IGNORE INTO tracks (artist_name, artist_id, track_name, track_id, cached_at)
                     VALUES (?, ?, ?, ?, ?)",
                )
                .map_err(|e| CacheError::Database(e.to_string()))?;

            for record in records {
                let changed = stmt
                    .execute(params![
                        &record.artist_name,
                        &record.artist_id,
                        &record.track_name,
                        &record.track_id,
                        &now_str,
                    ])
                    .map_err(|e| CacheError::Database(e.to_string()))?;
                inserted += changed as u32;
            }
        }
        tx.commit()
            .map_err(|e| CacheError::Database(e.to_string()))?;

        Ok(inserted)
    }

    fn mark_missing(&self, artist_name: &str, track_name: &str) -> Result<bool, CacheError> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "INSERT OR IGNORE INTO missing_tracks (artist_name, track_name, checked_at)
                 VALUES (?, ?, ?)",
                params![artist_name, track_name, Utc::now().to_rfc3339()],
            )
            .map_err(|e| CacheError::Database(e.to_string()))?;
        Ok(changed > 0)
    }

    fn stats(&self) -> Result<CacheStats, CacheError> {
        let conn = self.conn()?;

        let (total_tracks, unique_artists, newest_track): (i64, i64, Option<String>) = conn
            .query_row(
                "SELECT COUNT(*), COUNT(DISTINCT artist_id), MAX(cached_at) FROM tracks",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(|e| CacheError::Database(e.to_string()))?;

        let (total_missing, newest_missing): (i64, Option<String>) = conn
            .query_row(
                "SELECT COUNT(*), MAX(checked_at) FROM missing_tracks",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| CacheError::Database(e.to_string()))?;

        Ok(CacheStats {
            total_tracks: total_tracks as u64,
            unique_artists: unique_artists as u64,
            total_missing: total_missing as u64,
            newest_track: Self::parse_timestamp(newest_track),
            newest_missing: Self::parse_timestamp(newest_missing),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_cache() -> SqliteTrackCache {
        SqliteTrackCache::in_memory().unwrap()
    }

    fn record(artist: &str, track: &str, track_id: &str) -> TrackRecord {
        TrackRecord::new(artist, format!("{}-id", artist), track, track_id)
    }

    #[test]
    fn test_store_and_lookup() {
        let cache = create_test_cache();
        let inserted = cache
            .store_tracks(&[
                record("Radiohead", "Airbag", "t1"),
                record("Radiohead", "Paranoid Android", "t2"),
            ])
            .unwrap();
        assert_eq!(inserted, 2);

        assert_eq!(
            cache.lookup_track_id("Radiohead", "Paranoid Android").unwrap(),
            Some("t2".to_string())
        );
        assert!(cache.contains_track("Radiohead", "Airbag").unwrap());
        assert_eq!(cache.lookup_track_id("Radiohead", "Creep").unwrap(), None);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let cache = create_test_cache();
        cache
            .store_tracks(&[record("Radiohead", "Airbag", "t1")])
            .unwrap();

        assert!(!cache.contains_track("radiohead", "Airbag").unwrap());
        assert!(!cache.contains_track("Radiohead", "AIRBAG").unwrap());
    }

    #[test]
    fn test_store_identical_records_is_noop() {
        let cache = create_test_cache();
        let records = vec![record("Radiohead", "Airbag", "t1")];

        assert_eq!(cache.store_tracks(&records).unwrap(), 1);
        assert_eq!(cache.store_tracks(&records).unwrap(), 0);

        let stats = cache.stats().unwrap();
        assert_eq!(stats.total_tracks, 1);
    }

    #[test]
    fn test_store_empty_batch() {
        let cache = create_test_cache();
        assert_eq!(cache.store_tracks(&[]).unwrap(), 0);
    }

    #[test]
    fn test_lookup_returns_first_stored_id() {
        let cache = create_test_cache();
        // Same song on the album and on a compilation.
        cache
            .store_tracks(&[record("Radiohead", "Creep", "album-version")])
            .unwrap();
        cache
            .store_tracks(&[record("Radiohead", "Creep", "compilation-version")])
            .unwrap();

        assert_eq!(
            cache.lookup_track_id("Radiohead", "Creep").unwrap(),
            Some("album-version".to_string())
        );
        assert_eq!(cache.stats().unwrap().total_tracks, 2);
    }

    #[test]
    fn test_mark_missing_is_idempotent() {
        let cache = create_test_cache();

        assert!(!cache.is_known_missing("Nobody", "Nothing").unwrap());
        assert!(cache.mark_missing("Nobody", "Nothing").unwrap());
        assert!(!cache.mark_missing("Nobody", "Nothing").unwrap());
        assert!(cache.is_known_missing("Nobody", "Nothing").unwrap());

        assert_eq!(cache.stats().unwrap().total_missing, 1);
    }

    #[test]
    fn test_missing_does_not_affect_positive_lookup() {
        let cache = create_test_cache();
        cache.mark_missing("Radiohead", "Airbag").unwrap();

        assert!(!cache.contains_track("Radiohead", "Airbag").unwrap());
        assert_eq!(cache.lookup_track_id("Radiohead", "Airbag").unwrap(), None);
    }

    #[test]
    fn test_stats() {
        let cache = create_test_cache();

        let empty = cache.stats().unwrap();
        assert_eq!(empty.total_tracks, 0);
        assert!(empty.newest_track.is_none());

        cache
            .store_tracks(&[
                record("Radiohead", "Airbag", "t1"),
                record("Radiohead", "Lucky", "t2"),
                record("Portishead", "Roads", "t3"),
            ])
            .unwrap();
        cache.mark_missing("Portishead", "Creep").unwrap();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.total_tracks, 3);
        assert_eq!(stats.unique_artists, 2);
        assert_eq!(stats.total_missing, 1);
        assert!(stats.newest_track.is_some());
        assert!(stats.newest_missing.is_some());
    }

    #[test]
    fn test_reopen_file_keeps_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("music.db");

        {
            let cache = SqliteTrackCache::new(&path).unwrap();
            cache
                .store_tracks(&[record("Radiohead", "Airbag", "t1")])
                .unwrap();
            cache.mark_missing("Radiohead", "Unreleased").unwrap();
        }

        // Schema creation runs again on open and must not fail or drop data.
        let cache = SqliteTrackCache::new(&path).unwrap();
        assert_eq!(
            cache.lookup_track_id("Radiohead", "Airbag").unwrap(),
            Some("t1".to_string())
        );
        assert!(cache.is_known_missing("Radiohead", "Unreleased").unwrap());
    }

    #[test]
    fn test_open_invalid_path_fails() {
        let result = SqliteTrackCache::new(Path::new("/nonexistent/dir/music.db"));
        assert!(matches!(result, Err(CacheError::Database(_))));
    }
}
