//! Cache-first resolution of (artist, track) pairs against the catalog.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::config::ResolverConfig;
use super::types::{Resolution, ResolveError, TrackQuery};
use crate::external_catalog::{
    CatalogArtist, ExternalCatalog, MAX_ALBUM_BATCH_SIZE, MAX_ALBUM_PAGE_SIZE,
    MAX_ARTIST_SEARCH_LIMIT,
};
use crate::metrics;
use crate::pacing::Pacer;
use crate::track_cache::{TrackCache, TrackRecord};

/// Resolves (artist, track) pairs to catalog track ids.
///
/// Lookup order is negative cache, positive cache, then the catalog. Every
/// track seen while scanning an artist's albums is cached, not only the one
/// asked for, so later lookups for the same artist are usually cache hits.
pub struct CatalogResolver {
    config: ResolverConfig,
    catalog: Arc<dyn ExternalCatalog>,
    cache: Arc<dyn TrackCache>,
    pacer: Arc<dyn Pacer>,
}

impl CatalogResolver {
    pub fn new(
        config: ResolverConfig,
        catalog: Arc<dyn ExternalCatalog>,
        cache: Arc<dyn TrackCache>,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        Self {
            config,
            catalog,
            cache,
            pacer,
        }
    }

    /// Resolve one pair. Names are matched exactly and case-sensitively.
    pub async fn resolve(
        &self,
        artist_name: &str,
        track_name: &str,
    ) -> Result<Resolution, ResolveError> {
        let result = self.resolve_inner(artist_name, track_name).await;

        let outcome = match &result {
            Ok(resolution) => resolution.outcome_label(),
            Err(_) => "error",
        };
        metrics::RESOLUTIONS.with_label_values(&[outcome]).inc();

        result
    }

    /// Resolve pairs one after another, in order.
    ///
    /// A failed pair is reported in its slot and does not stop the rest.
    pub async fn resolve_many(
        &self,
        queries: &[TrackQuery],
    ) -> Vec<(TrackQuery, Result<Resolution, ResolveError>)> {
        let mut results = Vec::with_capacity(queries.len());
        for query in queries {
            let result = self.resolve(&query.artist_name, &query.track_name).await;
            if let Err(e) = &result {
                warn!(
                    "Failed to resolve '{}' - '{}': {}",
                    query.artist_name, query.track_name, e
                );
            }
            results.push((query.clone(), result));
        }
        results
    }

    async fn resolve_inner(
        &self,
        artist_name: &str,
        track_name: &str,
    ) -> Result<Resolution, ResolveError> {
        if artist_name.trim().is_empty() {
            return Err(ResolveError::InvalidInput(
                "artist name must not be empty".to_string(),
            ));
        }
        if track_name.trim().is_empty() {
            return Err(ResolveError::InvalidInput(
                "track name must not be empty".to_string(),
            ));
        }

        if self.cache.is_known_missing(artist_name, track_name)? {
            debug!("Negative cache hit: '{}' - '{}'", artist_name, track_name);
            metrics::CACHE_LOOKUPS
                .with_label_values(&["negative_hit"])
                .inc();
            return Ok(Resolution::KnownMissing);
        }

        if let Some(track_id) = self.cache.lookup_track_id(artist_name, track_name)? {
            debug!(
                "Cache hit: '{}' - '{}' -> {}",
                artist_name, track_name, track_id
            );
            metrics::CACHE_LOOKUPS
                .with_label_values(&["positive_hit"])
                .inc();
            return Ok(Resolution::Cached(track_id));
        }

        metrics::CACHE_LOOKUPS.with_label_values(&["miss"]).inc();

        let found = self
            .catalog
            .search_artists(
                artist_name,
                self.config
                    .artist_search_limit
                    .clamp(1, MAX_ARTIST_SEARCH_LIMIT),
            )
            .await;
        metrics::record_catalog_request("search_artists", &found);
        let candidates: Vec<CatalogArtist> = found?
            .into_iter()
            .filter(|artist| artist.name == artist_name)
            .collect();

        debug!(
            "Artist search for '{}': {} exact matches",
            artist_name,
            candidates.len()
        );

        for artist in &candidates {
            match self.scan_artist(artist, track_name).await {
                Ok(Some(track_id)) => {
                    info!(
                        "Resolved '{}' - '{}' -> {}",
                        artist_name, track_name, track_id
                    );
                    return Ok(Resolution::Resolved(track_id));
                }
                Ok(None) => {}
                Err(ResolveError::Catalog(e)) => {
                    warn!(
                        "Album enumeration failed for artist {} ({}), skipping: {}",
                        artist.name, artist.id, e
                    );
                }
                Err(e) => return Err(e),
            }

            self.pacer.pace().await;
        }

        self.cache.mark_missing(artist_name, track_name)?;
        info!("Not in catalog: '{}' - '{}'", artist_name, track_name);
        Ok(Resolution::Missing)
    }

    /// Walk one artist's albums page by page, caching every track seen.
    ///
    /// Returns as soon as a batch contains `track_name`. Page and batch sizes
    /// are held to the catalog's limits: a page the catalog silently shortens
    /// would otherwise end the listing early.
    async fn scan_artist(
        &self,
        artist: &CatalogArtist,
        track_name: &str,
    ) -> Result<Option<String>, ResolveError> {
        let page_size = self.config.album_page_size.clamp(1, MAX_ALBUM_PAGE_SIZE);
        let batch_size = self.config.album_batch_size.clamp(1, MAX_ALBUM_BATCH_SIZE);
        let mut offset = 0u32;

        loop {
            let listed = self
                .catalog
                .artist_albums(&artist.id, page_size, offset)
                .await;
            metrics::record_catalog_request("artist_albums", &listed);
            let page = listed?;

            debug!(
                "Artist {} albums at offset {}: {}",
                artist.id,
                offset,
                page.len()
            );

            for batch in page.chunks(batch_size) {
                let album_ids: Vec<String> = batch.iter().map(|a| a.id.clone()).collect();
                let looked_up = self.catalog.album_tracks(&album_ids).await;
                metrics::record_catalog_request("album_tracks", &looked_up);
                let albums = looked_up?;

                let records: Vec<TrackRecord> = albums
                    .iter()
                    .flat_map(|album| album.tracks.iter())
                    .map(|track| {
                        TrackRecord::new(&artist.name, &artist.id, &track.name, &track.id)
                    })
                    .collect();

                let inserted = self.cache.store_tracks(&records)?;
                metrics::TRACKS_CACHED.inc_by(inserted as u64);

                let hit = albums
                    .iter()
                    .find_map(|album| album.find_track(track_name).map(|t| (album, t)));
                if let Some((album, track)) = hit {
                    debug!(
                        "'{}' found on '{}' ({})",
                        track_name, album.album_name, album.album_id
                    );
                    return Ok(Some(track.id.clone()));
                }
            }

            if (page.len() as u32) < page_size {
                return Ok(None);
            }
            offset += page_size;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external_catalog::ExternalCatalogError;
    use crate::testing::{fixtures, MockExternalCatalog, RecordedCatalogQuery, RecordingPacer};
    use crate::track_cache::SqliteTrackCache;

    struct Harness {
        catalog: Arc<MockExternalCatalog>,
        cache: Arc<SqliteTrackCache>,
        pacer: Arc<RecordingPacer>,
        resolver: CatalogResolver,
    }

    fn harness() -> Harness {
        harness_with_config(ResolverConfig::default())
    }

    fn harness_with_config(config: ResolverConfig) -> Harness {
        let catalog = Arc::new(MockExternalCatalog::new());
        let cache = Arc::new(SqliteTrackCache::in_memory().unwrap());
        let pacer = Arc::new(RecordingPacer::new());
        let resolver = CatalogResolver::new(
            config,
            catalog.clone(),
            cache.clone(),
            pacer.clone(),
        );
        Harness {
            catalog,
            cache,
            pacer,
            resolver,
        }
    }

    #[tokio::test]
    async fn test_known_missing_skips_catalog() {
        let h = harness();
        h.cache.mark_missing("Radiohead", "Unreleased").unwrap();

        let resolution = h.resolver.resolve("Radiohead", "Unreleased").await.unwrap();

        assert_eq!(resolution, Resolution::KnownMissing);
        assert_eq!(h.catalog.query_count().await, 0);
    }

    #[tokio::test]
    async fn test_cached_track_skips_catalog() {
        let h = harness();
        h.cache
            .store_tracks(&[TrackRecord::new("Radiohead", "ar1", "Airbag", "t1")])
            .unwrap();

        let resolution = h.resolver.resolve("Radiohead", "Airbag").await.unwrap();

        assert_eq!(resolution, Resolution::Cached("t1".to_string()));
        assert_eq!(h.catalog.query_count().await, 0);
    }

    #[tokio::test]
    async fn test_negative_cache_checked_before_positive() {
        let h = harness();
        h.cache
            .store_tracks(&[TrackRecord::new("A", "A_id", "X", "X_id")])
            .unwrap();
        h.cache.mark_missing("A", "X").unwrap();

        let resolution = h.resolver.resolve("A", "X").await.unwrap();
        assert_eq!(resolution, Resolution::KnownMissing);
    }

    #[tokio::test]
    async fn test_resolve_caches_every_track_in_batch() {
        let h = harness();
        h.catalog
            .add_artist(
                fixtures::artist("A", "A_id"),
                vec![fixtures::album("album-1", "First", &[("X", "X_id"), ("Y", "Y_id")])],
            )
            .await;

        let resolution = h.resolver.resolve("A", "Y").await.unwrap();

        assert_eq!(resolution, Resolution::Resolved("Y_id".to_string()));
        assert_eq!(
            h.cache.lookup_track_id("A", "X").unwrap(),
            Some("X_id".to_string())
        );
        assert!(!h.cache.is_known_missing("A", "Y").unwrap());
    }

    #[tokio::test]
    async fn test_second_lookup_for_same_artist_is_cache_hit() {
        let h = harness();
        h.catalog
            .add_artist(
                fixtures::artist("A", "A_id"),
                vec![fixtures::album("album-1", "First", &[("X", "X_id"), ("Y", "Y_id")])],
            )
            .await;

        h.resolver.resolve("A", "Y").await.unwrap();
        h.catalog.clear_recorded().await;

        let resolution = h.resolver.resolve("A", "X").await.unwrap();
        assert_eq!(resolution, Resolution::Cached("X_id".to_string()));
        assert_eq!(h.catalog.query_count().await, 0);
    }

    #[tokio::test]
    async fn test_inexact_artist_name_is_skipped() {
        let h = harness();
        h.catalog
            .add_artist(
                fixtures::artist("A Tribe", "tribe_id"),
                vec![fixtures::album("album-1", "Album", &[("X", "X_id")])],
            )
            .await;

        let resolution = h.resolver.resolve("A", "X").await.unwrap();

        assert_eq!(resolution, Resolution::Missing);
        assert!(h.cache.is_known_missing("A", "X").unwrap());
        assert_eq!(h.catalog.album_listing_count().await, 0);
        assert!(!h.cache.contains_track("A Tribe", "X").unwrap());
    }

    #[tokio::test]
    async fn test_artist_name_match_is_case_sensitive() {
        let h = harness();
        h.catalog
            .add_artist(
                fixtures::artist("radiohead", "lower_id"),
                vec![fixtures::album("album-1", "Album", &[("Airbag", "t1")])],
            )
            .await;

        let resolution = h.resolver.resolve("Radiohead", "Airbag").await.unwrap();
        assert_eq!(resolution, Resolution::Missing);
    }

    #[tokio::test]
    async fn test_all_exact_matches_are_tried() {
        let h = harness();
        h.catalog
            .add_artist(
                fixtures::artist("Nirvana", "nirvana_uk"),
                vec![fixtures::album("uk-1", "Local Anaesthetic", &[("Rainbow Chaser", "rc")])],
            )
            .await;
        h.catalog
            .add_artist(
                fixtures::artist("Nirvana", "nirvana_us"),
                vec![fixtures::album("us-1", "Nevermind", &[("Lithium", "li")])],
            )
            .await;

        let resolution = h.resolver.resolve("Nirvana", "Lithium").await.unwrap();

        assert_eq!(resolution, Resolution::Resolved("li".to_string()));
        // Both artists' tracks end up cached.
        assert!(h.cache.contains_track("Nirvana", "Rainbow Chaser").unwrap());
        // Paced after the first artist only.
        assert_eq!(h.pacer.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_pair_is_negative_cached_once() {
        let h = harness();
        h.catalog
            .add_artist(
                fixtures::artist("A", "A_id"),
                vec![fixtures::album("album-1", "First", &[("X", "X_id")])],
            )
            .await;

        let first = h.resolver.resolve("A", "Z").await.unwrap();
        let second = h.resolver.resolve("A", "Z").await.unwrap();

        assert_eq!(first, Resolution::Missing);
        assert_eq!(second, Resolution::KnownMissing);
        assert_eq!(h.cache.stats().unwrap().total_missing, 1);
        assert_eq!(h.pacer.calls(), 1);
    }

    #[tokio::test]
    async fn test_pagination_stops_on_short_page() {
        let h = harness();
        h.catalog
            .add_artist(
                fixtures::artist("A", "A_id"),
                fixtures::numbered_albums("al", 110),
            )
            .await;

        let resolution = h.resolver.resolve("A", "Not There").await.unwrap();

        assert_eq!(resolution, Resolution::Missing);
        assert_eq!(h.catalog.album_listing_count().await, 3);

        let offsets: Vec<u32> = h
            .catalog
            .recorded_queries()
            .await
            .into_iter()
            .filter_map(|q| match q {
                RecordedCatalogQuery::ArtistAlbums { offset, limit, .. } => {
                    assert_eq!(limit, 50);
                    Some(offset)
                }
                _ => None,
            })
            .collect();
        assert_eq!(offsets, vec![0, 50, 100]);

        // 110 albums in batches of 20 (per page: 20+20+10, 20+20+10, 10).
        assert_eq!(h.catalog.album_lookup_count().await, 7);
        assert_eq!(h.cache.stats().unwrap().total_tracks, 110);
    }

    #[tokio::test]
    async fn test_full_last_page_requires_extra_empty_page() {
        let h = harness();
        h.catalog
            .add_artist(fixtures::artist("A", "A_id"), fixtures::numbered_albums("al", 50))
            .await;

        h.resolver.resolve("A", "Not There").await.unwrap();

        // A full page cannot end the listing; the following empty page does.
        assert_eq!(h.catalog.album_listing_count().await, 2);
    }

    #[tokio::test]
    async fn test_match_stops_enumeration_early() {
        let h = harness();
        let mut albums = fixtures::numbered_albums("al", 110);
        // Put the target in the second batch of the first page.
        albums[25] = fixtures::album("al-25", "Album 25", &[("Target", "target_id")]);
        h.catalog
            .add_artist(fixtures::artist("A", "A_id"), albums)
            .await;

        let resolution = h.resolver.resolve("A", "Target").await.unwrap();

        assert_eq!(resolution, Resolution::Resolved("target_id".to_string()));
        assert_eq!(h.catalog.album_listing_count().await, 1);
        assert_eq!(h.catalog.album_lookup_count().await, 2);
        assert_eq!(h.cache.stats().unwrap().total_tracks, 40);
        assert_eq!(h.pacer.calls(), 0);
    }

    #[tokio::test]
    async fn test_album_listing_error_moves_to_next_artist() {
        let h = harness();
        h.catalog
            .add_artist(
                fixtures::artist("Nirvana", "broken"),
                vec![fixtures::album("b-1", "Broken", &[("Lithium", "wrong")])],
            )
            .await;
        h.catalog
            .add_artist(
                fixtures::artist("Nirvana", "working"),
                vec![fixtures::album("w-1", "Nevermind", &[("Lithium", "li")])],
            )
            .await;
        h.catalog.fail_album_listing("broken").await;

        let resolution = h.resolver.resolve("Nirvana", "Lithium").await.unwrap();

        assert_eq!(resolution, Resolution::Resolved("li".to_string()));
        assert_eq!(h.pacer.calls(), 1);
    }

    #[tokio::test]
    async fn test_album_listing_error_for_only_artist_is_missing() {
        let h = harness();
        h.catalog
            .add_artist(
                fixtures::artist("A", "A_id"),
                vec![fixtures::album("album-1", "First", &[("X", "X_id")])],
            )
            .await;
        h.catalog.fail_album_listing("A_id").await;

        let resolution = h.resolver.resolve("A", "X").await.unwrap();

        assert_eq!(resolution, Resolution::Missing);
        assert!(h.cache.is_known_missing("A", "X").unwrap());
    }

    #[tokio::test]
    async fn test_artist_search_error_is_returned_and_not_cached() {
        let h = harness();
        h.catalog
            .set_next_error(ExternalCatalogError::RateLimitExceeded)
            .await;

        let result = h.resolver.resolve("A", "X").await;

        assert!(matches!(
            result,
            Err(ResolveError::Catalog(ExternalCatalogError::RateLimitExceeded))
        ));
        assert!(!h.cache.is_known_missing("A", "X").unwrap());
    }

    #[tokio::test]
    async fn test_empty_names_rejected() {
        let h = harness();

        let result = h.resolver.resolve("", "X").await;
        assert!(matches!(result, Err(ResolveError::InvalidInput(_))));

        let result = h.resolver.resolve("A", "   ").await;
        assert!(matches!(result, Err(ResolveError::InvalidInput(_))));

        assert_eq!(h.catalog.query_count().await, 0);
    }

    #[tokio::test]
    async fn test_resolve_many_keeps_order_and_continues_after_error() {
        let h = harness();
        h.catalog
            .add_artist(
                fixtures::artist("A", "A_id"),
                vec![fixtures::album("album-1", "First", &[("X", "X_id"), ("Y", "Y_id")])],
            )
            .await;

        let queries = vec![
            TrackQuery::new("A", "Y"),
            TrackQuery::new("", "Y"),
            TrackQuery::new("A", "X"),
            TrackQuery::new("A", "Nope"),
        ];
        let results = h.resolver.resolve_many(&queries).await;

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].0, queries[0]);
        assert_eq!(
            results[0].1.as_ref().unwrap(),
            &Resolution::Resolved("Y_id".to_string())
        );
        assert!(results[1].1.is_err());
        assert_eq!(
            results[2].1.as_ref().unwrap(),
            &Resolution::Cached("X_id".to_string())
        );
        assert_eq!(results[3].1.as_ref().unwrap(), &Resolution::Missing);
    }

    #[tokio::test]
    async fn test_oversized_page_is_capped_to_catalog_limit() {
        let h = harness_with_config(ResolverConfig {
            album_page_size: 60,
            ..Default::default()
        });
        let mut albums = fixtures::numbered_albums("al", 120);
        albums[100] = fixtures::album("al-100", "Album 100", &[("Target", "target_id")]);
        h.catalog
            .add_artist(fixtures::artist("A", "A_id"), albums)
            .await;

        let resolution = h.resolver.resolve("A", "Target").await.unwrap();

        assert_eq!(resolution, Resolution::Resolved("target_id".to_string()));
        assert!(!h.cache.is_known_missing("A", "Target").unwrap());
        let limits: Vec<u32> = h
            .catalog
            .recorded_queries()
            .await
            .into_iter()
            .filter_map(|q| match q {
                RecordedCatalogQuery::ArtistAlbums { limit, .. } => Some(limit),
                _ => None,
            })
            .collect();
        assert_eq!(limits, vec![50, 50, 50]);
    }

    #[tokio::test]
    async fn test_oversized_batch_is_capped_to_catalog_limit() {
        let h = harness_with_config(ResolverConfig {
            album_batch_size: 25,
            artist_search_limit: 80,
            ..Default::default()
        });
        let mut albums = fixtures::numbered_albums("al", 120);
        albums[0] = fixtures::album("al-0", "Album 0", &[("Target", "target_id")]);
        h.catalog
            .add_artist(fixtures::artist("A", "A_id"), albums)
            .await;

        let resolution = h.resolver.resolve("A", "Target").await.unwrap();

        assert_eq!(resolution, Resolution::Resolved("target_id".to_string()));
        let queries = h.catalog.recorded_queries().await;
        assert_eq!(
            queries[0],
            RecordedCatalogQuery::SearchArtists {
                name: "A".to_string(),
                limit: 50
            }
        );
        match &queries[2] {
            RecordedCatalogQuery::AlbumTracks { album_ids } => assert_eq!(album_ids.len(), 20),
            other => panic!("unexpected query {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_album_lookup_error_moves_to_next_artist() {
        let h = harness();
        h.catalog
            .add_artist(
                fixtures::artist("Nirvana", "broken"),
                vec![fixtures::album("b-1", "Broken", &[("Lithium", "wrong")])],
            )
            .await;
        h.catalog
            .add_artist(
                fixtures::artist("Nirvana", "working"),
                vec![fixtures::album("w-1", "Nevermind", &[("Lithium", "li")])],
            )
            .await;
        h.catalog.fail_album_lookup("b-1").await;

        let resolution = h.resolver.resolve("Nirvana", "Lithium").await.unwrap();

        assert_eq!(resolution, Resolution::Resolved("li".to_string()));
        assert_eq!(h.catalog.album_lookup_count().await, 2);
        assert_eq!(h.pacer.calls(), 1);
    }

    #[tokio::test]
    async fn test_lookup_error_on_second_page_keeps_earlier_tracks() {
        let h = harness();
        h.catalog
            .add_artist(
                fixtures::artist("A", "A_id"),
                fixtures::numbered_albums("al", 120),
            )
            .await;
        // First album of the second page.
        h.catalog.fail_album_lookup("al-50").await;

        let resolution = h.resolver.resolve("A", "Not There").await.unwrap();

        assert_eq!(resolution, Resolution::Missing);
        assert!(h.cache.is_known_missing("A", "Not There").unwrap());
        // Page 1 is cached; nothing after the failing batch is fetched.
        assert_eq!(h.cache.stats().unwrap().total_tracks, 50);
        assert!(h.cache.contains_track("A", "Track 49 of al").unwrap());
        assert_eq!(h.catalog.album_listing_count().await, 2);
        assert_eq!(h.catalog.album_lookup_count().await, 4);
        assert_eq!(h.pacer.calls(), 1);
    }
}
