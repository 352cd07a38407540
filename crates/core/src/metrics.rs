//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Track cache lookups (negative hit, positive hit, miss)
//! - Resolution outcomes
//! - External catalog requests
//! - Pacing waits

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Cache Metrics
// =============================================================================

/// Cache lookups by result.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "trackresolver_cache_lookups_total",
            "Track cache lookups performed before querying the catalog",
        ),
        &["result"], // "negative_hit", "positive_hit", "miss"
    )
    .unwrap()
});

/// Track rows newly written to the positive cache.
pub static TRACKS_CACHED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "trackresolver_tracks_cached_total",
        "Track records newly inserted into the cache",
    )
    .unwrap()
});

// =============================================================================
// Resolver Metrics
// =============================================================================

/// Resolutions by outcome.
pub static RESOLUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("trackresolver_resolutions_total", "Completed resolutions"),
        &["outcome"], // "cached", "resolved", "known_missing", "missing", "error"
    )
    .unwrap()
});

// =============================================================================
// External Catalog Metrics
// =============================================================================

/// Catalog requests by operation and result.
pub static CATALOG_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "trackresolver_catalog_requests_total",
            "Requests issued to the external catalog",
        ),
        &["operation", "result"], // operation: "search_artists", "artist_albums", "album_tracks"
    )
    .unwrap()
});

/// Time spent waiting on the pacer.
pub static PACING_WAIT: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "trackresolver_pacing_wait_seconds",
            "Time spent waiting for the pacing policy",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Record the outcome of one catalog request.
pub fn record_catalog_request<T, E>(operation: &str, result: &Result<T, E>) {
    let label = if result.is_ok() { "success" } else { "error" };
    CATALOG_REQUESTS
        .with_label_values(&[operation, label])
        .inc();
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Cache
        Box::new(CACHE_LOOKUPS.clone()),
        Box::new(TRACKS_CACHED.clone()),
        // Resolver
        Box::new(RESOLUTIONS.clone()),
        // External catalog
        Box::new(CATALOG_REQUESTS.clone()),
        Box::new(PACING_WAIT.clone()),
    ]
}
