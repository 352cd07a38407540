//! Catalog resolver: (artist, track) → track id, cache first.
//!
//! Resolution order:
//! 1. Negative cache - pairs previously searched and not found
//! 2. Positive cache - pairs already resolved
//! 3. Catalog scan - exact-name artist matches, every album, every track
//!
//! All resolutions run sequentially; there is no concurrency inside a
//! resolution or across a `resolve_many` batch.

mod catalog_resolver;
mod config;
mod types;

pub use catalog_resolver::CatalogResolver;
pub use config::ResolverConfig;
pub use types::{Resolution, ResolveError, TrackQuery};
