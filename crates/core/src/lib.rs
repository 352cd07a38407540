pub mod config;
pub mod external_catalog;
pub mod history;
pub mod metrics;
pub mod pacing;
pub mod resolver;
pub mod testing;
pub mod track_cache;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError, DatabaseConfig, SanitizedConfig,
};
pub use external_catalog::{ExternalCatalog, ExternalCatalogError, SpotifyClient, SpotifyConfig};
pub use history::{load_history, HistoryCollector, HistoryError};
pub use pacing::{create_pacer, NoPacing, Pacer, PacingConfig, TokenBucketPacer};
pub use resolver::{CatalogResolver, Resolution, ResolveError, ResolverConfig, TrackQuery};
pub use track_cache::{CacheError, CacheStats, SqliteTrackCache, TrackCache, TrackRecord};
