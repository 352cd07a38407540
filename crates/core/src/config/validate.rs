use super::{types::Config, ConfigError};
use crate::external_catalog::{MAX_ALBUM_BATCH_SIZE, MAX_ALBUM_PAGE_SIZE, MAX_ARTIST_SEARCH_LIMIT};

/// Validate configuration
/// Currently validates:
/// - Spotify credentials are present
/// - Resolver page/batch sizes are within the catalog's limits
/// - Pacing window is non-zero when pacing is enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.spotify.client_id.is_empty() {
        return Err(ConfigError::ValidationError(
            "spotify.client_id is required".to_string(),
        ));
    }
    if config.spotify.client_secret.is_empty() {
        return Err(ConfigError::ValidationError(
            "spotify.client_secret is required".to_string(),
        ));
    }

    if config.database.path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "database.path cannot be empty".to_string(),
        ));
    }

    let resolver = &config.resolver;
    if !(1..=MAX_ARTIST_SEARCH_LIMIT).contains(&resolver.artist_search_limit) {
        return Err(ConfigError::ValidationError(format!(
            "resolver.artist_search_limit must be between 1 and {}",
            MAX_ARTIST_SEARCH_LIMIT
        )));
    }
    if !(1..=MAX_ALBUM_PAGE_SIZE).contains(&resolver.album_page_size) {
        return Err(ConfigError::ValidationError(format!(
            "resolver.album_page_size must be between 1 and {}",
            MAX_ALBUM_PAGE_SIZE
        )));
    }
    if !(1..=MAX_ALBUM_BATCH_SIZE).contains(&resolver.album_batch_size) {
        return Err(ConfigError::ValidationError(format!(
            "resolver.album_batch_size must be between 1 and {}",
            MAX_ALBUM_BATCH_SIZE
        )));
    }

    let pacing = &resolver.pacing;
    if pacing.enabled && (pacing.requests_per_window == 0 || pacing.window_ms == 0) {
        return Err(ConfigError::ValidationError(
            "resolver.pacing needs requests_per_window and window_ms above 0 (or enabled = false)"
                .to_string(),
        ));
    }

    Ok(())
}
