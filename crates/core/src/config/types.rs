use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::external_catalog::SpotifyConfig;
use crate::resolver::ResolverConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub spotify: SpotifyConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("music.db")
}

/// Sanitized config for printing (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub spotify: SanitizedSpotifyConfig,
    pub database: DatabaseConfig,
    pub resolver: ResolverConfig,
}

/// Sanitized Spotify config (client secret hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSpotifyConfig {
    pub client_id: String,
    pub client_secret_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            spotify: SanitizedSpotifyConfig {
                client_id: config.spotify.client_id.clone(),
                client_secret_configured: !config.spotify.client_secret.is_empty(),
                base_url: config.spotify.base_url.clone(),
                timeout_secs: config.spotify.timeout_secs,
                market: config.spotify.market.clone(),
            },
            database: config.database.clone(),
            resolver: config.resolver.clone(),
        }
    }
}
