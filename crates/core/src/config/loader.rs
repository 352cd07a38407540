use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides, e.g. `TRACKRESOLVER_DATABASE__PATH`.
const ENV_PREFIX: &str = "TRACKRESOLVER_";

/// Layer environment overrides on top of `figment`.
///
/// The conventional `SPOTIFY_CLIENT_ID` / `SPOTIFY_CLIENT_SECRET` variables are
/// honoured; prefixed variables win over them.
fn with_env(figment: Figment) -> Figment {
    figment
        .merge(
            Env::raw()
                .only(&["SPOTIFY_CLIENT_ID", "SPOTIFY_CLIENT_SECRET"])
                .map(|key| {
                    key.as_str()
                        .to_ascii_lowercase()
                        .replacen("spotify_", "spotify.", 1)
                        .into()
                }),
        )
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = with_env(Figment::new().merge(Toml::file(path)))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from defaults and environment variables only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    with_env(Figment::new())
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
