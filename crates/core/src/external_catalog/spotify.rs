//! Spotify Web API client.
//!
//! Spotify requires:
//! - An OAuth bearer token; this client uses the client-credentials flow and
//!   caches the token until shortly before it expires
//! - `limit` of at most 50 for search and album listing, at most 20 ids per
//!   bulk album lookup

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::types::{CatalogAlbum, CatalogAlbumTracks, CatalogArtist, CatalogTrack};
use super::{
    ExternalCatalog, ExternalCatalogError, MAX_ALBUM_BATCH_SIZE, MAX_ALBUM_PAGE_SIZE,
    MAX_ARTIST_SEARCH_LIMIT,
};

/// Tokens are refreshed this long before Spotify says they expire, or at
/// half their lifetime for short-lived tokens.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Spotify API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotifyConfig {
    /// Application client ID (from the Spotify developer dashboard).
    #[serde(default)]
    pub client_id: String,
    /// Application client secret.
    #[serde(default)]
    pub client_secret: String,
    /// Base URL (default: https://api.spotify.com/v1).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Token endpoint (default: https://accounts.spotify.com/api/token).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accounts_url: Option<String>,
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Market (ISO 3166-1 alpha-2) forwarded to album endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
}

fn default_timeout() -> u64 {
    30
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            base_url: None,
            accounts_url: None,
            timeout_secs: default_timeout(),
            market: None,
        }
    }
}

struct AccessToken {
    value: String,
    refresh_at: Instant,
}

impl AccessToken {
    fn new(value: String, lifetime: Duration) -> Self {
        let margin = TOKEN_EXPIRY_MARGIN.min(lifetime / 2);
        Self {
            value,
            refresh_at: Instant::now() + lifetime - margin,
        }
    }

    fn is_fresh(&self) -> bool {
        Instant::now() < self.refresh_at
    }
}

/// Spotify Web API client.
pub struct SpotifyClient {
    client: Client,
    base_url: String,
    accounts_url: String,
    client_id: String,
    client_secret: String,
    market: Option<String>,
    token: Mutex<Option<AccessToken>>,
}

impl SpotifyClient {
    /// Create a new Spotify client.
    pub fn new(config: SpotifyConfig) -> Result<Self, ExternalCatalogError> {
        if config.client_id.is_empty() || config.client_secret.is_empty() {
            return Err(ExternalCatalogError::NotConfigured(
                "Spotify client_id and client_secret are required".to_string(),
            ));
        }

        let timeout_secs = if config.timeout_secs == 0 {
            default_timeout()
        } else {
            config.timeout_secs
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        let base_url = config
            .base_url
            .unwrap_or_else(|| "https://api.spotify.com/v1".to_string());
        let accounts_url = config
            .accounts_url
            .unwrap_or_else(|| "https://accounts.spotify.com/api/token".to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            accounts_url,
            client_id: config.client_id,
            client_secret: config.client_secret,
            market: config.market,
            token: Mutex::new(None),
        })
    }

    /// Return a valid bearer token, requesting a new one if needed.
    async fn access_token(&self) -> Result<String, ExternalCatalogError> {
        let mut token = self.token.lock().await;

        if let Some(current) = token.as_ref() {
            if current.is_fresh() {
                return Ok(current.value.clone());
            }
        }

        debug!("Requesting Spotify access token");

        let response = self
            .client
            .post(&self.accounts_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if status == 400 || status == 401 {
            let body = response.text().await.unwrap_or_default();
            return Err(ExternalCatalogError::AuthFailed(body));
        }
        if status == 429 {
            warn!("Spotify rate limit exceeded on token request");
            return Err(ExternalCatalogError::RateLimitExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExternalCatalogError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let grant: SpTokenResponse = response.json().await.map_err(|e| {
            ExternalCatalogError::ParseError(format!("Failed to parse token response: {}", e))
        })?;

        let value = grant.access_token;
        *token = Some(AccessToken::new(
            value.clone(),
            Duration::from_secs(grant.expires_in),
        ));

        Ok(value)
    }

    /// Send an authenticated GET and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        what: &str,
    ) -> Result<T, ExternalCatalogError> {
        let token = self.access_token().await?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == 401 {
            // Revoked or expired early; the next call fetches a new token.
            *self.token.lock().await = None;
            return Err(ExternalCatalogError::AuthFailed(
                "access token rejected".to_string(),
            ));
        }
        if status == 429 {
            warn!("Spotify rate limit exceeded");
            return Err(ExternalCatalogError::RateLimitExceeded);
        }
        if status == 404 {
            return Err(ExternalCatalogError::NotFound(what.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExternalCatalogError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        response.json().await.map_err(|e| {
            ExternalCatalogError::ParseError(format!("Failed to parse {} response: {}", what, e))
        })
    }

    fn market_param(&self, query: &mut Vec<(&'static str, String)>) {
        if let Some(market) = &self.market {
            query.push(("market", market.clone()));
        }
    }

    /// Search for artists by name.
    pub async fn search_artists(
        &self,
        name: &str,
        limit: u32,
    ) -> Result<Vec<CatalogArtist>, ExternalCatalogError> {
        let url = format!("{}/search", self.base_url);
        let limit = limit.clamp(1, MAX_ARTIST_SEARCH_LIMIT);

        debug!("Spotify artist search: query='{}', limit={}", name, limit);

        let result: SpSearchResponse = self
            .get_json(
                &url,
                &[
                    ("q", name.to_string()),
                    ("type", "artist".to_string()),
                    ("limit", limit.to_string()),
                ],
                "artist search",
            )
            .await?;

        Ok(result
            .artists
            .items
            .into_iter()
            .map(CatalogArtist::from)
            .collect())
    }

    /// List one page of an artist's albums.
    pub async fn artist_albums(
        &self,
        artist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<CatalogAlbum>, ExternalCatalogError> {
        let url = format!("{}/artists/{}/albums", self.base_url, artist_id);
        let limit = limit.clamp(1, MAX_ALBUM_PAGE_SIZE);

        debug!(
            "Spotify artist albums: artist={}, limit={}, offset={}",
            artist_id, limit, offset
        );

        let mut query = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
        self.market_param(&mut query);

        let page: SpPaging<SpSimplifiedAlbum> =
            self.get_json(&url, &query, "artist albums").await?;

        Ok(page.items.into_iter().map(CatalogAlbum::from).collect())
    }

    /// Look up several albums with their complete track lists.
    pub async fn album_tracks(
        &self,
        album_ids: &[String],
    ) -> Result<Vec<CatalogAlbumTracks>, ExternalCatalogError> {
        if album_ids.is_empty() {
            return Ok(Vec::new());
        }
        if album_ids.len() > MAX_ALBUM_BATCH_SIZE {
            return Err(ExternalCatalogError::InvalidRequest(format!(
                "at most {} albums per lookup, got {}",
                MAX_ALBUM_BATCH_SIZE,
                album_ids.len()
            )));
        }

        let url = format!("{}/albums", self.base_url);

        debug!("Spotify album lookup: {} ids", album_ids.len());

        let mut query = vec![("ids", album_ids.join(","))];
        self.market_param(&mut query);

        let response: SpAlbumsResponse = self.get_json(&url, &query, "albums").await?;

        let mut albums = Vec::with_capacity(response.albums.len());
        for album in response.albums.into_iter().flatten() {
            let mut tracks = album.tracks.items;
            let mut next = album.tracks.next;

            // The embedded track page holds at most 50 tracks.
            while let Some(next_url) = next {
                debug!("Spotify album tracks: following {}", next_url);
                let page: SpPaging<SpTrack> =
                    self.get_json(&next_url, &[], "album tracks").await?;
                tracks.extend(page.items);
                next = page.next;
            }

            albums.push(CatalogAlbumTracks {
                album_id: album.id,
                album_name: album.name,
                tracks: tracks.into_iter().filter_map(SpTrack::into_catalog).collect(),
            });
        }

        Ok(albums)
    }
}

#[async_trait]
impl ExternalCatalog for SpotifyClient {
    async fn search_artists(
        &self,
        name: &str,
        limit: u32,
    ) -> Result<Vec<CatalogArtist>, ExternalCatalogError> {
        SpotifyClient::search_artists(self, name, limit).await
    }

    async fn artist_albums(
        &self,
        artist_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<CatalogAlbum>, ExternalCatalogError> {
        SpotifyClient::artist_albums(self, artist_id, limit, offset).await
    }

    async fn album_tracks(
        &self,
        album_ids: &[String],
    ) -> Result<Vec<CatalogAlbumTracks>, ExternalCatalogError> {
        SpotifyClient::album_tracks(self, album_ids).await
    }
}

// ============================================================================
// Spotify API Response Types (private)
// ============================================================================

#[derive(Debug, Deserialize)]
struct SpTokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct SpSearchResponse {
    artists: SpPaging<SpArtist>,
}

#[derive(Debug, Deserialize)]
struct SpPaging<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpArtist {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpSimplifiedAlbum {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SpAlbumsResponse {
    // Unknown ids come back as null entries.
    #[serde(default)]
    albums: Vec<Option<SpFullAlbum>>,
}

#[derive(Debug, Deserialize)]
struct SpFullAlbum {
    id: String,
    name: String,
    tracks: SpPaging<SpTrack>,
}

#[derive(Debug, Deserialize)]
struct SpTrack {
    // Local files have no id.
    #[serde(default)]
    id: Option<String>,
    name: String,
}

impl SpTrack {
    fn into_catalog(self) -> Option<CatalogTrack> {
        let id = self.id?;
        Some(CatalogTrack {
            id,
            name: self.name,
        })
    }
}

impl From<SpArtist> for CatalogArtist {
    fn from(sp: SpArtist) -> Self {
        CatalogArtist {
            id: sp.id,
            name: sp.name,
        }
    }
}

impl From<SpSimplifiedAlbum> for CatalogAlbum {
    fn from(sp: SpSimplifiedAlbum) -> Self {
        CatalogAlbum {
            id: sp.id,
            name: sp.name,
        }
    }
}
