//! Spotify Web API client.
//!
//! Implements `CatalogApi` over the small slice of the Web API the agent
//! uses: current user, playlist creation, search, track addition. Wire
//! types stay private to this module; callers only see the domain types
//! from core. The client never retries — failures surface as
//! `CatalogError` and are handled one layer up.

use async_trait::async_trait;
use serde::Deserialize;
use setlist_core::catalog::{
    AlbumHit, ArtistHit, CatalogApi, CatalogUser, Playlist, SearchOutcome, TrackHit,
};
use setlist_core::error::CatalogError;
use tracing::{debug, warn};

const API_BASE_URL: &str = "https://api.spotify.com/v1";

/// A bearer-token Spotify client.
///
/// Bound to one access token; token refresh produces a new client (see
/// `auth::ensure_valid_client`).
pub struct SpotifyClient {
    base_url: String,
    access_token: String,
    client: reqwest::Client,
}

impl SpotifyClient {
    /// Create a client for the given access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(access_token, API_BASE_URL)
    }

    /// Create a client against a non-default API base (tests, proxies).
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            client,
        }
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }

    /// Turn a non-success response into a `CatalogError::Api`, parsing the
    /// provider's error envelope when it has one.
    async fn error_from_response(response: reqwest::Response) -> CatalogError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
            .map(|envelope| envelope.error.message)
            .unwrap_or(body);
        warn!(status, message = %message, "Catalog returned error");
        CatalogError::Api { status, message }
    }
}

#[async_trait]
impl CatalogApi for SpotifyClient {
    async fn current_user(&self) -> Result<CatalogUser, CatalogError> {
        let url = format!("{}/me", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", self.bearer())
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let user: ApiUser = response
            .json()
            .await
            .map_err(|e| CatalogError::Network(format!("Failed to parse user response: {e}")))?;

        Ok(CatalogUser {
            id: user.id,
            display_name: user.display_name,
        })
    }

    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        public: bool,
        description: &str,
    ) -> Result<Playlist, CatalogError> {
        let url = format!("{}/users/{}/playlists", self.base_url, user_id);
        let body = serde_json::json!({
            "name": name,
            "public": public,
            "description": description,
        });

        debug!(user_id, name, public, "Creating playlist");

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.bearer())
            .json(&body)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let playlist: ApiPlaylist = response.json().await.map_err(|e| {
            CatalogError::Network(format!("Failed to parse playlist response: {e}"))
        })?;

        Ok(Playlist {
            id: playlist.id,
            url: playlist.external_urls.spotify,
            name: playlist.name,
            description: playlist.description.unwrap_or_default(),
        })
    }

    async fn search(
        &self,
        query: &str,
        type_param: &str,
        limit: u32,
    ) -> Result<SearchOutcome, CatalogError> {
        let url = format!("{}/search", self.base_url);

        debug!(query, types = type_param, limit, "Searching catalog");

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.bearer())
            .query(&[
                ("q", query),
                ("type", type_param),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let results: ApiSearchResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::Network(format!("Failed to parse search response: {e}")))?;

        Ok(map_search_response(results))
    }

    async fn add_items(&self, playlist_id: &str, uris: &[String]) -> Result<(), CatalogError> {
        let url = format!("{}/playlists/{}/tracks", self.base_url, playlist_id);
        let body = serde_json::json!({ "uris": uris });

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.bearer())
            .json(&body)
            .send()
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let snapshot: ApiSnapshot = response
            .json()
            .await
            .map_err(|e| CatalogError::Network(format!("Failed to parse add response: {e}")))?;

        debug!(playlist_id, snapshot_id = %snapshot.snapshot_id, count = uris.len(), "Added tracks");
        Ok(())
    }
}

/// Map the provider's search payload to the domain outcome. A category
/// missing from the response stays `None`.
fn map_search_response(results: ApiSearchResponse) -> SearchOutcome {
    SearchOutcome {
        tracks: results.tracks.map(|paging| {
            paging
                .items
                .into_iter()
                .map(|t| TrackHit {
                    id: t.id,
                    uri: t.uri,
                    name: t.name,
                    artists: t.artists.into_iter().map(|a| a.name).collect(),
                })
                .collect()
        }),
        artists: results.artists.map(|paging| {
            paging
                .items
                .into_iter()
                .map(|a| ArtistHit {
                    id: a.id,
                    name: a.name,
                    genres: a.genres,
                })
                .collect()
        }),
        albums: results.albums.map(|paging| {
            paging
                .items
                .into_iter()
                .map(|al| AlbumHit {
                    id: al.id,
                    name: al.name,
                    artists: al.artists.into_iter().map(|a| a.name).collect(),
                })
                .collect()
        }),
    }
}

// --- Spotify API types (internal) ---

#[derive(Debug, Deserialize)]
struct ApiUser {
    id: String,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiPlaylist {
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    external_urls: ApiExternalUrls,
}

#[derive(Debug, Deserialize)]
struct ApiExternalUrls {
    spotify: String,
}

#[derive(Debug, Deserialize)]
struct ApiSearchResponse {
    #[serde(default)]
    tracks: Option<ApiPaging<ApiTrack>>,
    #[serde(default)]
    artists: Option<ApiPaging<ApiFullArtist>>,
    #[serde(default)]
    albums: Option<ApiPaging<ApiAlbum>>,
}

#[derive(Debug, Deserialize)]
struct ApiPaging<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ApiTrack {
    id: String,
    uri: String,
    name: String,
    #[serde(default)]
    artists: Vec<ApiArtistRef>,
}

#[derive(Debug, Deserialize)]
struct ApiArtistRef {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiFullArtist {
    id: String,
    name: String,
    #[serde(default)]
    genres: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ApiAlbum {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<ApiArtistRef>,
}

#[derive(Debug, Deserialize)]
struct ApiSnapshot {
    snapshot_id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[allow(dead_code)]
    status: u16,
    message: String,
}
