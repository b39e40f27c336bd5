//! CatalogApi trait — the abstraction over the music catalog.
//!
//! The agent only ever needs four catalog operations: who am I, create a
//! playlist, search, add tracks. Everything provider-specific (transport,
//! auth, wire formats) lives behind this trait in the catalog crate.

use crate::error::CatalogError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The authenticated catalog account a run acts as.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// A created playlist.
///
/// Serializes to the exact payload the create-playlist tool hands back to
/// the model, and is what the run reports as its playlist reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub url: String,
    pub name: String,
    /// Echoed by the provider, which may normalise it. Absent upstream
    /// becomes an empty string.
    #[serde(default)]
    pub description: String,
}

/// A track search hit, reduced to what the agent needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackHit {
    pub id: String,
    pub uri: String,
    pub name: String,
    pub artists: Vec<String>,
}

/// An artist search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistHit {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
}

/// An album search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumHit {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
}

/// The outcome of a catalog search.
///
/// A category the provider did not answer for stays `None`; callers must
/// read that as "no results", not as an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracks: Option<Vec<TrackHit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artists: Option<Vec<ArtistHit>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub albums: Option<Vec<AlbumHit>>,
}

/// The core CatalogApi trait.
///
/// One implementation talks to the real provider; tests substitute fakes
/// that record calls and script responses.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Resolve the authenticated account.
    async fn current_user(&self) -> std::result::Result<CatalogUser, CatalogError>;

    /// Create a playlist owned by `user_id`.
    async fn create_playlist(
        &self,
        user_id: &str,
        name: &str,
        public: bool,
        description: &str,
    ) -> std::result::Result<Playlist, CatalogError>;

    /// Search the catalog. `type_param` is the comma-joined category list
    /// the provider expects (e.g. "track,artist").
    async fn search(
        &self,
        query: &str,
        type_param: &str,
        limit: u32,
    ) -> std::result::Result<SearchOutcome, CatalogError>;

    /// Add `uris` to a playlist. Callers batch; this is one request.
    async fn add_items(
        &self,
        playlist_id: &str,
        uris: &[String],
    ) -> std::result::Result<(), CatalogError>;
}
