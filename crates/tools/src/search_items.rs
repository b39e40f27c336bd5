//! Catalog search tool.
//!
//! Searches one or more categories in a single provider call and reports
//! simplified records: enough for the model to pick tracks and collect
//! their URIs, nothing more. A category the provider did not answer for is
//! left out of the payload entirely.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use setlist_core::catalog::{AlbumHit, ArtistHit, CatalogApi, TrackHit};
use setlist_core::error::ToolError;
use setlist_core::tool::Tool;
use std::sync::Arc;

pub struct SearchItemsTool {
    catalog: Arc<dyn CatalogApi>,
}

impl SearchItemsTool {
    pub fn new(catalog: Arc<dyn CatalogApi>) -> Self {
        Self { catalog }
    }
}

#[derive(Debug, Deserialize)]
struct Args {
    query: String,
    item_types: Vec<String>,
    limit: u32,
}

#[async_trait]
impl Tool for SearchItemsTool {
    fn name(&self) -> &str {
        "search_items"
    }

    fn description(&self) -> &str {
        "Search the music catalog for tracks, artists or albums. Returns simplified records including track URIs for add_tracks."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Free-text search query (title, artist, genre, mood)"
                },
                "item_types": {
                    "type": "array",
                    "items": { "type": "string", "enum": ["track", "artist", "album"] },
                    "description": "Catalog categories to search"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of results per category"
                }
            },
            "required": ["query", "item_types", "limit"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: Args = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let type_param = args.item_types.join(",");
        let outcome = self
            .catalog
            .search(&args.query, &type_param, args.limit)
            .await?;

        let mut payload = serde_json::Map::new();
        if let Some(tracks) = outcome.tracks {
            payload.insert(
                "tracks".into(),
                tracks.iter().map(track_payload).collect(),
            );
        }
        if let Some(artists) = outcome.artists {
            payload.insert(
                "artists".into(),
                artists.iter().map(artist_payload).collect(),
            );
        }
        if let Some(albums) = outcome.albums {
            payload.insert(
                "albums".into(),
                albums.iter().map(album_payload).collect(),
            );
        }
        Ok(Value::Object(payload))
    }
}

fn track_payload(track: &TrackHit) -> Value {
    json!({
        "id": track.id,
        "uri": track.uri,
        "name": track.name,
        "artists": track.artists.join(", "),
    })
}

fn artist_payload(artist: &ArtistHit) -> Value {
    json!({
        "id": artist.id,
        "name": artist.name,
        "genres": artist.genres,
    })
}

fn album_payload(album: &AlbumHit) -> Value {
    json!({
        "id": album.id,
        "name": album.name,
        "artists": album.artists.join(", "),
    })
}
