//! Track addition tool.
//!
//! An empty URI list short-circuits without touching the network. The
//! provider caps one addition request at 100 items, so longer lists are
//! cut there and the reported count is what was actually added.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use setlist_core::catalog::CatalogApi;
use setlist_core::error::ToolError;
use setlist_core::tool::Tool;
use std::sync::Arc;

const URI_BATCH_LIMIT: usize = 100;

pub struct AddTracksTool {
    catalog: Arc<dyn CatalogApi>,
}

impl AddTracksTool {
    pub fn new(catalog: Arc<dyn CatalogApi>) -> Self {
        Self { catalog }
    }
}

#[derive(Debug, Deserialize)]
struct Args {
    playlist_id: String,
    uris: Vec<String>,
}

#[async_trait]
impl Tool for AddTracksTool {
    fn name(&self) -> &str {
        "add_tracks"
    }

    fn description(&self) -> &str {
        "Add tracks to a playlist by URI. Returns how many were actually added."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "playlist_id": {
                    "type": "string",
                    "description": "Id of the playlist to add to"
                },
                "uris": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Track URIs, e.g. spotify:track:..."
                }
            },
            "required": ["playlist_id", "uris"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let mut args: Args = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        if args.uris.is_empty() {
            return Ok(json!({ "added": 0 }));
        }

        args.uris.truncate(URI_BATCH_LIMIT);
        self.catalog
            .add_items(&args.playlist_id, &args.uris)
            .await?;

        Ok(json!({ "added": args.uris.len() }))
    }
}
