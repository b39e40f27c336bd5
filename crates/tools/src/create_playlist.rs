//! Playlist creation tool.
//!
//! Truncates the title and description to the provider's limits before
//! submission; truncating locally avoids a guaranteed round-trip failure.

use async_trait::async_trait;
use serde::Deserialize;
use setlist_core::catalog::CatalogApi;
use setlist_core::error::ToolError;
use setlist_core::tool::Tool;
use std::sync::Arc;

const NAME_MAX_CHARS: usize = 100;
const DESCRIPTION_MAX_CHARS: usize = 300;

pub struct CreatePlaylistTool {
    catalog: Arc<dyn CatalogApi>,
    user_id: String,
}

impl CreatePlaylistTool {
    pub fn new(catalog: Arc<dyn CatalogApi>, user_id: impl Into<String>) -> Self {
        Self {
            catalog,
            user_id: user_id.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Args {
    name: String,
    description: String,
    public: bool,
}

#[async_trait]
impl Tool for CreatePlaylistTool {
    fn name(&self) -> &str {
        "create_playlist"
    }

    fn description(&self) -> &str {
        "Create a new playlist for the current user. Returns the playlist id, shareable url, name and description."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Playlist title"
                },
                "description": {
                    "type": "string",
                    "description": "Short description shown under the title"
                },
                "public": {
                    "type": "boolean",
                    "description": "Whether the playlist is publicly visible"
                }
            },
            "required": ["name", "description", "public"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: Args = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let name = truncate_chars(&args.name, NAME_MAX_CHARS);
        let description = truncate_chars(&args.description, DESCRIPTION_MAX_CHARS);

        let playlist = self
            .catalog
            .create_playlist(&self.user_id, &name, args.public, &description)
            .await?;

        Ok(serde_json::to_value(&playlist)?)
    }
}

/// Truncate to at most `max` characters. Counted in characters, not
/// bytes; the provider's limits are character limits.
fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use setlist_core::catalog::{CatalogUser, Playlist, SearchOutcome};
    use setlist_core::error::CatalogError;
    use std::sync::Mutex;

    /// Records the submitted playlist fields and echoes them back.
    struct RecordingCatalog {
        created: Mutex<Option<(String, String, String, bool)>>,
    }

    impl RecordingCatalog {
        fn new() -> Self {
            Self {
                created: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl CatalogApi for RecordingCatalog {
        async fn current_user(&self) -> Result<CatalogUser, CatalogError> {
            Ok(CatalogUser {
                id: "listener".into(),
                display_name: None,
            })
        }

        async fn create_playlist(
            &self,
            user_id: &str,
            name: &str,
            public: bool,
            description: &str,
        ) -> Result<Playlist, CatalogError> {
            *self.created.lock().unwrap() = Some((
                user_id.to_string(),
                name.to_string(),
                description.to_string(),
                public,
            ));
            Ok(Playlist {
                id: "p1".into(),
                url: "https://open.spotify.com/playlist/p1".into(),
                name: name.to_string(),
                description: description.to_string(),
            })
        }

        async fn search(
            &self,
            _query: &str,
            _type_param: &str,
            _limit: u32,
        ) -> Result<SearchOutcome, CatalogError> {
            Ok(SearchOutcome::default())
        }

        async fn add_items(
            &self,
            _playlist_id: &str,
            _uris: &[String],
        ) -> Result<(), CatalogError> {
            Ok(())
        }
    }

    fn tool(catalog: Arc<RecordingCatalog>) -> CreatePlaylistTool {
        CreatePlaylistTool::new(catalog, "listener")
    }

    #[tokio::test]
    async fn creates_playlist_and_returns_reference() {
        let catalog = Arc::new(RecordingCatalog::new());
        let result = tool(catalog.clone())
            .execute(serde_json::json!({
                "name": "Sunday Coffee",
                "description": "slow acoustic morning",
                "public": true
            }))
            .await
            .unwrap();

        assert_eq!(result["id"], "p1");
        assert_eq!(result["url"], "https://open.spotify.com/playlist/p1");
        assert_eq!(result["name"], "Sunday Coffee");
        assert_eq!(result["description"], "slow acoustic morning");

        let created = catalog.created.lock().unwrap().clone().unwrap();
        assert_eq!(created.0, "listener");
        assert!(created.3);
    }

    #[tokio::test]
    async fn truncates_long_name_to_100_chars() {
        let catalog = Arc::new(RecordingCatalog::new());
        let long_name: String = "x".repeat(250);
        tool(catalog.clone())
            .execute(serde_json::json!({
                "name": long_name,
                "description": "d",
                "public": false
            }))
            .await
            .unwrap();

        let created = catalog.created.lock().unwrap().clone().unwrap();
        assert_eq!(created.1.chars().count(), 100);
    }

    #[tokio::test]
    async fn truncates_long_description_to_300_chars() {
        let catalog = Arc::new(RecordingCatalog::new());
        let long_description: String = "y".repeat(500);
        tool(catalog.clone())
            .execute(serde_json::json!({
                "name": "n",
                "description": long_description,
                "public": true
            }))
            .await
            .unwrap();

        let created = catalog.created.lock().unwrap().clone().unwrap();
        assert_eq!(created.2.chars().count(), 300);
    }

    #[tokio::test]
    async fn truncation_counts_characters_not_bytes() {
        let catalog = Arc::new(RecordingCatalog::new());
        // 150 two-byte characters; byte-based slicing would split one
        let name: String = "é".repeat(150);
        tool(catalog.clone())
            .execute(serde_json::json!({
                "name": name,
                "description": "d",
                "public": true
            }))
            .await
            .unwrap();

        let created = catalog.created.lock().unwrap().clone().unwrap();
        assert_eq!(created.1.chars().count(), 100);
        assert_eq!(created.1, "é".repeat(100));
    }

    #[tokio::test]
    async fn missing_fields_is_invalid_arguments() {
        let catalog = Arc::new(RecordingCatalog::new());
        let err = tool(catalog)
            .execute(serde_json::json!({ "name": "only a name" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn short_values_pass_through_unchanged() {
        assert_eq!(truncate_chars("abc", 100), "abc");
        assert_eq!(truncate_chars("", 100), "");
    }

    #[test]
    fn tool_definition() {
        let catalog = Arc::new(RecordingCatalog::new());
        let def = tool(catalog).to_definition();
        assert_eq!(def.name, "create_playlist");
        assert_eq!(def.parameters["required"][2], "public");
    }
}
