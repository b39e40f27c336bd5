//! Catalog gateway tools for Setlist.
//!
//! The three operations the model may call: create a playlist, search
//! the catalog, add tracks. Each owns its own input limits and payload
//! shape; catalog failures pass through untouched and are folded into
//! result payloads by the registry's dispatcher.

pub mod add_tracks;
pub mod create_playlist;
pub mod search_items;

use setlist_core::catalog::CatalogApi;
use setlist_core::error::CatalogError;
use setlist_core::tool::ToolRegistry;
use std::sync::Arc;
use tracing::debug;

pub use add_tracks::AddTracksTool;
pub use create_playlist::CreatePlaylistTool;
pub use search_items::SearchItemsTool;

/// Build the tool registry for one authenticated catalog account.
///
/// The account's user id is resolved once here and bound into the tools
/// for the whole run.
pub async fn registry_for(catalog: Arc<dyn CatalogApi>) -> Result<ToolRegistry, CatalogError> {
    let user = catalog.current_user().await?;
    debug!(user_id = %user.id, "Resolved catalog account");

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(CreatePlaylistTool::new(
        catalog.clone(),
        user.id,
    )));
    registry.register(Box::new(SearchItemsTool::new(catalog.clone())));
    registry.register(Box::new(AddTracksTool::new(catalog)));
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use setlist_core::catalog::{CatalogUser, Playlist, SearchOutcome};
    use std::sync::Mutex;

    struct OneUserCatalog {
        user_lookups: Mutex<u32>,
    }

    #[async_trait]
    impl CatalogApi for OneUserCatalog {
        async fn current_user(&self) -> Result<CatalogUser, CatalogError> {
            *self.user_lookups.lock().unwrap() += 1;
            Ok(CatalogUser {
                id: "listener".into(),
                display_name: Some("A Listener".into()),
            })
        }

        async fn create_playlist(
            &self,
            user_id: &str,
            name: &str,
            _public: bool,
            description: &str,
        ) -> Result<Playlist, CatalogError> {
            assert_eq!(user_id, "listener");
            Ok(Playlist {
                id: "p1".into(),
                url: "u".into(),
                name: name.into(),
                description: description.into(),
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

    #[tokio::test]
    async fn registry_holds_the_three_tools() {
        let catalog = Arc::new(OneUserCatalog {
            user_lookups: Mutex::new(0),
        });
        let registry = registry_for(catalog.clone()).await.unwrap();

        let mut names = registry.names();
        names.sort();
        assert_eq!(names, vec!["add_tracks", "create_playlist", "search_items"]);
        assert_eq!(registry.definitions().len(), 3);
    }

    #[tokio::test]
    async fn user_id_is_resolved_once() {
        let catalog = Arc::new(OneUserCatalog {
            user_lookups: Mutex::new(0),
        });
        let registry = registry_for(catalog.clone()).await.unwrap();
        assert_eq!(*catalog.user_lookups.lock().unwrap(), 1);

        // Creating playlists does not look the user up again; the id was
        // bound at registry construction (asserted inside the fake).
        registry
            .dispatch(
                "create_playlist",
                r#"{"name":"n","description":"d","public":true}"#,
            )
            .await;
        assert_eq!(*catalog.user_lookups.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn registry_propagates_user_lookup_failure() {
        struct DownCatalog;

        #[async_trait]
        impl CatalogApi for DownCatalog {
            async fn current_user(&self) -> Result<CatalogUser, CatalogError> {
                Err(CatalogError::Api {
                    status: 503,
                    message: "service unavailable".into(),
                })
            }
            async fn create_playlist(
                &self,
                _user_id: &str,
                _name: &str,
                _public: bool,
                _description: &str,
            ) -> Result<Playlist, CatalogError> {
                unreachable!()
            }
            async fn search(
                &self,
                _query: &str,
                _type_param: &str,
                _limit: u32,
            ) -> Result<SearchOutcome, CatalogError> {
                unreachable!()
            }
            async fn add_items(
                &self,
                _playlist_id: &str,
                _uris: &[String],
            ) -> Result<(), CatalogError> {
                unreachable!()
            }
        }

        let err = registry_for(Arc::new(DownCatalog)).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
    }
}
