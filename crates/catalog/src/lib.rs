//! # Setlist Catalog
//!
//! Spotify Web API integration: the `CatalogApi` implementation the agent
//! runs against, plus the OAuth authorization-code flow that produces and
//! maintains the tokens behind it.

pub mod auth;
pub mod client;

pub use auth::{SpotifyAuth, TokenSet, ensure_valid_client};
pub use client::SpotifyClient;
