//! # Setlist Core
//!
//! Domain types, traits, and error definitions for the Setlist playlist
//! agent. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here: the model
//! endpoint (`ModelClient`), the music catalog (`CatalogApi`) and the
//! callable tools (`Tool`). Implementations live in their respective
//! crates, which keeps the agent loop testable against scripted fakes and
//! the dependency graph pointing inward.

pub mod catalog;
pub mod error;
pub mod model;
pub mod sanitize;
pub mod tool;
pub mod transcript;

// Re-export key types at crate root for ergonomics
pub use catalog::{AlbumHit, ArtistHit, CatalogApi, CatalogUser, Playlist, SearchOutcome, TrackHit};
pub use error::{CatalogError, Error, ModelError, Result, ToolError};
pub use model::{ModelClient, ModelRequest, ModelResponse, ToolDefinition, Usage};
pub use sanitize::{sanitize_value, strip_control_chars};
pub use tool::{Tool, ToolRegistry};
pub use transcript::{Role, TranscriptItem};
