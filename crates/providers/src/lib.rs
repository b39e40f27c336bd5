//! Model endpoint clients for Setlist.
//!
//! All clients implement the `setlist_core::ModelClient` trait; the rest
//! of the system never sees a wire format.

pub mod responses;

pub use responses::OpenAiResponsesClient;
