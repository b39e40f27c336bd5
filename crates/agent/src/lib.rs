//! The playlist agent loop — the heart of Setlist.
//!
//! One run follows a fixed cycle:
//!
//! 1. **Seed** the transcript with the system instruction and the user's
//!    request
//! 2. **Send** the full transcript to the model with the tool definitions
//! 3. **If tool calls**: dispatch each one, pair an output to every call,
//!    loop back to step 2
//! 4. **If text only**: fold the turn's text into the run summary and stop
//!
//! The loop is bounded; hitting the turn limit yields a degraded result
//! rather than an error.

pub mod playlist_run;
pub mod prompt;

pub use playlist_run::{PlaylistAgent, RunResult, RunStatus, run_agent_for_user};
pub use prompt::SYSTEM_PROMPT;
