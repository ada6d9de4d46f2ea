// Status ("stories") playback for the marketplace client.
// The library holds the engine and its collaborators; the binary is a
// terminal viewer on top of it.

pub mod config;
pub mod media;
pub mod models;
pub mod playback;
pub mod services;
pub mod utils;

// Re-export main types for convenience
pub use models::*;
pub use playback::{PlaybackConfig, PlaybackError, PlaybackSession, StatusViewer};
