//! spindl - a terminal client for self-hosted Spotify download servers.
//!
//! The server does all the downloading; this crate is the presentation
//! layer. It opens the server's realtime channel, fires named commands at
//! it, and renders the progress snapshots the server pushes back.
//!
//! # Example
//!
//! ```no_run
//! use spindl::{Channel, Command, ServerEvent};
//!
//! # async fn example() -> spindl::Result<()> {
//! // Open the channel against a running server
//! let (channel, mut events) = Channel::connect("http://127.0.0.1:5000")?;
//!
//! // Commands are fire-and-forget
//! channel.emit(Command::download("https://open.spotify.com/track/..."));
//!
//! // Server pushes arrive as decoded events
//! while let Some(event) = events.recv().await {
//!     if let ServerEvent::Progress(snapshot) = event {
//!         println!("{}%", snapshot.percent_completion);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod channel;
pub mod cli;
pub mod error;
pub mod prefs;
pub mod protocol;
#[cfg(feature = "tui")]
pub mod tui;

// Re-export main types for convenience
pub use channel::{Channel, SseDecoder, SseMessage};
pub use error::{Error, Result};
pub use prefs::{Prefs, Theme};
pub use protocol::{
    Command, DownloadRequest, DownloadResponse, ProgressSnapshot, QueueStatus, ResponseStatus,
    ServerEvent, SettingsPayload, TrackProgress, TrackStatus,
};
