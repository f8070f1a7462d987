//! WCBN client library
//!
//! This crate provides the now-playing side of a player for WCBN 88.3 FM
//! (Ann Arbor): metadata scraped from the station's Icecast server, artwork
//! from the iTunes Search API, the station playlist, and a refresh service
//! that keeps listeners up to date.
//!
//! # Features
//!
//! - **Playlist**: Parse the HTML playlist, including rows crossed by
//!   `rowspan` show cells
//! - **Live Metadata**: Scrape the Icecast status page of the selected stream
//! - **Artwork**: Song/album fallback chain over the iTunes Search API
//! - **Refresh Service**: Tokio task owning the player state, ticking every
//!   10 seconds and notifying listeners on song change
//! - **Configuration Extension**: Stream quality, artwork and refresh
//!   settings stored through pmoconfig
//!
//! # Example
//!
//! ```no_run
//! use pmowcbn::{MetadataRefreshCycle, StreamQuality, WcbnClient, WcbnStation, TickOutcome};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WcbnClient::new().await?;
//!     let cycle = MetadataRefreshCycle::for_station(
//!         Arc::new(client),
//!         Arc::new(WcbnStation::new()),
//!         StreamQuality::Hi,
//!     )?;
//!
//!     if let TickOutcome::Changed { snapshot, .. } = cycle.tick(None).await {
//!         println!("Now: {} - {}", snapshot.artist, snapshot.current_song);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Configuration Extension
//!
//! When the `pmoconfig` feature is enabled (default), [`WcbnConfigExt`] adds
//! the player settings to `pmoconfig::Config` and [`PlayerSetup`] wires the
//! clients and the service from them.

pub mod artwork;
pub mod client;
pub mod context;
pub mod error;
pub mod icecast;
pub mod listener;
pub mod models;
pub mod notification;
pub mod playlist;
pub mod refresh;
pub mod service;
pub mod station;

#[cfg(feature = "pmoconfig")]
pub mod config_ext;

#[cfg(feature = "pmoconfig")]
pub mod setup;

// Re-exports
pub use artwork::{lookup_artwork, ArtworkSearch, ItunesClient};
pub use client::{ClientBuilder, WcbnClient};
pub use context::PlayerContext;
pub use error::{Error, Result};
pub use icecast::{parse_status_page, MetadataScraper};
pub use listener::{ListenerId, ListenerRegistry, StreamListener};
pub use models::{
    capitalize_title, ArtKind, Artwork, IcecastStream, MediaError, PlaybackState, PlaylistRow,
    StreamQuality, StreamSnapshot, TrackArt,
};
pub use notification::{NotificationAction, NotificationListener, NowPlayingNotification};
pub use playlist::{PlaylistCell, PlaylistRowParser};
pub use refresh::{has_changed, MetadataRefreshCycle, TickOutcome};
pub use service::{ServiceHandle, StreamService};
pub use station::{Station, WcbnStation};

#[cfg(feature = "pmoconfig")]
pub use config_ext::WcbnConfigExt;

#[cfg(feature = "pmoconfig")]
pub use setup::PlayerSetup;
