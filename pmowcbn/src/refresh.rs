//! Metadata refresh cycle
//!
//! One tick scrapes the status page, reduces it to a [`StreamSnapshot`],
//! compares it with the previous one and, on a song change, looks up artwork.
//! Scheduling of ticks belongs to the stream service.

use crate::artwork::{lookup_artwork, ArtworkSearch};
use crate::error::Result;
use crate::icecast::MetadataScraper;
use crate::models::{StreamQuality, StreamSnapshot, TrackArt};
use crate::station::Station;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Default delay between two ticks
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_millis(10_000);

/// Whether `current` describes another song than `previous`
///
/// Only `current_song` is compared, exactly and case-sensitively. With no
/// previous snapshot every snapshot is a change.
pub fn has_changed(previous: Option<&StreamSnapshot>, current: &StreamSnapshot) -> bool {
    match previous {
        Some(previous) => !previous.same_song(current),
        None => true,
    }
}

/// Result of one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A new song is on air
    Changed {
        snapshot: StreamSnapshot,
        art: TrackArt,
    },
    /// Same song as before
    Unchanged,
    /// The status page could not be read or understood
    Skipped,
}

/// Inputs of a tick
pub struct MetadataRefreshCycle {
    scraper: Arc<dyn MetadataScraper>,
    artwork: Option<Arc<dyn ArtworkSearch>>,
    station: Arc<dyn Station>,
    stream_uri: Url,
    delay: Duration,
    grab_album_art: bool,
}

impl MetadataRefreshCycle {
    pub fn new(
        scraper: Arc<dyn MetadataScraper>,
        station: Arc<dyn Station>,
        stream_uri: Url,
    ) -> Self {
        Self {
            scraper,
            artwork: None,
            station,
            stream_uri,
            delay: DEFAULT_REFRESH_DELAY,
            grab_album_art: true,
        }
    }

    /// Cycle over the stream of `station` at `quality`
    pub fn for_station(
        scraper: Arc<dyn MetadataScraper>,
        station: Arc<dyn Station>,
        quality: StreamQuality,
    ) -> Result<Self> {
        let stream_uri = Url::parse(station.stream_url(quality))?;
        Ok(Self::new(scraper, station, stream_uri))
    }

    /// Use `search` for artwork lookups
    pub fn with_artwork(mut self, search: Arc<dyn ArtworkSearch>) -> Self {
        self.artwork = Some(search);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Turn artwork lookups on or off
    pub fn with_grab_album_art(mut self, enabled: bool) -> Self {
        self.grab_album_art = enabled;
        self
    }

    /// Delay between two ticks
    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn stream_uri(&self) -> &Url {
        &self.stream_uri
    }

    pub fn station(&self) -> &Arc<dyn Station> {
        &self.station
    }

    /// Read the current snapshot without change detection
    pub async fn snapshot(&self) -> Result<StreamSnapshot> {
        let streams = self.scraper.scrape(&self.stream_uri).await?;
        self.station.fix_metadata(&streams, &self.stream_uri)
    }

    /// Run one refresh
    pub async fn tick(&self, previous: Option<&StreamSnapshot>) -> TickOutcome {
        let snapshot = match self.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Metadata refresh skipped for {}: {}", self.stream_uri, e);
                return TickOutcome::Skipped;
            }
        };

        if !has_changed(previous, &snapshot) {
            tracing::trace!("Still playing {:?}", snapshot.current_song);
            return TickOutcome::Unchanged;
        }

        tracing::info!(
            "Now playing on {}: {} - {}",
            self.station.name(),
            snapshot.artist,
            snapshot.current_song
        );

        let art = match (&self.artwork, self.grab_album_art) {
            (Some(search), true) => lookup_artwork(search.as_ref(), &snapshot).await,
            _ => TrackArt::Placeholder,
        };

        TickOutcome::Changed { snapshot, art }
    }
}

impl std::fmt::Debug for MetadataRefreshCycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataRefreshCycle")
            .field("station", &self.station.name())
            .field("stream_uri", &self.stream_uri.as_str())
            .field("delay", &self.delay)
            .field("grab_album_art", &self.grab_album_art)
            .field("artwork", &self.artwork.is_some())
            .finish()
    }
}
