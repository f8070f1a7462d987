//! Player state shared with listeners

use crate::models::{PlaybackState, StreamQuality, StreamSnapshot, TrackArt};
use crate::station::{Station, WcbnStation};
use std::sync::Arc;

/// Everything a listener needs to render the player
///
/// Owned by the stream service; listeners receive a copy on attach and
/// follow changes through their callbacks.
#[derive(Debug, Clone)]
pub struct PlayerContext {
    pub station: Arc<dyn Station>,
    pub quality: StreamQuality,
    /// Last snapshot seen, `None` before the first successful tick
    pub snapshot: Option<StreamSnapshot>,
    pub art: TrackArt,
    pub playback: PlaybackState,
}

impl PlayerContext {
    pub fn new(station: Arc<dyn Station>, quality: StreamQuality) -> Self {
        Self {
            station,
            quality,
            snapshot: None,
            art: TrackArt::Placeholder,
            playback: PlaybackState::Stopped,
        }
    }

    /// Audio URL of the selected quality
    pub fn stream_url(&self) -> &str {
        self.station.stream_url(self.quality)
    }

    /// Song line, or the station name when nothing is known yet
    pub fn song_name(&self) -> String {
        match &self.snapshot {
            Some(snapshot) => self.station.song_name(snapshot),
            None => self.station.name().to_string(),
        }
    }

    pub fn artist_name(&self) -> String {
        self.snapshot
            .as_ref()
            .map(|s| self.station.artist_name(s))
            .unwrap_or_default()
    }

    pub fn description(&self) -> String {
        self.snapshot
            .as_ref()
            .map(|s| self.station.description(s))
            .unwrap_or_default()
    }

    pub fn is_playing(&self) -> bool {
        self.playback == PlaybackState::Playing
    }
}

impl Default for PlayerContext {
    fn default() -> Self {
        Self::new(Arc::new(WcbnStation::new()), StreamQuality::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::{WCBN_NAME, WCBN_STREAM_HI};

    #[test]
    fn test_default_context() {
        let ctx = PlayerContext::default();
        assert_eq!(ctx.stream_url(), WCBN_STREAM_HI);
        assert_eq!(ctx.song_name(), WCBN_NAME);
        assert_eq!(ctx.artist_name(), "");
        assert!(ctx.art.is_placeholder());
        assert!(!ctx.is_playing());
    }

    #[test]
    fn test_display_lines_follow_snapshot() {
        let mut ctx = PlayerContext::default();
        ctx.snapshot = Some(StreamSnapshot::new("so what", "miles davis", "kind of blue"));
        assert_eq!(ctx.song_name(), "So What");
        assert_eq!(ctx.artist_name(), "Miles Davis");
        assert_eq!(ctx.description(), "Kind Of Blue");
    }
}
