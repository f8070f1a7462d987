//! Station definitions
//!
//! A [`Station`] knows its stream URLs, how to reduce the mounts listed on its
//! Icecast status page to one [`StreamSnapshot`], and how to present a
//! snapshot to the user.

use crate::error::{Error, Result};
use crate::models::{capitalize_title, IcecastStream, StreamQuality, StreamSnapshot};
use std::fmt;
use url::Url;

/// A radio station served by Icecast
pub trait Station: Send + Sync + fmt::Debug {
    /// Display name
    fn name(&self) -> &str;

    /// Audio stream URL for a quality variant
    fn stream_url(&self, quality: StreamQuality) -> &str;

    /// Reduce the mounts of the status page to the now-playing snapshot of
    /// the stream at `stream_uri`
    fn fix_metadata(&self, streams: &[IcecastStream], stream_uri: &Url) -> Result<StreamSnapshot>;

    /// Song line shown to the user
    fn song_name(&self, snapshot: &StreamSnapshot) -> String;

    /// Artist line shown to the user
    fn artist_name(&self, snapshot: &StreamSnapshot) -> String;

    /// Secondary line shown to the user
    fn description(&self, snapshot: &StreamSnapshot) -> String;
}

/// WCBN 88.3 FM, Ann Arbor
pub const WCBN_NAME: &str = "WCBN 88.3 FM";

pub const WCBN_STREAM_MID: &str = "http://floyd.wcbn.org:8000/wcbn-mid.mp3";
pub const WCBN_STREAM_HI: &str = "http://floyd.wcbn.org:8000/wcbn-hi.mp3";
pub const WCBN_STREAM_HD: &str = "http://floyd.wcbn.org:8000/wcbn-hd.mp3";

/// Separator used by the station's automation in "Current Song"
const SONG_SEPARATOR: &str = " - ";

/// The WCBN station
///
/// WCBN publishes "Current Song" as `Artist - Title`, optionally followed by
/// ` - Album`.
#[derive(Debug, Clone, Default)]
pub struct WcbnStation;

impl WcbnStation {
    pub fn new() -> Self {
        Self
    }
}

impl Station for WcbnStation {
    fn name(&self) -> &str {
        WCBN_NAME
    }

    fn stream_url(&self, quality: StreamQuality) -> &str {
        match quality {
            StreamQuality::Mid => WCBN_STREAM_MID,
            StreamQuality::Hi => WCBN_STREAM_HI,
            StreamQuality::Hd => WCBN_STREAM_HD,
        }
    }

    fn fix_metadata(&self, streams: &[IcecastStream], stream_uri: &Url) -> Result<StreamSnapshot> {
        let stream = select_stream(streams, stream_uri)
            .ok_or_else(|| Error::NoStream(stream_uri.to_string()))?;

        let (artist, title, album) = split_current_song(stream.current_song_or_default());

        Ok(StreamSnapshot {
            current_song: title,
            artist,
            album,
            description: stream.description.clone().unwrap_or_default(),
            genre: stream.genre.clone().unwrap_or_default(),
            listeners: stream.current_listeners,
        })
    }

    fn song_name(&self, snapshot: &StreamSnapshot) -> String {
        if snapshot.current_song.is_empty() {
            self.name().to_string()
        } else {
            capitalize_title(&snapshot.current_song)
        }
    }

    fn artist_name(&self, snapshot: &StreamSnapshot) -> String {
        capitalize_title(&snapshot.artist)
    }

    fn description(&self, snapshot: &StreamSnapshot) -> String {
        if !snapshot.album.is_empty() {
            capitalize_title(&snapshot.album)
        } else {
            snapshot.description.clone()
        }
    }
}

/// Pick the mount matching the stream path, else the first one with a song
fn select_stream<'a>(streams: &'a [IcecastStream], stream_uri: &Url) -> Option<&'a IcecastStream> {
    let path = stream_uri.path();
    streams
        .iter()
        .find(|s| s.mount.as_deref() == Some(path))
        .or_else(|| streams.iter().find(|s| s.current_song.is_some()))
        .or_else(|| streams.first())
}

/// Split `Artist - Title[ - Album]` into (artist, title, album)
///
/// A value without separator is taken as the title alone.
pub fn split_current_song(raw: &str) -> (String, String, String) {
    let parts: Vec<&str> = raw.trim().splitn(3, SONG_SEPARATOR).map(str::trim).collect();
    match parts.as_slice() {
        [title] => (String::new(), title.to_string(), String::new()),
        [artist, title] => (artist.to_string(), title.to_string(), String::new()),
        [artist, title, album] => (artist.to_string(), title.to_string(), album.to_string()),
        _ => Default::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mount(path: &str, song: Option<&str>) -> IcecastStream {
        IcecastStream {
            mount: Some(path.to_string()),
            current_song: song.map(str::to_string),
            description: Some(format!("desc {}", path)),
            current_listeners: Some(4),
            ..Default::default()
        }
    }

    #[test]
    fn test_split_current_song() {
        assert_eq!(
            split_current_song("Sun Ra - Space Is The Place"),
            ("Sun Ra".into(), "Space Is The Place".into(), String::new())
        );
        assert_eq!(
            split_current_song("Miles Davis - So What - Kind of Blue"),
            ("Miles Davis".into(), "So What".into(), "Kind of Blue".into())
        );
        assert_eq!(
            split_current_song("A - B - C - D"),
            ("A".into(), "B".into(), "C - D".into())
        );
        assert_eq!(
            split_current_song("Station ID"),
            (String::new(), "Station ID".into(), String::new())
        );
        assert_eq!(split_current_song(""), Default::default());
    }

    #[test]
    fn test_fix_metadata_prefers_matching_mount() {
        let streams = vec![
            mount("/wcbn-mid.mp3", Some("X - Wrong")),
            mount("/wcbn-hi.mp3", Some("Sun Ra - Space Is The Place")),
        ];
        let uri = Url::parse(WCBN_STREAM_HI).unwrap();

        let snapshot = WcbnStation::new().fix_metadata(&streams, &uri).unwrap();
        assert_eq!(snapshot.current_song, "Space Is The Place");
        assert_eq!(snapshot.artist, "Sun Ra");
        assert_eq!(snapshot.album, "");
        assert_eq!(snapshot.description, "desc /wcbn-hi.mp3");
        assert_eq!(snapshot.listeners, Some(4));
    }

    #[test]
    fn test_fix_metadata_falls_back_to_stream_with_song() {
        let streams = vec![
            mount("/other.ogg", None),
            mount("/wcbn-mid.mp3", Some("A - B")),
        ];
        let uri = Url::parse(WCBN_STREAM_HD).unwrap();

        let snapshot = WcbnStation::new().fix_metadata(&streams, &uri).unwrap();
        assert_eq!(snapshot.current_song, "B");
    }

    #[test]
    fn test_fix_metadata_without_streams() {
        let uri = Url::parse(WCBN_STREAM_HI).unwrap();
        assert!(matches!(
            WcbnStation::new().fix_metadata(&[], &uri),
            Err(Error::NoStream(_))
        ));
    }

    #[test]
    fn test_display_lines() {
        let station = WcbnStation::new();
        let mut snapshot = StreamSnapshot::new("space is the place", "sun ra", "");
        snapshot.description = "Freeform".into();

        assert_eq!(station.song_name(&snapshot), "Space Is The Place");
        assert_eq!(station.artist_name(&snapshot), "Sun Ra");
        assert_eq!(station.description(&snapshot), "Freeform");

        snapshot.album = "space is the place".into();
        assert_eq!(station.description(&snapshot), "Space Is The Place");

        assert_eq!(station.song_name(&StreamSnapshot::default()), WCBN_NAME);
    }

    #[test]
    fn test_stream_urls() {
        let station = WcbnStation::new();
        assert_eq!(station.stream_url(StreamQuality::Mid), WCBN_STREAM_MID);
        assert_eq!(station.stream_url(StreamQuality::Hi), WCBN_STREAM_HI);
        assert_eq!(station.stream_url(StreamQuality::Hd), WCBN_STREAM_HD);
    }
}
