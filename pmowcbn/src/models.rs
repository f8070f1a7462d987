//! Data models for WCBN metadata
//!
//! Playlist rows scraped from the station's playlist page, stream snapshots
//! reduced from the Icecast status page, and downloaded artwork.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Playlist
// ============================================================================

/// One entry of the station playlist
///
/// Always carries five logical fields, even when the source row had fewer
/// physical cells because a cell of a previous row spans into it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistRow {
    /// Air time as printed on the page (e.g. "12:00 AM")
    pub time: String,
    pub artist: String,
    pub title: String,
    pub album: String,
    /// Record label
    pub label: String,
}

impl PlaylistRow {
    /// Artist name in title case
    pub fn display_artist(&self) -> String {
        capitalize_title(&self.artist)
    }

    /// Song title in title case
    pub fn display_title(&self) -> String {
        capitalize_title(&self.title)
    }

    /// Album name in title case
    pub fn display_album(&self) -> String {
        capitalize_title(&self.album)
    }
}

/// Capitalize the first letter of every word, lowercasing the rest
///
/// DJs type playlists in every possible case; this gives them a uniform look.
///
/// ```
/// use pmowcbn::capitalize_title;
///
/// assert_eq!(capitalize_title("the VELVET underground"), "The Velvet Underground");
/// ```
pub fn capitalize_title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
        } else if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

// ============================================================================
// Icecast status page
// ============================================================================

/// One mount point listed on an Icecast status page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcecastStream {
    /// Mount point path (e.g. "/wcbn-hi.mp3")
    pub mount: Option<String>,
    /// "Stream Name" / "Stream Title"
    pub name: Option<String>,
    pub description: Option<String>,
    pub content_type: Option<String>,
    pub genre: Option<String>,
    /// "Stream URL" (the station homepage, not the audio URL)
    pub url: Option<String>,
    /// Bitrate in kbps
    pub bitrate: Option<u32>,
    pub current_listeners: Option<u32>,
    pub peak_listeners: Option<u32>,
    /// Raw "Current Song" value
    pub current_song: Option<String>,
}

impl IcecastStream {
    /// Get the current song or an empty string
    pub fn current_song_or_default(&self) -> &str {
        self.current_song.as_deref().unwrap_or("")
    }
}

// ============================================================================
// Stream snapshot
// ============================================================================

/// The station's now-playing metadata at one point in time
///
/// Two snapshots describe the same song when their `current_song` fields are
/// equal; the other fields do not take part in that comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSnapshot {
    /// Song title
    pub current_song: String,
    pub artist: String,
    pub album: String,
    /// Stream or show description
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub listeners: Option<u32>,
}

impl StreamSnapshot {
    /// Create a snapshot from the three now-playing fields
    pub fn new(
        current_song: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
    ) -> Self {
        Self {
            current_song: current_song.into(),
            artist: artist.into(),
            album: album.into(),
            ..Default::default()
        }
    }

    /// Whether this snapshot and `other` describe the same song
    pub fn same_song(&self, other: &StreamSnapshot) -> bool {
        self.current_song == other.current_song
    }
}

// ============================================================================
// Artwork
// ============================================================================

/// Search entity used for an artwork lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtKind {
    Song,
    Album,
}

impl ArtKind {
    /// Entity name understood by the search service
    pub fn entity(&self) -> &'static str {
        match self {
            ArtKind::Song => "song",
            ArtKind::Album => "album",
        }
    }
}

/// A downloaded cover image
#[derive(Clone, PartialEq, Eq)]
pub struct Artwork {
    /// Where the image was downloaded from
    pub url: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Artwork {
    /// File extension matching the content type, defaulting to "jpg"
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_deref() {
            Some("image/png") => "png",
            Some("image/webp") => "webp",
            Some("image/gif") => "gif",
            _ => "jpg",
        }
    }
}

impl fmt::Debug for Artwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artwork")
            .field("url", &self.url)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Artwork attached to the current track
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TrackArt {
    Found(Artwork),
    /// Station logo stand-in
    #[default]
    Placeholder,
}

impl TrackArt {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, TrackArt::Placeholder)
    }

    pub fn artwork(&self) -> Option<&Artwork> {
        match self {
            TrackArt::Found(art) => Some(art),
            TrackArt::Placeholder => None,
        }
    }
}

impl From<Option<Artwork>> for TrackArt {
    fn from(art: Option<Artwork>) -> Self {
        art.map(TrackArt::Found).unwrap_or(TrackArt::Placeholder)
    }
}

// ============================================================================
// Playback
// ============================================================================

/// Stream bitrate variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamQuality {
    Mid,
    #[default]
    Hi,
    Hd,
}

impl StreamQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamQuality::Mid => "mid",
            StreamQuality::Hi => "hi",
            StreamQuality::Hd => "hd",
        }
    }
}

impl FromStr for StreamQuality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Numeric values are the indices used by older settings files
        match s.trim().to_lowercase().as_str() {
            "mid" | "0" => Ok(StreamQuality::Mid),
            "hi" | "1" => Ok(StreamQuality::Hi),
            "hd" | "2" => Ok(StreamQuality::Hd),
            other => Err(Error::InvalidQuality(other.to_string())),
        }
    }
}

impl fmt::Display for StreamQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Player state as seen by listeners
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Error reported by the playback engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("media error {code} (extra {extra})")]
pub struct MediaError {
    /// Engine-specific error class
    pub code: i32,
    /// Engine-specific detail code
    pub extra: i32,
}

impl MediaError {
    pub fn new(code: i32, extra: i32) -> Self {
        Self { code, extra }
    }
}
