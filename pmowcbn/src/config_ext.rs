//! WCBN settings stored in pmoconfig
//!
//! The trait [`WcbnConfigExt`] adds the player settings to
//! `pmoconfig::Config`. All keys live under `sources.wcbn`.
//!
//! # Example
//!
//! ```no_run
//! use pmoconfig::get_config;
//! use pmowcbn::WcbnConfigExt;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = get_config();
//!
//! let quality = config.get_wcbn_stream_quality()?;
//! let delay = config.get_wcbn_refresh_delay()?;
//! println!("Streaming {} quality, refreshing every {:?}", quality, delay);
//! # Ok(())
//! # }
//! ```

use crate::artwork::DEFAULT_ARTWORK_SIZE;
use crate::client::DEFAULT_PLAYLIST_URL;
use crate::models::StreamQuality;
use crate::playlist::DEFAULT_CELL_LIMIT;
use crate::refresh::DEFAULT_REFRESH_DELAY;
use anyhow::Result;
use pmoconfig::Config;
use serde_yaml::{Number, Value};
use std::time::Duration;

const SECTION: [&str; 2] = ["sources", "wcbn"];

fn key(name: &str) -> [&str; 3] {
    [SECTION[0], SECTION[1], name]
}

/// Extension trait for the WCBN settings
///
/// # Default persistence
///
/// Getters write the default value back to the configuration when the key
/// is missing or holds an unusable value.
pub trait WcbnConfigExt {
    /// Selected stream quality (default: hi)
    fn get_wcbn_stream_quality(&self) -> Result<StreamQuality>;
    fn set_wcbn_stream_quality(&self, quality: StreamQuality) -> Result<()>;

    /// Whether artwork is looked up on song change (default: true)
    fn get_wcbn_grab_album_art(&self) -> Result<bool>;
    fn set_wcbn_grab_album_art(&self, enabled: bool) -> Result<()>;

    /// Delay between two metadata refreshes (default: 10 s)
    fn get_wcbn_refresh_delay(&self) -> Result<Duration>;
    fn set_wcbn_refresh_delay(&self, delay: Duration) -> Result<()>;

    /// Cells scanned per playlist row (default: 50)
    fn get_wcbn_row_cell_limit(&self) -> Result<usize>;
    fn set_wcbn_row_cell_limit(&self, limit: usize) -> Result<()>;

    /// Playlist page URL
    fn get_wcbn_playlist_url(&self) -> Result<String>;
    fn set_wcbn_playlist_url(&self, url: &str) -> Result<()>;

    /// Edge in pixels of downloaded artwork (default: 600)
    fn get_wcbn_artwork_size(&self) -> Result<u32>;
    fn set_wcbn_artwork_size(&self, size: u32) -> Result<()>;
}

impl WcbnConfigExt for Config {
    fn get_wcbn_stream_quality(&self) -> Result<StreamQuality> {
        let parsed = match self.get_value(&key("quality")) {
            Ok(Value::String(s)) => s.parse().ok(),
            Ok(Value::Number(n)) => n.to_string().parse().ok(),
            _ => None,
        };
        match parsed {
            Some(quality) => Ok(quality),
            None => {
                self.set_wcbn_stream_quality(StreamQuality::default())?;
                Ok(StreamQuality::default())
            }
        }
    }

    fn set_wcbn_stream_quality(&self, quality: StreamQuality) -> Result<()> {
        self.set_value(&key("quality"), Value::String(quality.as_str().to_string()))
    }

    fn get_wcbn_grab_album_art(&self) -> Result<bool> {
        match self.get_value(&key("grab_album_art")) {
            Ok(Value::Bool(b)) => Ok(b),
            _ => {
                self.set_wcbn_grab_album_art(true)?;
                Ok(true)
            }
        }
    }

    fn set_wcbn_grab_album_art(&self, enabled: bool) -> Result<()> {
        self.set_value(&key("grab_album_art"), Value::Bool(enabled))
    }

    fn get_wcbn_refresh_delay(&self) -> Result<Duration> {
        match self.get_value(&key("refresh_delay_ms")) {
            Ok(Value::Number(n)) if n.as_u64().is_some_and(|ms| ms > 0) => {
                Ok(Duration::from_millis(n.as_u64().unwrap_or_default()))
            }
            _ => {
                self.set_wcbn_refresh_delay(DEFAULT_REFRESH_DELAY)?;
                Ok(DEFAULT_REFRESH_DELAY)
            }
        }
    }

    fn set_wcbn_refresh_delay(&self, delay: Duration) -> Result<()> {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.set_value(&key("refresh_delay_ms"), Value::Number(Number::from(ms)))
    }

    fn get_wcbn_row_cell_limit(&self) -> Result<usize> {
        match self.get_value(&key("row_cell_limit")) {
            Ok(Value::Number(n)) if n.as_u64().is_some() => {
                Ok(n.as_u64().unwrap_or_default() as usize)
            }
            _ => {
                self.set_wcbn_row_cell_limit(DEFAULT_CELL_LIMIT)?;
                Ok(DEFAULT_CELL_LIMIT)
            }
        }
    }

    fn set_wcbn_row_cell_limit(&self, limit: usize) -> Result<()> {
        self.set_value(&key("row_cell_limit"), Value::Number(Number::from(limit)))
    }

    fn get_wcbn_playlist_url(&self) -> Result<String> {
        match self.get_value(&key("playlist_url")) {
            Ok(Value::String(s)) if !s.trim().is_empty() => Ok(s),
            _ => {
                self.set_wcbn_playlist_url(DEFAULT_PLAYLIST_URL)?;
                Ok(DEFAULT_PLAYLIST_URL.to_string())
            }
        }
    }

    fn set_wcbn_playlist_url(&self, url: &str) -> Result<()> {
        self.set_value(&key("playlist_url"), Value::String(url.to_string()))
    }

    fn get_wcbn_artwork_size(&self) -> Result<u32> {
        let size = match self.get_value(&key("artwork_size")) {
            Ok(Value::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
            _ => None,
        };
        match size {
            Some(size) if size > 0 => Ok(size),
            _ => {
                self.set_wcbn_artwork_size(DEFAULT_ARTWORK_SIZE)?;
                Ok(DEFAULT_ARTWORK_SIZE)
            }
        }
    }

    fn set_wcbn_artwork_size(&self, size: u32) -> Result<()> {
        self.set_value(&key("artwork_size"), Value::Number(Number::from(size)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_config(dir.path().to_str().unwrap()).unwrap();
        (dir, config)
    }

    #[test]
    fn test_embedded_defaults() {
        let (_dir, config) = temp_config();
        assert_eq!(config.get_wcbn_stream_quality().unwrap(), StreamQuality::Hi);
        assert!(config.get_wcbn_grab_album_art().unwrap());
        assert_eq!(config.get_wcbn_refresh_delay().unwrap(), Duration::from_secs(10));
        assert_eq!(config.get_wcbn_row_cell_limit().unwrap(), 50);
        assert_eq!(config.get_wcbn_playlist_url().unwrap(), DEFAULT_PLAYLIST_URL);
        assert_eq!(config.get_wcbn_artwork_size().unwrap(), 600);
    }

    #[test]
    fn test_setters_round_trip() {
        let (_dir, config) = temp_config();
        config.set_wcbn_stream_quality(StreamQuality::Hd).unwrap();
        config.set_wcbn_grab_album_art(false).unwrap();
        config.set_wcbn_refresh_delay(Duration::from_millis(2500)).unwrap();
        config.set_wcbn_row_cell_limit(8).unwrap();
        config.set_wcbn_artwork_size(300).unwrap();

        assert_eq!(config.get_wcbn_stream_quality().unwrap(), StreamQuality::Hd);
        assert!(!config.get_wcbn_grab_album_art().unwrap());
        assert_eq!(config.get_wcbn_refresh_delay().unwrap(), Duration::from_millis(2500));
        assert_eq!(config.get_wcbn_row_cell_limit().unwrap(), 8);
        assert_eq!(config.get_wcbn_artwork_size().unwrap(), 300);
    }

    #[test]
    fn test_invalid_values_fall_back_and_persist() {
        let (_dir, config) = temp_config();
        config
            .set_value(&key("quality"), Value::String("ultra".into()))
            .unwrap();
        config
            .set_value(&key("refresh_delay_ms"), Value::Number(0.into()))
            .unwrap();

        assert_eq!(config.get_wcbn_stream_quality().unwrap(), StreamQuality::Hi);
        assert_eq!(
            config.get_value(&key("quality")).unwrap(),
            Value::String("hi".into())
        );
        assert_eq!(config.get_wcbn_refresh_delay().unwrap(), DEFAULT_REFRESH_DELAY);
    }

    #[test]
    fn test_numeric_quality_index() {
        let (_dir, config) = temp_config();
        config.set_value(&key("quality"), Value::Number(0.into())).unwrap();
        assert_eq!(config.get_wcbn_stream_quality().unwrap(), StreamQuality::Mid);
    }
}
