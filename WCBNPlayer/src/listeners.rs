//! Terminal front-ends attached to the stream service

use pmowcbn::{PlayerContext, StreamListener, StreamSnapshot, Station, TrackArt};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// Prints the song info block on every track change
#[derive(Default)]
pub struct SongInfoPrinter {
    station: Mutex<Option<Arc<dyn Station>>>,
}

impl SongInfoPrinter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StreamListener for SongInfoPrinter {
    fn on_attach(&self, context: &PlayerContext) {
        *self.station.lock().unwrap_or_else(|e| e.into_inner()) = Some(Arc::clone(&context.station));
        println!("{} ({})", context.station.name(), context.stream_url());
    }

    fn on_media_play(&self) {
        println!("> playing");
    }

    fn on_media_pause(&self) {
        println!("|| paused");
    }

    fn on_media_stop(&self) {
        println!("[] stopped");
    }

    fn on_track_updated(&self, snapshot: &StreamSnapshot, _art: &TrackArt) {
        let station = self.station.lock().unwrap_or_else(|e| e.into_inner()).clone();
        let Some(station) = station else {
            return;
        };

        println!();
        println!("  {}", station.song_name(snapshot));
        println!("  {}", station.artist_name(snapshot));
        let description = station.description(snapshot);
        if !description.is_empty() {
            println!("  {}", description);
        }
        if let Some(listeners) = snapshot.listeners {
            println!("  {} listener(s)", listeners);
        }
    }
}

/// Writes the current artwork to `<dir>/current.<ext>`
pub struct AlbumArtSaver {
    directory: PathBuf,
}

impl AlbumArtSaver {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Remove stale images so only the current one is left
    fn clear(&self) {
        for ext in ["jpg", "png", "webp", "gif"] {
            let _ = fs::remove_file(self.directory.join(format!("current.{}", ext)));
        }
    }
}

impl StreamListener for AlbumArtSaver {
    fn on_attach(&self, context: &PlayerContext) {
        self.on_track_updated(
            context.snapshot.as_ref().unwrap_or(&StreamSnapshot::default()),
            &context.art,
        );
    }

    fn on_track_updated(&self, _snapshot: &StreamSnapshot, art: &TrackArt) {
        self.clear();
        let Some(artwork) = art.artwork() else {
            return;
        };

        let path = self.directory.join(format!("current.{}", artwork.extension()));
        match fs::write(&path, &artwork.bytes) {
            Ok(()) => info!(path = %path.display(), source = %artwork.url, "Saved album art"),
            Err(e) => warn!(path = %path.display(), "Failed to save album art: {}", e),
        }
    }
}
