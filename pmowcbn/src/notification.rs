//! Now-playing notification model
//!
//! Keeps the content of a media-style notification (title, text, sub-text,
//! large icon, transport actions) in sync with the service. Delivering it to
//! an OS is left to the callback.

use crate::context::PlayerContext;
use crate::listener::StreamListener;
use crate::models::{PlaybackState, StreamSnapshot, TrackArt};
use crate::station::Station;
use std::sync::{Arc, Mutex, MutexGuard};

/// Button shown on the notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    Play,
    Pause,
    Stop,
}

/// Content of the notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlayingNotification {
    /// Song name
    pub title: String,
    /// Artist name
    pub text: String,
    /// Station description
    pub sub_text: String,
    /// Large icon; the placeholder is the station logo
    pub icon: TrackArt,
    pub playing: bool,
    /// Shown while playback is in the foreground
    pub visible: bool,
}

impl NowPlayingNotification {
    /// Actions for the current playing state
    pub fn actions(&self) -> [NotificationAction; 2] {
        if self.playing {
            [NotificationAction::Pause, NotificationAction::Stop]
        } else {
            [NotificationAction::Play, NotificationAction::Stop]
        }
    }
}

impl Default for NowPlayingNotification {
    fn default() -> Self {
        Self {
            title: String::new(),
            text: String::new(),
            sub_text: String::new(),
            icon: TrackArt::Placeholder,
            playing: false,
            visible: false,
        }
    }
}

/// Callback receiving every new notification state
pub type NotificationCallback = Arc<dyn Fn(&NowPlayingNotification) + Send + Sync>;

/// Listener maintaining a [`NowPlayingNotification`]
pub struct NotificationListener {
    station: Mutex<Option<Arc<dyn Station>>>,
    current: Mutex<NowPlayingNotification>,
    publish: NotificationCallback,
}

impl NotificationListener {
    pub fn new(publish: NotificationCallback) -> Self {
        Self {
            station: Mutex::new(None),
            current: Mutex::new(NowPlayingNotification::default()),
            publish,
        }
    }

    /// Copy of the current notification
    pub fn current(&self) -> NowPlayingNotification {
        self.lock_current().clone()
    }

    fn lock_current(&self) -> MutexGuard<'_, NowPlayingNotification> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn update(&self, f: impl FnOnce(&mut NowPlayingNotification) -> bool) {
        let published = {
            let mut current = self.lock_current();
            f(&mut current).then(|| current.clone())
        };
        if let Some(notification) = published {
            (self.publish)(&notification);
        }
    }

    fn set_text(&self, notification: &mut NowPlayingNotification, snapshot: &StreamSnapshot) {
        let station = self.station.lock().unwrap_or_else(|e| e.into_inner()).clone();
        match station {
            Some(station) => {
                notification.title = station.song_name(snapshot);
                notification.text = station.artist_name(snapshot);
                notification.sub_text = station.description(snapshot);
            }
            None => {
                notification.title = snapshot.current_song.clone();
                notification.text = snapshot.artist.clone();
                notification.sub_text = snapshot.description.clone();
            }
        }
    }
}

impl StreamListener for NotificationListener {
    fn on_attach(&self, context: &PlayerContext) {
        *self.station.lock().unwrap_or_else(|e| e.into_inner()) = Some(Arc::clone(&context.station));

        let mut current = self.lock_current();
        current.title = context.song_name();
        current.text = context.artist_name();
        current.sub_text = context.description();
        current.icon = context.art.clone();
        current.playing = context.playback == PlaybackState::Playing;
        current.visible = context.playback != PlaybackState::Stopped;
    }

    fn on_media_play(&self) {
        self.update(|n| {
            n.playing = true;
            n.visible = true;
            true
        });
    }

    fn on_media_pause(&self) {
        self.update(|n| {
            n.playing = false;
            n.visible
        });
    }

    fn on_media_stop(&self) {
        self.update(|n| {
            let was_visible = n.visible;
            n.playing = false;
            n.visible = false;
            was_visible
        });
    }

    fn on_track_updated(&self, snapshot: &StreamSnapshot, art: &TrackArt) {
        self.update(|n| {
            self.set_text(n, snapshot);
            n.icon = art.clone();
            n.visible
        });
    }
}

impl std::fmt::Debug for NotificationListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationListener")
            .field("current", &self.current())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listener() -> (Arc<NotificationListener>, Arc<Mutex<Vec<NowPlayingNotification>>>) {
        let published = Arc::new(Mutex::new(Vec::new()));
        let sink = published.clone();
        let listener = Arc::new(NotificationListener::new(Arc::new(move |n: &NowPlayingNotification| {
            sink.lock().unwrap().push(n.clone());
        })));
        (listener, published)
    }

    #[test]
    fn test_track_update_while_playing_is_published() {
        let (listener, published) = listener();
        listener.on_attach(&PlayerContext::default());
        listener.on_media_play();

        let mut snapshot = StreamSnapshot::new("so what", "miles davis", "");
        snapshot.description = "Jazz".into();
        listener.on_track_updated(&snapshot, &TrackArt::Placeholder);

        let published = published.lock().unwrap();
        assert_eq!(published.len(), 2);
        let last = &published[1];
        assert_eq!(last.title, "So What");
        assert_eq!(last.text, "Miles Davis");
        assert_eq!(last.sub_text, "Jazz");
        assert!(last.playing);
        assert_eq!(last.actions(), [NotificationAction::Pause, NotificationAction::Stop]);
    }

    #[test]
    fn test_track_update_while_stopped_is_not_published() {
        let (listener, published) = listener();
        listener.on_attach(&PlayerContext::default());
        listener.on_track_updated(&StreamSnapshot::new("Song", "Artist", ""), &TrackArt::Placeholder);

        assert!(published.lock().unwrap().is_empty());
        assert_eq!(listener.current().title, "Song");
    }

    #[test]
    fn test_pause_and_stop() {
        let (listener, published) = listener();
        listener.on_attach(&PlayerContext::default());
        listener.on_media_play();
        listener.on_media_pause();
        assert_eq!(
            listener.current().actions(),
            [NotificationAction::Play, NotificationAction::Stop]
        );

        listener.on_media_stop();
        listener.on_media_stop();

        let published = published.lock().unwrap();
        assert_eq!(published.len(), 3);
        assert!(!published[2].visible);
    }
}
