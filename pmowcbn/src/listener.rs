//! Listener contract of the stream service
//!
//! Front-ends (song info display, album art display, notification) implement
//! [`StreamListener`] and register with the service. Every method has an
//! empty default so a listener only overrides what it renders.

use crate::context::PlayerContext;
use crate::models::{MediaError, StreamSnapshot, TrackArt};
use std::sync::Arc;

/// Receives player events
///
/// Called sequentially from the service task; implementations must not
/// block for long.
pub trait StreamListener: Send + Sync {
    /// Registered with the service; `context` is the current state
    fn on_attach(&self, _context: &PlayerContext) {}

    /// Removed from the service
    fn on_detach(&self) {}

    fn on_media_error(&self, _error: &MediaError) {}

    fn on_media_play(&self) {}

    fn on_media_pause(&self) {}

    fn on_media_stop(&self) {}

    /// The song changed; `art` is the artwork found or the placeholder
    fn on_track_updated(&self, snapshot: &StreamSnapshot, art: &TrackArt);
}

/// Identifier returned by [`ListenerRegistry::attach`]
pub type ListenerId = u64;

/// Ordered set of listeners
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: ListenerId,
    listeners: Vec<(ListenerId, Arc<dyn StreamListener>)>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener and hand it the current context
    pub fn attach(&mut self, listener: Arc<dyn StreamListener>, context: &PlayerContext) -> ListenerId {
        let id = self.next_id;
        self.next_id += 1;
        listener.on_attach(context);
        self.listeners.push((id, listener));
        id
    }

    /// Remove a listener; returns false when `id` is unknown
    pub fn detach(&mut self, id: ListenerId) -> bool {
        match self.listeners.iter().position(|(lid, _)| *lid == id) {
            Some(pos) => {
                let (_, listener) = self.listeners.remove(pos);
                listener.on_detach();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn notify_track_updated(&self, snapshot: &StreamSnapshot, art: &TrackArt) {
        self.each(|l| l.on_track_updated(snapshot, art));
    }

    pub fn notify_media_error(&self, error: &MediaError) {
        self.each(|l| l.on_media_error(error));
    }

    pub fn notify_media_play(&self) {
        self.each(|l| l.on_media_play());
    }

    pub fn notify_media_pause(&self) {
        self.each(|l| l.on_media_pause());
    }

    pub fn notify_media_stop(&self) {
        self.each(|l| l.on_media_stop());
    }

    /// Detach everyone, in registration order
    pub fn clear(&mut self) {
        for (_, listener) in self.listeners.drain(..) {
            listener.on_detach();
        }
    }

    fn each(&self, f: impl Fn(&dyn StreamListener)) {
        for (_, listener) in &self.listeners {
            f(listener.as_ref());
        }
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("next_id", &self.next_id)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
