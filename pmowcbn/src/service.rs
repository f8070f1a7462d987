//! Stream service
//!
//! A single tokio task owns the [`PlayerContext`], the listener registry and
//! the refresh schedule. Everything else talks to it through a cloneable
//! [`ServiceHandle`].
//!
//! A tick does its network work in a task of its own and sends the
//! [`TickOutcome`] back to the service, so commands are answered while a
//! scrape or artwork download is pending. Ticks never overlap: the next one
//! is scheduled only once the outcome has been applied, and only while the
//! player is in the foreground (playing or paused) or a front-end asked for
//! metadata refresh.

use crate::context::PlayerContext;
use crate::error::{Error, Result};
use crate::listener::{ListenerId, ListenerRegistry, StreamListener};
use crate::models::{MediaError, PlaybackState, StreamQuality};
use crate::refresh::{MetadataRefreshCycle, TickOutcome};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration, Sleep};
use tracing::{debug, info, warn};

const COMMAND_BUFFER: usize = 32;
const OUTCOME_BUFFER: usize = 1;

/// Commands sent to the service task
enum Command {
    Play,
    Pause,
    TogglePlayPause,
    Stop,
    ReportError(MediaError),
    Attach {
        listener: Arc<dyn StreamListener>,
        reply: oneshot::Sender<ListenerId>,
    },
    Detach {
        id: ListenerId,
        reply: oneshot::Sender<bool>,
    },
    SetMetadataRefresh(bool),
    Context(oneshot::Sender<PlayerContext>),
    Shutdown,
}

/// Entry point of the service task
pub struct StreamService;

impl StreamService {
    /// Start the service for the stream of `cycle` at `quality`
    ///
    /// The task ends on [`ServiceHandle::shutdown`] or when every handle is
    /// dropped; listeners still attached are detached at that point.
    pub fn spawn(
        cycle: MetadataRefreshCycle,
        quality: StreamQuality,
    ) -> (ServiceHandle, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel(COMMAND_BUFFER);
        let (outcome_tx, mut outcome_rx) = mpsc::channel(OUTCOME_BUFFER);
        let context = PlayerContext::new(Arc::clone(cycle.station()), quality);

        let join_handle = tokio::spawn(async move {
            let mut state = ServiceState::new(Arc::new(cycle), context, outcome_tx);
            info!(station = state.context.station.name(), "Starting stream service");

            loop {
                let mut pending_command: Option<Option<Command>> = None;

                tokio::select! {
                    biased;

                    Some(outcome) = outcome_rx.recv() => {
                        state.apply_outcome(outcome);
                    }
                    _ = next_tick(&mut state.scheduled_tick) => {
                        state.scheduled_tick = None;
                        state.start_tick();
                    }
                    cmd = rx.recv() => {
                        pending_command = Some(cmd);
                    }
                }

                match pending_command {
                    Some(Some(cmd)) => state.handle_command(cmd),
                    // Every handle is gone
                    Some(None) => break,
                    None => {}
                }

                if state.shutdown {
                    break;
                }
            }

            if let Some(task) = state.tick_task.take() {
                task.abort();
            }
            state.listeners.clear();
            info!("Stream service stopped");
        });

        (ServiceHandle { tx }, join_handle)
    }
}

/// Cloneable handle to a running [`StreamService`]
///
/// Every method fails with [`Error::ServiceStopped`] once the task is gone.
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    tx: mpsc::Sender<Command>,
}

impl ServiceHandle {
    /// Start or resume playback
    pub async fn play(&self) -> Result<()> {
        self.send(Command::Play).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(Command::Pause).await
    }

    pub async fn toggle_play_pause(&self) -> Result<()> {
        self.send(Command::TogglePlayPause).await
    }

    /// Stop playback and leave the foreground
    pub async fn stop(&self) -> Result<()> {
        self.send(Command::Stop).await
    }

    /// Forward an error from the playback engine to the listeners
    pub async fn report_error(&self, error: MediaError) -> Result<()> {
        self.send(Command::ReportError(error)).await
    }

    /// Register a listener; it receives the current context right away
    pub async fn attach(&self, listener: Arc<dyn StreamListener>) -> Result<ListenerId> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Attach { listener, reply }).await?;
        rx.await.map_err(|_| Error::ServiceStopped)
    }

    /// Unregister a listener; `false` when the id is unknown
    pub async fn detach(&self, id: ListenerId) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Detach { id, reply }).await?;
        rx.await.map_err(|_| Error::ServiceStopped)
    }

    /// Keep refreshing metadata while not playing (a front-end is visible)
    pub async fn set_metadata_refresh(&self, refresh: bool) -> Result<()> {
        self.send(Command::SetMetadataRefresh(refresh)).await
    }

    /// Copy of the current player context
    pub async fn context(&self) -> Result<PlayerContext> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Context(reply)).await?;
        rx.await.map_err(|_| Error::ServiceStopped)
    }

    /// Ask the task to exit
    pub async fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(command)
            .await
            .map_err(|_| Error::ServiceStopped)
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Play => f.write_str("Play"),
            Command::Pause => f.write_str("Pause"),
            Command::TogglePlayPause => f.write_str("TogglePlayPause"),
            Command::Stop => f.write_str("Stop"),
            Command::ReportError(e) => write!(f, "ReportError({})", e),
            Command::Attach { .. } => f.write_str("Attach"),
            Command::Detach { id, .. } => write!(f, "Detach({})", id),
            Command::SetMetadataRefresh(r) => write!(f, "SetMetadataRefresh({})", r),
            Command::Context(_) => f.write_str("Context"),
            Command::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Wait for the scheduled tick, forever when none is scheduled
async fn next_tick(tick: &mut Option<Pin<Box<Sleep>>>) {
    match tick {
        Some(due) => due.as_mut().await,
        None => std::future::pending().await,
    }
}

struct ServiceState {
    cycle: Arc<MetadataRefreshCycle>,
    context: PlayerContext,
    listeners: ListenerRegistry,
    foreground: bool,
    ui_refresh: bool,
    scheduled_tick: Option<Pin<Box<Sleep>>>,
    /// Tick currently scraping; `None` between ticks
    tick_task: Option<JoinHandle<()>>,
    outcome_tx: mpsc::Sender<TickOutcome>,
    shutdown: bool,
}

impl ServiceState {
    fn new(
        cycle: Arc<MetadataRefreshCycle>,
        context: PlayerContext,
        outcome_tx: mpsc::Sender<TickOutcome>,
    ) -> Self {
        Self {
            cycle,
            context,
            listeners: ListenerRegistry::new(),
            foreground: false,
            ui_refresh: false,
            scheduled_tick: None,
            tick_task: None,
            outcome_tx,
            shutdown: false,
        }
    }

    /// Whether ticks keep being rescheduled
    fn is_active(&self) -> bool {
        self.foreground || self.ui_refresh
    }

    fn schedule_tick(&mut self, delay: Duration) {
        self.scheduled_tick = Some(Box::pin(sleep(delay)));
    }

    fn cancel_tick(&mut self) {
        self.scheduled_tick = None;
    }

    /// Run a tick in its own task; its outcome comes back on `outcome_tx`
    fn start_tick(&mut self) {
        if self.tick_task.is_some() {
            // The running tick reschedules when it reports
            debug!("Tick already in flight");
            return;
        }

        let cycle = Arc::clone(&self.cycle);
        let previous = self.context.snapshot.clone();
        let outcome_tx = self.outcome_tx.clone();

        self.tick_task = Some(tokio::spawn(async move {
            let outcome = cycle.tick(previous.as_ref()).await;
            // The service may be gone already
            let _ = outcome_tx.send(outcome).await;
        }));
    }

    fn apply_outcome(&mut self, outcome: TickOutcome) {
        self.tick_task = None;

        if let TickOutcome::Changed { snapshot, art } = outcome {
            self.listeners.notify_track_updated(&snapshot, &art);
            self.context.snapshot = Some(snapshot);
            self.context.art = art;
        }

        if self.is_active() {
            self.schedule_tick(self.cycle.delay());
        } else {
            debug!("Metadata refresh idle");
        }
    }

    fn handle_command(&mut self, command: Command) {
        debug!("Stream service command: {:?}", command);

        match command {
            Command::Play => self.play(),
            Command::Pause => self.pause(),
            Command::TogglePlayPause => {
                if self.context.is_playing() {
                    self.pause()
                } else {
                    self.play()
                }
            }
            Command::Stop => self.stop(),
            Command::ReportError(error) => {
                warn!("Playback error: {}", error);
                self.listeners.notify_media_error(&error);
            }
            Command::Attach { listener, reply } => {
                let id = self.listeners.attach(listener, &self.context);
                let _ = reply.send(id);
            }
            Command::Detach { id, reply } => {
                let _ = reply.send(self.listeners.detach(id));
            }
            Command::SetMetadataRefresh(refresh) => {
                if refresh {
                    self.schedule_tick(Duration::ZERO);
                } else if !self.foreground {
                    self.cancel_tick();
                }
                self.ui_refresh = refresh;
            }
            Command::Context(reply) => {
                let _ = reply.send(self.context.clone());
            }
            Command::Shutdown => self.shutdown = true,
        }
    }

    fn play(&mut self) {
        match self.context.playback {
            PlaybackState::Playing => return,
            PlaybackState::Stopped => {
                self.foreground = true;
                self.schedule_tick(Duration::ZERO);
            }
            PlaybackState::Paused => {}
        }
        self.context.playback = PlaybackState::Playing;
        self.listeners.notify_media_play();
    }

    fn pause(&mut self) {
        if self.context.playback != PlaybackState::Playing {
            return;
        }
        self.context.playback = PlaybackState::Paused;
        self.listeners.notify_media_pause();
    }

    fn stop(&mut self) {
        self.context.playback = PlaybackState::Stopped;
        self.foreground = false;
        if !self.ui_refresh {
            self.cancel_tick();
        }
        self.listeners.notify_media_stop();
    }
}
