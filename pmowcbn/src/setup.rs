//! Wiring of clients and service from the configuration
//!
//! # Example
//!
//! ```no_run
//! use pmoconfig::get_config;
//! use pmowcbn::PlayerSetup;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let setup = PlayerSetup::from_config(get_config()).await?;
//!     let (handle, join) = setup.spawn_service()?;
//!
//!     handle.play().await?;
//!     tokio::signal::ctrl_c().await?;
//!     handle.shutdown().await?;
//!     join.await?;
//!     Ok(())
//! }
//! ```

use crate::artwork::ItunesClient;
use crate::client::WcbnClient;
use crate::config_ext::WcbnConfigExt;
use crate::error::Result;
use crate::models::StreamQuality;
use crate::refresh::MetadataRefreshCycle;
use crate::service::{ServiceHandle, StreamService};
use crate::station::{Station, WcbnStation};
use pmoconfig::Config;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Clients and settings read from the configuration
#[derive(Clone)]
pub struct PlayerSetup {
    config: Arc<Config>,
    station: Arc<dyn Station>,
    client: WcbnClient,
    itunes: ItunesClient,
    quality: StreamQuality,
    refresh_delay: Duration,
    grab_album_art: bool,
}

impl PlayerSetup {
    /// Build the WCBN clients from `config`
    ///
    /// Reads `host.http.timeout_secs` and every `sources.wcbn` key; missing
    /// keys are written back with their defaults.
    pub async fn from_config(config: Arc<Config>) -> Result<Self> {
        let timeout = Duration::from_secs(config.get_http_timeout_secs()?);

        let client = WcbnClient::builder()
            .timeout(timeout)
            .playlist_url(config.get_wcbn_playlist_url()?)
            .cell_limit(config.get_wcbn_row_cell_limit()?)
            .build()
            .await?;

        let itunes = ItunesClient::builder()
            .client(client.http_client().clone())
            .artwork_size(config.get_wcbn_artwork_size()?)
            .build()?;

        Ok(Self {
            station: Arc::new(WcbnStation::new()),
            client,
            itunes,
            quality: config.get_wcbn_stream_quality()?,
            refresh_delay: config.get_wcbn_refresh_delay()?,
            grab_album_art: config.get_wcbn_grab_album_art()?,
            config,
        })
    }

    /// Override the configured stream quality
    pub fn with_quality(mut self, quality: StreamQuality) -> Self {
        self.quality = quality;
        self
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn station(&self) -> &Arc<dyn Station> {
        &self.station
    }

    pub fn client(&self) -> &WcbnClient {
        &self.client
    }

    pub fn quality(&self) -> StreamQuality {
        self.quality
    }

    /// Refresh cycle for the configured stream
    pub fn cycle(&self) -> Result<MetadataRefreshCycle> {
        Ok(MetadataRefreshCycle::for_station(
            Arc::new(self.client.clone()),
            Arc::clone(&self.station),
            self.quality,
        )?
        .with_artwork(Arc::new(self.itunes.clone()))
        .with_delay(self.refresh_delay)
        .with_grab_album_art(self.grab_album_art))
    }

    /// Start the stream service
    pub fn spawn_service(&self) -> Result<(ServiceHandle, JoinHandle<()>)> {
        Ok(StreamService::spawn(self.cycle()?, self.quality))
    }
}

impl std::fmt::Debug for PlayerSetup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerSetup")
            .field("config_dir", &self.config.directory())
            .field("station", &self.station.name())
            .field("quality", &self.quality)
            .field("refresh_delay", &self.refresh_delay)
            .field("grab_album_art", &self.grab_album_art)
            .finish()
    }
}
