//! HTTP client for the WCBN web services
//!
//! Fetches the Icecast status page of a stream (now-playing metadata) and the
//! station's HTML playlist.
//!
//! # Example
//!
//! ```no_run
//! use pmowcbn::{Station, StreamQuality, WcbnClient, WcbnStation};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WcbnClient::new().await?;
//!     let station = WcbnStation::new();
//!
//!     let snapshot = client.now_playing(&station, StreamQuality::Hi).await?;
//!     println!("{} - {}", station.artist_name(&snapshot), station.song_name(&snapshot));
//!
//!     for row in client.playlist().await? {
//!         println!("{}  {} - {}", row.time, row.display_artist(), row.display_title());
//!     }
//!
//!     Ok(())
//! }
//! ```

use crate::error::{Error, Result};
use crate::icecast::{parse_status_page, status_url_for, MetadataScraper};
use crate::models::{IcecastStream, PlaylistRow, StreamQuality, StreamSnapshot};
use crate::playlist::{PlaylistRowParser, DEFAULT_CELL_LIMIT};
use crate::station::Station;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Default playlist page
pub const DEFAULT_PLAYLIST_URL: &str = "https://app.wcbn.org/playlist";

/// Per-request timeout unless configured
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const DEFAULT_USER_AGENT: &str = "WCBNPlayer/0.1 (pmowcbn)";

/// WCBN HTTP client
///
/// Stateless: every call hits the network. Keeping the previous snapshot is
/// the job of the refresh cycle.
#[derive(Debug, Clone)]
pub struct WcbnClient {
    http: Client,
    playlist_url: String,
    timeout: Duration,
    cell_limit: usize,
}

impl WcbnClient {
    /// Client with the default playlist URL, timeout and user agent
    pub async fn new() -> Result<Self> {
        Self::builder().build().await
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Wrap an existing reqwest client, keeping every other default
    pub fn with_client(http: Client) -> Self {
        Self {
            http,
            playlist_url: DEFAULT_PLAYLIST_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            cell_limit: DEFAULT_CELL_LIMIT,
        }
    }

    pub fn playlist_url(&self) -> &str {
        &self.playlist_url
    }

    /// Underlying reqwest client, for sharing with other services
    pub fn http_client(&self) -> &Client {
        &self.http
    }

    // ========================================================================
    // Status page
    // ========================================================================

    /// Fetch and parse the Icecast status page of the server hosting `stream_uri`
    pub async fn status_page(&self, stream_uri: &Url) -> Result<Vec<IcecastStream>> {
        let url = status_url_for(stream_uri);
        let html = self.get_text(url).await?;
        parse_status_page(&html)
    }

    /// Current snapshot of a station stream, without change detection
    pub async fn now_playing(
        &self,
        station: &dyn Station,
        quality: StreamQuality,
    ) -> Result<StreamSnapshot> {
        let stream_uri = Url::parse(station.stream_url(quality))?;
        let streams = self.status_page(&stream_uri).await?;
        station.fix_metadata(&streams, &stream_uri)
    }

    // ========================================================================
    // Playlist
    // ========================================================================

    /// Fetch the playlist page and parse every row
    ///
    /// Malformed rows are kept as `Err` entries.
    pub async fn playlist_rows(&self) -> Result<Vec<Result<PlaylistRow>>> {
        let url = Url::parse(&self.playlist_url)?;
        let html = self.get_text(url).await?;
        let parser = PlaylistRowParser::new().with_cell_limit(self.cell_limit);
        Ok(parser.parse_playlist_page(&html))
    }

    /// Fetch the playlist, dropping malformed rows with a warning
    pub async fn playlist(&self) -> Result<Vec<PlaylistRow>> {
        let rows = self.playlist_rows().await?;
        let mut playlist = Vec::with_capacity(rows.len());
        for (position, row) in rows.into_iter().enumerate() {
            match row {
                Ok(row) => playlist.push(row),
                Err(e) => tracing::warn!("Skipping playlist row {}: {}", position, e),
            }
        }
        Ok(playlist)
    }

    async fn get_text(&self, url: Url) -> Result<String> {
        tracing::debug!("Fetching {}", url);

        let response = self
            .http
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| if e.is_timeout() { Error::Timeout } else { e.into() })?;

        if !response.status().is_success() {
            return Err(Error::ApiError(format!(
                "Server returned status: {}",
                response.status()
            )));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl MetadataScraper for WcbnClient {
    async fn scrape(&self, stream_uri: &Url) -> Result<Vec<IcecastStream>> {
        self.status_page(stream_uri).await
    }
}

/// Settings of a [`WcbnClient`]
#[derive(Debug)]
pub struct ClientBuilder {
    http: Option<Client>,
    playlist_url: String,
    timeout: Duration,
    user_agent: String,
    proxy: Option<String>,
    cell_limit: usize,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            http: None,
            playlist_url: DEFAULT_PLAYLIST_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
            cell_limit: DEFAULT_CELL_LIMIT,
        }
    }
}

impl ClientBuilder {
    /// Use `http` as is; user agent and proxy settings are then ignored
    pub fn client(mut self, http: Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn playlist_url(mut self, url: impl Into<String>) -> Self {
        self.playlist_url = url.into();
        self
    }

    /// Timeout applied to every request
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Route requests through `proxy` (`http://`, `https://` or `socks5://`)
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Cells scanned per playlist row
    pub fn cell_limit(mut self, cell_limit: usize) -> Self {
        self.cell_limit = cell_limit;
        self
    }

    pub async fn build(self) -> Result<WcbnClient> {
        let http = match self.http {
            Some(http) => http,
            None => http_client(&self.user_agent, self.timeout, self.proxy.as_deref())?,
        };

        Ok(WcbnClient {
            http,
            playlist_url: self.playlist_url,
            timeout: self.timeout,
            cell_limit: self.cell_limit,
        })
    }
}

/// reqwest client shared by the WCBN and iTunes clients
pub(crate) fn http_client(user_agent: &str, timeout: Duration, proxy: Option<&str>) -> Result<Client> {
    let mut builder = Client::builder().user_agent(user_agent).timeout(timeout);
    if let Some(proxy) = proxy {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| Error::other(format!("Invalid proxy {:?}: {}", proxy, e)))?;
        builder = builder.proxy(proxy);
    }
    Ok(builder.build()?)
}
