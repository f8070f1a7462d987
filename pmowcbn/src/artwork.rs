//! Album artwork lookup
//!
//! Artwork comes from the iTunes Search API. A lookup runs a fallback chain
//! of queries (song as a track, song as an album, then the album name) and
//! the first hit wins. When nothing is found the station logo placeholder is
//! used.

use crate::error::{Error, Result};
use crate::models::{ArtKind, Artwork, StreamSnapshot, TrackArt};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Default iTunes Search API host
pub const DEFAULT_ITUNES_URL: &str = "https://itunes.apple.com";

/// Default edge of the downloaded square image, in pixels
pub const DEFAULT_ARTWORK_SIZE: u32 = 600;

/// Size token of the thumbnails returned by the search
const THUMBNAIL_SIZE: &str = "100x100";

/// Something able to find a cover image for a search term
#[async_trait]
pub trait ArtworkSearch: Send + Sync {
    /// Look up `term` as `kind`; `Ok(None)` when nothing matches
    async fn query(&self, term: &str, kind: ArtKind) -> Result<Option<Artwork>>;
}

// ============================================================================
// iTunes Search API
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    result_count: usize,
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    #[serde(rename = "artworkUrl100")]
    artwork_url100: Option<String>,
}

/// iTunes Search API client
#[derive(Debug, Clone)]
pub struct ItunesClient {
    client: Client,
    base_url: String,
    artwork_size: u32,
}

impl ItunesClient {
    /// Create a client with default settings
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn builder() -> ItunesClientBuilder {
        ItunesClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn artwork_size(&self) -> u32 {
        self.artwork_size
    }

    /// URL of the first artwork thumbnail matching `term`
    pub async fn search_artwork_url(&self, term: &str, kind: ArtKind) -> Result<Option<String>> {
        let mut url = Url::parse(&format!("{}/search", self.base_url))?;
        url.query_pairs_mut()
            .append_pair("term", term)
            .append_pair("media", "music")
            .append_pair("entity", kind.entity())
            .append_pair("limit", "1");

        tracing::debug!("iTunes search: {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::ApiError(format!(
                "iTunes search returned status: {}",
                response.status()
            )));
        }

        // The service answers with text/javascript, so decode the body by hand
        let body = response.text().await?;
        let search: SearchResponse = serde_json::from_str(&body)?;

        if search.result_count == 0 {
            return Ok(None);
        }

        Ok(search
            .results
            .into_iter()
            .find_map(|r| r.artwork_url100)
            .map(|thumb| upscale_artwork_url(&thumb, self.artwork_size)))
    }

    /// Download an image
    pub async fn download(&self, url: &str) -> Result<Artwork> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::ApiError(format!(
                "Artwork download returned status: {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
        let bytes = response.bytes().await?.to_vec();

        Ok(Artwork {
            url: url.to_string(),
            content_type,
            bytes,
        })
    }
}

#[async_trait]
impl ArtworkSearch for ItunesClient {
    async fn query(&self, term: &str, kind: ArtKind) -> Result<Option<Artwork>> {
        match self.search_artwork_url(term, kind).await? {
            Some(url) => Ok(Some(self.download(&url).await?)),
            None => Ok(None),
        }
    }
}

/// Builder for configuring an ItunesClient
#[derive(Debug)]
pub struct ItunesClientBuilder {
    client: Option<Client>,
    base_url: String,
    artwork_size: u32,
    timeout: Duration,
}

impl Default for ItunesClientBuilder {
    fn default() -> Self {
        Self {
            client: None,
            base_url: DEFAULT_ITUNES_URL.to_string(),
            artwork_size: DEFAULT_ARTWORK_SIZE,
            timeout: Duration::from_secs(crate::client::DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl ItunesClientBuilder {
    /// Share an existing HTTP client
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the edge of the requested image
    pub fn artwork_size(mut self, size: u32) -> Self {
        self.artwork_size = size;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ItunesClient> {
        let client = match self.client {
            Some(client) => client,
            None => crate::client::http_client(
                crate::client::DEFAULT_USER_AGENT,
                self.timeout,
                None,
            )?,
        };

        Ok(ItunesClient {
            client,
            base_url: self.base_url,
            artwork_size: self.artwork_size,
        })
    }
}

/// Replace the thumbnail size token with `size`x`size`
///
/// ```
/// use pmowcbn::artwork::upscale_artwork_url;
///
/// assert_eq!(
///     upscale_artwork_url("https://is1.example/a/100x100bb.jpg", 600),
///     "https://is1.example/a/600x600bb.jpg"
/// );
/// ```
pub fn upscale_artwork_url(url: &str, size: u32) -> String {
    url.replace(THUMBNAIL_SIZE, &format!("{}x{}", size, size))
}

// ============================================================================
// Fallback chain
// ============================================================================

/// Queries tried for a snapshot, in order
pub fn art_queries(snapshot: &StreamSnapshot) -> Vec<(String, ArtKind)> {
    let song_and_artist = format!("{} {}", snapshot.current_song, snapshot.artist);
    vec![
        (song_and_artist.clone(), ArtKind::Song),
        (song_and_artist, ArtKind::Album),
        (snapshot.album.clone(), ArtKind::Album),
    ]
}

/// Run the fallback chain and return the first artwork found
///
/// Blank terms are not sent. A failed query is logged and the chain goes on.
///
/// ```rust
/// use async_trait::async_trait;
/// use pmowcbn::{lookup_artwork, ArtKind, ArtworkSearch, Artwork, StreamSnapshot};
///
/// struct AlbumsOnly;
///
/// #[async_trait]
/// impl ArtworkSearch for AlbumsOnly {
///     async fn query(&self, term: &str, kind: ArtKind) -> pmowcbn::Result<Option<Artwork>> {
///         Ok((kind == ArtKind::Album && term == "Kind of Blue").then(|| Artwork {
///             url: "https://covers.example/kob.jpg".to_string(),
///             content_type: Some("image/jpeg".to_string()),
///             bytes: Vec::new(),
///         }))
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let snapshot = StreamSnapshot::new("So What", "Miles Davis", "Kind of Blue");
/// let art = lookup_artwork(&AlbumsOnly, &snapshot).await;
/// assert_eq!(art.artwork().unwrap().url, "https://covers.example/kob.jpg");
/// # });
/// ```
pub async fn lookup_artwork(search: &dyn ArtworkSearch, snapshot: &StreamSnapshot) -> TrackArt {
    for (term, kind) in art_queries(snapshot) {
        let term = term.trim();
        if term.is_empty() {
            continue;
        }

        match search.query(term, kind).await {
            Ok(Some(artwork)) => {
                tracing::debug!("Artwork found for {:?} as {:?}: {}", term, kind, artwork.url);
                return TrackArt::Found(artwork);
            }
            Ok(None) => tracing::debug!("No artwork for {:?} as {:?}", term, kind),
            Err(e) => tracing::warn!("Artwork lookup for {:?} failed: {}", term, e),
        }
    }

    TrackArt::Placeholder
}
