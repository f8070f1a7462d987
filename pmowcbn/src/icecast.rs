//! Icecast status page scraping
//!
//! Icecast servers publish a human-readable `status.xsl` page listing every
//! mount point with a small key/value table ("Stream Name:", "Current
//! Song:", ...). Both the 2.3 (`div.roundcont`) and 2.4 (`div.roundbox`)
//! layouts are understood.

use crate::error::{Error, Result};
use crate::models::IcecastStream;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Path of the status page relative to the server root
pub const STATUS_PAGE_PATH: &str = "/status.xsl";

/// Source of now-playing metadata for a stream URI
#[async_trait]
pub trait MetadataScraper: Send + Sync {
    /// List the streams reported by the server that hosts `stream_uri`
    async fn scrape(&self, stream_uri: &Url) -> Result<Vec<IcecastStream>>;
}

/// Build the status page URL for a stream URI
///
/// ```
/// use pmowcbn::icecast::status_url_for;
/// use url::Url;
///
/// let stream = Url::parse("http://floyd.wcbn.org:8000/wcbn-hi.mp3").unwrap();
/// assert_eq!(
///     status_url_for(&stream).as_str(),
///     "http://floyd.wcbn.org:8000/status.xsl"
/// );
/// ```
pub fn status_url_for(stream_uri: &Url) -> Url {
    let mut url = stream_uri.clone();
    url.set_path(STATUS_PAGE_PATH);
    url.set_query(None);
    url.set_fragment(None);
    url
}

/// Parse every mount point of an Icecast status page
///
/// # Errors
///
/// [`Error::NoStream`] when no mount carries any recognised field.
pub fn parse_status_page(html: &str) -> Result<Vec<IcecastStream>> {
    let document = Html::parse_document(html);
    let containers = selector("div.roundbox, div.roundcont")?;
    let heading = selector("h3")?;
    let row = selector("tr")?;
    let cell = selector("td")?;

    let mut streams: Vec<IcecastStream> = document
        .select(&containers)
        .filter_map(|container| parse_mount(container, &heading, &row, &cell))
        .collect();

    // Stripped-down custom status pages have no container divs
    if streams.is_empty() {
        streams.extend(parse_mount(document.root_element(), &heading, &row, &cell));
    }

    if streams.is_empty() {
        return Err(Error::NoStream(
            "status page lists no mount point".to_string(),
        ));
    }

    tracing::debug!("Parsed {} stream(s) from status page", streams.len());

    Ok(streams)
}

fn parse_mount(
    container: ElementRef<'_>,
    heading: &Selector,
    row: &Selector,
    cell: &Selector,
) -> Option<IcecastStream> {
    let mut stream = IcecastStream {
        mount: container
            .select(heading)
            .map(|h| element_text(&h))
            .find_map(|text| {
                text.strip_prefix("Mount Point")
                    .map(|mount| mount.trim().to_string())
            }),
        ..Default::default()
    };

    let mut has_fields = false;
    for tr in container.select(row) {
        let mut tds = tr.select(cell);
        let (Some(key), Some(value)) = (tds.next(), tds.next()) else {
            continue;
        };
        let key = element_text(&key);
        let value = element_text(&value);
        if value.is_empty() {
            continue;
        }
        has_fields |= apply_field(&mut stream, &key, value);
    }

    (has_fields || stream.mount.is_some()).then_some(stream)
}

/// Store one key/value pair; returns false for keys we don't know
fn apply_field(stream: &mut IcecastStream, key: &str, value: String) -> bool {
    let key = key.trim().trim_end_matches(':').trim().to_lowercase();
    match key.as_str() {
        "stream title" | "stream name" => stream.name = Some(value),
        "stream description" => stream.description = Some(value),
        "content type" => stream.content_type = Some(value),
        "stream genre" | "genre" => stream.genre = Some(value),
        "stream url" => stream.url = Some(value),
        "bitrate" => stream.bitrate = leading_number(&value),
        "current listeners" | "listeners (current)" | "listeners" => {
            stream.current_listeners = leading_number(&value)
        }
        "peak listeners" | "listeners (peak)" => stream.peak_listeners = leading_number(&value),
        "current song" | "currently playing" => stream.current_song = Some(value),
        _ => return false,
    }
    true
}

fn leading_number(value: &str) -> Option<u32> {
    let digits: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::scraping_error(format!("Invalid selector: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ICECAST_24: &str = r#"<html><body>
        <h2>Icecast2 Status</h2>
        <div class="roundbox">
          <div class="mounthead"><h3 class="mount">Mount Point /wcbn-hi.mp3</h3></div>
          <div class="mountcont">
            <table class="yellowkeys"><tbody>
              <tr><td>Stream Name:</td><td class="streamstats">WCBN-FM Ann Arbor</td></tr>
              <tr><td>Stream Description:</td><td class="streamstats">Freeform Radio</td></tr>
              <tr><td>Content Type:</td><td class="streamstats">audio/mpeg</td></tr>
              <tr><td>Bitrate:</td><td class="streamstats">128 kbps</td></tr>
              <tr><td>Listeners (current):</td><td class="streamstats">17</td></tr>
              <tr><td>Listeners (peak):</td><td class="streamstats">88</td></tr>
              <tr><td>Genre:</td><td class="streamstats">Freeform</td></tr>
              <tr><td>Stream URL:</td><td class="streamstats"><a href="http://wcbn.org">http://wcbn.org</a></td></tr>
              <tr><td>Currently playing:</td><td class="streamstats">Sun Ra - Space Is The Place</td></tr>
            </tbody></table>
          </div>
        </div>
        <div class="roundbox">
          <div class="mounthead"><h3 class="mount">Mount Point /wcbn-mid.mp3</h3></div>
          <div class="mountcont">
            <table class="yellowkeys"><tbody>
              <tr><td>Stream Name:</td><td class="streamstats">WCBN-FM Ann Arbor</td></tr>
              <tr><td>Currently playing:</td><td class="streamstats">Sun Ra - Space Is The Place</td></tr>
            </tbody></table>
          </div>
        </div>
      </body></html>"#;

    const ICECAST_23: &str = r#"<html><body>
        <div class="roundcont">
          <div class="roundtop"></div>
          <div class="newscontent">
            <h3>Mount Point /wcbn-hd.mp3</h3>
            <table border="0" cellpadding="4">
              <tr><td>Stream Title:</td><td class="streamdata">WCBN HD</td></tr>
              <tr><td>Stream Genre:</td><td class="streamdata">Jazz</td></tr>
              <tr><td>Current Listeners:</td><td class="streamdata">3</td></tr>
              <tr><td>Peak Listeners:</td><td class="streamdata">9</td></tr>
              <tr><td>Current Song:</td><td class="streamdata">Miles Davis - So What - Kind of Blue</td></tr>
            </table>
          </div>
        </div>
      </body></html>"#;

    #[test]
    fn test_status_url_for_strips_path_and_query() {
        let stream = Url::parse("https://example.org:8443/live/hi.mp3?token=x#frag").unwrap();
        assert_eq!(
            status_url_for(&stream).as_str(),
            "https://example.org:8443/status.xsl"
        );
    }

    #[test]
    fn test_parse_icecast_24_layout() {
        let streams = parse_status_page(ICECAST_24).unwrap();
        assert_eq!(streams.len(), 2);

        let hi = &streams[0];
        assert_eq!(hi.mount.as_deref(), Some("/wcbn-hi.mp3"));
        assert_eq!(hi.name.as_deref(), Some("WCBN-FM Ann Arbor"));
        assert_eq!(hi.description.as_deref(), Some("Freeform Radio"));
        assert_eq!(hi.content_type.as_deref(), Some("audio/mpeg"));
        assert_eq!(hi.bitrate, Some(128));
        assert_eq!(hi.current_listeners, Some(17));
        assert_eq!(hi.peak_listeners, Some(88));
        assert_eq!(hi.genre.as_deref(), Some("Freeform"));
        assert_eq!(hi.url.as_deref(), Some("http://wcbn.org"));
        assert_eq!(hi.current_song_or_default(), "Sun Ra - Space Is The Place");

        assert_eq!(streams[1].mount.as_deref(), Some("/wcbn-mid.mp3"));
        assert_eq!(streams[1].bitrate, None);
    }

    #[test]
    fn test_parse_icecast_23_layout() {
        let streams = parse_status_page(ICECAST_23).unwrap();
        assert_eq!(streams.len(), 1);

        let hd = &streams[0];
        assert_eq!(hd.mount.as_deref(), Some("/wcbn-hd.mp3"));
        assert_eq!(hd.name.as_deref(), Some("WCBN HD"));
        assert_eq!(hd.genre.as_deref(), Some("Jazz"));
        assert_eq!(hd.current_listeners, Some(3));
        assert_eq!(hd.peak_listeners, Some(9));
        assert_eq!(
            hd.current_song.as_deref(),
            Some("Miles Davis - So What - Kind of Blue")
        );
    }

    #[test]
    fn test_parse_bare_table() {
        let html = "<table><tr><td>Current Song:</td><td>A - B</td></tr></table>";
        let streams = parse_status_page(html).unwrap();
        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].mount, None);
        assert_eq!(streams[0].current_song.as_deref(), Some("A - B"));
    }

    #[test]
    fn test_page_without_streams_is_an_error() {
        let html = "<html><body><p>Server is down for maintenance</p></body></html>";
        assert!(matches!(parse_status_page(html), Err(Error::NoStream(_))));
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("128 kbps"), Some(128));
        assert_eq!(leading_number(" 7"), Some(7));
        assert_eq!(leading_number("n/a"), None);
    }
}
