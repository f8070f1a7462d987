//! Error type of the crate

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while talking to WCBN or iTunes
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The iTunes answer is not the expected JSON
    #[error("Invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Non-success HTTP status
    #[error("Server error: {0}")]
    ApiError(String),

    /// The page could not be scraped
    #[error("Scraping error: {0}")]
    ScrapingError(String),

    /// A playlist row ran out of cells before all five fields were assigned
    #[error("Malformed playlist row: no cell at index {index} ({assigned} of 5 fields assigned)")]
    MalformedRow {
        /// Index of the missing cell
        index: usize,
        /// Fields assigned before the row ran out
        assigned: usize,
    },

    /// The status page lists no usable stream
    #[error("No stream found on status page: {0}")]
    NoStream(String),

    #[error("Unknown stream quality: {0}")]
    InvalidQuality(String),

    #[error("Request timed out")]
    Timeout,

    /// Reading or writing pmoconfig settings failed
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    /// The stream service task is gone
    #[error("Stream service is not running")]
    ServiceStopped,

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    pub fn scraping_error(msg: impl Into<String>) -> Self {
        Self::ScrapingError(msg.into())
    }
}
