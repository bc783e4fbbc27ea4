use thiserror::Error;

/// Why a single feed request failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("failed to read body: {0}")]
    Body(String),

    #[error("relay returned no contents")]
    EmptyRelay,
}

#[derive(Error, Debug)]
pub enum NewsError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Network errors
    #[error("Transport failed for {url}: {kind}")]
    Transport { url: String, kind: TransportFailure },

    #[error("Feed task for {source_name} failed: {reason}")]
    Task { source_name: String, reason: String },

    // Parsing errors
    #[error("OPML parsing failed: {0}")]
    OpmlParse(String),

    // Storage errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NewsError {
    pub fn transport(url: impl Into<String>, kind: TransportFailure) -> Self {
        NewsError::Transport {
            url: url.into(),
            kind,
        }
    }
}

pub type NewsResult<T> = Result<T, NewsError>;
