use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when fetching or decoding creator feeds
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to fetch feed for {creator} from {url}: {source}")]
    FetchFailed {
        creator: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to parse feed for {creator}: {source}")]
    ParseFailed {
        creator: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that can occur while loading the feed source configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read sources file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse sources file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Feed URL for {creator} must be a string")]
    NotAString { creator: String },

    #[error("Invalid feed URL for {creator}: {source}")]
    InvalidUrl {
        creator: String,
        #[source]
        source: url::ParseError,
    },

    #[error("No platform data directory available, pass one explicitly")]
    NoDataDir,
}

/// Errors produced by preference storage backends
#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("Failed to read preferences file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write preferences file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Preferences file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode preference value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors reported by a playback engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Audio output unavailable: {0}")]
    Unavailable(String),

    #[error("Playback was rejected: {0}")]
    Rejected(String),

    #[error("Audio worker has shut down")]
    Disconnected,
}

/// Errors returned by a player handle once its session is gone
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Player session has shut down")]
    Closed,
}
