//! Error types shared across the crate.
//!
//! Fetch errors never escape a fetch cycle as a panic or an `Err` from the
//! public feed operations; they are captured into
//! [`CycleOutcome::Failed`](crate::fetcher::CycleOutcome::Failed) so the
//! caller can show them.

use thiserror::Error;

/// Anything that can go wrong while retrieving one raw page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network, DNS, TLS or timeout failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// The body was not JSON or lacked `data.children[].data.{id,url}`.
    #[error("malformed listing: {0}")]
    Parse(#[from] serde_json::Error),

    /// The request URL could not be built from the current settings.
    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Errors from reading, writing or validating [`FeedSettings`](crate::settings::FeedSettings).
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings blob is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("subreddit name must not be empty")]
    EmptySubreddit,

    #[error("invalid subreddit name {0:?}: only letters, digits, '_' and '+' are allowed")]
    InvalidSubreddit(String),

    #[error("posts per page must be greater than zero")]
    ZeroPerPage,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },

    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("failed to parse {name} as boolean: {value}")]
    ParseBool { name: String, value: String },
}
