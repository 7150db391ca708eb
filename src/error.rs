//! Error types for fetching listings and loading configuration.

use thiserror::Error;

/// Failure to obtain a listing from the news API.
///
/// None of these are fatal: the session records the error on the feed that
/// issued the request and the view shows it until the next filter change.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The response decoded, but not into the expected envelope shape
    #[error("invalid response format: {0}")]
    InvalidFormat(String),

    /// Transport failure or non-success HTTP status
    #[error("{}", request_failed_message(.status, .message))]
    RequestFailed {
        /// HTTP status, absent for transport errors (DNS, timeout, refused)
        status: Option<u16>,
        /// Error text from the API envelope or the transport
        message: String,
    },

    /// No search text and no category: nothing meaningful to ask for
    #[error("enter a search term or pick a category")]
    EmptyQuery,
}

fn request_failed_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("request failed with status {}: {}", code, message),
        None => format!("request failed: {}", message),
    }
}

impl FetchError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        FetchError::RequestFailed {
            status: None,
            message: err.to_string(),
        }
    }
}

/// Configuration file or value errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid base URL '{url}': {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("base URL '{0}' cannot carry a path (use http or https)")]
    OpaqueBaseUrl(String),

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}
