//! HTTP error types

use thiserror::Error;

/// HTTP errors that can occur while building, sending or reading requests
#[derive(Debug, Error)]
pub enum HttpError {
    /// HTTP error with status code
    #[error("HTTP error ({status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Decoded response body, empty if it could not be read
        message: String,
    },
    /// The URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),
    /// Request timeout
    #[error("Request timeout")]
    Timeout,
    /// Compressing a request body or decompressing a response body failed
    #[error("Compression error: {0}")]
    Compression(String),
    /// Reading the response body stream failed
    #[error("Body read error: {0}")]
    Body(String),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// JSON decoding was attempted on an empty body
    #[error("Body is empty")]
    EmptyBody,
    /// Body access before any response was received
    #[error("No response received")]
    NoResponse,
    /// The body stream was consumed by an earlier failed read
    #[error("Body stream already consumed")]
    BodyConsumed,
    /// Proxy error
    #[error("Proxy error: {0}")]
    Proxy(String),
    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),
    /// Client or request build error
    #[error("Client build error: {0}")]
    Build(String),
    /// Other error
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpError::Timeout
        } else if err.is_builder() {
            HttpError::Build(err.to_string())
        } else if err.is_connect() {
            HttpError::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            HttpError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            HttpError::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self {
        HttpError::Serialization(err.to_string())
    }
}

impl From<serde_urlencoded::ser::Error> for HttpError {
    fn from(err: serde_urlencoded::ser::Error) -> Self {
        HttpError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for HttpError {
    fn from(err: url::ParseError) -> Self {
        HttpError::InvalidUrl(err.to_string())
    }
}

impl From<http::header::InvalidHeaderName> for HttpError {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        HttpError::Build(err.to_string())
    }
}

impl From<http::header::InvalidHeaderValue> for HttpError {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        HttpError::Build(err.to_string())
    }
}
