//! HTTP response types

use std::io::{Cursor, Read};
use std::mem;

use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::encoding::{read_decoded, ContentEncoding};
use crate::error::HttpError;

/// HTTP Response type - generic over the body type R and error type E
/// This is the primary return type for all HTTP operations
pub type Response<R, E = HttpError> = Result<R, E>;

/// Response as returned by a [`Transport`](crate::Transport)
///
/// The body is an unread stream; nothing is pulled from the network until an
/// [`HttpResponse`] body accessor asks for it.
pub struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Box<dyn Read + Send>,
}

impl std::fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

impl RawResponse {
    /// Create a raw response around a body stream
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Read + Send + 'static) -> Self {
        Self {
            status,
            headers,
            body: Box::new(body),
        }
    }

    /// Create a raw response from an in-memory body
    pub fn from_bytes(status: StatusCode, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        Self::new(status, headers, Cursor::new(body.into()))
    }

    /// Get the HTTP status code
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get the response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

enum BodyState {
    Unread(Box<dyn Read + Send>),
    Cached(Vec<u8>),
    Consumed,
}

/// Snapshot of one HTTP response
///
/// Status and headers are fixed at construction. The body is read, decoded
/// according to `Content-Encoding`, and cached on first access; every later
/// access is served from the cache.
pub struct HttpResponse {
    status: StatusCode,
    status_text: String,
    headers: HeaderMap,
    encodings: Vec<ContentEncoding>,
    body: BodyState,
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let body = match &self.body {
            BodyState::Unread(_) => "unread",
            BodyState::Cached(_) => "cached",
            BodyState::Consumed => "consumed",
        };
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("encodings", &self.encodings)
            .field("body", &body)
            .finish()
    }
}

impl From<RawResponse> for HttpResponse {
    fn from(raw: RawResponse) -> Self {
        let status_text = match raw.status.canonical_reason() {
            Some(reason) => format!("{} {}", raw.status.as_u16(), reason),
            None => raw.status.as_u16().to_string(),
        };
        Self {
            status: raw.status,
            status_text,
            encodings: ContentEncoding::from_headers(&raw.headers),
            headers: raw.headers,
            body: BodyState::Unread(raw.body),
        }
    }
}

impl HttpResponse {
    /// Get the HTTP status code
    pub fn status(&self) -> u16 {
        self.status.as_u16()
    }

    /// Get the HTTP status code as a [`StatusCode`]
    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Status line text, e.g. `"200 OK"`; just the code when it has no
    /// canonical reason phrase
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Get the response headers
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a header value, `None` if absent or not visible ASCII
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Outermost encoding declared by `Content-Encoding`, `Identity` if none
    pub fn content_encoding(&self) -> &ContentEncoding {
        static IDENTITY: ContentEncoding = ContentEncoding::Identity;
        self.encodings.last().unwrap_or(&IDENTITY)
    }

    /// Every non-identity encoding declared by `Content-Encoding`, in the
    /// order the server applied them
    pub fn content_encodings(&self) -> &[ContentEncoding] {
        &self.encodings
    }

    /// Check if the response status is a success (2xx)
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Check if the response status is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// Check if the response status is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Whether the body has already been read into the cache
    pub fn is_body_cached(&self) -> bool {
        matches!(self.body, BodyState::Cached(_))
    }

    fn load_body(&mut self) -> Response<()> {
        match mem::replace(&mut self.body, BodyState::Consumed) {
            BodyState::Unread(reader) => {
                let decoded = read_decoded(&self.encodings, reader)?;
                trace!("Cached {} byte response body", decoded.len());
                self.body = BodyState::Cached(decoded);
            }
            BodyState::Cached(bytes) => {
                trace!("Serving cached response body");
                self.body = BodyState::Cached(bytes);
            }
            BodyState::Consumed => {}
        }
        Ok(())
    }

    /// Get the decoded response body as bytes
    pub fn bytes(&mut self) -> Response<&[u8]> {
        self.load_body()?;
        match &self.body {
            BodyState::Cached(bytes) => Ok(bytes),
            _ => Err(HttpError::BodyConsumed),
        }
    }

    /// Get the decoded response body as UTF-8 text
    pub fn text(&mut self) -> Response<&str> {
        let bytes = self.bytes()?;
        std::str::from_utf8(bytes).map_err(|e| HttpError::Serialization(e.to_string()))
    }

    /// Decode the response body as JSON
    ///
    /// Fails with [`HttpError::EmptyBody`] when there is no content to decode.
    pub fn json<T: DeserializeOwned>(&mut self) -> Response<T> {
        let bytes = self.bytes()?;
        if bytes.is_empty() {
            return Err(HttpError::EmptyBody);
        }
        serde_json::from_slice(bytes).map_err(HttpError::from)
    }

    /// Consume the response and return the decoded body
    pub fn into_bytes(mut self) -> Response<Vec<u8>> {
        self.load_body()?;
        match self.body {
            BodyState::Cached(bytes) => Ok(bytes),
            _ => Err(HttpError::BodyConsumed),
        }
    }

    /// Turn a non-2xx response into [`HttpError::Status`] carrying the body text
    pub fn error_for_status(mut self) -> Response<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let message = self.text().map(str::to_owned).unwrap_or_default();
        Err(HttpError::Status {
            status: self.status(),
            message,
        })
    }
}
