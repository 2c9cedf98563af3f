//! HTTP request types

use http::header::{HeaderName, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::client::HttpClient;
use crate::error::HttpError;
use crate::response::{HttpResponse, Response};

/// A fully prepared request, as handed to a [`Transport`](crate::Transport)
///
/// The body has already been compressed when the client's
/// [`CompressionPolicy`](crate::CompressionPolicy) asked for it, and the
/// headers include `Content-Encoding` in that case.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Target URL
    pub url: Url,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body; `None` for requests that carry no body (GET, DELETE)
    pub body: Option<Vec<u8>>,
}

/// HTTP request builder for requests that need custom headers or bodies
///
/// Errors from header or body construction are held until [`send`](Self::send).
#[derive(Debug)]
pub struct RequestBuilder {
    client: HttpClient,
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    error: Option<HttpError>,
}

impl RequestBuilder {
    pub(crate) fn new(client: HttpClient, method: Method, url: &str) -> Self {
        Self {
            client,
            method,
            url: url.to_string(),
            headers: HeaderMap::new(),
            body: None,
            error: None,
        }
    }

    /// Add a header to the request
    pub fn header(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if self.error.is_some() {
            return self;
        }
        let name = match HeaderName::from_bytes(key.as_ref().as_bytes()) {
            Ok(name) => name,
            Err(e) => {
                self.error = Some(e.into());
                return self;
            }
        };
        match HeaderValue::from_str(value.as_ref()) {
            Ok(value) => {
                self.headers.append(name, value);
            }
            Err(e) => self.error = Some(e.into()),
        }
        self
    }

    /// Set the raw request body
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the request body as JSON
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_json::to_vec(body) {
            Ok(bytes) => {
                self.headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                self.body = Some(bytes);
            }
            Err(e) => self.error = Some(e.into()),
        }
        self
    }

    /// Set the request body as form data
    pub fn form<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_urlencoded::to_string(body) {
            Ok(form) => {
                self.headers.insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("application/x-www-form-urlencoded"),
                );
                self.body = Some(form.into_bytes());
            }
            Err(e) => self.error = Some(e.into()),
        }
        self
    }

    /// Send the request and return the response, whatever its status
    /// (unless the client uses [`StatusPolicy::ErrorForStatus`](crate::StatusPolicy))
    pub fn send(self) -> Response<HttpResponse> {
        if let Some(err) = self.error {
            return Err(err);
        }
        self.client
            .execute(self.method, &self.url, self.headers, self.body)
    }

    /// Send the request and deserialize a 2xx response as JSON
    pub fn send_json<R: DeserializeOwned>(self) -> Response<R> {
        self.send()?.error_for_status()?.json()
    }
}
