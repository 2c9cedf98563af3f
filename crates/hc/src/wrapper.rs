//! Stateful request wrapper
//!
//! [`RequestWrapper`] keeps the most recent response so callers can issue a
//! request and then inspect status, headers and body in separate steps:
//!
//! ```no_run
//! use hc::RequestWrapper;
//!
//! # fn main() -> Result<(), hc::HttpError> {
//! let mut wrapper = RequestWrapper::new();
//! wrapper.post("https://example.com/echo", b"hello".to_vec())?;
//! if wrapper.status() == 200 {
//!     println!("{}", wrapper.read_string()?);
//! }
//! # Ok(())
//! # }
//! ```

use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::HttpClient;
use crate::error::HttpError;
use crate::request::RequestBuilder;
use crate::response::{HttpResponse, Response};

/// HTTP client that remembers its last response
///
/// Each request replaces the stored response, and with it the cached body.
/// The previous response is dropped before the new request is sent, so a
/// failed request leaves the wrapper with no response at all.
#[derive(Debug, Default)]
pub struct RequestWrapper {
    client: HttpClient,
    last: Option<HttpResponse>,
}

impl RequestWrapper {
    /// Create a wrapper around a default [`HttpClient`]
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`HttpClient::new`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a wrapper around a configured client
    pub fn with_client(client: HttpClient) -> Self {
        Self { client, last: None }
    }

    /// The underlying stateless client
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// GET request
    pub fn get(&mut self, url: &str) -> Response<()> {
        self.send(Method::GET, url, None)
    }

    /// POST request; non-empty bodies are gzip-compressed by default
    pub fn post(&mut self, url: &str, body: impl Into<Vec<u8>>) -> Response<()> {
        self.send(Method::POST, url, Some(body.into()))
    }

    /// PUT request; non-empty bodies are gzip-compressed by default
    pub fn put(&mut self, url: &str, body: impl Into<Vec<u8>>) -> Response<()> {
        self.send(Method::PUT, url, Some(body.into()))
    }

    /// DELETE request
    pub fn delete(&mut self, url: &str) -> Response<()> {
        self.send(Method::DELETE, url, None)
    }

    /// POST with JSON body
    pub fn post_json<B: Serialize + ?Sized>(&mut self, url: &str, body: &B) -> Response<()> {
        let request = self.client.request(Method::POST, url).json(body);
        self.dispatch(request)
    }

    /// PUT with JSON body
    pub fn put_json<B: Serialize + ?Sized>(&mut self, url: &str, body: &B) -> Response<()> {
        let request = self.client.request(Method::PUT, url).json(body);
        self.dispatch(request)
    }

    /// POST with form data
    pub fn post_form<F: Serialize + ?Sized>(&mut self, url: &str, form: &F) -> Response<()> {
        let request = self.client.request(Method::POST, url).form(form);
        self.dispatch(request)
    }

    /// Send a request with any method and an optional raw body
    pub fn send(&mut self, method: Method, url: &str, body: Option<Vec<u8>>) -> Response<()> {
        let request = self.client.request(method, url);
        let request = match body {
            Some(body) => request.body(body),
            None => request,
        };
        self.dispatch(request)
    }

    fn dispatch(&mut self, request: RequestBuilder) -> Response<()> {
        self.last = None;
        self.last = Some(request.send()?);
        Ok(())
    }

    /// Status code of the last response, `0` if there is none
    pub fn status(&self) -> u16 {
        self.last.as_ref().map_or(0, HttpResponse::status)
    }

    /// Status text of the last response, e.g. `"200 OK"`; empty if there is none
    pub fn status_text(&self) -> &str {
        self.last.as_ref().map_or("", HttpResponse::status_text)
    }

    /// Headers of the last response, `None` if there is none
    pub fn header(&self) -> Option<&HeaderMap> {
        self.last.as_ref().map(HttpResponse::headers)
    }

    /// Decoded body of the last response, read and cached on first access
    pub fn read_body(&mut self) -> Response<&[u8]> {
        self.last_mut()?.bytes()
    }

    /// Decoded body of the last response as UTF-8 text
    pub fn read_string(&mut self) -> Response<&str> {
        self.last_mut()?.text()
    }

    /// Decode the body of the last response as JSON
    ///
    /// Fails with [`HttpError::NoResponse`] before any request and with
    /// [`HttpError::EmptyBody`] when the response has no content.
    pub fn read_json<T: DeserializeOwned>(&mut self) -> Response<T> {
        self.last_mut()?.json()
    }

    /// The last response, if any
    pub fn last_response(&self) -> Option<&HttpResponse> {
        self.last.as_ref()
    }

    /// Move the last response out, leaving the wrapper empty
    pub fn take_response(&mut self) -> Option<HttpResponse> {
        self.last.take()
    }

    fn last_mut(&mut self) -> Response<&mut HttpResponse> {
        self.last.as_mut().ok_or(HttpError::NoResponse)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor, Read};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use http::header::{CONTENT_ENCODING, CONTENT_TYPE};
    use http::{HeaderValue, StatusCode};
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::encoding::{decode, gzip, ContentEncoding};
    use crate::request::Request;
    use crate::response::RawResponse;
    use crate::transport::Transport;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Payload {
        name: String,
        value: i32,
    }

    /// Echoes the request body back with the request's `Content-Encoding`
    #[derive(Debug, Default)]
    struct EchoTransport {
        requests: Mutex<Vec<Request>>,
    }

    impl Transport for EchoTransport {
        fn execute(&self, request: Request) -> Response<RawResponse> {
            let mut headers = HeaderMap::new();
            if let Some(encoding) = request.headers.get(CONTENT_ENCODING) {
                headers.insert(CONTENT_ENCODING, encoding.clone());
            }
            let body = request.body.clone().unwrap_or_default();
            self.requests
                .lock()
                .expect("Lock should not be poisoned")
                .push(request);
            Ok(RawResponse::from_bytes(StatusCode::OK, headers, body))
        }
    }

    impl EchoTransport {
        fn last(&self) -> Request {
            self.requests
                .lock()
                .expect("Lock should not be poisoned")
                .last()
                .cloned()
                .expect("A request should have been sent")
        }
    }

    /// Body stream that counts bytes handed out and fails if read after EOF
    struct SingleReadBody {
        inner: Cursor<Vec<u8>>,
        served: Arc<AtomicUsize>,
        finished: bool,
    }

    impl Read for SingleReadBody {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.finished {
                return Err(io::Error::other("body read twice"));
            }
            let n = self.inner.read(buf)?;
            if n == 0 {
                self.finished = true;
            }
            self.served.fetch_add(n, Ordering::SeqCst);
            Ok(n)
        }
    }

    /// Serves one gzip-encoded JSON body through a single-read stream
    #[derive(Debug)]
    struct SingleReadTransport {
        body: Vec<u8>,
        served: Arc<AtomicUsize>,
        calls: AtomicUsize,
    }

    impl Transport for SingleReadTransport {
        fn execute(&self, _request: Request) -> Response<RawResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut headers = HeaderMap::new();
            headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
            let body = SingleReadBody {
                inner: Cursor::new(self.body.clone()),
                served: self.served.clone(),
                finished: false,
            };
            Ok(RawResponse::new(StatusCode::OK, headers, body))
        }
    }

    fn echo_wrapper() -> (RequestWrapper, Arc<EchoTransport>) {
        let transport = Arc::new(EchoTransport::default());
        let client = HttpClient::builder()
            .transport(transport.clone())
            .build()
            .expect("Client should build");
        (RequestWrapper::with_client(client), transport)
    }

    #[test]
    fn test_defaults_before_any_request() {
        let mut wrapper = RequestWrapper::new();

        assert_eq!(wrapper.status(), 0);
        assert_eq!(wrapper.status_text(), "");
        assert!(wrapper.header().is_none());
        assert!(wrapper.last_response().is_none());
        assert!(matches!(wrapper.read_body(), Err(HttpError::NoResponse)));
        assert!(matches!(wrapper.read_string(), Err(HttpError::NoResponse)));

        let result: Response<Payload> = wrapper.read_json();
        assert!(matches!(result, Err(HttpError::NoResponse)));
    }

    #[test]
    fn test_post_gzip_echo() {
        let (mut wrapper, transport) = echo_wrapper();

        wrapper
            .post("http://x/y", b"hello".to_vec())
            .expect("Request should succeed");

        assert_eq!(wrapper.status(), 200);
        assert_eq!(wrapper.status_text(), "200 OK");
        assert_eq!(
            wrapper
                .header()
                .and_then(|headers| headers.get(CONTENT_ENCODING)),
            Some(&HeaderValue::from_static("gzip"))
        );
        assert_eq!(wrapper.read_string().expect("Body should decode"), "hello");

        let sent = transport.last().body.expect("POST should carry a body");
        assert_ne!(sent, b"hello");
        assert_eq!(
            decode(&ContentEncoding::Gzip, &sent).expect("Sent body should be gzip"),
            b"hello"
        );
    }

    #[test]
    fn test_empty_post_and_put_send_plain_empty_body() {
        let (mut wrapper, transport) = echo_wrapper();

        for method in [Method::POST, Method::PUT] {
            wrapper
                .send(method.clone(), "http://x/y", Some(Vec::new()))
                .expect("Request should succeed");

            let request = transport.last();
            assert_eq!(request.method, method);
            assert!(request.headers.get(CONTENT_ENCODING).is_none());
            assert_eq!(request.body, Some(Vec::new()));
            assert!(wrapper.read_body().expect("Empty body").is_empty());
        }
    }

    #[test]
    fn test_get_and_delete_send_no_body() {
        let (mut wrapper, transport) = echo_wrapper();

        wrapper.get("http://x/y").expect("GET should succeed");
        assert_eq!(transport.last().method, Method::GET);
        assert!(transport.last().body.is_none());

        wrapper.delete("http://x/y").expect("DELETE should succeed");
        assert_eq!(transport.last().method, Method::DELETE);
        assert!(transport.last().body.is_none());
    }

    #[test]
    fn test_post_json_and_read_json() {
        let (mut wrapper, transport) = echo_wrapper();
        let payload = Payload {
            name: "test".to_string(),
            value: 42,
        };

        wrapper
            .post_json("http://x/y", &payload)
            .expect("Request should succeed");

        let request = transport.last();
        assert_eq!(
            request.headers.get(CONTENT_TYPE),
            Some(&HeaderValue::from_static("application/json"))
        );

        let echoed: Payload = wrapper.read_json().expect("Body should be JSON");
        assert_eq!(echoed, payload);
    }

    #[test]
    fn test_put_json() {
        let (mut wrapper, transport) = echo_wrapper();

        wrapper
            .put_json("http://x/y", &serde_json::json!({"ok": true}))
            .expect("Request should succeed");

        assert_eq!(transport.last().method, Method::PUT);
        let echoed: serde_json::Value = wrapper.read_json().expect("Body should be JSON");
        assert_eq!(echoed, serde_json::json!({"ok": true}));
    }

    #[test]
    fn test_read_json_is_cached() {
        let served = Arc::new(AtomicUsize::new(0));
        let body = gzip(br#"{"name": "cached", "value": 1}"#).expect("Compression should succeed");
        let body_len = body.len();
        let transport = Arc::new(SingleReadTransport {
            body,
            served: served.clone(),
            calls: AtomicUsize::new(0),
        });
        let client = HttpClient::builder()
            .transport(transport.clone())
            .build()
            .expect("Client should build");
        let mut wrapper = RequestWrapper::with_client(client);

        wrapper.get("http://x/y").expect("Request should succeed");

        let first: Payload = wrapper.read_json().expect("First decode");
        let second: Payload = wrapper.read_json().expect("Second decode");
        let text = wrapper.read_string().expect("Cached text").to_string();

        assert_eq!(first, second);
        assert_eq!(first.name, "cached");
        assert!(text.contains("cached"));
        assert_eq!(served.load(Ordering::SeqCst), body_len);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_read_json_empty_body() {
        let (mut wrapper, _transport) = echo_wrapper();

        wrapper.get("http://x/y").expect("Request should succeed");
        let result: Response<Payload> = wrapper.read_json();
        assert!(matches!(result, Err(HttpError::EmptyBody)));
    }

    #[test]
    fn test_new_request_replaces_response() {
        let (mut wrapper, _transport) = echo_wrapper();

        wrapper
            .post("http://x/y", b"first".to_vec())
            .expect("Request should succeed");
        assert_eq!(wrapper.read_string().expect("First body"), "first");

        wrapper
            .post("http://x/y", b"second".to_vec())
            .expect("Request should succeed");
        assert_eq!(wrapper.read_string().expect("Second body"), "second");
    }

    #[test]
    fn test_failed_request_clears_response() {
        let (mut wrapper, _transport) = echo_wrapper();

        wrapper.get("http://x/y").expect("Request should succeed");
        assert_eq!(wrapper.status(), 200);

        assert!(matches!(
            wrapper.get("not a url"),
            Err(HttpError::InvalidUrl(_))
        ));
        assert_eq!(wrapper.status(), 0);
        assert!(wrapper.header().is_none());
        assert!(matches!(wrapper.read_body(), Err(HttpError::NoResponse)));
    }

    #[test]
    fn test_post_form() {
        let (mut wrapper, transport) = echo_wrapper();

        wrapper
            .post_form("http://x/y", &[("q", "rust lang")])
            .expect("Request should succeed");

        assert_eq!(
            transport.last().headers.get(CONTENT_TYPE),
            Some(&HeaderValue::from_static(
                "application/x-www-form-urlencoded"
            ))
        );
        assert_eq!(wrapper.read_string().expect("Body"), "q=rust+lang");
    }

    #[test]
    fn test_take_response() {
        let (mut wrapper, _transport) = echo_wrapper();

        wrapper
            .post("http://x/y", b"owned".to_vec())
            .expect("Request should succeed");

        let response = wrapper.take_response().expect("Response should be stored");
        assert_eq!(wrapper.status(), 0);
        assert_eq!(response.into_bytes().expect("Body"), b"owned");
    }
}
