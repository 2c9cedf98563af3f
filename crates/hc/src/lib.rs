//! Blocking HTTP client with gzip request bodies and transparent response decoding
//!
//! [`HttpClient`] issues GET/POST/PUT/DELETE requests, gzip-compresses
//! non-empty request bodies (setting `Content-Encoding: gzip`), and returns an
//! [`HttpResponse`] whose body is decoded according to its `Content-Encoding`
//! and cached on first access. [`RequestWrapper`] keeps the last response for
//! callers that prefer to inspect status, headers and body after the call.
//!
//! Non-2xx responses are returned as-is unless the client is built with
//! [`StatusPolicy::ErrorForStatus`].
//!
//! # Example
//!
//! ```no_run
//! use hc::{HttpClient, Response};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct Ping {
//!     message: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct Pong {
//!     message: String,
//! }
//!
//! fn example() -> Response<Pong> {
//!     let client = HttpClient::new();
//!     let mut response = client.post_json(
//!         "https://api.example.com/ping",
//!         &Ping {
//!             message: "hello".to_string(),
//!         },
//!     )?;
//!     response.json()
//! }
//! ```

mod backends;
mod client;
mod config;
pub mod encoding;
mod error;
mod request;
mod response;
mod transport;
mod wrapper;

pub use backends::ReqwestTransport;
pub use client::{fetch, HttpClient, HttpClientBuilder};
pub use config::{ClientConfig, StatusPolicy};
pub use encoding::{CompressionPolicy, ContentEncoding};
pub use error::HttpError;
pub use http::{HeaderMap, HeaderValue, Method, StatusCode};
pub use request::{Request, RequestBuilder};
pub use response::{HttpResponse, RawResponse, Response};
pub use transport::Transport;
pub use url::Url;
pub use wrapper::RequestWrapper;
