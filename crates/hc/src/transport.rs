//! Transport abstraction
//!
//! A [`Transport`] puts a prepared [`Request`] on the wire and hands back the
//! [`RawResponse`] without reading its body. [`HttpClient`](crate::HttpClient)
//! handles everything around that: URL parsing, compression, default headers
//! and status policy.

use std::sync::Arc;

use crate::request::Request;
use crate::response::{RawResponse, Response};

/// Trait for sending HTTP requests
///
/// The default implementation is [`ReqwestTransport`](crate::ReqwestTransport).
/// Implementations must not decode response bodies; the client does that
/// according to `Content-Encoding`.
pub trait Transport: std::fmt::Debug + Send + Sync {
    /// Send the request and return the response with an unread body
    fn execute(&self, request: Request) -> Response<RawResponse>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: Request) -> Response<RawResponse> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: Request) -> Response<RawResponse> {
        (**self).execute(request)
    }
}
