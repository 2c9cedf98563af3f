//! HTTP client

use std::sync::Arc;
use std::time::{Duration, Instant};

use http::header::{HeaderName, ACCEPT_ENCODING, CONTENT_ENCODING, USER_AGENT};
use http::{HeaderMap, HeaderValue, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::backends::reqwest_backend::{ReqwestOptions, ReqwestTransport};
use crate::config::{ClientConfig, StatusPolicy};
use crate::encoding::{gzip, CompressionPolicy};
use crate::error::HttpError;
use crate::request::{Request, RequestBuilder};
use crate::response::{HttpResponse, Response};
use crate::transport::Transport;

const ACCEPTED_ENCODINGS: &str = "gzip, deflate";

/// Stateless HTTP client
///
/// Every call returns its own [`HttpResponse`]; the client keeps nothing
/// between requests and is cheap to clone.
#[derive(Debug, Clone)]
pub struct HttpClient {
    transport: Arc<dyn Transport>,
    compression: CompressionPolicy,
    status_policy: StatusPolicy,
    default_headers: HeaderMap,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialized, or if called from
    /// within an async runtime. Use [`HttpClient::builder`] to get an error
    /// instead of a panic for the former.
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::new())
    }

    /// Create a new HTTP client builder
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Create an HttpClient from a blocking reqwest client
    pub fn from_reqwest(client: reqwest::blocking::Client) -> Self {
        Self::with_transport(ReqwestTransport::from_reqwest(client))
    }

    /// Create an HttpClient with default settings over a custom transport
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            compression: CompressionPolicy::default(),
            status_policy: StatusPolicy::default(),
            default_headers: default_headers(true),
        }
    }

    /// Compression policy for request bodies
    pub fn compression(&self) -> CompressionPolicy {
        self.compression
    }

    /// Status policy for responses
    pub fn status_policy(&self) -> StatusPolicy {
        self.status_policy
    }

    // === Verb methods ===

    /// GET request
    pub fn get(&self, url: &str) -> Response<HttpResponse> {
        self.request(Method::GET, url).send()
    }

    /// POST request with a raw body, gzip-compressed per the compression policy
    pub fn post(&self, url: &str, body: impl Into<Vec<u8>>) -> Response<HttpResponse> {
        self.request(Method::POST, url).body(body).send()
    }

    /// PUT request with a raw body, gzip-compressed per the compression policy
    pub fn put(&self, url: &str, body: impl Into<Vec<u8>>) -> Response<HttpResponse> {
        self.request(Method::PUT, url).body(body).send()
    }

    /// DELETE request
    pub fn delete(&self, url: &str) -> Response<HttpResponse> {
        self.request(Method::DELETE, url).send()
    }

    /// POST with JSON body
    pub fn post_json<B>(&self, url: &str, body: &B) -> Response<HttpResponse>
    where
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, url).json(body).send()
    }

    /// PUT with JSON body
    pub fn put_json<B>(&self, url: &str, body: &B) -> Response<HttpResponse>
    where
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, url).json(body).send()
    }

    /// POST with form data
    pub fn post_form<F>(&self, url: &str, form: &F) -> Response<HttpResponse>
    where
        F: Serialize + ?Sized,
    {
        self.request(Method::POST, url).form(form).send()
    }

    /// Send a request with any method and an optional raw body
    pub fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
    ) -> Response<HttpResponse> {
        let builder = self.request(method, url);
        match body {
            Some(body) => builder.body(body).send(),
            None => builder.send(),
        }
    }

    /// GET request, returns JSON deserialized to R
    ///
    /// Non-2xx responses are errors here regardless of the status policy.
    pub fn fetch_json<R>(&self, url: &str) -> Response<R>
    where
        R: DeserializeOwned,
    {
        self.request(Method::GET, url).send_json()
    }

    // === Request builder ===

    /// Request builder for complex cases (custom headers, form data, etc.)
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        RequestBuilder::new(self.clone(), method, url)
    }

    #[instrument(skip_all, fields(method = %method, url = %url))]
    pub(crate) fn execute(
        &self,
        method: Method,
        url: &str,
        headers: HeaderMap,
        body: Option<Vec<u8>>,
    ) -> Response<HttpResponse> {
        let url = Url::parse(url)?;

        let mut request_headers = self.default_headers.clone();
        request_headers.extend(headers);

        // A caller-supplied Content-Encoding means the body is already encoded
        let body = match body {
            Some(body)
                if !request_headers.contains_key(CONTENT_ENCODING)
                    && self.compression.should_compress(&body) =>
            {
                let compressed = gzip(&body)?;
                debug!(
                    "Compressed request body: {} -> {} bytes",
                    body.len(),
                    compressed.len()
                );
                request_headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
                Some(compressed)
            }
            body => body,
        };

        debug!("Sending {} request to {}", method, url);
        let start_time = Instant::now();

        let raw = self.transport.execute(Request {
            method,
            url,
            headers: request_headers,
            body,
        })?;

        debug!(
            "Response received in {}ms: {}",
            start_time.elapsed().as_millis(),
            raw.status()
        );

        let response = HttpResponse::from(raw);
        match self.status_policy {
            StatusPolicy::PassThrough => Ok(response),
            StatusPolicy::ErrorForStatus => response.error_for_status(),
        }
    }
}

fn default_headers(accept_compressed: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if accept_compressed {
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static(ACCEPTED_ENCODINGS));
    }
    headers
}

/// HTTP client builder for configuring transport and encoding settings
#[derive(Debug)]
pub struct HttpClientBuilder {
    accept_invalid_certs: bool,
    proxy: Option<ProxyConfig>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http2_prior_knowledge: bool,
    headers: HeaderMap,
    accept_compressed: bool,
    compression: CompressionPolicy,
    status_policy: StatusPolicy,
    transport: Option<Arc<dyn Transport>>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            accept_invalid_certs: false,
            proxy: None,
            timeout: None,
            connect_timeout: None,
            http2_prior_knowledge: false,
            headers: HeaderMap::new(),
            accept_compressed: true,
            compression: CompressionPolicy::default(),
            status_policy: StatusPolicy::default(),
            transport: None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct ProxyConfig {
    pub url: Url,
    pub matcher: Option<regex::Regex>,
}

impl HttpClientBuilder {
    /// Create a builder from serializable settings
    pub fn from_config(config: &ClientConfig) -> Response<Self> {
        let mut builder = Self::default()
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .http2_prior_knowledge(config.http2_prior_knowledge)
            .accept_compressed(config.accept_compressed)
            .compression(config.compression)
            .status_policy(config.status_policy);

        if let Some(secs) = config.timeout_secs {
            if secs == 0 {
                return Err(HttpError::Config("timeout_secs must be positive".to_string()));
            }
            builder = builder.timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = config.connect_timeout_secs {
            if secs == 0 {
                return Err(HttpError::Config(
                    "connect_timeout_secs must be positive".to_string(),
                ));
            }
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }

        match (&config.proxy, &config.proxy_pattern) {
            (Some(proxy), pattern) => {
                let url = Url::parse(proxy)
                    .map_err(|e| HttpError::Proxy(format!("Invalid proxy URL: {}", e)))?;
                builder = match pattern {
                    Some(pattern) => builder.proxy_with_matcher(url, pattern)?,
                    None => builder.proxy(url),
                };
            }
            (None, Some(_)) => {
                return Err(HttpError::Config(
                    "proxy_pattern requires proxy".to_string(),
                ));
            }
            (None, None) => {}
        }

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent)?;
        }

        Ok(builder)
    }

    /// Accept invalid TLS certificates
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Set a proxy URL
    pub fn proxy(mut self, url: Url) -> Self {
        self.proxy = Some(ProxyConfig { url, matcher: None });
        self
    }

    /// Set a proxy URL with a host pattern matcher
    pub fn proxy_with_matcher(mut self, url: Url, pattern: &str) -> Response<Self> {
        let matcher = regex::Regex::new(pattern)
            .map_err(|e| HttpError::Proxy(format!("Invalid proxy pattern: {}", e)))?;
        self.proxy = Some(ProxyConfig {
            url,
            matcher: Some(matcher),
        });
        Ok(self)
    }

    /// Total timeout for each request
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Timeout for establishing connections
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Speak HTTP/2 without ALPN negotiation
    pub fn http2_prior_knowledge(mut self, enabled: bool) -> Self {
        self.http2_prior_knowledge = enabled;
        self
    }

    /// Set the `User-Agent` header sent with every request
    pub fn user_agent(self, value: &str) -> Response<Self> {
        self.default_header(USER_AGENT.as_str(), value)
    }

    /// Add a header sent with every request
    ///
    /// Headers set on an individual request replace default headers with the
    /// same name.
    pub fn default_header(mut self, name: &str, value: &str) -> Response<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Send `Accept-Encoding: gzip, deflate` (enabled by default)
    pub fn accept_compressed(mut self, enabled: bool) -> Self {
        self.accept_compressed = enabled;
        self
    }

    /// When request bodies are gzip-compressed
    pub fn compression(mut self, policy: CompressionPolicy) -> Self {
        self.compression = policy;
        self
    }

    /// How non-2xx responses are reported
    pub fn status_policy(mut self, policy: StatusPolicy) -> Self {
        self.status_policy = policy;
        self
    }

    /// Use a custom transport instead of reqwest
    ///
    /// The TLS, proxy, timeout and HTTP/2 settings only apply to the reqwest
    /// transport and are ignored when a custom one is set.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the HTTP client
    pub fn build(self) -> Response<HttpClient> {
        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::with_options(ReqwestOptions {
                accept_invalid_certs: self.accept_invalid_certs,
                proxy: self.proxy,
                timeout: self.timeout,
                connect_timeout: self.connect_timeout,
                http2_prior_knowledge: self.http2_prior_knowledge,
            })?),
        };

        let mut default_headers = default_headers(self.accept_compressed);
        default_headers.extend(self.headers);

        Ok(HttpClient {
            transport,
            compression: self.compression,
            status_policy: self.status_policy,
            default_headers,
        })
    }
}

/// Convenience function for simple JSON GET requests
///
/// # Panics
///
/// Panics under the same conditions as [`HttpClient::new`].
pub fn fetch<R: DeserializeOwned>(url: &str) -> Response<R> {
    HttpClient::new().fetch_json(url)
}
