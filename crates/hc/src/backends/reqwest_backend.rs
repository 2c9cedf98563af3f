//! reqwest-based Transport implementation

use std::time::Duration;

use crate::client::ProxyConfig;
use crate::error::HttpError;
use crate::request::Request;
use crate::response::{RawResponse, Response};
use crate::transport::Transport;

/// Connection settings applied to the underlying `reqwest` client
#[derive(Debug, Default)]
pub(crate) struct ReqwestOptions {
    pub accept_invalid_certs: bool,
    pub proxy: Option<ProxyConfig>,
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub http2_prior_knowledge: bool,
}

/// Blocking `reqwest` transport
///
/// reqwest is built without its decompression features, so `Content-Encoding`
/// reaches the client untouched.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::blocking::Client,
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestTransport {
    /// Create a transport with reqwest's default settings
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialized, or if called from
    /// within an async runtime, as [`reqwest::blocking::Client::new`] does.
    pub fn new() -> Self {
        Self {
            inner: reqwest::blocking::Client::new(),
        }
    }

    /// Create a transport from an existing blocking reqwest client
    pub fn from_reqwest(client: reqwest::blocking::Client) -> Self {
        Self { inner: client }
    }

    pub(crate) fn with_options(options: ReqwestOptions) -> Response<Self> {
        let mut builder = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(options.accept_invalid_certs);

        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = options.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        if options.http2_prior_knowledge {
            builder = builder.http2_prior_knowledge();
        }

        if let Some(proxy_config) = options.proxy {
            let proxy_url = proxy_config.url.to_string();
            let proxy = if let Some(matcher) = proxy_config.matcher {
                reqwest::Proxy::custom(move |url| {
                    if matcher.is_match(url.host_str().unwrap_or("")) {
                        Some(proxy_url.clone())
                    } else {
                        None
                    }
                })
            } else {
                reqwest::Proxy::all(&proxy_url).map_err(|e| HttpError::Proxy(e.to_string()))?
            };
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(HttpError::from)?;
        Ok(Self { inner: client })
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: Request) -> Response<RawResponse> {
        let Request {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.inner.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder.send().map_err(HttpError::from)?;
        let status = response.status();
        let headers = response.headers().clone();
        Ok(RawResponse::new(status, headers, response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_new() {
        let transport = ReqwestTransport::new();
        let _ = format!("{:?}", transport);
    }

    #[test]
    fn test_with_default_options() {
        let result = ReqwestTransport::with_options(ReqwestOptions::default());
        assert!(result.is_ok());
    }

    #[test]
    fn test_with_all_options() {
        let options = ReqwestOptions {
            accept_invalid_certs: true,
            proxy: Some(ProxyConfig {
                url: url::Url::parse("http://localhost:8080").expect("Valid proxy URL"),
                matcher: Some(regex::Regex::new(r".*\.example\.com$").expect("Valid regex")),
            }),
            timeout: Some(Duration::from_secs(5)),
            connect_timeout: Some(Duration::from_secs(1)),
            http2_prior_knowledge: true,
        };
        assert!(ReqwestTransport::with_options(options).is_ok());
    }

    #[test]
    fn test_connection_refused() {
        // Reserve a free port, then release it so nothing is listening there
        let listener =
            std::net::TcpListener::bind("127.0.0.1:0").expect("Should bind an ephemeral port");
        let addr = listener.local_addr().expect("Listener should have an address");
        drop(listener);

        let transport = ReqwestTransport::with_options(ReqwestOptions {
            connect_timeout: Some(Duration::from_secs(2)),
            ..Default::default()
        })
        .expect("Transport should build");
        let request = Request {
            method: http::Method::GET,
            url: url::Url::parse(&format!("http://{}/", addr)).expect("Valid URL"),
            headers: http::HeaderMap::new(),
            body: None,
        };

        let result = transport.execute(request);
        assert!(matches!(
            result,
            Err(HttpError::Connection(_)) | Err(HttpError::Timeout) | Err(HttpError::Other(_))
        ));
    }
}
