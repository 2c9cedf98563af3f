//! Client configuration

use serde::{Deserialize, Serialize};

use crate::encoding::CompressionPolicy;

/// How responses with a non-2xx status are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusPolicy {
    /// Return every response; callers inspect the status themselves
    #[default]
    PassThrough,
    /// Turn non-2xx responses into [`HttpError::Status`](crate::HttpError::Status)
    ErrorForStatus,
}

/// Serializable client settings
///
/// Meant to be embedded in an application's own configuration file. Every
/// field is optional; missing fields take the defaults below.
///
/// ```toml
/// timeout_secs = 30
/// proxy = "socks5://127.0.0.1:9050"
/// proxy_pattern = ".*\\.onion$"
/// compression = "always"
/// status_policy = "error_for_status"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Total request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Connect timeout in seconds
    pub connect_timeout_secs: Option<u64>,
    /// Proxy URL
    pub proxy: Option<String>,
    /// Only proxy hosts matching this regex
    pub proxy_pattern: Option<String>,
    /// Accept invalid TLS certificates
    pub accept_invalid_certs: bool,
    /// Use HTTP/2 without ALPN negotiation
    pub http2_prior_knowledge: bool,
    /// `User-Agent` header value
    pub user_agent: Option<String>,
    /// When request bodies are gzip-compressed
    pub compression: CompressionPolicy,
    /// How non-2xx responses are reported
    pub status_policy: StatusPolicy,
    /// Send `Accept-Encoding: gzip, deflate`
    pub accept_compressed: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            connect_timeout_secs: None,
            proxy: None,
            proxy_pattern: None,
            accept_invalid_certs: false,
            http2_prior_knowledge: false,
            user_agent: None,
            compression: CompressionPolicy::default(),
            status_policy: StatusPolicy::default(),
            accept_compressed: true,
        }
    }
}
