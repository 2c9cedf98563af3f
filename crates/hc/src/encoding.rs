//! Content encodings for request and response bodies
//!
//! Request bodies are compressed with gzip according to a [`CompressionPolicy`].
//! Response bodies are decoded according to their `Content-Encoding` header,
//! which may list several encodings in the order they were applied.

use std::fmt;
use std::io::{self, Read, Write};

use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::GzEncoder;
use flate2::Compression;
use http::header::CONTENT_ENCODING;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::HttpError;
use crate::response::Response;

/// Value of a `Content-Encoding` header
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContentEncoding {
    /// No encoding
    #[default]
    Identity,
    /// gzip (`gzip` or the legacy `x-gzip`)
    Gzip,
    /// zlib-wrapped deflate
    Deflate,
    /// Any encoding this crate cannot decode, lowercased
    Other(String),
}

impl ContentEncoding {
    /// Parse a header value. Matching is case-insensitive.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("identity") {
            ContentEncoding::Identity
        } else if value.eq_ignore_ascii_case("gzip") || value.eq_ignore_ascii_case("x-gzip") {
            ContentEncoding::Gzip
        } else if value.eq_ignore_ascii_case("deflate") {
            ContentEncoding::Deflate
        } else {
            ContentEncoding::Other(value.to_ascii_lowercase())
        }
    }

    /// Parse a comma-separated list of encodings in the order they were
    /// applied. `identity` tokens are dropped.
    pub fn parse_list(value: &str) -> Vec<Self> {
        value
            .split(',')
            .map(Self::parse)
            .filter(|encoding| *encoding != ContentEncoding::Identity)
            .collect()
    }

    /// Read the applied encodings from every `Content-Encoding` header line,
    /// empty if absent or not ASCII
    pub fn from_headers(headers: &HeaderMap) -> Vec<Self> {
        headers
            .get_all(CONTENT_ENCODING)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Self::parse_list)
            .collect()
    }

    /// Header value for this encoding
    pub fn as_str(&self) -> &str {
        match self {
            ContentEncoding::Identity => "identity",
            ContentEncoding::Gzip => "gzip",
            ContentEncoding::Deflate => "deflate",
            ContentEncoding::Other(name) => name,
        }
    }

    /// Whether this crate decompresses bodies with this encoding
    pub fn is_compressed(&self) -> bool {
        matches!(self, ContentEncoding::Gzip | ContentEncoding::Deflate)
    }
}

impl fmt::Display for ContentEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When outgoing POST/PUT bodies are gzip-compressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionPolicy {
    /// Compress non-empty bodies; empty bodies are sent as-is without a
    /// `Content-Encoding` header
    #[default]
    NonEmpty,
    /// Compress every body, so an empty body becomes an empty gzip stream
    Always,
    /// Never compress
    Never,
}

impl CompressionPolicy {
    /// Whether `body` is compressed under this policy
    pub fn should_compress(self, body: &[u8]) -> bool {
        match self {
            CompressionPolicy::NonEmpty => !body.is_empty(),
            CompressionPolicy::Always => true,
            CompressionPolicy::Never => false,
        }
    }
}

/// Compress `data` into a gzip stream
pub fn gzip(data: &[u8]) -> Response<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| HttpError::Compression(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| HttpError::Compression(e.to_string()))
}

/// Decode a complete body according to `encoding`
///
/// An empty body decodes to an empty body whatever the encoding, since
/// responses such as `204` or `304` may carry the header without content.
/// Unknown encodings are returned unchanged.
pub fn decode(encoding: &ContentEncoding, data: &[u8]) -> Response<Vec<u8>> {
    if data.is_empty() {
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    let result = match encoding {
        ContentEncoding::Identity => return Ok(data.to_vec()),
        ContentEncoding::Gzip => GzDecoder::new(data).read_to_end(&mut out),
        ContentEncoding::Deflate => ZlibDecoder::new(data).read_to_end(&mut out),
        ContentEncoding::Other(name) => {
            warn!("Unsupported content encoding '{}', returning body undecoded", name);
            return Ok(data.to_vec());
        }
    };

    result.map_err(|e| HttpError::Compression(e.to_string()))?;
    trace!(
        "Decoded {} body: {} -> {} bytes",
        encoding,
        data.len(),
        out.len()
    );
    Ok(out)
}

/// Undo a list of encodings, last applied first
///
/// Decoding stops at the first encoding this crate cannot decode; the body is
/// returned as it is at that layer.
pub fn decode_all(encodings: &[ContentEncoding], data: &[u8]) -> Response<Vec<u8>> {
    let mut body = data.to_vec();
    for encoding in encodings.iter().rev() {
        if let ContentEncoding::Other(name) = encoding {
            warn!("Unsupported content encoding '{}', returning body undecoded", name);
            break;
        }
        body = decode(encoding, &body)?;
    }
    Ok(body)
}

/// Read a body stream to the end and decode it
pub(crate) fn read_decoded(
    encodings: &[ContentEncoding],
    mut reader: impl Read,
) -> Response<Vec<u8>> {
    let mut raw = Vec::new();
    reader
        .read_to_end(&mut raw)
        .map_err(|e: io::Error| HttpError::Body(e.to_string()))?;
    decode_all(encodings, &raw)
}
