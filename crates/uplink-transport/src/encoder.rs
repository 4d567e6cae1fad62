//! Transfer encoder
//!
//! [`CompressedContent`] wraps an already-serialized body and produces a
//! gzip-compressed request body for it. Compression happens while the body is
//! being sent: the serialized bytes are read through a `GzipEncoder` and the
//! encoder's output is streamed straight into the request. Because the
//! compressed size is unknown up front, the body never declares a length and
//! the request goes out chunked.
//!
//! ```text
//! Bytes ──→ BufReader ──→ GzipEncoder ──→ ReaderStream ──→ reqwest::Body
//! ```
//!
//! Each call to [`body`](CompressedContent::body) builds a fresh stream over
//! the same immutable bytes, so one `CompressedContent` can be sent to any
//! number of hosts.

use std::io::Cursor;

use async_compression::tokio::bufread::GzipEncoder;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::Body;
use tokio::io::BufReader;
use tokio_util::io::ReaderStream;

/// Content type of the serialized upload payload
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Content coding applied by [`CompressedContent`]
pub const GZIP_ENCODING: &str = "gzip";

/// A body that is gzip-compressed as it is streamed
#[derive(Debug, Clone)]
pub struct CompressedContent {
    original: Bytes,
    headers: HeaderMap,
}

impl CompressedContent {
    /// Wraps `original` whose own headers are `original_headers`
    ///
    /// Every original header is carried over, then `Content-Encoding: gzip`
    /// is added. Any length the original declared is dropped.
    pub fn new(original: impl Into<Bytes>, original_headers: &HeaderMap) -> Self {
        let mut headers = original_headers.clone();
        headers.remove(reqwest::header::CONTENT_LENGTH);
        headers.insert(CONTENT_ENCODING, HeaderValue::from_static(GZIP_ENCODING));
        Self {
            original: original.into(),
            headers,
        }
    }

    /// Wraps a serialized JSON document
    pub fn json(original: impl Into<Bytes>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        Self::new(original, &headers)
    }

    /// Headers to send with the compressed body
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Size of the uncompressed body
    pub fn original_len(&self) -> usize {
        self.original.len()
    }

    /// A new streaming body that gzip-encodes the original bytes on the fly
    pub fn body(&self) -> Body {
        Body::wrap_stream(ReaderStream::new(self.encoder()))
    }

    fn encoder(&self) -> GzipEncoder<BufReader<Cursor<Bytes>>> {
        GzipEncoder::new(BufReader::new(Cursor::new(self.original.clone())))
    }
}
