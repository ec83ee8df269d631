//! Parsed request representation.
//!
//! # Responsibilities
//! - Hold the method, target, version, headers and body of one request
//! - Provide case-insensitive header lookup
//! - Stay immutable once the parser hands it out
//!
//! # Design Decisions
//! - Raw bytes (`Bytes`) rather than strings: the wire grammar does not
//!   guarantee UTF-8 anywhere except header names
//! - Header keys are stored lowercased, so lookups lowercase the query

use std::collections::HashMap;

use bytes::Bytes;

/// A complete HTTP/1.1 request as read off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Bytes,
    target: Bytes,
    version: Bytes,
    headers: HashMap<String, Bytes>,
    body: Bytes,
}

impl Request {
    pub(crate) fn new(
        method: Bytes,
        target: Bytes,
        version: Bytes,
        headers: HashMap<String, Bytes>,
        body: Bytes,
    ) -> Self {
        Self {
            method,
            target,
            version,
            headers,
            body,
        }
    }

    /// Request method, e.g. `GET`.
    pub fn method(&self) -> &[u8] {
        &self.method
    }

    /// Method as a string slice, if it is valid UTF-8.
    pub fn method_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.method).ok()
    }

    /// Request target, e.g. `/index.html`.
    pub fn target(&self) -> &[u8] {
        &self.target
    }

    /// Protocol version token, e.g. `HTTP/1.1`.
    pub fn version(&self) -> &[u8] {
        &self.version
    }

    /// All headers keyed by lowercase name.
    pub fn headers(&self) -> &HashMap<String, Bytes> {
        &self.headers
    }

    /// Look up a header value. The name is matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers
            .get(&name.to_lowercase())
            .map(|value| value.as_ref())
    }

    /// Message body. Empty when no positive Content-Length was declared.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Declared Content-Length, if present and numeric.
    pub fn content_length(&self) -> Option<i64> {
        let raw = self.header("content-length")?;
        std::str::from_utf8(raw).ok()?.parse().ok()
    }
}
