//! Incoming request representation.
//!
//! The server collects the body up front (bounded by the configured limit),
//! so handlers and middleware share one immutable view of the request.

use std::net::SocketAddr;

use hyper::body::Bytes;
use hyper::{HeaderMap, Method, Uri, Version};

/// A fully-read incoming HTTP request.
#[derive(Debug)]
pub struct HttpRequest {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    remote_addr: SocketAddr,
}

impl HttpRequest {
    pub const fn new(
        method: Method,
        uri: Uri,
        version: Version,
        headers: HeaderMap,
        body: Bytes,
        remote_addr: SocketAddr,
    ) -> Self {
        Self {
            method,
            uri,
            version,
            headers,
            body,
            remote_addr,
        }
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Query string without the leading `?`, when one was sent.
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// The literal request URL as received (path plus query). Used as the
    /// route cache key.
    pub fn url(&self) -> String {
        self.uri.to_string()
    }

    pub const fn version(&self) -> Version {
        self.version
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Fetch a header value as a string, ignoring non-UTF8 values.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    pub const fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }
}
