//! HTTP support module
//!
//! Request/response types, the per-request context, response builders, and
//! MIME type detection.

pub mod context;
pub mod mime;
pub mod request;
pub mod response;

use std::collections::HashMap;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

/// The response type produced by every handler and middleware.
pub type HttpResponse = Response<Full<Bytes>>;

/// Parse an `application/x-www-form-urlencoded` payload (also the query
/// string format) into a name/value map.
///
/// `+` is treated as a space and percent-escapes are decoded. A pair that
/// fails to decode keeps its raw form rather than being dropped.
pub fn parse_urlencoded(input: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for pair in input.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        out.insert(decode_component(name), decode_component(value));
    }
    out
}

fn decode_component(raw: &str) -> String {
    let plus_decoded = raw.replace('+', " ");
    match urlencoding::decode(&plus_decoded) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => plus_decoded,
    }
}
