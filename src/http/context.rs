//! Per-request context threaded through the middleware chain.
//!
//! The context carries the data derived from the URL (path parameters, query
//! parameters) plus a fixed set of optional slots that cross-cutting
//! middleware fills in and handlers read. The core never interprets the
//! slots; they exist so middleware and handlers can cooperate without the
//! router knowing about rendering, cookies, auth, or storage engines.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Rendering hook installed by a render middleware: takes a page body
/// fragment and produces the full HTML document.
pub type RenderFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Handle to an external key-value store, installed by a storage middleware.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn delete(&self, key: &str);
}

/// Request body after parsing by a body-parser middleware.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    /// `application/x-www-form-urlencoded` fields.
    Form(HashMap<String, String>),
    /// `application/json` document.
    Json(serde_json::Value),
}

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

impl SameSite {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Lax => "Lax",
            Self::Strict => "Strict",
            Self::None => "None",
        }
    }
}

/// Optional attributes for an outgoing cookie.
#[derive(Debug, Clone, Default)]
pub struct CookieOptions {
    pub path: Option<String>,
    pub domain: Option<String>,
    pub max_age: Option<i64>,
    pub expires: Option<DateTime<Utc>>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

/// A cookie queued by a handler, serialized into a `Set-Cookie` header by
/// the cookie middleware on the way out.
#[derive(Debug, Clone)]
pub struct SetCookie {
    pub name: String,
    pub value: String,
    pub options: CookieOptions,
}

impl SetCookie {
    /// Serialize into a `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        if let Some(path) = &self.options.path {
            out.push_str("; Path=");
            out.push_str(path);
        }
        if let Some(domain) = &self.options.domain {
            out.push_str("; Domain=");
            out.push_str(domain);
        }
        if let Some(max_age) = self.options.max_age {
            out.push_str(&format!("; Max-Age={max_age}"));
        }
        if let Some(expires) = self.options.expires {
            out.push_str(&format!(
                "; Expires={}",
                expires.format("%a, %d %b %Y %H:%M:%S GMT")
            ));
        }
        if self.options.secure {
            out.push_str("; Secure");
        }
        if self.options.http_only {
            out.push_str("; HttpOnly");
        }
        if let Some(same_site) = self.options.same_site {
            out.push_str("; SameSite=");
            out.push_str(same_site.as_str());
        }
        out
    }
}

/// Mutable per-request state owned by the dispatch chain.
///
/// Created fresh for every request and dropped once the response is
/// produced. Params and query are filled by the router; everything else is
/// a fixed extension slot populated by middleware.
pub struct Context {
    /// Named path parameters extracted from the matched pattern.
    pub params: HashMap<String, String>,
    /// Decoded query parameters.
    pub query: HashMap<String, String>,
    /// Peer address of the connection that carried this request.
    pub remote_addr: SocketAddr,
    /// Rendering hook, if a render middleware ran.
    pub render: Option<RenderFn>,
    /// Parsed request cookies, if the cookie middleware ran.
    pub cookies: Option<HashMap<String, String>>,
    /// Cookies queued for the response; drained by the cookie middleware.
    pub set_cookies: Vec<SetCookie>,
    /// External key-value store handle.
    pub kv: Option<Arc<dyn KeyValueStore>>,
    /// Authenticated-user claims set by an auth middleware.
    pub user: Option<serde_json::Value>,
    /// Parsed request body, if the body-parser middleware ran.
    pub body: Option<ParsedBody>,
}

impl Context {
    /// Empty context for requests resolved without pattern matching (root
    /// fast path, static files).
    pub fn new(remote_addr: SocketAddr) -> Self {
        Self::with_route_data(HashMap::new(), HashMap::new(), remote_addr)
    }

    /// Context seeded with the params/query computed (or cached) for a URL.
    pub fn with_route_data(
        params: HashMap<String, String>,
        query: HashMap<String, String>,
        remote_addr: SocketAddr,
    ) -> Self {
        Self {
            params,
            query,
            remote_addr,
            render: None,
            cookies: None,
            set_cookies: Vec::new(),
            kv: None,
            user: None,
            body: None,
        }
    }

    /// Path parameter by name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Request cookie by name, when the cookie middleware populated the map.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .as_ref()
            .and_then(|cookies| cookies.get(name))
            .map(String::as_str)
    }

    /// Queue a cookie for the response.
    pub fn set_cookie(&mut self, name: &str, value: &str, options: CookieOptions) {
        self.set_cookies.push(SetCookie {
            name: name.to_string(),
            value: value.to_string(),
            options,
        });
    }
}
