//! Cookie middleware.
//!
//! Parses the request `Cookie` header into the context before the chain
//! runs, and serializes any cookies handlers queued via
//! `Context::set_cookie` into `Set-Cookie` response headers afterwards.

use std::collections::HashMap;

use hyper::header::{HeaderValue, SET_COOKIE};

use crate::http::context::Context;
use crate::http::request::HttpRequest;
use crate::http::HttpResponse;
use crate::logger;
use crate::middleware::{BoxFuture, Middleware, Next};

/// Reads request cookies and writes queued response cookies.
pub struct CookieParser;

/// Split a `Cookie` header into name/value pairs.
fn parse_cookie_header(header: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for part in header.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        if let Some((name, value)) = part.split_once('=') {
            cookies.insert(name.trim().to_string(), value.trim().to_string());
        }
    }
    cookies
}

impl Middleware for CookieParser {
    fn handle<'a>(
        &'a self,
        req: &'a HttpRequest,
        ctx: &'a mut Context,
        next: Next<'a>,
    ) -> BoxFuture<'a, HttpResponse> {
        Box::pin(async move {
            ctx.cookies = Some(
                req.header("cookie")
                    .map(parse_cookie_header)
                    .unwrap_or_default(),
            );

            let mut response = next.run(req, &mut *ctx).await;

            for cookie in ctx.set_cookies.drain(..) {
                match HeaderValue::from_str(&cookie.to_header_value()) {
                    Ok(value) => {
                        response.headers_mut().append(SET_COOKIE, value);
                    }
                    Err(e) => {
                        logger::log_warning(&format!(
                            "Dropping invalid Set-Cookie for '{}': {e}",
                            cookie.name
                        ));
                    }
                }
            }

            response
        })
    }
}
