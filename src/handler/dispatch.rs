//! Request dispatch module
//!
//! Entry point for HTTP request processing. Resolution order per request:
//! root fast path, cache lookup, static extension probe, dynamic route
//! scan, static fallback, memoized 404.

use std::sync::Arc;

use hyper::Method;

use crate::config::AppState;
use crate::http::context::Context;
use crate::http::request::HttpRequest;
use crate::http::{parse_urlencoded, response, HttpResponse};
use crate::middleware::Next;
use crate::routing::cache::{CachedMatch, Lookup};
use crate::routing::route::Route;

/// Resolve and answer one request.
pub async fn handle_request(req: HttpRequest, state: Arc<AppState>) -> HttpResponse {
    let url = req.url();

    // 1. Root fast path: GET / with no query string skips the cache and
    //    query parsing. Restricted to the exact root path so the shortcut
    //    changes performance only, never semantics; the full middleware
    //    chain still runs.
    if let Some(root_index) = state.root_route {
        if req.method() == Method::GET && req.path() == "/" && req.query().is_none() {
            let route = &state.router.routes()[root_index];
            let mut ctx = Context::new(req.remote_addr());
            return run_route(route, &req, &mut ctx).await;
        }
    }

    // 2. Cache lookup by the literal URL. Params and query are derived
    //    purely from the URL string, so a cached resolution can be reused
    //    verbatim for every request to the same URL.
    match state.cache.lookup(&url) {
        Lookup::NotFound => return response::not_found(),
        Lookup::Hit(found) => {
            let route = &state.router.routes()[found.route_index];
            let mut ctx = Context::with_route_data(found.params, found.query, req.remote_addr());
            return run_route(route, &req, &mut ctx).await;
        }
        Lookup::Absent => {}
    }

    // 3. URLs that look like file requests probe the static mounts first,
    //    without touching the dynamic-route cache.
    if req.method() == Method::GET && has_file_extension(req.path()) {
        for static_route in state.router.static_routes() {
            if static_route.matches(req.path()) {
                return static_route.serve(req.path()).await;
            }
        }
    }

    // 4. Parse the query only when one was actually sent.
    let query = req
        .query()
        .filter(|q| !q.is_empty())
        .map(parse_urlencoded)
        .unwrap_or_default();

    // 5. Linear scan in registration order; first match wins.
    for (index, route) in state.router.routes().iter().enumerate() {
        if route.method != *req.method() {
            continue;
        }
        if let Some(params) = route.pattern.captures(req.path()) {
            state.cache.insert_match(
                url,
                CachedMatch {
                    route_index: index,
                    params: params.clone(),
                    query: query.clone(),
                },
            );
            let mut ctx = Context::with_route_data(params, query, req.remote_addr());
            return run_route(route, &req, &mut ctx).await;
        }
    }

    // 6. Static mounts as a fallback for extensionless paths.
    if req.method() == Method::GET {
        for static_route in state.router.static_routes() {
            if static_route.matches(req.path()) {
                return static_route.serve(req.path()).await;
            }
        }
    }

    // 7. Memoize the miss so repeated requests skip the scan.
    state.cache.insert_miss(url);
    response::not_found()
}

async fn run_route(route: &Route, req: &HttpRequest, ctx: &mut Context) -> HttpResponse {
    Next::new(&route.middlewares, route.handler.as_ref())
        .run(req, ctx)
        .await
}

/// Whether the final path segment carries an extension-like suffix: a
/// trailing `.` followed by a non-empty alphanumeric token.
fn has_file_extension(path: &str) -> bool {
    let last_segment = path.rsplit('/').next().unwrap_or("");
    match last_segment.rsplit_once('.') {
        Some((_, suffix)) => {
            !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_alphanumeric())
        }
        None => false,
    }
}
