//! Route table and registration module
//!
//! The `Router` is a plain value built up at startup with registration
//! calls and then handed to the server, immutable from that point on.
//! Registration order is match precedence: the first matching route wins.

use std::sync::Arc;
use std::time::Duration;

use hyper::Method;

use crate::handler::static_files::{StaticRoute, FILE_CACHE_CAPACITY, FILE_CACHE_TTL};
use crate::middleware::{Handler, Middleware};
use crate::routing::pattern::PathPattern;

/// A registered (method, pattern, handler, middleware chain) tuple.
pub struct Route {
    pub method: Method,
    pub pattern: PathPattern,
    pub handler: Arc<dyn Handler>,
    /// Full dispatch chain: route-specific middleware first, then the
    /// global middleware as registered at the time this route was added.
    pub middlewares: Vec<Arc<dyn Middleware>>,
}

/// Ordered route table plus static mounts and the global middleware list.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
    static_routes: Vec<StaticRoute>,
    global_middlewares: Vec<Arc<dyn Middleware>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a global middleware. It applies to routes registered
    /// after this call; earlier routes keep the chain they were built
    /// with.
    pub fn use_middleware(&mut self, middleware: impl Middleware + 'static) {
        self.global_middlewares.push(Arc::new(middleware));
    }

    /// Register a route with route-specific middleware. The dispatch
    /// chain is route-specific middleware first, then the global list:
    /// specific overrides general.
    pub fn route(
        &mut self,
        method: Method,
        path: &str,
        handler: impl Handler + 'static,
        route_middlewares: Vec<Arc<dyn Middleware>>,
    ) {
        let mut middlewares = route_middlewares;
        middlewares.extend(self.global_middlewares.iter().cloned());
        self.routes.push(Route {
            method,
            pattern: PathPattern::parse(path),
            handler: Arc::new(handler),
            middlewares,
        });
    }

    pub fn get(&mut self, path: &str, handler: impl Handler + 'static) {
        self.route(Method::GET, path, handler, Vec::new());
    }

    pub fn post(&mut self, path: &str, handler: impl Handler + 'static) {
        self.route(Method::POST, path, handler, Vec::new());
    }

    pub fn put(&mut self, path: &str, handler: impl Handler + 'static) {
        self.route(Method::PUT, path, handler, Vec::new());
    }

    pub fn delete(&mut self, path: &str, handler: impl Handler + 'static) {
        self.route(Method::DELETE, path, handler, Vec::new());
    }

    pub fn patch(&mut self, path: &str, handler: impl Handler + 'static) {
        self.route(Method::PATCH, path, handler, Vec::new());
    }

    pub fn head(&mut self, path: &str, handler: impl Handler + 'static) {
        self.route(Method::HEAD, path, handler, Vec::new());
    }

    pub fn options(&mut self, path: &str, handler: impl Handler + 'static) {
        self.route(Method::OPTIONS, path, handler, Vec::new());
    }

    /// Mount a directory under a URL prefix with the default file cache
    /// settings (1 hour TTL, 100 entries).
    pub fn static_files(&mut self, url_prefix: &str, directory: &str) {
        self.static_files_with(url_prefix, directory, FILE_CACHE_TTL, FILE_CACHE_CAPACITY);
    }

    /// Mount a directory with explicit file cache settings.
    pub fn static_files_with(
        &mut self,
        url_prefix: &str,
        directory: &str,
        cache_ttl: Duration,
        cache_capacity: usize,
    ) {
        self.static_routes
            .push(StaticRoute::new(url_prefix, directory, cache_ttl, cache_capacity));
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn static_routes(&self) -> &[StaticRoute] {
        &self.static_routes
    }

    /// Index of the `GET /` route, if one is registered. Computed once at
    /// server startup for the root fast path.
    pub fn find_root_route(&self) -> Option<usize> {
        self.routes
            .iter()
            .position(|route| route.method == Method::GET && route.pattern.is_root())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::tests::{test_request, Recorder, RecordingHandler};
    use crate::middleware::Next;
    use crate::Context;
    use std::sync::Mutex;

    fn recording_router(
        log: &Arc<Mutex<Vec<String>>>,
    ) -> Router {
        let mut router = Router::new();
        router.use_middleware(Recorder::new("global", Arc::clone(log)));
        router.route(
            Method::GET,
            "/test",
            RecordingHandler::new(Arc::clone(log)),
            vec![Arc::new(Recorder::new("route", Arc::clone(log)))],
        );
        router
    }

    #[tokio::test]
    async fn test_route_specific_runs_before_global() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let router = recording_router(&log);
        let route = &router.routes()[0];
        let req = test_request(Method::GET, "/test");
        let mut ctx = Context::new(req.remote_addr());

        Next::new(&route.middlewares, route.handler.as_ref())
            .run(&req, &mut ctx)
            .await;

        assert_eq!(
            *log.lock().expect("lock poisoned"),
            vec![
                "route-before",
                "global-before",
                "handler",
                "global-after",
                "route-after"
            ]
        );
    }

    #[test]
    fn test_global_snapshot_taken_at_registration() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut router = Router::new();
        router.get("/early", RecordingHandler::new(Arc::clone(&log)));
        router.use_middleware(Recorder::new("late-global", Arc::clone(&log)));
        router.get("/late", RecordingHandler::new(Arc::clone(&log)));

        assert_eq!(router.routes()[0].middlewares.len(), 0);
        assert_eq!(router.routes()[1].middlewares.len(), 1);
    }

    #[test]
    fn test_param_names_extracted_once_at_registration() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut router = Router::new();
        router.get("/users/:id/posts/:postId", RecordingHandler::new(log));
        assert_eq!(
            router.routes()[0].pattern.param_names(),
            ["id", "postId"]
        );
    }

    #[test]
    fn test_find_root_route() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut router = Router::new();
        assert_eq!(router.find_root_route(), None);

        router.get("/about", RecordingHandler::new(Arc::clone(&log)));
        router.post("/", RecordingHandler::new(Arc::clone(&log)));
        router.get("/", RecordingHandler::new(Arc::clone(&log)));
        // POST / does not qualify; the GET registration does.
        assert_eq!(router.find_root_route(), Some(2));
    }

    #[test]
    fn test_all_verbs_register() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut router = Router::new();
        router.get("/r", RecordingHandler::new(Arc::clone(&log)));
        router.post("/r", RecordingHandler::new(Arc::clone(&log)));
        router.put("/r", RecordingHandler::new(Arc::clone(&log)));
        router.delete("/r", RecordingHandler::new(Arc::clone(&log)));
        router.patch("/r", RecordingHandler::new(Arc::clone(&log)));
        router.head("/r", RecordingHandler::new(Arc::clone(&log)));
        router.options("/r", RecordingHandler::new(Arc::clone(&log)));

        let methods: Vec<_> = router.routes().iter().map(|r| r.method.clone()).collect();
        assert_eq!(
            methods,
            [
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::PATCH,
                Method::HEAD,
                Method::OPTIONS
            ]
        );
    }

    #[test]
    fn test_registration_order_preserved() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut router = Router::new();
        router.get("/a/:x", RecordingHandler::new(Arc::clone(&log)));
        router.get("/a/b", RecordingHandler::new(Arc::clone(&log)));
        assert_eq!(router.routes()[0].pattern.as_str(), "/a/:x");
        assert_eq!(router.routes()[1].pattern.as_str(), "/a/b");
    }
}
