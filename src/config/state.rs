// Application state module
// Immutable-after-startup runtime state shared by all request tasks

use crate::config::Config;
use crate::routing::{RouteCache, Router};

/// Shared application state: the finished route table, the URL-match
/// cache, and the configuration. Built once at startup; only the cache
/// mutates afterwards, behind its own lock.
pub struct AppState {
    pub router: Router,
    pub cache: RouteCache,
    pub config: Config,
    /// Index of the `GET /` route, precomputed for the root fast path.
    pub root_route: Option<usize>,
}

impl AppState {
    pub fn new(router: Router, config: &Config) -> Self {
        let root_route = router.find_root_route();
        let cache = RouteCache::new(config.cache.route_cache_size);
        Self {
            router,
            cache,
            config: config.clone(),
            root_route,
        }
    }
}
