//! Static file serving module
//!
//! A static route maps a URL prefix onto a directory. Resolved files are
//! held in a bounded in-memory cache with a TTL; eviction is
//! earliest-inserted-first, and entries past their expiry are refetched
//! from disk. Any read failure is answered with a plain 404 and no
//! further detail.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use hyper::body::Bytes;
use tokio::fs;

use crate::http::{mime, response, HttpResponse};

/// Default TTL for cached file contents.
pub const FILE_CACHE_TTL: Duration = Duration::from_secs(3600);
/// Default number of cached files per mount.
pub const FILE_CACHE_CAPACITY: usize = 100;

#[derive(Clone)]
struct FileEntry {
    content: Bytes,
    content_type: &'static str,
    expires_at: Instant,
}

struct FileCacheInner {
    entries: HashMap<String, FileEntry>,
    order: VecDeque<String>,
}

/// Bounded TTL cache of file contents, keyed by resolved relative path.
struct FileCache {
    ttl: Duration,
    capacity: usize,
    inner: Mutex<FileCacheInner>,
}

impl FileCache {
    fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity,
            inner: Mutex::new(FileCacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Fresh entry for the key, or `None` when absent or expired.
    fn get(&self, key: &str) -> Option<FileEntry> {
        let inner = self.inner.lock().expect("file cache lock poisoned");
        inner
            .entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .cloned()
    }

    fn insert(&self, key: String, content: Bytes, content_type: &'static str) {
        if self.capacity == 0 {
            return;
        }
        let mut inner = self.inner.lock().expect("file cache lock poisoned");
        let entry = FileEntry {
            content,
            content_type,
            expires_at: Instant::now() + self.ttl,
        };
        if inner.entries.contains_key(&key) {
            // Stale refresh: overwrite, keep the insertion position.
            inner.entries.insert(key, entry);
            return;
        }
        while inner.entries.len() >= self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.entries.remove(&oldest);
                }
                None => break,
            }
        }
        inner.order.push_back(key.clone());
        inner.entries.insert(key, entry);
    }
}

/// A directory mounted under a URL prefix, consulted after the dynamic
/// route table (or before it, for extension-bearing GET requests).
pub struct StaticRoute {
    prefix: String,
    root: PathBuf,
    cache: FileCache,
}

impl StaticRoute {
    pub fn new(
        url_prefix: &str,
        directory: impl Into<PathBuf>,
        cache_ttl: Duration,
        cache_capacity: usize,
    ) -> Self {
        Self {
            prefix: url_prefix.trim_end_matches('/').to_string(),
            root: directory.into(),
            cache: FileCache::new(cache_ttl, cache_capacity),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Whether a request path falls under this mount. The prefix must end
    /// on a segment boundary: `/assets` matches `/assets/app.css` but not
    /// `/assetsx`.
    pub fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Resolve and serve a request path under this mount.
    pub async fn serve(&self, path: &str) -> HttpResponse {
        let mut rest = path
            .strip_prefix(self.prefix.as_str())
            .unwrap_or(path)
            .to_string();

        // Directory requests resolve to their index document.
        if rest.is_empty() {
            rest.push_str("/index.html");
        } else if rest.ends_with('/') {
            rest.push_str("index.html");
        }

        let relative = rest.trim_start_matches('/').to_string();

        // Refuse to step outside the mounted directory.
        if relative.split('/').any(|segment| segment == "..") {
            return response::not_found();
        }

        if let Some(entry) = self.cache.get(&relative) {
            return response::static_file(entry.content, entry.content_type);
        }

        let file_path = self.root.join(&relative);
        match fs::read(&file_path).await {
            Ok(content) => {
                let content_type = content_type_for(&relative);
                let content = Bytes::from(content);
                self.cache
                    .insert(relative, content.clone(), content_type);
                response::static_file(content, content_type)
            }
            // Not found, permission denied, and every other read failure
            // look the same to the client.
            Err(_) => response::not_found(),
        }
    }
}

fn content_type_for(relative: &str) -> &'static str {
    let extension = Path::new(relative)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    mime::content_type(extension.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::StatusCode;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tela-static-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, content).expect("write file");
    }

    fn body_bytes(response: &HttpResponse) -> u64 {
        use hyper::body::Body as _;
        response.body().size_hint().exact().unwrap_or(0)
    }

    #[tokio::test]
    async fn test_serves_index_for_directory_request() {
        let dir = scratch_dir("index");
        write(&dir, "index.html", "<h1>home</h1>");
        let route = StaticRoute::new("/", dir.to_str().expect("utf8 path"), FILE_CACHE_TTL, 10);

        let response = route.serve("/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("Content-Type")
                .and_then(|v| v.to_str().ok()),
            Some("text/html")
        );
        assert_eq!(body_bytes(&response), 13);
    }

    #[tokio::test]
    async fn test_serves_index_for_subdirectory_request() {
        let dir = scratch_dir("subdir");
        write(&dir, "docs/index.html", "<p>docs</p>");
        let route = StaticRoute::new("/", dir.to_str().expect("utf8 path"), FILE_CACHE_TTL, 10);

        let response = route.serve("/docs/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("Content-Type")
                .and_then(|v| v.to_str().ok()),
            Some("text/html")
        );
    }

    #[tokio::test]
    async fn test_content_type_from_extension() {
        let dir = scratch_dir("css");
        write(&dir, "style.css", "body { margin: 0 }");
        let route =
            StaticRoute::new("/assets", dir.to_str().expect("utf8 path"), FILE_CACHE_TTL, 10);

        assert!(route.matches("/assets/style.css"));
        let response = route.serve("/assets/style.css").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("Content-Type")
                .and_then(|v| v.to_str().ok()),
            Some("text/css")
        );
        assert_eq!(
            response
                .headers()
                .get("Cache-Control")
                .and_then(|v| v.to_str().ok()),
            Some("public, max-age=3600")
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let dir = scratch_dir("missing");
        let route = StaticRoute::new("/", dir.to_str().expect("utf8 path"), FILE_CACHE_TTL, 10);
        let response = route.serve("/nope.txt").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let dir = scratch_dir("traversal");
        write(&dir, "ok.txt", "fine");
        let route = StaticRoute::new("/", dir.to_str().expect("utf8 path"), FILE_CACHE_TTL, 10);
        let response = route.serve("/../secret.txt").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_prefix_boundary() {
        let dir = scratch_dir("boundary");
        let route = StaticRoute::new("/assets", dir.to_str().expect("utf8 path"), FILE_CACHE_TTL, 10);
        assert!(route.matches("/assets"));
        assert!(route.matches("/assets/app.js"));
        assert!(!route.matches("/assetsx/app.js"));
        assert!(!route.matches("/other"));
    }

    #[tokio::test]
    async fn test_cache_survives_file_deletion() {
        let dir = scratch_dir("cached");
        write(&dir, "page.txt", "v1");
        let route = StaticRoute::new("/", dir.to_str().expect("utf8 path"), FILE_CACHE_TTL, 10);

        let first = route.serve("/page.txt").await;
        assert_eq!(first.status(), StatusCode::OK);

        std::fs::remove_file(dir.join("page.txt")).expect("remove file");

        // Still served from cache within the TTL.
        let second = route.serve("/page.txt").await;
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(body_bytes(&second), 2);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let dir = scratch_dir("expired");
        write(&dir, "page.txt", "v1");
        let route = StaticRoute::new(
            "/",
            dir.to_str().expect("utf8 path"),
            Duration::from_millis(0),
            10,
        );

        let first = route.serve("/page.txt").await;
        assert_eq!(first.status(), StatusCode::OK);

        std::fs::remove_file(dir.join("page.txt")).expect("remove file");

        // TTL zero: the cached entry is immediately stale, so the resolver
        // goes back to disk and finds nothing.
        let second = route.serve("/page.txt").await;
        assert_eq!(second.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_file_cache_fifo_eviction() {
        let cache = FileCache::new(FILE_CACHE_TTL, 2);
        cache.insert("a".to_string(), Bytes::from_static(b"1"), "text/plain");
        cache.insert("b".to_string(), Bytes::from_static(b"2"), "text/plain");
        cache.insert("c".to_string(), Bytes::from_static(b"3"), "text/plain");

        assert!(cache.get("a").is_none());
        assert!(cache.get("b").is_some());
        assert!(cache.get("c").is_some());
    }
}
