//! tela - a lightweight asynchronous HTTP framework.
//!
//! The core is a linear-scan router with `:name` path parameters, per-route
//! middleware chains (onion model), a bounded URL-match cache with FIFO
//! eviction, and a static file resolver with an in-memory TTL cache. The
//! transport is plain hyper HTTP/1.1 on a multi-threaded Tokio runtime.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod middleware;
pub mod routing;
pub mod server;

pub use config::Config;
pub use http::context::Context;
pub use http::request::HttpRequest;
pub use http::HttpResponse;
pub use middleware::{BoxFuture, Handler, Middleware, Next};
pub use routing::Router;
pub use server::Server;
