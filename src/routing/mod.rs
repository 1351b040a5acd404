//! Routing module
//!
//! Path pattern matching, the ordered route table with its registration
//! API, and the bounded URL-match cache.

pub mod cache;
pub mod pattern;
pub mod route;

pub use cache::{CachedMatch, Lookup, RouteCache};
pub use pattern::PathPattern;
pub use route::{Route, Router};
