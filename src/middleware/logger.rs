//! Access-log middleware.
//!
//! Wraps the rest of the chain, times it, and emits one formatted access
//! log line per request through the global log writer.

use std::time::Instant;

use hyper::body::Body as _;
use hyper::Version;

use crate::config::LoggingConfig;
use crate::http::context::Context;
use crate::http::request::HttpRequest;
use crate::http::HttpResponse;
use crate::logger::{self, AccessLogEntry};
use crate::middleware::{BoxFuture, Middleware, Next};

/// Emits an access log line for every request passing through it.
pub struct RequestLogger {
    format: String,
}

impl RequestLogger {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
        }
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        Self::new(config.access_log_format.clone())
    }
}

fn version_label(version: Version) -> &'static str {
    if version == Version::HTTP_10 {
        "1.0"
    } else if version == Version::HTTP_2 {
        "2"
    } else {
        "1.1"
    }
}

impl Middleware for RequestLogger {
    fn handle<'a>(
        &'a self,
        req: &'a HttpRequest,
        ctx: &'a mut Context,
        next: Next<'a>,
    ) -> BoxFuture<'a, HttpResponse> {
        Box::pin(async move {
            let start = Instant::now();
            let remote_addr = ctx.remote_addr;

            let response = next.run(req, ctx).await;

            let mut entry = AccessLogEntry::new(
                remote_addr.ip().to_string(),
                req.method().to_string(),
                req.path().to_string(),
            );
            entry.query = req.query().map(ToString::to_string);
            entry.http_version = version_label(req.version()).to_string();
            entry.status = response.status().as_u16();
            entry.body_bytes =
                usize::try_from(response.body().size_hint().exact().unwrap_or(0)).unwrap_or(0);
            entry.referer = req.header("referer").map(ToString::to_string);
            entry.user_agent = req.header("user-agent").map(ToString::to_string);
            entry.request_time_us =
                u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);

            logger::log_access(&entry, &self.format);

            response
        })
    }
}
