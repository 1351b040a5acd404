//! Security-headers middleware.
//!
//! Post-processes every response with HSTS, CSP and X-Frame-Options
//! headers.

use hyper::header::HeaderValue;

use crate::http::context::Context;
use crate::http::request::HttpRequest;
use crate::http::HttpResponse;
use crate::logger;
use crate::middleware::{BoxFuture, Middleware, Next};

/// Adds standard security headers on the way out.
pub struct SecurityHeaders {
    hsts: String,
    csp: String,
    x_frame: String,
}

impl SecurityHeaders {
    pub fn new(
        hsts: impl Into<String>,
        csp: impl Into<String>,
        x_frame: impl Into<String>,
    ) -> Self {
        Self {
            hsts: hsts.into(),
            csp: csp.into(),
            x_frame: x_frame.into(),
        }
    }
}

impl Default for SecurityHeaders {
    fn default() -> Self {
        Self::new(
            "max-age=31536000; includeSubDomains",
            "default-src 'self'",
            "DENY",
        )
    }
}

fn set_header(response: &mut HttpResponse, name: &'static str, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            response.headers_mut().insert(name, value);
        }
        Err(e) => logger::log_warning(&format!("Skipping invalid {name} header value: {e}")),
    }
}

impl Middleware for SecurityHeaders {
    fn handle<'a>(
        &'a self,
        req: &'a HttpRequest,
        ctx: &'a mut Context,
        next: Next<'a>,
    ) -> BoxFuture<'a, HttpResponse> {
        Box::pin(async move {
            let mut response = next.run(req, ctx).await;
            set_header(&mut response, "Strict-Transport-Security", &self.hsts);
            set_header(&mut response, "Content-Security-Policy", &self.csp);
            set_header(&mut response, "X-Frame-Options", &self.x_frame);
            response
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::tests::{test_request, RecordingHandler};
    use crate::middleware::Middleware as _;
    use hyper::Method;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_headers_applied() {
        let req = test_request(Method::GET, "/");
        let mut ctx = Context::new(req.remote_addr());
        let chain: Vec<Arc<dyn crate::middleware::Middleware>> = Vec::new();
        let handler = RecordingHandler::new(Arc::new(Mutex::new(Vec::new())));

        let response = SecurityHeaders::default()
            .handle(&req, &mut ctx, Next::new(&chain, &handler))
            .await;

        assert_eq!(
            response
                .headers()
                .get("X-Frame-Options")
                .and_then(|v| v.to_str().ok()),
            Some("DENY")
        );
        assert_eq!(
            response
                .headers()
                .get("Content-Security-Policy")
                .and_then(|v| v.to_str().ok()),
            Some("default-src 'self'")
        );
        assert!(response.headers().contains_key("Strict-Transport-Security"));
    }
}
