//! Middleware chain dispatch module
//!
//! Defines the `Handler` and `Middleware` contracts and the `Next`
//! continuation that composes an ordered middleware sequence with a
//! terminal handler. Middleware run in registration order on the way in;
//! code after `next.run(..)` executes in reverse order on the way out. A
//! middleware short-circuits the chain by returning a response without
//! calling `next`. The dispatcher adds no concurrency and no error
//! recovery of its own.

mod body;
mod cookies;
mod logger;
mod security_headers;

pub use body::BodyParser;
pub use cookies::CookieParser;
pub use logger::RequestLogger;
pub use security_headers::SecurityHeaders;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::http::context::Context;
use crate::http::request::HttpRequest;
use crate::http::HttpResponse;

/// Boxed future returned by handlers and middleware.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Terminal request handler.
pub trait Handler: Send + Sync {
    fn call<'a>(&'a self, req: &'a HttpRequest, ctx: &'a mut Context) -> BoxFuture<'a, HttpResponse>;
}

/// A step wrapping the rest of the chain. Either returns a response
/// directly or awaits `next.run(..)` and may post-process its result.
pub trait Middleware: Send + Sync {
    fn handle<'a>(
        &'a self,
        req: &'a HttpRequest,
        ctx: &'a mut Context,
        next: Next<'a>,
    ) -> BoxFuture<'a, HttpResponse>;
}

impl<F> Handler for F
where
    F: for<'a> Fn(&'a HttpRequest, &'a mut Context) -> BoxFuture<'a, HttpResponse> + Send + Sync,
{
    fn call<'a>(&'a self, req: &'a HttpRequest, ctx: &'a mut Context) -> BoxFuture<'a, HttpResponse> {
        self(req, ctx)
    }
}

impl<F> Middleware for F
where
    F: for<'a> Fn(&'a HttpRequest, &'a mut Context, Next<'a>) -> BoxFuture<'a, HttpResponse>
        + Send
        + Sync,
{
    fn handle<'a>(
        &'a self,
        req: &'a HttpRequest,
        ctx: &'a mut Context,
        next: Next<'a>,
    ) -> BoxFuture<'a, HttpResponse> {
        self(req, ctx, next)
    }
}

/// Continuation over the remaining middleware and the terminal handler.
///
/// Consuming `run` guarantees a middleware can invoke the rest of the
/// chain at most once.
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    handler: &'a dyn Handler,
}

impl<'a> Next<'a> {
    pub const fn new(chain: &'a [Arc<dyn Middleware>], handler: &'a dyn Handler) -> Self {
        Self { chain, handler }
    }

    /// Advance the chain: call the next middleware, or the handler once
    /// the chain is exhausted.
    pub fn run<'b>(self, req: &'b HttpRequest, ctx: &'b mut Context) -> BoxFuture<'b, HttpResponse>
    where
        'a: 'b,
    {
        match self.chain.split_first() {
            Some((middleware, rest)) => middleware.handle(
                req,
                ctx,
                Next {
                    chain: rest,
                    handler: self.handler,
                },
            ),
            None => self.handler.call(req, ctx),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::http::response;
    use hyper::body::Bytes;
    use hyper::{HeaderMap, Method, Version};
    use std::sync::Mutex;

    pub(crate) fn test_request(method: Method, target: &str) -> HttpRequest {
        HttpRequest::new(
            method,
            target.parse().expect("valid uri"),
            Version::HTTP_11,
            HeaderMap::new(),
            Bytes::new(),
            "127.0.0.1:4000".parse().expect("valid addr"),
        )
    }

    pub(crate) struct Recorder {
        label: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Recorder {
        pub(crate) fn new(label: &'static str, log: Arc<Mutex<Vec<String>>>) -> Self {
            Self { label, log }
        }
    }

    impl Middleware for Recorder {
        fn handle<'a>(
            &'a self,
            req: &'a HttpRequest,
            ctx: &'a mut Context,
            next: Next<'a>,
        ) -> BoxFuture<'a, HttpResponse> {
            Box::pin(async move {
                self.log
                    .lock()
                    .expect("lock poisoned")
                    .push(format!("{}-before", self.label));
                let response = next.run(req, ctx).await;
                self.log
                    .lock()
                    .expect("lock poisoned")
                    .push(format!("{}-after", self.label));
                response
            })
        }
    }

    pub(crate) struct RecordingHandler {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingHandler {
        pub(crate) fn new(log: Arc<Mutex<Vec<String>>>) -> Self {
            Self { log }
        }
    }

    impl Handler for RecordingHandler {
        fn call<'a>(
            &'a self,
            _req: &'a HttpRequest,
            _ctx: &'a mut Context,
        ) -> BoxFuture<'a, HttpResponse> {
            Box::pin(async move {
                self.log
                    .lock()
                    .expect("lock poisoned")
                    .push("handler".to_string());
                response::text("ok")
            })
        }
    }

    struct ShortCircuit;

    impl Middleware for ShortCircuit {
        fn handle<'a>(
            &'a self,
            _req: &'a HttpRequest,
            _ctx: &'a mut Context,
            _next: Next<'a>,
        ) -> BoxFuture<'a, HttpResponse> {
            Box::pin(async move {
                response::text_with_status(hyper::StatusCode::UNAUTHORIZED, "denied")
            })
        }
    }

    #[tokio::test]
    async fn test_onion_ordering() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(Recorder::new("mw1", Arc::clone(&log))),
            Arc::new(Recorder::new("mw2", Arc::clone(&log))),
        ];
        let handler = RecordingHandler::new(Arc::clone(&log));
        let req = test_request(Method::GET, "/test");
        let mut ctx = Context::new(req.remote_addr());

        Next::new(&chain, &handler).run(&req, &mut ctx).await;

        assert_eq!(
            *log.lock().expect("lock poisoned"),
            vec!["mw1-before", "mw2-before", "handler", "mw2-after", "mw1-after"]
        );
    }

    #[tokio::test]
    async fn test_empty_chain_calls_handler() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain: Vec<Arc<dyn Middleware>> = Vec::new();
        let handler = RecordingHandler::new(Arc::clone(&log));
        let req = test_request(Method::GET, "/test");
        let mut ctx = Context::new(req.remote_addr());

        let response = Next::new(&chain, &handler).run(&req, &mut ctx).await;

        assert_eq!(response.status(), hyper::StatusCode::OK);
        assert_eq!(*log.lock().expect("lock poisoned"), vec!["handler"]);
    }

    #[tokio::test]
    async fn test_short_circuit_skips_rest() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(Recorder::new("mw1", Arc::clone(&log))),
            Arc::new(ShortCircuit),
            Arc::new(Recorder::new("mw2", Arc::clone(&log))),
        ];
        let handler = RecordingHandler::new(Arc::clone(&log));
        let req = test_request(Method::GET, "/test");
        let mut ctx = Context::new(req.remote_addr());

        let response = Next::new(&chain, &handler).run(&req, &mut ctx).await;

        assert_eq!(response.status(), hyper::StatusCode::UNAUTHORIZED);
        // mw2 and the handler never ran; mw1 still post-processed.
        assert_eq!(
            *log.lock().expect("lock poisoned"),
            vec!["mw1-before", "mw1-after"]
        );
    }

    #[tokio::test]
    async fn test_middleware_mutates_context_for_handler() {
        struct Tagger;
        impl Middleware for Tagger {
            fn handle<'a>(
                &'a self,
                req: &'a HttpRequest,
                ctx: &'a mut Context,
                next: Next<'a>,
            ) -> BoxFuture<'a, HttpResponse> {
                Box::pin(async move {
                    ctx.user = Some(serde_json::json!({"name": "amelia"}));
                    next.run(req, ctx).await
                })
            }
        }

        struct UserEcho;
        impl Handler for UserEcho {
            fn call<'a>(
                &'a self,
                _req: &'a HttpRequest,
                ctx: &'a mut Context,
            ) -> BoxFuture<'a, HttpResponse> {
                Box::pin(async move {
                    match &ctx.user {
                        Some(user) => response::text(user.to_string()),
                        None => response::text_with_status(
                            hyper::StatusCode::UNAUTHORIZED,
                            "no user",
                        ),
                    }
                })
            }
        }

        let chain: Vec<Arc<dyn Middleware>> = vec![Arc::new(Tagger)];
        let handler = UserEcho;
        let req = test_request(Method::GET, "/whoami");
        let mut ctx = Context::new(req.remote_addr());

        let response = Next::new(&chain, &handler).run(&req, &mut ctx).await;
        assert_eq!(response.status(), hyper::StatusCode::OK);
    }
}
