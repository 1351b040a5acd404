//! Demo application: a small site built on the tela framework.
//!
//! Wires up the global middleware stack (access logging, body parsing,
//! key-value store, cookies, rendering), a handful of dynamic routes
//! including parameterised and cookie/session demos, a notification
//! signup endpoint, and a static mount for `public/`.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hyper::{Method, StatusCode};

use tela::http::context::{
    Context, CookieOptions, KeyValueStore, ParsedBody, RenderFn, SameSite,
};
use tela::http::request::HttpRequest;
use tela::http::{response, HttpResponse};
use tela::logger;
use tela::middleware::{BodyParser, CookieParser, RequestLogger, SecurityHeaders};
use tela::{BoxFuture, Config, Middleware, Next, Router, Server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    logger::init(&config)?;

    let mut router = Router::new();

    if config.logging.access_log {
        router.use_middleware(RequestLogger::from_config(&config.logging));
    }
    router.use_middleware(BodyParser);
    router.use_middleware(StoreProvider::new());
    router.use_middleware(CookieParser);
    router.use_middleware(PageShell);
    router.use_middleware(SecurityHeaders::default());

    router.get("/", landing);
    router.get("/api", api_root);
    router.route(
        Method::GET,
        "/hello/:id",
        hello,
        vec![
            Arc::new(RouteTrace::new("hello")),
            Arc::new(RouteTrace::new("hello-extra")),
        ],
    );
    router.route(
        Method::GET,
        "/hello",
        hello_guarded,
        vec![Arc::new(RequireAuthHeader)],
    );
    router.get("/session", session_show);
    router.get("/session/set", session_set);
    router.get("/session/clear", session_clear);
    router.get("/login", login);
    router.route(
        Method::GET,
        "/protected",
        protected,
        vec![Arc::new(SessionGuard)],
    );
    router.post("/notify", notify);
    router.get("/success", success);

    router.static_files_with(
        "/",
        "public",
        Duration::from_secs(config.cache.static_file_ttl),
        config.cache.static_file_cache_size,
    );

    Server::new(router, config).run()
}

/// Opaque token for the session demos, derived from the peer address and
/// the current timestamp.
fn issue_token(ctx: &Context) -> String {
    let mut hasher = DefaultHasher::new();
    ctx.remote_addr.hash(&mut hasher);
    chrono::Utc::now().timestamp_nanos_opt().hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

// ---------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------

/// In-memory key-value store exposed through the context's storage slot.
struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value);
        }
    }

    fn delete(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

/// Installs the shared store into every request context.
struct StoreProvider {
    store: Arc<MemoryStore>,
}

impl StoreProvider {
    fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore {
                entries: Mutex::new(HashMap::new()),
            }),
        }
    }
}

impl Middleware for StoreProvider {
    fn handle<'a>(
        &'a self,
        req: &'a HttpRequest,
        ctx: &'a mut Context,
        next: Next<'a>,
    ) -> BoxFuture<'a, HttpResponse> {
        Box::pin(async move {
            ctx.kv = Some(Arc::clone(&self.store) as Arc<dyn KeyValueStore>);
            next.run(req, ctx).await
        })
    }
}

/// Installs the page-shell render hook used by the HTML handlers.
struct PageShell;

impl Middleware for PageShell {
    fn handle<'a>(
        &'a self,
        req: &'a HttpRequest,
        ctx: &'a mut Context,
        next: Next<'a>,
    ) -> BoxFuture<'a, HttpResponse> {
        Box::pin(async move {
            let render: RenderFn = Arc::new(|body| {
                format!(
                    "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
                     <title>tela demo</title></head><body>{body}</body></html>"
                )
            });
            ctx.render = Some(render);
            next.run(req, ctx).await
        })
    }
}

/// Logs route-level tracing for the parameterised hello route.
struct RouteTrace {
    label: &'static str,
}

impl RouteTrace {
    const fn new(label: &'static str) -> Self {
        Self { label }
    }
}

impl Middleware for RouteTrace {
    fn handle<'a>(
        &'a self,
        req: &'a HttpRequest,
        ctx: &'a mut Context,
        next: Next<'a>,
    ) -> BoxFuture<'a, HttpResponse> {
        Box::pin(async move {
            logger::log_info(&format!(
                "[{}] {} {} params={:?}",
                self.label,
                req.method(),
                req.path(),
                ctx.params
            ));
            next.run(req, ctx).await
        })
    }
}

/// Rejects requests without an Authorization header.
struct RequireAuthHeader;

impl Middleware for RequireAuthHeader {
    fn handle<'a>(
        &'a self,
        req: &'a HttpRequest,
        ctx: &'a mut Context,
        next: Next<'a>,
    ) -> BoxFuture<'a, HttpResponse> {
        Box::pin(async move {
            if req.header("authorization").is_none() {
                return response::text_with_status(StatusCode::UNAUTHORIZED, "Unauthorized");
            }
            next.run(req, ctx).await
        })
    }
}

/// Resolves the auth cookie into user claims, rejecting requests that
/// carry no valid session. Token verification itself lives outside the
/// framework; here presence in the store is the check.
struct SessionGuard;

impl Middleware for SessionGuard {
    fn handle<'a>(
        &'a self,
        req: &'a HttpRequest,
        ctx: &'a mut Context,
        next: Next<'a>,
    ) -> BoxFuture<'a, HttpResponse> {
        Box::pin(async move {
            let token = match ctx.cookie("auth") {
                Some(token) => token.to_string(),
                None => {
                    return response::text_with_status(StatusCode::UNAUTHORIZED, "Unauthorized")
                }
            };
            let known = ctx
                .kv
                .as_ref()
                .and_then(|kv| kv.get(&format!("auth:{token}")));
            match known {
                Some(user) => {
                    ctx.user = Some(serde_json::json!({ "username": user, "token": token }));
                    next.run(req, ctx).await
                }
                None => response::text_with_status(StatusCode::UNAUTHORIZED, "Invalid token"),
            }
        })
    }
}

// ---------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------

fn landing<'a>(_req: &'a HttpRequest, ctx: &'a mut Context) -> BoxFuture<'a, HttpResponse> {
    Box::pin(async move {
        let body = "<h1>tela</h1><p>A lightweight HTTP framework.</p>\
                    <p><a href=\"/hello/world\">Say hello</a></p>";
        match &ctx.render {
            Some(render) => response::html(render(body)),
            None => response::html(body),
        }
    })
}

fn api_root<'a>(_req: &'a HttpRequest, _ctx: &'a mut Context) -> BoxFuture<'a, HttpResponse> {
    Box::pin(async move { response::text("API Root") })
}

fn hello<'a>(_req: &'a HttpRequest, ctx: &'a mut Context) -> BoxFuture<'a, HttpResponse> {
    Box::pin(async move {
        let id = ctx.param("id").unwrap_or("stranger");
        response::text(format!("Hello, {id}"))
    })
}

fn hello_guarded<'a>(_req: &'a HttpRequest, _ctx: &'a mut Context) -> BoxFuture<'a, HttpResponse> {
    Box::pin(async move { response::text("Hello, authorized user") })
}

fn session_show<'a>(_req: &'a HttpRequest, ctx: &'a mut Context) -> BoxFuture<'a, HttpResponse> {
    Box::pin(async move {
        match ctx.cookie("session") {
            Some(session) => response::text(format!("Session: {session}")),
            None => {
                response::text_with_status(StatusCode::UNAUTHORIZED, "Missing session cookie")
            }
        }
    })
}

fn session_set<'a>(_req: &'a HttpRequest, ctx: &'a mut Context) -> BoxFuture<'a, HttpResponse> {
    Box::pin(async move {
        let token = issue_token(ctx);
        ctx.set_cookie(
            "session",
            &token,
            CookieOptions {
                path: Some("/".to_string()),
                http_only: true,
                same_site: Some(SameSite::Lax),
                max_age: Some(60 * 60 * 24 * 7), // 7 days
                ..CookieOptions::default()
            },
        );
        response::text("Session cookie set")
    })
}

fn session_clear<'a>(_req: &'a HttpRequest, ctx: &'a mut Context) -> BoxFuture<'a, HttpResponse> {
    Box::pin(async move {
        ctx.set_cookie(
            "session",
            "",
            CookieOptions {
                path: Some("/".to_string()),
                max_age: Some(0),
                ..CookieOptions::default()
            },
        );
        response::text("Session cleared")
    })
}

fn login<'a>(_req: &'a HttpRequest, ctx: &'a mut Context) -> BoxFuture<'a, HttpResponse> {
    Box::pin(async move {
        let token = issue_token(ctx);
        if let Some(kv) = &ctx.kv {
            kv.set(&format!("auth:{token}"), "demo_user".to_string());
        }
        ctx.set_cookie(
            "auth",
            &token,
            CookieOptions {
                path: Some("/".to_string()),
                http_only: true,
                same_site: Some(SameSite::Lax),
                max_age: Some(60 * 60), // 1 hour
                ..CookieOptions::default()
            },
        );
        response::text(format!("Logged in, auth token set in cookie: {token}"))
    })
}

fn protected<'a>(_req: &'a HttpRequest, ctx: &'a mut Context) -> BoxFuture<'a, HttpResponse> {
    Box::pin(async move {
        match &ctx.user {
            Some(user) => response::text(format!("Protected content for user: {user}")),
            None => response::text_with_status(StatusCode::UNAUTHORIZED, "Unauthorized"),
        }
    })
}

fn notify<'a>(_req: &'a HttpRequest, ctx: &'a mut Context) -> BoxFuture<'a, HttpResponse> {
    Box::pin(async move {
        let email = match &ctx.body {
            Some(ParsedBody::Form(fields)) => fields.get("email").cloned(),
            Some(ParsedBody::Json(value)) => value
                .get("email")
                .and_then(|v| v.as_str())
                .map(ToString::to_string),
            None => None,
        };

        let Some(email) = email.filter(|e| e.contains('@')) else {
            return response::json(
                StatusCode::BAD_REQUEST,
                &serde_json::json!({ "error": "A valid email address is required" }),
            );
        };

        if let Some(kv) = &ctx.kv {
            kv.set(
                &format!("notify:{email}"),
                chrono::Utc::now().to_rfc3339(),
            );
        }

        response::json(
            StatusCode::OK,
            &serde_json::json!({ "status": "subscribed", "email": email }),
        )
    })
}

fn success<'a>(_req: &'a HttpRequest, ctx: &'a mut Context) -> BoxFuture<'a, HttpResponse> {
    Box::pin(async move {
        let body = "<h1>You're on the list</h1><p>We'll be in touch.</p>";
        match &ctx.render {
            Some(render) => response::html(render(body)),
            None => response::html(body),
        }
    })
}
