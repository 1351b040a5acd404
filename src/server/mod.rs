//! Server module
//!
//! Owns the Tokio runtime, the listening socket, and per-connection
//! handling. Every request on every connection is routed through the
//! dispatch entry point with a shared `AppState`.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{HeaderMap, Request};
use hyper_util::rt::TokioIo;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;

use crate::config::{AppState, Config};
use crate::handler::dispatch;
use crate::http::request::HttpRequest;
use crate::http::{response, HttpResponse};
use crate::logger;
use crate::routing::Router;

/// An immutable router plus configuration, ready to accept connections.
pub struct Server {
    router: Router,
    config: Config,
}

impl Server {
    pub const fn new(router: Router, config: Config) -> Self {
        Self { router, config }
    }

    /// Build the runtime and serve until the process is terminated.
    pub fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
        runtime_builder.enable_all();
        if let Some(workers) = self.config.server.workers {
            runtime_builder.worker_threads(workers);
        }
        let runtime = runtime_builder.build()?;
        runtime.block_on(self.serve())
    }

    async fn serve(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = self.config.socket_addr()?;
        let listener = create_reusable_listener(addr)?;
        logger::log_server_start(&addr, &self.config);

        let state = Arc::new(AppState::new(self.router, &self.config));
        let active_connections = Arc::new(AtomicUsize::new(0));

        loop {
            match listener.accept().await {
                Ok((stream, peer_addr)) => {
                    accept_connection(stream, peer_addr, &state, &active_connections);
                }
                Err(e) => {
                    logger::log_error(&format!("Failed to accept connection: {e}"));
                }
            }
        }
    }
}

/// Accept a connection, enforcing the optional connection limit.
fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment first, then check, so two racing accepts cannot both
    // slip under the limit.
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);
    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= max_conn as usize {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    if state.config.logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    handle_connection(stream, peer_addr, Arc::clone(state), Arc::clone(conn_counter));
}

/// Serve one connection in a spawned task: HTTP/1.1 with keep-alive and a
/// connection-level timeout from the performance configuration.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);

        let keep_alive_timeout = state.config.performance.keep_alive_timeout;
        let timeout_duration = Duration::from_secs(std::cmp::max(
            state.config.performance.read_timeout,
            state.config.performance.write_timeout,
        ));

        let mut builder = http1::Builder::new();
        if keep_alive_timeout > 0 {
            builder.keep_alive(true);
        }

        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let state = Arc::clone(&state);
                async move { serve_request(req, peer_addr, state).await }
            }),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    timeout_duration.as_secs()
                ));
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Collect the request body within the configured limit and hand the
/// request to the dispatch entry point.
async fn serve_request(
    req: Request<Incoming>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<HttpResponse, Infallible> {
    let max_body_size = state.config.http.max_body_size;
    let (parts, body) = req.into_parts();

    // Reject early on the declared length before reading anything.
    if let Some(resp) = check_body_size(&parts.headers, max_body_size) {
        return Ok(resp);
    }

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let body = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            if err.downcast_ref::<LengthLimitError>().is_some() {
                logger::log_error(&format!(
                    "Request body exceeded limit of {max_body_size} bytes"
                ));
                return Ok(response::payload_too_large());
            }
            logger::log_error(&format!("Failed to read request body: {err}"));
            return Ok(response::bad_request("Malformed request body"));
        }
    };

    let request = HttpRequest::new(
        parts.method,
        parts.uri,
        parts.version,
        parts.headers,
        body,
        peer_addr,
    );

    Ok(dispatch::handle_request(request, state).await)
}

/// Validate the Content-Length header against the configured limit.
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<HttpResponse> {
    let content_length = headers.get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(response::payload_too_large())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

/// Create a `TcpListener` with SO_REUSEPORT and SO_REUSEADDR enabled, so
/// a replacement process can bind the same address before this one exits.
fn create_reusable_listener(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_port(true)?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(128)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}
