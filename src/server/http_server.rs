//! HTTP/1.1 transport adapter.
//!
//! Converts wire requests into [`Request`]s, runs them through a shared
//! [`Dispatcher`] and writes the resulting [`Response`] back. The adapter is
//! an axum fallback service so every path and method reaches the dispatcher,
//! which owns 404/405 handling.

use crate::config::HttpConfig;
use crate::dispatcher::Dispatcher;
use crate::server::{Request, Response};
use axum::body::Body;
use axum::extract::State;
use axum::http::header::CONTENT_LENGTH;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Clone)]
struct AdapterState {
    dispatcher: Arc<Dispatcher>,
    max_body_bytes: usize,
}

fn payload_too_large() -> Response {
    Response::json(
        413,
        &serde_json::json!({ "status": 413, "message": "Payload Too Large" }),
    )
}

/// axum service that forwards every request to `dispatcher`.
///
/// Bodies above `max_body_bytes` are answered with 413 before dispatch.
pub fn router(dispatcher: Arc<Dispatcher>, max_body_bytes: usize) -> axum::Router {
    axum::Router::new().fallback(handle).with_state(AdapterState {
        dispatcher,
        max_body_bytes,
    })
}

async fn handle(
    State(state): State<AdapterState>,
    request: axum::extract::Request,
) -> axum::response::Response {
    let (parts, body) = request.into_parts();

    let declared = parts
        .headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<usize>().ok());
    if declared.is_some_and(|len| len > state.max_body_bytes) {
        warn!(
            content_length = declared,
            limit = state.max_body_bytes,
            "Request body exceeds limit"
        );
        return into_http(payload_too_large());
    }

    // Chunked bodies are only caught while reading.
    let bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(limit = state.max_body_bytes, error = %e, "Failed to read request body");
            return into_http(payload_too_large());
        }
    };

    let target = parts
        .uri
        .path_and_query()
        .map_or_else(|| parts.uri.path(), |pq| pq.as_str());
    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)));
    let request = Request::from_parts(parts.method.clone(), target, headers, bytes.to_vec());

    into_http(state.dispatcher.dispatch(request).await)
}

fn into_http(response: Response) -> axum::response::Response {
    let (status, headers, body) = response.into_parts();
    let mut builder = axum::http::Response::builder().status(status);
    for (name, value) in &headers {
        builder = builder.header(name.as_ref(), value.as_str());
    }
    builder.body(Body::from(body)).unwrap_or_else(|e| {
        error!(status, error = %e, "Response could not be encoded");
        let mut fallback = axum::response::Response::new(Body::empty());
        *fallback.status_mut() = axum::http::StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}

/// Owns a dispatcher and the body limit, and binds listeners for it.
pub struct HttpServer {
    dispatcher: Arc<Dispatcher>,
    max_body_bytes: usize,
}

/// A server started with [`HttpServer::start`].
pub struct ServerHandle {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<io::Result<()>>,
}

impl ServerHandle {
    /// Address the listener actually bound (useful with port 0).
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for in-flight requests.
    ///
    /// # Errors
    ///
    /// The server's own I/O error, or an error if its task panicked.
    pub async fn stop(self) -> io::Result<()> {
        // The task may already have exited; its result is reported below.
        let _ = self.shutdown.send(());
        self.task.await.map_err(io::Error::other)?
    }
}

impl HttpServer {
    #[must_use]
    pub fn new(dispatcher: Arc<Dispatcher>, config: &HttpConfig) -> Self {
        Self {
            dispatcher,
            max_body_bytes: config.max_body_bytes,
        }
    }

    /// The axum service for this server, for embedding or in-process tests.
    #[must_use]
    pub fn router(&self) -> axum::Router {
        router(Arc::clone(&self.dispatcher), self.max_body_bytes)
    }

    /// Bind `addr` and serve on a background task until [`ServerHandle::stop`].
    ///
    /// # Errors
    ///
    /// Fails when the address cannot be bound.
    pub async fn start(self, addr: &str) -> io::Result<ServerHandle> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let (shutdown, stopped) = oneshot::channel::<()>();
        let app = self.router();

        info!(address = %addr, routes = self.dispatcher.router().len(), "HTTP server starting");
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    // A dropped handle also stops the server.
                    let _ = stopped.await;
                })
                .await?;
            info!(address = %addr, "HTTP server stopped");
            Ok::<(), io::Error>(())
        });

        Ok(ServerHandle {
            addr,
            shutdown,
            task,
        })
    }

    /// Bind `addr` and serve until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Fails when the address cannot be bound or the listener errors.
    pub async fn run(self, addr: &str) -> io::Result<()> {
        let listener = TcpListener::bind(addr).await?;
        let local = listener.local_addr()?;
        info!(address = %local, routes = self.dispatcher.router().len(), "HTTP server starting");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!(address = %local, "HTTP server stopped");
        Ok(())
    }
}

/// Bind `config.bind` and serve `dispatcher` until Ctrl-C.
///
/// # Errors
///
/// See [`HttpServer::run`].
pub async fn serve(dispatcher: Arc<Dispatcher>, config: &HttpConfig) -> io::Result<()> {
    HttpServer::new(dispatcher, config).run(&config.bind).await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            error!(error = %e, "Cannot listen for Ctrl-C; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
