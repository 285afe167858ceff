//! HTTP server, error boundary and graceful shutdown.
//!
//! # Error boundary
//!
//! The router hands back either the handler's response or a
//! [`DispatchError`]. This is the only place that turns the latter into HTTP:
//!
//! | Outcome | Status | `message` |
//! |---|---|---|
//! | no route matched | 404 | `Route GET:/path not found` |
//! | handler raised [`HttpError`] | its status | its message |
//! | handler raised anything else | 500 | `Internal Server Error` (error logged) |
//!
//! Bodies are JSON: `{"statusCode": 404, "error": "Not Found", "message": "…"}`.
//!
//! # Graceful shutdown
//!
//! On SIGTERM or Ctrl-C the server stops accepting and closes the listener.
//! Every open connection is told to shut down: a request already in flight
//! runs to completion and its response is written, idle keep-alive
//! connections close immediately. Then [`Server::serve`] returns.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::error::{Error, HttpError};
use crate::request::Request;
use crate::response::Response;
use crate::router::{DispatchError, Router};

/// The HTTP server.
pub struct Server {
    listener: TcpListener,
}

impl Server {
    /// Binds the listening socket. Port `0` picks a free port; read it back
    /// with [`Server::local_addr`].
    pub async fn bind(addr: SocketAddr) -> Result<Self, Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves `router` until SIGTERM or Ctrl-C, then drains and returns.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Serves `router` until `signal` resolves, then drains and returns.
    pub async fn serve_with_shutdown(
        self,
        router: Router,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let addr = self.local_addr()?;
        for (method, path) in router.routes() {
            debug!(%method, path, "route registered");
        }

        let router = Arc::new(router);
        info!(%addr, "stockroom listening");

        let conn_builder = ConnBuilder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();
        let mut tasks = tokio::task::JoinSet::new();
        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Shutdown is checked first so queued connections are not
                // accepted once the signal has fired.
                biased;

                () = &mut signal => {
                    info!(
                        in_flight = tasks.len(),
                        "shutdown signal received, draining connections",
                    );
                    break;
                }

                res = self.listener.accept() => {
                    let (stream, peer) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let io = TokioIo::new(stream);

                    // Called once per request on the connection.
                    let svc = service_fn(move |req| {
                        let router = Arc::clone(&router);
                        async move { handle(&router, req, peer).await }
                    });

                    // Watched connections are told to finish their current
                    // request and close once shutdown starts; idle keep-alive
                    // connections close at once.
                    let conn = graceful.watch(conn_builder.serve_connection(io, svc).into_owned());

                    tasks.spawn(async move {
                        if let Err(e) = conn.await {
                            error!(%peer, "connection error: {e}");
                        }
                    });
                }

                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        drop(self.listener);
        graceful.shutdown().await;
        while tasks.join_next().await.is_some() {}

        info!("stockroom stopped");
        Ok(())
    }
}

// ── Request handling ──────────────────────────────────────────────────────────

/// Buffers the body, dispatches, and renders whatever came back.
///
/// Infallible toward hyper: every failure is already a response here.
async fn handle(
    router: &Router,
    req: hyper::Request<Incoming>,
    peer: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let method = parts.method.clone();
    let path = parts.uri.path().to_owned();

    let response = match body.collect().await {
        Ok(collected) => {
            let req = Request::from_parts(parts, collected.to_bytes());
            match router.dispatch(req).await {
                Ok(res) => res,
                Err(e) => render_error(e),
            }
        }
        Err(e) => {
            warn!(%peer, "failed to read request body: {e}");
            error_response(StatusCode::BAD_REQUEST, "failed to read request body")
        }
    };

    info!(
        %method,
        path = %path,
        status = response.status_code().as_u16(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        %peer,
        "request completed",
    );
    Ok(response.into_inner())
}

fn render_error(err: DispatchError) -> Response {
    match err {
        DispatchError::NotFound { .. } => error_response(StatusCode::NOT_FOUND, &err.to_string()),
        DispatchError::Handler(err) => match err.downcast::<HttpError>() {
            Ok(http) => error_response(http.status(), http.message()),
            Err(err) => {
                error!(error = %err, "handler failed");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        },
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let body = json!({
        "statusCode": status.as_u16(),
        "error": status.canonical_reason().unwrap_or(""),
        "message": message,
    });
    Response::builder().status(status).json(body.to_string())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on SIGTERM (Unix) or Ctrl-C, whichever comes first.
///
/// A signal that cannot be installed is logged and never fires; the other
/// one still works.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_json(res: &Response) -> serde_json::Value {
        serde_json::from_slice(res.body()).unwrap()
    }

    #[test]
    fn not_found_renders_route_message() {
        let res = render_error(DispatchError::NotFound {
            method: http::Method::GET,
            path: "/unknown-path".to_owned(),
        });
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(&res),
            json!({
                "statusCode": 404,
                "error": "Not Found",
                "message": "Route GET:/unknown-path not found",
            })
        );
    }

    #[test]
    fn http_error_keeps_its_status_and_message() {
        let res = render_error(DispatchError::Handler(Box::new(HttpError::unauthorized(
            "invalid credentials",
        ))));
        assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(&res)["message"], "invalid credentials");
        assert_eq!(body_json(&res)["error"], "Unauthorized");
    }

    #[test]
    fn other_errors_are_hidden_behind_500() {
        let err = std::io::Error::other("connection refused by db.internal:5432");
        let res = render_error(DispatchError::Handler(Box::new(err)));
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(&res)["message"], "Internal Server Error");
    }
}
