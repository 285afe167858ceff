//! Error types.
//!
//! Two families, split by where they surface:
//!
//! - [`Error`]: startup and infrastructure failures (a bad address or
//!   config value, a route registered twice, a socket that will not bind).
//!   These stop the process before it serves a single request.
//! - [`HttpError`]: raised by a controller to choose the status the server
//!   renders. Routing never produces one; it only passes them through.

use std::net::AddrParseError;

use http::{Method, StatusCode};

/// A type-erased error returned by a handler.
///
/// The router forwards it untouched; only the server's error boundary looks
/// inside (to find an [`HttpError`]).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by stockroom's fallible operations.
///
/// Application-level errors (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values or [`HttpError`]s, not as `Error`s.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{value}`: {source}")]
    InvalidAddr {
        value: String,
        #[source]
        source: AddrParseError,
    },

    #[error("invalid value for {key}: `{value}`")]
    Config { key: &'static str, value: String },

    #[error("route {method}:{path} is already registered (conflicts with `{existing}`)")]
    DuplicateRoute {
        method: Method,
        path: String,
        existing: String,
    },

    #[error("invalid route `{path}`: {reason}")]
    InvalidRoute { path: String, reason: String },
}

/// An error carrying the HTTP status it should be rendered with.
///
/// ```rust
/// use stockroom::{HttpError, Request, Response};
///
/// async fn login(req: Request) -> Result<Response, HttpError> {
///     if req.body().is_empty() {
///         return Err(HttpError::bad_request("missing credentials"));
///     }
///     Ok(Response::text("welcome"))
/// }
/// ```
#[derive(Debug, thiserror::Error)]
#[error("{status}: {message}")]
pub struct HttpError {
    status: StatusCode,
    message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn message(&self) -> &str { &self.message }
}
