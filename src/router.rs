//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. You register a path, you
//! get a handler. Dispatch looks the handler up, calls it once and hands back
//! whatever it returned. It does not validate, log, wrap or retry.

use std::collections::HashMap;

use http::Method;
use matchit::{InsertError, Router as MatchitRouter};

use crate::error::{BoxError, Error};
use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::Response;

/// Why [`Router::dispatch`] did not produce a response.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No route matched the method and path. No handler ran.
    #[error("Route {method}:{path} not found")]
    NotFound { method: Method, path: String },

    /// The handler ran and failed. The error is the handler's own value.
    #[error(transparent)]
    Handler(BoxError),
}

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// After that it is read-only and shared by every connection without locks.
pub struct Router {
    trees: HashMap<Method, MatchitRouter<BoxedHandler>>,
    entries: Vec<(Method, String)>,
}

impl Router {
    pub fn new() -> Self {
        Self { trees: HashMap::new(), entries: Vec::new() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `:name` segments and are read with
    /// `req.param("name")`:
    ///
    /// ```rust
    /// # use std::convert::Infallible;
    /// # use http::Method;
    /// # use stockroom::{Request, Router};
    /// # async fn delete_user(_: Request) -> Result<&'static str, Infallible> { Ok("") }
    /// # async fn list_users(_: Request) -> Result<&'static str, Infallible> { Ok("") }
    /// Router::new()
    ///     .on(Method::DELETE, "/users/:userId", delete_user)
    ///     .on(Method::GET,    "/users",         list_users);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the route is malformed or already registered. Use
    /// [`Router::try_on`] to get the error instead.
    pub fn on(self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.try_on(method, path, handler)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Fallible form of [`Router::on`].
    pub fn try_on(
        mut self,
        method: Method,
        path: &str,
        handler: impl Handler,
    ) -> Result<Self, Error> {
        let pattern = to_matchit(path)?;
        let tree = self.trees.entry(method.clone()).or_default();
        match tree.insert(pattern, handler.into_boxed_handler()) {
            Ok(()) => {}
            Err(InsertError::Conflict { with }) => {
                return Err(Error::DuplicateRoute {
                    method,
                    path: path.to_owned(),
                    existing: from_matchit(&with),
                });
            }
            Err(e) => {
                return Err(Error::InvalidRoute { path: path.to_owned(), reason: e.to_string() });
            }
        }
        self.entries.push((method, path.to_owned()));
        Ok(self)
    }

    /// Registered routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.entries.iter().map(|(m, p)| (m, p.as_str()))
    }

    /// Routes `req` to its handler and returns the handler's result unchanged.
    pub async fn dispatch(&self, mut req: Request) -> Result<Response, DispatchError> {
        let Some((handler, params)) = self.lookup(req.method(), req.path()) else {
            return Err(DispatchError::NotFound {
                method: req.method().clone(),
                path: req.path().to_owned(),
            });
        };
        req.params = params;
        handler.call(req).await.map_err(DispatchError::Handler)
    }

    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(&BoxedHandler, HashMap<String, String>)> {
        let tree = self.trees.get(method)?;
        let matched = tree.at(path).ok()?;
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((matched.value, params))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

// ── Pattern syntax ────────────────────────────────────────────────────────────

/// Rewrites `/users/:userId` into matchit's `/users/{userId}`.
///
/// Braces in literal segments are escaped so they match themselves.
fn to_matchit(path: &str) -> Result<String, Error> {
    if !path.starts_with('/') {
        return Err(Error::InvalidRoute {
            path: path.to_owned(),
            reason: "must start with `/`".to_owned(),
        });
    }

    let segments = path.split('/').map(|segment| match segment.strip_prefix(':') {
        Some("") => Err(Error::InvalidRoute {
            path: path.to_owned(),
            reason: "parameter segment has no name".to_owned(),
        }),
        Some(name) => Ok(format!("{{{name}}}")),
        None => Ok(segment.replace('{', "{{").replace('}', "}}")),
    });

    segments.collect::<Result<Vec<_>, _>>().map(|s| s.join("/"))
}

/// Inverse of [`to_matchit`], for error messages.
fn from_matchit(pattern: &str) -> String {
    pattern
        .split('/')
        .map(|segment| {
            if segment.starts_with('{') && !segment.starts_with("{{") && segment.ends_with('}') {
                format!(":{}", &segment[1..segment.len() - 1])
            } else {
                segment.replace("{{", "{").replace("}}", "}")
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}
