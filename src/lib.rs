//! # stockroom
//!
//! Route table and request dispatch for a small service that manages user
//! accounts and a stock of items.
//!
//! ## The contract
//!
//! The crate decides *which* code runs for a request. It never decides what
//! that code does. Credentials, sessions, storage, validation: all of it
//! sits behind [`Controllers`], supplied by the application.
//!
//! - Radix-tree routing, one tree per method, via [`matchit`]
//! - `:name` path parameters, bound raw into [`Request::param`]
//! - Duplicate routes fail at startup, never at request time
//! - Handler results, errors included, come back from the router unchanged
//! - The [`Server`] is the single error boundary: 404s, [`HttpError`]s, 500s
//! - Graceful shutdown on SIGTERM / Ctrl-C, draining in-flight requests
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use stockroom::{Controllers, HandlerResult, Request, Response, Server, ServerConfig};
//!
//! struct App;
//!
//! impl Controllers for App {
//!     async fn login(&self, _req: Request) -> HandlerResult { Ok(Response::text("hi")) }
//!     async fn register(&self, _req: Request) -> HandlerResult { Ok(Response::text("")) }
//!     async fn list_users(&self, _req: Request) -> HandlerResult { Ok(Response::json("[]")) }
//!     async fn delete_user(&self, req: Request) -> HandlerResult {
//!         let id = req.param("userId").unwrap_or_default();
//!         Ok(Response::text(format!("deleted {id}")))
//!     }
//!     async fn logout(&self, _req: Request) -> HandlerResult { Ok(Response::text("")) }
//!     async fn register_stock(&self, _req: Request) -> HandlerResult { Ok(Response::text("")) }
//!     async fn list_stock(&self, _req: Request) -> HandlerResult { Ok(Response::json("[]")) }
//!     async fn delete_stock(&self, _req: Request) -> HandlerResult { Ok(Response::text("")) }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), stockroom::Error> {
//!     let config = ServerConfig::from_env()?;
//!     stockroom::logging::init(&config);
//!
//!     let router = stockroom::routes(Arc::new(App))?;
//!     Server::bind(config.addr).await?.serve(router).await
//! }
//! ```

mod config;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod routes;
mod server;

pub mod health;
pub mod logging;

pub use config::{LogFormat, ServerConfig};
pub use error::{BoxError, Error, HttpError};
pub use handler::{Handler, HandlerResult};
pub use request::Request;
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::{DispatchError, Router};
pub use routes::{Controllers, routes};
pub use server::Server;
