//! The service's route table.
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | GET | `/teste` | [`health::probe`] |
//! | POST | `/login` | [`Controllers::login`] |
//! | POST | `/register` | [`Controllers::register`] |
//! | GET | `/users` | [`Controllers::list_users`] |
//! | DELETE | `/users/:userId` | [`Controllers::delete_user`] |
//! | POST | `/logout` | [`Controllers::logout`] |
//! | POST | `/register-stock` | [`Controllers::register_stock`] |
//! | GET | `/list-stock` | [`Controllers::list_stock`] |
//! | DELETE | `/delete-stock` | [`Controllers::delete_stock`] |
//!
//! Every entry is one line: pick the controller method, call it, return what
//! it returned. Credentials, sessions, storage and input checks all live in
//! the [`Controllers`] implementation the embedding application provides.

use std::future::Future;
use std::sync::Arc;

use http::Method;

use crate::error::Error;
use crate::handler::{Handler, HandlerResult};
use crate::health;
use crate::request::Request;
use crate::router::Router;

/// The business logic behind the routes.
///
/// Each method receives the whole request. `delete_user` finds the user id in
/// `req.param("userId")`; `delete_stock` reads its identifier from the body.
pub trait Controllers: Send + Sync + 'static {
    fn login(&self, req: Request) -> impl Future<Output = HandlerResult> + Send;
    fn register(&self, req: Request) -> impl Future<Output = HandlerResult> + Send;
    fn list_users(&self, req: Request) -> impl Future<Output = HandlerResult> + Send;
    fn delete_user(&self, req: Request) -> impl Future<Output = HandlerResult> + Send;
    fn logout(&self, req: Request) -> impl Future<Output = HandlerResult> + Send;
    fn register_stock(&self, req: Request) -> impl Future<Output = HandlerResult> + Send;
    fn list_stock(&self, req: Request) -> impl Future<Output = HandlerResult> + Send;
    fn delete_stock(&self, req: Request) -> impl Future<Output = HandlerResult> + Send;
}

/// Builds the router for the whole service.
///
/// Fails if two entries collide, which can only happen if this table is
/// edited badly. The server never starts in that case.
pub fn routes<C: Controllers>(controllers: Arc<C>) -> Result<Router, Error> {
    let c = &controllers;
    let login = bind(c, |c, req| async move { c.login(req).await });
    let register = bind(c, |c, req| async move { c.register(req).await });
    let list_users = bind(c, |c, req| async move { c.list_users(req).await });
    let delete_user = bind(c, |c, req| async move { c.delete_user(req).await });
    let logout = bind(c, |c, req| async move { c.logout(req).await });
    let register_stock = bind(c, |c, req| async move { c.register_stock(req).await });
    let list_stock = bind(c, |c, req| async move { c.list_stock(req).await });
    let delete_stock = bind(c, |c, req| async move { c.delete_stock(req).await });

    Router::new()
        .try_on(Method::GET,    "/teste",          health::probe)?
        .try_on(Method::POST,   "/login",          login)?
        .try_on(Method::POST,   "/register",       register)?
        .try_on(Method::GET,    "/users",          list_users)?
        .try_on(Method::DELETE, "/users/:userId",  delete_user)?
        .try_on(Method::POST,   "/logout",         logout)?
        .try_on(Method::POST,   "/register-stock", register_stock)?
        .try_on(Method::GET,    "/list-stock",     list_stock)?
        .try_on(Method::DELETE, "/delete-stock",   delete_stock)
}

/// Closes `call` over a shared handle to the controllers, once, at
/// registration time.
fn bind<C, F, Fut>(controllers: &Arc<C>, call: F) -> impl Handler + use<C, F, Fut>
where
    C: Controllers,
    F: Fn(Arc<C>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    let controllers = Arc::clone(controllers);
    move |req| call(Arc::clone(&controllers), req)
}
