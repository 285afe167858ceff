//! Minimal stockroom service with throwaway in-memory controllers.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example stock_service
//!
//! Try:
//!   curl http://localhost:3333/teste
//!   curl -X POST http://localhost:3333/register -d '{"email":"ana@example.com"}'
//!   curl http://localhost:3333/users
//!   curl -X DELETE http://localhost:3333/users/1
//!   curl -X POST http://localhost:3333/register-stock -d '{"name":"bolts","quantity":40}'
//!   curl http://localhost:3333/list-stock
//!   curl -X DELETE http://localhost:3333/delete-stock -d '{"id":1}'

use std::sync::{Arc, Mutex};

use http::StatusCode;
use serde::{Deserialize, Serialize};
use stockroom::{
    Controllers, HandlerResult, HttpError, IntoResponse, Json, Request, Response, Server,
    ServerConfig,
};

#[derive(Clone, Serialize)]
struct User {
    id: u64,
    email: String,
}

#[derive(Clone, Serialize)]
struct Item {
    id: u64,
    name: String,
    quantity: u32,
}

#[derive(Deserialize)]
struct NewUser {
    email: String,
}

#[derive(Deserialize)]
struct NewItem {
    name: String,
    quantity: u32,
}

#[derive(Deserialize)]
struct ItemId {
    id: u64,
}

// A real app talks to a database here. The demo keeps two vectors.
#[derive(Default)]
struct Memory {
    users: Mutex<Vec<User>>,
    stock: Mutex<Vec<Item>>,
    next_id: Mutex<u64>,
}

impl Memory {
    fn next_id(&self) -> u64 {
        let mut id = self.next_id.lock().unwrap();
        *id += 1;
        *id
    }
}

fn body<T: for<'de> Deserialize<'de>>(req: &Request) -> Result<T, HttpError> {
    req.json().map_err(|e| HttpError::bad_request(e.to_string()))
}

impl Controllers for Memory {
    async fn login(&self, req: Request) -> HandlerResult {
        let NewUser { email } = body(&req)?;
        if !self.users.lock().unwrap().iter().any(|u| u.email == email) {
            return Err(HttpError::unauthorized("unknown user").into());
        }
        Ok(Response::builder()
            .header("set-cookie", "token=demo; HttpOnly; Path=/")
            .text("logged in"))
    }

    async fn register(&self, req: Request) -> HandlerResult {
        let NewUser { email } = body(&req)?;
        let user = User { id: self.next_id(), email };
        self.users.lock().unwrap().push(user.clone());
        Ok(Json(user).into_response())
    }

    async fn list_users(&self, _req: Request) -> HandlerResult {
        Ok(Json(self.users.lock().unwrap().clone()).into_response())
    }

    async fn delete_user(&self, req: Request) -> HandlerResult {
        let id: u64 = req
            .param("userId")
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| HttpError::bad_request("userId must be a number"))?;
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(HttpError::not_found("no such user").into());
        }
        Ok(Response::status(StatusCode::NO_CONTENT))
    }

    async fn logout(&self, req: Request) -> HandlerResult {
        if req.cookie("token").is_none() {
            return Err(HttpError::unauthorized("not logged in").into());
        }
        Ok(Response::builder()
            .status(StatusCode::NO_CONTENT)
            .header("set-cookie", "token=; Max-Age=0; Path=/")
            .no_body())
    }

    async fn register_stock(&self, req: Request) -> HandlerResult {
        let NewItem { name, quantity } = body(&req)?;
        let item = Item { id: self.next_id(), name, quantity };
        self.stock.lock().unwrap().push(item.clone());
        Ok(Json(item).into_response())
    }

    async fn list_stock(&self, _req: Request) -> HandlerResult {
        Ok(Json(self.stock.lock().unwrap().clone()).into_response())
    }

    async fn delete_stock(&self, req: Request) -> HandlerResult {
        let ItemId { id } = body(&req)?;
        self.stock.lock().unwrap().retain(|i| i.id != id);
        Ok(Response::status(StatusCode::NO_CONTENT))
    }
}

#[tokio::main]
async fn main() -> Result<(), stockroom::Error> {
    let config = ServerConfig::from_env()?;
    stockroom::logging::init(&config);

    let router = stockroom::routes(Arc::new(Memory::default()))?;
    Server::bind(config.addr).await?.serve(router).await
}
