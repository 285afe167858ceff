//! Built-in health probe.
//!
//! `GET /teste` answers `{"ok": true}` whenever the process can answer HTTP
//! at all. It has no dependencies and never delegates to a controller, so a
//! broken database does not make the service look dead to a load balancer.

use std::convert::Infallible;

use serde::Serialize;

use crate::{Json, Request};

#[derive(Debug, Serialize)]
pub struct Probe {
    pub ok: bool,
}

/// Always returns `200 OK` with body `{"ok":true}`. Ignores the request.
pub async fn probe(_req: Request) -> Result<Json<Probe>, Infallible> {
    Ok(Json(Probe { ok: true }))
}
