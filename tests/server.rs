//! End to end: a real listener on an ephemeral port, raw HTTP/1.1 over TCP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use http::StatusCode;
use stockroom::{Controllers, HandlerResult, HttpError, Request, Response, Server, routes};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct Stub;

impl Controllers for Stub {
    async fn login(&self, req: Request) -> HandlerResult {
        #[derive(serde::Deserialize)]
        struct Credentials {
            email: String,
        }
        let creds: Credentials = req.json().map_err(|e| HttpError::bad_request(e.to_string()))?;
        Ok(Response::builder()
            .header("set-cookie", "token=t0k3n; HttpOnly")
            .json(format!(r#"{{"email":"{}"}}"#, creds.email)))
    }
    async fn register(&self, _req: Request) -> HandlerResult {
        Err(HttpError::conflict("email already registered").into())
    }
    async fn list_users(&self, _req: Request) -> HandlerResult {
        Err(std::io::Error::other("pool timed out").into())
    }
    async fn delete_user(&self, req: Request) -> HandlerResult {
        let id = req.param("userId").unwrap_or_default().to_owned();
        Ok(Response::json(format!(r#"{{"deleted":"{id}"}}"#)))
    }
    async fn logout(&self, _req: Request) -> HandlerResult {
        Ok(Response::status(StatusCode::NO_CONTENT))
    }
    async fn register_stock(&self, _req: Request) -> HandlerResult {
        Ok(Response::status(StatusCode::CREATED))
    }
    async fn list_stock(&self, _req: Request) -> HandlerResult {
        Ok(Response::json("[]"))
    }
    async fn delete_stock(&self, _req: Request) -> HandlerResult {
        Ok(Response::status(StatusCode::NO_CONTENT))
    }
}

struct Running {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    task: JoinHandle<Result<(), stockroom::Error>>,
}

async fn start() -> Running {
    let server = Server::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
    let addr = server.local_addr().unwrap();
    let router = routes(Arc::new(Stub)).unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let task = tokio::spawn(server.serve_with_shutdown(router, async move {
        let _ = stopped.await;
    }));
    Running { addr, stop, task }
}

/// Sends one request with `Connection: close`; returns status, lowercased head and body.
async fn send(addr: SocketAddr, method: &str, path: &str, body: &str) -> (u16, String, String) {
    let raw = format!(
        "{method} {path} HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\
         content-type: application/json\r\ncontent-length: {}\r\n\r\n{body}",
        body.len()
    );
    send_raw(addr, &raw).await
}

/// Writes `raw` as-is and reads until the server closes the connection.
async fn send_raw(addr: SocketAddr, raw: &str) -> (u16, String, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await.unwrap();
    let text = String::from_utf8(buf).unwrap();

    let (head, body) = text.split_once("\r\n\r\n").unwrap();
    let status = head.split(' ').nth(1).unwrap().parse().unwrap();
    (status, head.to_ascii_lowercase(), body.to_owned())
}

#[tokio::test]
async fn serves_the_route_table() {
    let server = start().await;

    let (status, _, body) = send(server.addr, "GET", "/teste", "").await;
    assert_eq!(status, 200);
    assert_eq!(body, r#"{"ok":true}"#);

    let credentials = r#"{"email":"ana@example.com","password":"x"}"#;
    let (status, head, body) = send(server.addr, "POST", "/login", credentials).await;
    assert_eq!(status, 200);
    assert!(head.contains("set-cookie: token=t0k3n; httponly"), "{head}");
    assert_eq!(body, r#"{"email":"ana@example.com"}"#);

    let (status, _, body) = send(server.addr, "DELETE", "/users/42", "").await;
    assert_eq!(status, 200);
    assert_eq!(body, r#"{"deleted":"42"}"#);

    let (status, _, body) = send(server.addr, "POST", "/logout", "").await;
    assert_eq!(status, 204);
    assert!(body.is_empty());

    server.stop.send(()).unwrap();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn error_boundary_renders_json() {
    let server = start().await;

    let (status, _, body) = send(server.addr, "GET", "/unknown-path", "").await;
    assert_eq!(status, 404);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["statusCode"], 404);
    assert_eq!(json["error"], "Not Found");
    assert_eq!(json["message"], "Route GET:/unknown-path not found");

    let (status, _, body) = send(server.addr, "POST", "/register", "{}").await;
    assert_eq!(status, 409);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["message"], "email already registered");

    let (status, _, body) = send(server.addr, "POST", "/login", "not json").await;
    assert_eq!(status, 400);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "Bad Request");

    let (status, _, body) = send(server.addr, "GET", "/users", "").await;
    assert_eq!(status, 500);
    assert!(!body.contains("pool timed out"));

    // Chunk size that is not hex: the body cannot be read.
    let malformed = "POST /login HTTP/1.1\r\nhost: localhost\r\nconnection: close\r\n\
                     transfer-encoding: chunked\r\n\r\nZZZ\r\n";
    let (status, _, body) = send_raw(server.addr, malformed).await;
    assert_eq!(status, 400);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "statusCode": 400,
            "error": "Bad Request",
            "message": "failed to read request body",
        })
    );

    server.stop.send(()).unwrap();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn stops_accepting_after_shutdown() {
    let server = start().await;
    let addr = server.addr;

    server.stop.send(()).unwrap();
    server.task.await.unwrap().unwrap();

    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn shutdown_closes_idle_keep_alive_connections() {
    let server = start().await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream
        .write_all(b"GET /teste HTTP/1.1\r\nhost: localhost\r\n\r\n")
        .await
        .unwrap();

    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !String::from_utf8_lossy(&buf).contains(r#"{"ok":true}"#) {
        let n = stream.read(&mut chunk).await.unwrap();
        assert_ne!(n, 0, "connection closed before the response arrived");
        buf.extend_from_slice(&chunk[..n]);
    }
    assert!(buf.starts_with(b"HTTP/1.1 200"));

    server.stop.send(()).unwrap();
    let stopped = tokio::time::timeout(Duration::from_secs(5), server.task).await;
    stopped
        .expect("serve_with_shutdown must return while a keep-alive connection is idle")
        .unwrap()
        .unwrap();

    let n = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut chunk))
        .await
        .expect("idle connection must be closed by the server")
        .unwrap_or(0);
    assert_eq!(n, 0);
}
