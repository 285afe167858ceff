//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;

/// An incoming HTTP request with its body fully buffered.
///
/// Path parameters are empty until the router binds them during dispatch.
#[derive(Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn from_parts(parts: http::request::Parts, body: Bytes) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            params: HashMap::new(),
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn query(&self) -> Option<&str> { self.uri.query() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Non-UTF-8 values are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the value of cookie `name` from any `Cookie` header.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.headers
            .get_all(http::header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|line| line.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/:userId`, `req.param("userId")` on `/users/42`
    /// returns `Some("42")`. The value is the raw segment, not percent-decoded.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self::from_parts(parts, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(builder: http::request::Builder, body: &'static str) -> Request {
        Request::from(builder.body(Bytes::from_static(body.as_bytes())).unwrap())
    }

    #[test]
    fn path_excludes_query() {
        let req = request(http::Request::get("/list-stock?page=2"), "");
        assert_eq!(req.path(), "/list-stock");
        assert_eq!(req.query(), Some("page=2"));
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = request(
            http::Request::post("/login").header("Content-Type", "application/json"),
            "",
        );
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("x-missing"), None);
    }

    #[test]
    fn cookie_is_found_across_pairs() {
        let req = request(
            http::Request::post("/logout").header("cookie", "theme=dark; token=abc123"),
            "",
        );
        assert_eq!(req.cookie("token"), Some("abc123"));
        assert_eq!(req.cookie("theme"), Some("dark"));
        assert_eq!(req.cookie("session"), None);
    }

    #[test]
    fn json_body_deserializes() {
        #[derive(serde::Deserialize)]
        struct Credentials {
            email: String,
        }

        let req = request(http::Request::post("/login"), r#"{"email":"a@b.c"}"#);
        let creds: Credentials = req.json().unwrap();
        assert_eq!(creds.email, "a@b.c");

        let empty = request(http::Request::post("/login"), "");
        assert!(empty.json::<Credentials>().is_err());
    }

    #[test]
    fn params_start_empty() {
        let req = request(http::Request::delete("/users/42"), "");
        assert_eq!(req.param("userId"), None);
    }
}
